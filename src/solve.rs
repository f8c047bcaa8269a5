//! # Solver Adapter
//!
//! Encodes an instance, hands the CNF to an incremental SAT solver and
//! minimises the largest courier distance by repeatedly probing
//! `MaxDist <= limit` as an assumption. A satisfiable probe lowers the upper
//! end of the search interval to one below the found objective, an
//! unsatisfiable probe raises the lower end above the limit. Either way the
//! probe result is added permanently, so later calls profit from it.
//!
//! The wall-clock budget covers encoding and solving. A watchdog thread
//! interrupts the solver when the budget is used up or the abort flag is set;
//! the best solution found until then is kept.

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc, Arc,
    },
    thread,
    time::{Duration, Instant},
};

use cpu_time::ProcessTime;
use rustsat::{
    instances::{BasicVarManager, Cnf, ManageVars},
    solvers::{Interrupt, InterruptSolver, Solve, SolveIncremental, SolveStats, SolverResult},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    bitvec::{Bit, BitVector},
    bounds::Bounds,
    decode::Solution,
    encodings::{Builder, Cmp, EncodeStats},
    events::{Event, EventSink, Phase},
    instance::Instance,
    model::{Encoding, ModelOptions},
    utils::Budget,
};

/// How often the watchdog checks the clock and the abort flag
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Search strategies for the objective
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Solution-improving search: always ask for something better than the
    /// best solution so far
    #[default]
    Linear,
    /// Bisection between the lower bound and the best solution so far
    Binary,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Linear => write!(f, "linear"),
            Strategy::Binary => write!(f, "binary"),
        }
    }
}

impl Strategy {
    /// The approach tag of a run with this strategy, e.g., `sat-linear-sb`
    /// if symmetry breaking constraints were part of the encoding
    #[must_use]
    pub fn approach(self, symmetry_broken: bool) -> String {
        if symmetry_broken {
            format!("sat-{self}-sb")
        } else {
            format!("sat-{self}")
        }
    }
}

/// Options of a solver run
#[derive(Clone, Debug)]
pub struct SolveOptions {
    /// Wall-clock budget for encoding and solving
    pub timeout: Duration,
    /// The search strategy
    pub strategy: Strategy,
    /// Options of the routing model
    pub model: ModelOptions,
    /// Set from outside to stop the search early
    pub abort: Arc<AtomicBool>,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            strategy: Strategy::default(),
            model: ModelOptions::default(),
            abort: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// The final state of a search
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    /// The best solution is proven optimal
    Optimal,
    /// The search was stopped after finding a solution
    Suboptimal,
    /// There is no solution
    Infeasible,
    /// The search was stopped before finding a solution
    Unknown,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Optimal => write!(f, "OPTIMAL"),
            Status::Suboptimal => write!(f, "SUBOPTIMAL"),
            Status::Infeasible => write!(f, "INFEASIBLE"),
            Status::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Searches that ended without a solution
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelError {
    /// The solver proved that no solution exists
    #[error("the instance has no solution")]
    Infeasible,
    /// The budget ran out before a solution was found
    #[error("no solution found within the time limit")]
    Timeout,
}

/// The result of a solver run
#[derive(Clone, Debug)]
pub struct Outcome {
    /// The final state of the search
    pub status: Status,
    /// The best solution found
    pub best: Option<Solution>,
    /// The approach tag, see [`Strategy::approach`]
    pub approach: String,
    /// Wall-clock time of the run
    pub elapsed: Duration,
    /// CPU time of the process during the run
    pub cpu_time: Duration,
    /// The budget the run had
    pub time_limit: Duration,
}

impl Outcome {
    /// Gets the best solution
    ///
    /// # Errors
    ///
    /// [`ModelError::Infeasible`] or [`ModelError::Timeout`] if there is none.
    pub fn solution(&self) -> Result<&Solution, ModelError> {
        match (&self.best, self.status) {
            (Some(sol), _) => Ok(sol),
            (None, Status::Infeasible) => Err(ModelError::Infeasible),
            (None, _) => Err(ModelError::Timeout),
        }
    }

    /// Creates the result record of the run. Runs that did not finish report
    /// the full time limit.
    #[must_use]
    pub fn record(&self) -> ResultRecord {
        let finished = matches!(self.status, Status::Optimal | Status::Infeasible);
        ResultRecord {
            approach: self.approach.clone(),
            elapsed_seconds: if finished {
                self.elapsed.as_secs()
            } else {
                self.time_limit.as_secs()
            },
            optimal: self.status == Status::Optimal,
            objective: self.best.as_ref().map(|sol| sol.objective),
            solution: self
                .best
                .as_ref()
                .map(|sol| {
                    sol.routes
                        .iter()
                        .map(|route| route.iter().map(|item| item + 1).collect())
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

/// A serialisable summary of a run, with 1-based item numbers
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    /// The approach tag
    pub approach: String,
    /// Whole seconds the run took
    pub elapsed_seconds: u64,
    /// Whether the objective is proven optimal
    pub optimal: bool,
    /// The objective of the solution, if any
    pub objective: Option<u64>,
    /// The items of every courier in delivery order, 1-based
    pub solution: Vec<Vec<usize>>,
}

impl ResultRecord {
    /// Gets the routes with 0-based item indices, `None` if an item number
    /// is zero
    #[must_use]
    pub fn routes(&self) -> Option<Vec<Vec<usize>>> {
        self.solution
            .iter()
            .map(|route| route.iter().map(|item| item.checked_sub(1)).collect())
            .collect()
    }
}

/// Interrupts a solver once a deadline passes or an abort flag is raised.
/// The thread stops when the watchdog is dropped.
struct Watchdog {
    stop: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Watchdog {
    fn spawn<I>(interrupter: I, deadline: Instant, abort: Arc<AtomicBool>) -> Self
    where
        I: InterruptSolver + Send + 'static,
    {
        let (stop, stopped) = mpsc::channel::<()>();
        let handle = thread::spawn(move || loop {
            let now = Instant::now();
            if now >= deadline || abort.load(Ordering::Relaxed) {
                // repeated until the search ends, a solve call may reset it
                interrupter.interrupt();
            }
            let wait = match deadline.checked_duration_since(now) {
                Some(left) if !left.is_zero() => left.min(POLL_INTERVAL),
                _ => POLL_INTERVAL,
            };
            match stopped.recv_timeout(wait) {
                Err(mpsc::RecvTimeoutError::Timeout) => (),
                Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        });
        Self {
            stop: Some(stop),
            handle: Some(handle),
        }
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        drop(self.stop.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!(target: "mcrsat", "watchdog thread panicked");
            }
        }
    }
}

/// Encodes and solves an instance with a fresh solver of type `S`
///
/// # Errors
///
/// If encoding fails or the solver reports an error. Infeasibility and
/// timeouts are not errors, they are reported in [`Outcome::status`].
pub fn solve<S>(inst: &Instance, opts: &SolveOptions, sink: &mut dyn EventSink) -> anyhow::Result<Outcome>
where
    S: Solve + SolveIncremental + SolveStats + Interrupt + Default,
{
    let budget = Budget::start(opts.timeout);
    let cpu_start = ProcessTime::now();
    let event = |phase, n_vars, n_clauses, detail: String| Event {
        phase,
        elapsed: budget.elapsed(),
        n_vars,
        n_clauses,
        detail,
    };

    let bounds = Bounds::for_instance(inst);
    sink.record(event(
        Phase::Bounds,
        0,
        0,
        format!(
            "lower={} lowest={} upper={}",
            bounds.lower, bounds.lowest, bounds.upper
        ),
    ));

    let mut cnf = Cnf::new();
    let mut vm = BasicVarManager::default();
    let enc = {
        let mut builder = Builder::new(&mut cnf, &mut vm);
        Encoding::new(inst, &bounds, opts.model, &mut builder, sink)?
    };
    let width = enc.widths().dist;

    let max_var = vm
        .max_var()
        .ok_or_else(|| anyhow::anyhow!("routing model without variables"))?;
    let mut solver = S::default();
    solver.reserve(max_var)?;
    solver.add_cnf(std::mem::take(&mut cnf))?;
    let _watchdog = Watchdog::spawn(
        solver.interrupter(),
        Instant::now() + budget.remaining(),
        Arc::clone(&opts.abort),
    );

    let mut best: Option<Solution> = None;
    let (mut lo, mut hi) = (bounds.lower, bounds.upper);
    let status = loop {
        if lo > hi {
            break if best.is_some() {
                Status::Optimal
            } else {
                Status::Infeasible
            };
        }
        if budget.exhausted() || opts.abort.load(Ordering::Relaxed) {
            break stopped(best.as_ref());
        }
        let limit = match opts.strategy {
            Strategy::Linear => hi,
            Strategy::Binary => lo + (hi - lo) / 2,
        };
        let (probe, n_clauses) = {
            let mut builder = Builder::new(&mut cnf, &mut vm);
            let probe = builder.compare(enc.max_dist(), &BitVector::from_int(limit, width)?, Cmp::Le)?;
            (probe, builder.n_clauses())
        };
        if n_clauses > 0 {
            solver.add_cnf(std::mem::take(&mut cnf))?;
        }
        let res = match probe {
            Bit::Const(true) => solver.solve()?,
            Bit::Const(false) => SolverResult::Unsat,
            Bit::Lit(lit) => solver.solve_assumps(&[lit])?,
        };
        sink.record(event(
            Phase::Solve,
            n_used(&vm),
            solver.n_clauses(),
            format!("MaxDist <= {limit}: {res:?}"),
        ));
        match res {
            SolverResult::Sat => {
                let assign = solver.solution(max_var)?;
                let sol = Solution::decode(&enc, &assign)?;
                sink.record(event(
                    Phase::Decode,
                    n_used(&vm),
                    solver.n_clauses(),
                    format!("routes {:?}", sol.routes),
                ));
                sink.record(event(
                    Phase::Improve,
                    n_used(&vm),
                    solver.n_clauses(),
                    format!("objective {}", sol.objective),
                ));
                match sol.objective.checked_sub(1) {
                    Some(next) => hi = next,
                    None => lo = hi + 1,
                }
                if let Bit::Lit(lit) = probe {
                    solver.add_unit(lit)?;
                }
                best = Some(sol);
            }
            SolverResult::Unsat => {
                lo = limit + 1;
                if let Bit::Lit(lit) = probe {
                    solver.add_unit(!lit)?;
                }
            }
            SolverResult::Interrupted => break stopped(best.as_ref()),
        }
    };

    Ok(Outcome {
        status,
        best,
        approach: opts.strategy.approach(enc.symmetry_broken()),
        elapsed: budget.elapsed(),
        cpu_time: cpu_start.elapsed(),
        time_limit: opts.timeout,
    })
}

fn stopped(best: Option<&Solution>) -> Status {
    if best.is_some() {
        Status::Suboptimal
    } else {
        Status::Unknown
    }
}

fn n_used(vm: &BasicVarManager) -> u32 {
    vm.max_var().map_or(0, |var| var.idx32() + 1)
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{atomic::AtomicBool, Arc},
        time::Duration,
    };

    use rustsat_minisat::core::Minisat;

    use super::{solve, ModelError, Outcome, ResultRecord, SolveOptions, Status, Strategy};
    use crate::{
        decode::Solution,
        events::{Event, Phase},
        instance::Instance,
    };

    fn line3() -> Instance {
        Instance::new(
            vec![10, 10],
            vec![1, 1, 1],
            vec![
                vec![0, 1, 2, 1],
                vec![1, 0, 1, 2],
                vec![2, 1, 0, 3],
                vec![1, 2, 3, 0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn strategies_agree() {
        let inst = line3();
        for strategy in [Strategy::Linear, Strategy::Binary] {
            let opts = SolveOptions {
                strategy,
                ..SolveOptions::default()
            };
            let mut events: Vec<Event> = Vec::new();
            let outcome = solve::<Minisat>(&inst, &opts, &mut events).unwrap();
            assert_eq!(outcome.status, Status::Optimal);
            let sol = outcome.solution().unwrap();
            // one courier takes the far item alone
            assert_eq!(sol.objective, 6);
            sol.check(&inst, false).unwrap();
            assert!(events.iter().any(|ev| ev.phase == Phase::Improve));
            assert_eq!(outcome.approach, format!("sat-{strategy}"));
        }
    }

    #[test]
    fn abort_before_search() {
        let opts = SolveOptions {
            abort: Arc::new(AtomicBool::new(true)),
            ..SolveOptions::default()
        };
        let outcome = solve::<Minisat>(&line3(), &opts, &mut ()).unwrap();
        assert_eq!(outcome.status, Status::Unknown);
        assert_eq!(outcome.solution().unwrap_err(), ModelError::Timeout);
        let record = outcome.record();
        assert_eq!(record.elapsed_seconds, 300);
        assert_eq!(record.objective, None);
        assert!(record.solution.is_empty());
    }

    #[test]
    fn approach_tags() {
        assert_eq!(Strategy::Binary.approach(false), "sat-binary");
        assert_eq!(Strategy::Binary.approach(true), "sat-binary-sb");
        assert_eq!(Strategy::Linear.approach(true), "sat-linear-sb");
    }

    #[test]
    fn record_is_one_based() {
        let outcome = Outcome {
            status: Status::Optimal,
            best: Some(Solution {
                objective: 6,
                distances: vec![4, 6],
                loads: vec![2, 1],
                routes: vec![vec![0, 1], vec![2]],
            }),
            approach: "sat-linear".to_string(),
            elapsed: Duration::from_millis(2500),
            cpu_time: Duration::from_millis(2400),
            time_limit: Duration::from_secs(300),
        };
        let record = outcome.record();
        assert_eq!(record.elapsed_seconds, 2);
        assert!(record.optimal);
        assert_eq!(record.solution, vec![vec![1, 2], vec![3]]);
        assert_eq!(record.routes(), Some(vec![vec![0, 1], vec![2]]));
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"elapsedSeconds\":2"));
        let back: ResultRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn zero_item_number() {
        let record = ResultRecord {
            approach: "sat-linear".to_string(),
            elapsed_seconds: 0,
            optimal: false,
            objective: Some(1),
            solution: vec![vec![0]],
        };
        assert_eq!(record.routes(), None);
    }
}
