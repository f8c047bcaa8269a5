use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use mcrsat::{
    bounds::Bounds,
    decode::route_distance,
    events::{Event, EventSink, Phase},
    instance::Instance,
    model::ModelOptions,
    solve::{solve, Outcome, SolveOptions, Status, Strategy},
    ModelError,
};
use rustsat_minisat::core::Minisat;

macro_rules! gen_tests {
    ($mod:ident, $strategy:expr) => {
        mod $mod {
            #[test]
            fn inst01_optimum() {
                super::inst01_optimum($strategy);
            }
            #[test]
            fn tight_capacity() {
                super::tight_capacity($strategy);
            }
            #[test]
            fn more_couriers_than_items() {
                super::more_couriers_than_items($strategy);
            }
            #[test]
            fn two_item_route() {
                super::two_item_route($strategy);
            }
            #[test]
            fn symmetric_routes() {
                super::symmetric_routes($strategy);
            }
        }
    };
}

gen_tests!(linear, super::Strategy::Linear);
gen_tests!(binary, super::Strategy::Binary);

fn data(name: &str) -> Instance {
    let path: PathBuf = [env!("CARGO_MANIFEST_DIR"), "data", name].iter().collect();
    Instance::from_path(path).unwrap()
}

fn run(inst: &Instance, strategy: Strategy, model: ModelOptions) -> Outcome {
    let opts = SolveOptions {
        strategy,
        model,
        ..SolveOptions::default()
    };
    solve::<Minisat>(inst, &opts, &mut ()).unwrap()
}

/// Every route starts and ends at the depot, and its distance is the decoded
/// courier distance
fn assert_round_trip(inst: &Instance, outcome: &Outcome, allow_empty_routes: bool) {
    let sol = outcome.solution().unwrap();
    sol.check(inst, allow_empty_routes).unwrap();
    for (route, &dist) in sol.routes.iter().zip(&sol.distances) {
        assert_eq!(route_distance(inst, route), dist);
    }
}

fn inst01_optimum(strategy: Strategy) {
    let inst = data("inst01.dat");
    let bounds = Bounds::for_instance(&inst);
    assert_eq!((bounds.lower, bounds.upper), (8, 40));
    let outcome = run(&inst, strategy, ModelOptions::default());
    assert_eq!(outcome.status, Status::Optimal);
    assert_eq!(outcome.solution().unwrap().objective, 14);
    assert_round_trip(&inst, &outcome, false);
}

fn tight_capacity(strategy: Strategy) {
    // a single courier whose capacity is exactly the total size
    let inst = data("line3.dat");
    assert_eq!(inst.total_size(), inst.capacities()[0]);
    let outcome = run(&inst, strategy, ModelOptions::default());
    assert_eq!(outcome.status, Status::Optimal);
    let sol = outcome.solution().unwrap();
    assert_eq!(sol.loads, vec![6]);
    assert_eq!(sol.objective, 6);
    assert_round_trip(&inst, &outcome, false);

    let short = Instance::new(
        vec![5],
        inst.sizes().to_vec(),
        (0..=inst.depot())
            .map(|from| inst.distance_row(from).to_vec())
            .collect(),
    )
    .unwrap();
    let outcome = run(&short, strategy, ModelOptions::default());
    assert_eq!(outcome.status, Status::Infeasible);
}

fn more_couriers_than_items(strategy: Strategy) {
    let inst = Instance::new(
        vec![5, 5, 5],
        vec![1, 1],
        vec![vec![0, 9, 2], vec![9, 0, 2], vec![2, 2, 0]],
    )
    .unwrap();
    let outcome = run(&inst, strategy, ModelOptions::default());
    assert_eq!(outcome.status, Status::Infeasible);
    assert_eq!(outcome.solution().unwrap_err(), ModelError::Infeasible);
    assert!(!outcome.record().optimal);

    let relaxed = ModelOptions {
        allow_empty_routes: true,
        ..ModelOptions::default()
    };
    let outcome = run(&inst, strategy, relaxed);
    assert_eq!(outcome.status, Status::Optimal);
    let sol = outcome.solution().unwrap();
    assert_eq!(sol.objective, 4);
    assert_eq!(sol.routes.iter().filter(|route| route.is_empty()).count(), 1);
    assert_round_trip(&inst, &outcome, true);
}

fn two_item_route(strategy: Strategy) {
    // depot -> 1 -> 0 -> depot costs 5, the other direction 10
    let inst = data("asym2.dat");
    let outcome = run(&inst, strategy, ModelOptions::default());
    assert_eq!(outcome.status, Status::Optimal);
    let sol = outcome.solution().unwrap();
    assert_eq!(sol.routes, vec![vec![1, 0]]);
    assert_eq!(sol.objective, 5);
    assert_eq!(outcome.record().solution, vec![vec![2, 1]]);
}

fn symmetric_routes(strategy: Strategy) {
    let inst = data("line3.dat");
    assert!(inst.is_symmetric());
    let model = ModelOptions {
        symmetry_breaking: true,
        ..ModelOptions::default()
    };
    let outcome = run(&inst, strategy, model);
    assert_eq!(outcome.status, Status::Optimal);
    assert!(outcome.approach.ends_with("-sb"));
    let sol = outcome.solution().unwrap();
    assert_eq!(sol.objective, 6);
    let route = &sol.routes[0];
    assert!(route.first() < route.last());
    assert_round_trip(&inst, &outcome, false);
}

#[test]
fn asymmetric_matrix_ignores_symmetry_breaking() {
    let inst = data("asym2.dat");
    let model = ModelOptions {
        symmetry_breaking: true,
        ..ModelOptions::default()
    };
    let outcome = run(&inst, Strategy::Linear, model);
    assert_eq!(outcome.solution().unwrap().routes, vec![vec![1, 0]]);
    assert_eq!(outcome.approach, "sat-linear");
    assert_eq!(outcome.record().approach, "sat-linear");
}

#[test]
fn no_budget() {
    let opts = SolveOptions {
        timeout: Duration::ZERO,
        ..SolveOptions::default()
    };
    let outcome = solve::<Minisat>(&data("inst01.dat"), &opts, &mut ()).unwrap();
    assert_eq!(outcome.status, Status::Unknown);
    assert_eq!(outcome.solution().unwrap_err(), ModelError::Timeout);
    assert_eq!(outcome.record().elapsed_seconds, 0);
}

#[test]
fn events_in_order() {
    let mut events: Vec<Event> = Vec::new();
    let outcome = solve::<Minisat>(&data("asym2.dat"), &SolveOptions::default(), &mut events).unwrap();
    assert_eq!(outcome.status, Status::Optimal);
    assert_eq!(events.first().map(|ev| ev.phase), Some(Phase::Bounds));
    let first_solve = events.iter().position(|ev| ev.phase == Phase::Solve).unwrap();
    assert!(events[..first_solve].iter().skip(1).all(|ev| ev.phase == Phase::Encode));
    let improvements = events.iter().filter(|ev| ev.phase == Phase::Improve).count();
    assert!(improvements >= 1);
}

/// Raises the abort flag as soon as the first solution is reported
struct StopOnImprove {
    abort: Arc<AtomicBool>,
    improvements: usize,
}

impl EventSink for StopOnImprove {
    fn record(&mut self, event: Event) {
        if event.phase == Phase::Improve {
            self.improvements += 1;
            self.abort.store(true, Ordering::Relaxed);
        }
    }
}

#[test]
fn stop_after_first_solution() {
    let inst = data("inst01.dat");
    for strategy in [Strategy::Linear, Strategy::Binary] {
        let opts = SolveOptions {
            strategy,
            ..SolveOptions::default()
        };
        let mut sink = StopOnImprove {
            abort: Arc::clone(&opts.abort),
            improvements: 0,
        };
        let outcome = solve::<Minisat>(&inst, &opts, &mut sink).unwrap();
        assert_eq!(sink.improvements, 1);
        assert_eq!(outcome.status, Status::Suboptimal);
        let sol = outcome.solution().unwrap();
        sol.check(&inst, false).unwrap();
        assert!(sol.objective >= 14);
        let record = outcome.record();
        assert!(!record.optimal);
        assert_eq!(record.objective, Some(sol.objective));
        assert_eq!(record.elapsed_seconds, 300);
    }
}
