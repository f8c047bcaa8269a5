//! # Reified Gates
//!
//! Tseitin definitions of `and`, `or` and `xnor` with constant folding. The
//! returned bit is equivalent to the gate output in both directions, so it can
//! be used positively, negated, under guards and as an assumption.

use rustsat::encodings::CollectClauses;

use super::{Builder, Error};
use crate::bitvec::Bit;

impl<Col> Builder<'_, Col>
where
    Col: CollectClauses,
{
    /// Returns a bit equivalent to the conjunction of `inputs`
    ///
    /// # Errors
    ///
    /// If the collector runs out of memory.
    pub fn and<I>(&mut self, inputs: I) -> Result<Bit, Error>
    where
        I: IntoIterator<Item = Bit>,
    {
        let mut lits = Vec::new();
        for bit in inputs {
            match bit {
                Bit::Const(false) => return Ok(Bit::FALSE),
                Bit::Const(true) => (),
                Bit::Lit(lit) => {
                    if lits.contains(&!lit) {
                        return Ok(Bit::FALSE);
                    }
                    if !lits.contains(&lit) {
                        lits.push(lit);
                    }
                }
            }
        }
        match lits.len() {
            0 => Ok(Bit::TRUE),
            1 => Ok(Bit::Lit(lits[0])),
            _ => {
                let out = self.new_lit();
                for &lit in &lits {
                    self.define([Bit::Lit(!out), Bit::Lit(lit)])?;
                }
                self.define(
                    lits.iter()
                        .map(|&lit| Bit::Lit(!lit))
                        .chain([Bit::Lit(out)]),
                )?;
                Ok(Bit::Lit(out))
            }
        }
    }

    /// Returns a bit equivalent to the disjunction of `inputs`
    ///
    /// # Errors
    ///
    /// If the collector runs out of memory.
    pub fn or<I>(&mut self, inputs: I) -> Result<Bit, Error>
    where
        I: IntoIterator<Item = Bit>,
    {
        // de Morgan
        let out = self.and(inputs.into_iter().map(|bit| !bit))?;
        Ok(!out)
    }

    /// Returns a bit that is true iff `a` and `b` have the same value
    ///
    /// # Errors
    ///
    /// If the collector runs out of memory.
    pub fn xnor(&mut self, a: Bit, b: Bit) -> Result<Bit, Error> {
        match (a, b) {
            (Bit::Const(a), Bit::Const(b)) => Ok(Bit::Const(a == b)),
            (Bit::Const(true), other) | (other, Bit::Const(true)) => Ok(other),
            (Bit::Const(false), other) | (other, Bit::Const(false)) => Ok(!other),
            (Bit::Lit(la), Bit::Lit(lb)) => {
                if la == lb {
                    return Ok(Bit::TRUE);
                }
                if la == !lb {
                    return Ok(Bit::FALSE);
                }
                let out = Bit::Lit(self.new_lit());
                self.define([!out, !a, b])?;
                self.define([!out, a, !b])?;
                self.define([out, a, b])?;
                self.define([out, !a, !b])?;
                Ok(out)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rustsat::{
        instances::{BasicVarManager, Cnf, ManageVars},
        lit,
        solvers::{Solve, SolveIncremental, SolverResult},
        types::Lit,
        var,
    };
    use rustsat_minisat::core::Minisat;

    use crate::{bitvec::Bit, encodings::Builder};

    /// Checks `out <-> f(inputs)` on every assignment of the first three variables
    fn check_gate(out: Bit, cnf: Cnf, eval: impl Fn(bool, bool, bool) -> bool) {
        let mut solver = Minisat::default();
        solver.add_cnf(cnf).unwrap();
        let Bit::Lit(out) = out else {
            panic!("gate over free inputs folded to a constant");
        };
        for idx in 0..8u32 {
            let vals = [idx & 1 == 1, idx & 2 == 2, idx & 4 == 4];
            let mut assumps: Vec<Lit> = (0..3)
                .map(|v| if vals[v as usize] { lit![v] } else { !lit![v] })
                .collect();
            let expected = eval(vals[0], vals[1], vals[2]);
            assumps.push(if expected { out } else { !out });
            assert_eq!(solver.solve_assumps(&assumps).unwrap(), SolverResult::Sat);
            *assumps.last_mut().unwrap() = if expected { !out } else { out };
            assert_eq!(
                solver.solve_assumps(&assumps).unwrap(),
                SolverResult::Unsat
            );
        }
    }

    #[test]
    fn and_gate() {
        let mut cnf = Cnf::new();
        let mut vm = BasicVarManager::default();
        vm.increase_next_free(var![3]);
        let mut builder = Builder::new(&mut cnf, &mut vm);
        let out = builder
            .and([Bit::Lit(lit![0]), Bit::Lit(lit![1]), Bit::Lit(lit![2])])
            .unwrap();
        check_gate(out, cnf, |a, b, c| a && b && c);
    }

    #[test]
    fn or_gate() {
        let mut cnf = Cnf::new();
        let mut vm = BasicVarManager::default();
        vm.increase_next_free(var![3]);
        let mut builder = Builder::new(&mut cnf, &mut vm);
        let out = builder
            .or([Bit::Lit(lit![0]), Bit::Lit(!lit![1]), Bit::Lit(lit![2])])
            .unwrap();
        check_gate(out, cnf, |a, b, c| a || !b || c);
    }

    #[test]
    fn xnor_gate() {
        let mut cnf = Cnf::new();
        let mut vm = BasicVarManager::default();
        vm.increase_next_free(var![3]);
        let mut builder = Builder::new(&mut cnf, &mut vm);
        let out = builder.xnor(Bit::Lit(lit![0]), Bit::Lit(lit![2])).unwrap();
        check_gate(out, cnf, |a, _, c| a == c);
    }

    #[test]
    fn folding() {
        let mut cnf = Cnf::new();
        let mut vm = BasicVarManager::default();
        vm.increase_next_free(var![2]);
        let mut builder = Builder::new(&mut cnf, &mut vm);
        assert_eq!(
            builder.and([Bit::TRUE, Bit::Lit(lit![0])]).unwrap(),
            Bit::Lit(lit![0])
        );
        assert_eq!(
            builder.and([Bit::Lit(lit![1]), Bit::Lit(!lit![1])]).unwrap(),
            Bit::FALSE
        );
        assert_eq!(builder.or(Vec::new()).unwrap(), Bit::FALSE);
        assert_eq!(
            builder.xnor(Bit::FALSE, Bit::Lit(lit![1])).unwrap(),
            Bit::Lit(!lit![1])
        );
        assert_eq!(cnf.len(), 0);
    }
}
