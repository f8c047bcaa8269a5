//! # Bit-Vector Arithmetic
//!
//! Ripple-carry addition and unsigned comparison of equal-width
//! [`BitVector`]s.

use std::fmt;

use rustsat::encodings::CollectClauses;

use super::{check_width, Builder, Error};
use crate::bitvec::{Bit, BitVector};

/// Comparison operators on unsigned bit vectors
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cmp {
    /// `==`
    Eq,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<`
    Lt,
    /// `<=`
    Le,
}

impl Cmp {
    /// All operators
    pub const ALL: [Cmp; 5] = [Cmp::Eq, Cmp::Gt, Cmp::Ge, Cmp::Lt, Cmp::Le];

    /// Applies the operator to two integers
    #[must_use]
    pub fn holds(self, a: u64, b: u64) -> bool {
        match self {
            Cmp::Eq => a == b,
            Cmp::Gt => a > b,
            Cmp::Ge => a >= b,
            Cmp::Lt => a < b,
            Cmp::Le => a <= b,
        }
    }
}

impl fmt::Display for Cmp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cmp::Eq => write!(f, "=="),
            Cmp::Gt => write!(f, ">"),
            Cmp::Ge => write!(f, ">="),
            Cmp::Lt => write!(f, "<"),
            Cmp::Le => write!(f, "<="),
        }
    }
}

impl<Col> Builder<'_, Col>
where
    Col: CollectClauses,
{
    /// Enforces `res = u + v` with a ripple-carry adder and returns the carry
    /// out of the most significant position. The carry chain starts false at
    /// the least significant position. Whether the returned carry may be set
    /// is up to the caller.
    ///
    /// Each position gets one implication per combination of input bit,
    /// addend bit and incoming carry, fixing the result bit and the outgoing
    /// carry.
    ///
    /// # Errors
    ///
    /// [`Error::WidthMismatch`] if the three vectors differ in width.
    pub fn add(&mut self, u: &BitVector, v: &BitVector, res: &BitVector) -> Result<Bit, Error> {
        check_width(u.width(), v.width())?;
        check_width(u.width(), res.width())?;
        let mut carry = Bit::FALSE;
        for pos in (0..u.width()).rev() {
            let (a, b, r) = (u[pos], v[pos], res[pos]);
            let carry_out = match (a.as_const(), b.as_const(), carry.as_const()) {
                (Some(a), Some(b), Some(c)) => Bit::Const(u8::from(a) + u8::from(b) + u8::from(c) >= 2),
                _ => Bit::Lit(self.new_lit()),
            };
            for case in 0..8u8 {
                let (va, vb, vc) = (case & 4 != 0, case & 2 != 0, case & 1 != 0);
                let ones = u8::from(va) + u8::from(vb) + u8::from(vc);
                // negated premise `a == va & b == vb & carry == vc`
                let premise = [
                    if va { !a } else { a },
                    if vb { !b } else { b },
                    if vc { !carry } else { carry },
                ];
                let sum_bit = if ones % 2 == 1 { r } else { !r };
                let carry_bit = if ones >= 2 { carry_out } else { !carry_out };
                self.clause(premise.into_iter().chain([sum_bit]))?;
                self.clause(premise.into_iter().chain([carry_bit]))?;
            }
            carry = carry_out;
        }
        Ok(carry)
    }

    /// Returns a bit that is true iff `a op b` holds for the unsigned values
    /// of the two vectors
    ///
    /// # Errors
    ///
    /// [`Error::WidthMismatch`] if the vectors differ in width.
    pub fn compare(&mut self, a: &BitVector, b: &BitVector, op: Cmp) -> Result<Bit, Error> {
        check_width(a.width(), b.width())?;
        match op {
            Cmp::Eq => self.equal(a, b),
            Cmp::Gt => self.greater(a, b),
            Cmp::Ge => {
                let eq = self.equal(a, b)?;
                let gt = self.greater(a, b)?;
                self.or([eq, gt])
            }
            Cmp::Lt => self.compare(b, a, Cmp::Gt),
            Cmp::Le => self.compare(b, a, Cmp::Ge),
        }
    }

    /// Enforces `a op b` under the current guards
    ///
    /// # Errors
    ///
    /// [`Error::WidthMismatch`] if the vectors differ in width.
    pub fn assert_compare(&mut self, a: &BitVector, b: &BitVector, op: Cmp) -> Result<(), Error> {
        check_width(a.width(), b.width())?;
        if op == Cmp::Eq {
            for (x, y) in a.iter().zip(b.iter()) {
                self.clause([!x, y])?;
                self.clause([x, !y])?;
            }
            return Ok(());
        }
        let holds = self.compare(a, b, op)?;
        self.assert(holds)
    }

    /// Bitwise biconditional over all positions
    fn equal(&mut self, a: &BitVector, b: &BitVector) -> Result<Bit, Error> {
        let eqs = a
            .iter()
            .zip(b.iter())
            .map(|(x, y)| self.xnor(x, y))
            .collect::<Result<Vec<_>, _>>()?;
        self.and(eqs)
    }

    /// Lexicographic comparison, most significant bit first: some position
    /// has `a = 1, b = 0` with all higher positions equal
    fn greater(&mut self, a: &BitVector, b: &BitVector) -> Result<Bit, Error> {
        let mut higher_equal = Bit::TRUE;
        let mut cases = Vec::with_capacity(a.width());
        for (x, y) in a.iter().zip(b.iter()) {
            cases.push(self.and([higher_equal, x, !y])?);
            let eq = self.xnor(x, y)?;
            higher_equal = self.and([higher_equal, eq])?;
        }
        self.or(cases)
    }
}

#[cfg(test)]
mod tests {
    use rustsat::{
        instances::{BasicVarManager, Cnf, ManageVars},
        solvers::{Solve, SolveIncremental, SolverResult},
        types::Lit,
    };
    use rustsat_minisat::core::Minisat;

    use super::Cmp;
    use crate::{
        bitvec::{Bit, BitVector},
        encodings::{Builder, Error},
    };

    /// Assumptions fixing `vec` to `value`
    fn fix(vec: &BitVector, value: u64) -> Vec<Lit> {
        let width = vec.width();
        vec.iter()
            .enumerate()
            .filter_map(|(idx, bit)| match bit {
                Bit::Lit(lit) => {
                    let set = (value >> (width - 1 - idx)) & 1 == 1;
                    Some(if set { lit } else { !lit })
                }
                Bit::Const(_) => None,
            })
            .collect()
    }

    #[test]
    fn add_exhaustive() {
        const WIDTH: usize = 3;
        let mut cnf = Cnf::new();
        let mut vm = BasicVarManager::default();
        let u = BitVector::new_vars(WIDTH, &mut vm);
        let v = BitVector::new_vars(WIDTH, &mut vm);
        let res = BitVector::new_vars(WIDTH, &mut vm);
        let mut builder = Builder::new(&mut cnf, &mut vm);
        let carry = builder.add(&u, &v, &res).unwrap();
        builder.assert(!carry).unwrap();
        let mut solver = Minisat::default();
        solver.add_cnf(cnf).unwrap();
        let max_var = vm.max_var().unwrap();
        for a in 0..8 {
            for b in 0..8 {
                let mut assumps = fix(&u, a);
                assumps.extend(fix(&v, b));
                let res_val = solver.solve_assumps(&assumps).unwrap();
                if a + b < 8 {
                    assert_eq!(res_val, SolverResult::Sat);
                    let sol = solver.solution(max_var).unwrap();
                    assert_eq!(res.to_int(&sol), a + b, "{a} + {b}");
                } else {
                    assert_eq!(res_val, SolverResult::Unsat, "{a} + {b} overflows");
                }
            }
        }
    }

    #[test]
    fn add_constants() {
        let mut cnf = Cnf::new();
        let mut vm = BasicVarManager::default();
        let res = BitVector::new_vars(5, &mut vm);
        let mut builder = Builder::new(&mut cnf, &mut vm);
        let u = BitVector::from_int(11, 5).unwrap();
        let v = BitVector::from_int(9, 5).unwrap();
        let carry = builder.add(&u, &v, &res).unwrap();
        assert_eq!(carry, Bit::FALSE);
        let mut solver = Minisat::default();
        solver.add_cnf(cnf).unwrap();
        assert_eq!(solver.solve().unwrap(), SolverResult::Sat);
        let sol = solver.solution(vm.max_var().unwrap()).unwrap();
        assert_eq!(res.to_int(&sol), 20);
    }

    #[test]
    fn compare_exhaustive() {
        const WIDTH: usize = 3;
        for op in Cmp::ALL {
            let mut cnf = Cnf::new();
            let mut vm = BasicVarManager::default();
            let a = BitVector::new_vars(WIDTH, &mut vm);
            let b = BitVector::new_vars(WIDTH, &mut vm);
            let mut builder = Builder::new(&mut cnf, &mut vm);
            let Bit::Lit(holds) = builder.compare(&a, &b, op).unwrap() else {
                panic!("comparison of free vectors folded to a constant");
            };
            let mut solver = Minisat::default();
            solver.add_cnf(cnf).unwrap();
            for x in 0..8 {
                for y in 0..8 {
                    let mut assumps = fix(&a, x);
                    assumps.extend(fix(&b, y));
                    let expected = op.holds(x, y);
                    assumps.push(if expected { holds } else { !holds });
                    assert_eq!(
                        solver.solve_assumps(&assumps).unwrap(),
                        SolverResult::Sat,
                        "{x} {op} {y}"
                    );
                    *assumps.last_mut().unwrap() = if expected { !holds } else { holds };
                    assert_eq!(
                        solver.solve_assumps(&assumps).unwrap(),
                        SolverResult::Unsat,
                        "{x} {op} {y}"
                    );
                }
            }
        }
    }

    #[test]
    fn compare_constants_fold() {
        let mut cnf = Cnf::new();
        let mut vm = BasicVarManager::default();
        let mut builder = Builder::new(&mut cnf, &mut vm);
        let a = BitVector::from_int(5, 4).unwrap();
        let b = BitVector::from_int(9, 4).unwrap();
        for op in Cmp::ALL {
            assert_eq!(
                builder.compare(&a, &b, op).unwrap(),
                Bit::Const(op.holds(5, 9)),
                "5 {op} 9"
            );
        }
    }

    #[test]
    fn assert_against_constant() {
        let mut cnf = Cnf::new();
        let mut vm = BasicVarManager::default();
        let x = BitVector::new_vars(4, &mut vm);
        let mut builder = Builder::new(&mut cnf, &mut vm);
        let limit = BitVector::from_int(6, 4).unwrap();
        builder.assert_compare(&x, &limit, Cmp::Le).unwrap();
        let mut solver = Minisat::default();
        solver.add_cnf(cnf).unwrap();
        for val in 0..16 {
            let want = if val <= 6 {
                SolverResult::Sat
            } else {
                SolverResult::Unsat
            };
            assert_eq!(solver.solve_assumps(&fix(&x, val)).unwrap(), want);
        }
    }

    #[test]
    fn width_mismatch() {
        let mut cnf = Cnf::new();
        let mut vm = BasicVarManager::default();
        let mut builder = Builder::new(&mut cnf, &mut vm);
        let a = BitVector::from_int(1, 2).unwrap();
        let b = BitVector::from_int(1, 3).unwrap();
        assert_eq!(
            builder.compare(&a, &b, Cmp::Lt),
            Err(Error::WidthMismatch { left: 2, right: 3 })
        );
        assert_eq!(
            builder.add(&a, &a, &b),
            Err(Error::WidthMismatch { left: 2, right: 3 })
        );
    }
}
