//! # Encodings of Integer Arithmetic and Cardinality to CNF
//!
//! All encodings are methods on a [`Builder`], which appends clauses to a flat
//! clause collector and creates auxiliary variables through a variable
//! manager.
//!
//! Implications of the form `cond -> constraint` are expressed with
//! [`Builder::guarded`]: every constraint clause emitted inside the closure is
//! extended with the negated guards. Definitions of auxiliary gate variables
//! are never guarded, so a gate can be reused under any guard.
//!
//! ## Example Usage
//!
//! ```
//! use mcrsat::{bitvec::BitVector, encodings::{Builder, Cmp}};
//! use rustsat::instances::{BasicVarManager, Cnf};
//!
//! let mut cnf = Cnf::new();
//! let mut vm = BasicVarManager::default();
//! let mut builder = Builder::new(&mut cnf, &mut vm);
//! let x = BitVector::new_vars(4, builder.var_manager());
//! let limit = BitVector::from_int(9, 4).unwrap();
//! builder.assert_compare(&x, &limit, Cmp::Le).unwrap();
//! ```

use rustsat::{
    encodings::CollectClauses,
    instances::ManageVars,
    types::{Clause, Lit},
};
use thiserror::Error;

use crate::bitvec::{Bit, BitVector};

mod arith;
mod card;
mod gates;
mod sum;

pub use arith::Cmp;

/// Errors from encodings
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// A constant does not fit into the requested number of bits
    #[error("{value} cannot be represented with {width} bits")]
    InsufficientWidth {
        /// The value to represent
        value: u64,
        /// The requested width
        width: usize,
    },
    /// Two bit vectors of different width were combined
    #[error("bit vector widths differ: {left} vs {right}")]
    WidthMismatch {
        /// Width of the left operand
        left: usize,
        /// Width of the right operand
        right: usize,
    },
    /// Two parallel inputs have different lengths
    #[error("{what}: expected {expected} entries, found {found}")]
    LengthMismatch {
        /// Which input was inconsistent
        what: &'static str,
        /// The expected length
        expected: usize,
        /// The found length
        found: usize,
    },
    /// The clause collector ran out of memory
    #[error("out of memory while collecting clauses")]
    OutOfMemory,
}

impl From<rustsat::OutOfMemory> for Error {
    fn from(_: rustsat::OutOfMemory) -> Self {
        Error::OutOfMemory
    }
}

/// Trait for encodings that track statistics.
pub trait EncodeStats {
    /// Gets the number of clauses in the encoding
    fn n_clauses(&self) -> usize;

    /// Gets the number of variables in the encoding
    fn n_vars(&self) -> u32;
}

/// Accumulates clauses into a collector, tracking guards and statistics
pub struct Builder<'enc, Col> {
    collector: &'enc mut Col,
    var_manager: &'enc mut dyn ManageVars,
    /// Literals that must all hold for the emitted constraints to be enforced
    guards: Vec<Lit>,
    n_clauses: usize,
    n_vars: u32,
}

impl<'enc, Col> Builder<'enc, Col>
where
    Col: CollectClauses,
{
    /// Creates a builder appending to `collector`
    pub fn new(collector: &'enc mut Col, var_manager: &'enc mut dyn ManageVars) -> Self {
        Self {
            collector,
            var_manager,
            guards: Vec::new(),
            n_clauses: 0,
            n_vars: 0,
        }
    }

    /// Gets the variable manager, for allocating decision variables
    pub fn var_manager(&mut self) -> &mut dyn ManageVars {
        &mut *self.var_manager
    }

    /// Creates a fresh auxiliary literal
    pub fn new_lit(&mut self) -> Lit {
        self.n_vars += 1;
        self.var_manager.new_var().pos_lit()
    }

    /// Creates a vector of fresh auxiliary literals
    pub fn new_vector(&mut self, width: usize) -> BitVector {
        (0..width).map(|_| self.new_lit()).collect()
    }

    /// Runs `encode` with `cond` as an additional premise of every constraint
    /// it emits, i.e., encodes `cond -> (...)`
    ///
    /// # Errors
    ///
    /// Whatever `encode` returns.
    pub fn guarded<T, F>(&mut self, cond: Lit, encode: F) -> Result<T, Error>
    where
        F: FnOnce(&mut Self) -> Result<T, Error>,
    {
        self.guards.push(cond);
        let res = encode(self);
        self.guards.pop();
        res
    }

    /// Like [`Builder::guarded`], but for a premise that is a [`Bit`]. A false
    /// constant premise skips the encoding entirely.
    ///
    /// # Errors
    ///
    /// Whatever `encode` returns.
    pub fn guarded_bit<F>(&mut self, cond: Bit, encode: F) -> Result<(), Error>
    where
        F: FnOnce(&mut Self) -> Result<(), Error>,
    {
        match cond {
            Bit::Const(true) => encode(self),
            Bit::Const(false) => Ok(()),
            Bit::Lit(lit) => self.guarded(lit, encode),
        }
    }

    /// Emits a constraint clause over bits, subject to the current guards.
    /// Clauses with a true constant are dropped, false constants are removed.
    ///
    /// # Errors
    ///
    /// If the collector runs out of memory.
    pub fn clause<I>(&mut self, bits: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = Bit>,
    {
        let Some(mut cl) = fold_clause(bits) else {
            return Ok(());
        };
        cl.extend(self.guards.iter().map(|&g| !g));
        self.push(cl)
    }

    /// Asserts a single bit under the current guards
    ///
    /// # Errors
    ///
    /// If the collector runs out of memory.
    pub fn assert(&mut self, bit: Bit) -> Result<(), Error> {
        self.clause([bit])
    }

    /// Emits a definitional clause that ignores the guards
    fn define<I>(&mut self, bits: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = Bit>,
    {
        match fold_clause(bits) {
            Some(cl) => self.push(cl),
            None => Ok(()),
        }
    }

    fn push(&mut self, cl: Clause) -> Result<(), Error> {
        self.n_clauses += 1;
        self.collector.extend_clauses(std::iter::once(cl))?;
        Ok(())
    }
}

impl<Col> EncodeStats for Builder<'_, Col> {
    fn n_clauses(&self) -> usize {
        self.n_clauses
    }

    fn n_vars(&self) -> u32 {
        self.n_vars
    }
}

/// Builds a clause from bits, `None` if it is satisfied by a constant
fn fold_clause<I>(bits: I) -> Option<Clause>
where
    I: IntoIterator<Item = Bit>,
{
    let mut cl = Clause::new();
    for bit in bits {
        match bit {
            Bit::Const(true) => return None,
            Bit::Const(false) => (),
            Bit::Lit(lit) => cl.add(lit),
        }
    }
    Some(cl)
}

/// Checks that two widths agree
fn check_width(left: usize, right: usize) -> Result<(), Error> {
    if left == right {
        Ok(())
    } else {
        Err(Error::WidthMismatch { left, right })
    }
}

#[cfg(test)]
mod tests {
    use rustsat::{
        instances::{BasicVarManager, Cnf},
        lit,
    };

    use super::{Builder, EncodeStats};
    use crate::bitvec::Bit;

    #[test]
    fn constant_folding() {
        let mut cnf = Cnf::new();
        let mut vm = BasicVarManager::default();
        let mut builder = Builder::new(&mut cnf, &mut vm);
        builder
            .clause([Bit::TRUE, Bit::Lit(lit![0])])
            .unwrap();
        builder
            .clause([Bit::FALSE, Bit::Lit(lit![0])])
            .unwrap();
        assert_eq!(builder.n_clauses(), 1);
        assert_eq!(cnf.len(), 1);
    }

    #[test]
    fn guards_nest() {
        let mut cnf = Cnf::new();
        let mut vm = BasicVarManager::default();
        let mut builder = Builder::new(&mut cnf, &mut vm);
        builder
            .guarded(lit![0], |b| {
                b.guarded(lit![1], |b| b.assert(Bit::Lit(lit![2])))
            })
            .unwrap();
        builder.assert(Bit::Lit(lit![3])).unwrap();
        let clauses: Vec<_> = cnf.iter().map(|cl| cl.len()).collect();
        assert_eq!(clauses, vec![3, 1]);
    }

    #[test]
    fn false_premise_skips() {
        let mut cnf = Cnf::new();
        let mut vm = BasicVarManager::default();
        let mut builder = Builder::new(&mut cnf, &mut vm);
        builder
            .guarded_bit(Bit::FALSE, |b| b.assert(Bit::FALSE))
            .unwrap();
        assert_eq!(cnf.len(), 0);
    }
}
