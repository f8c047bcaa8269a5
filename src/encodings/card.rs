//! # Cardinality Constraints
//!
//! At-least-one, at-most-one (pairwise), exactly-one and none over literals.
//! All constraints respect the guards of the [`Builder`].
//!
//! ## References
//!
//! - Steven D. Prestwich: _CNF Encodings_, in Handbook of Satisfiability 2021.

use itertools::Itertools;
use rustsat::{encodings::CollectClauses, types::Lit};

use super::{Builder, Error};
use crate::bitvec::Bit;

impl<Col> Builder<'_, Col>
where
    Col: CollectClauses,
{
    /// Enforces that at least one of `lits` is true
    ///
    /// # Errors
    ///
    /// If the collector runs out of memory.
    pub fn at_least_one(&mut self, lits: &[Lit]) -> Result<(), Error> {
        self.clause(lits.iter().map(|&lit| Bit::Lit(lit)))
    }

    /// Enforces that no two of `lits` are true at the same time, with one
    /// binary clause per pair
    ///
    /// # Errors
    ///
    /// If the collector runs out of memory.
    pub fn at_most_one(&mut self, lits: &[Lit]) -> Result<(), Error> {
        for (&first, &second) in lits.iter().tuple_combinations() {
            self.clause([Bit::Lit(!first), Bit::Lit(!second)])?;
        }
        Ok(())
    }

    /// Enforces that exactly one of `lits` is true
    ///
    /// # Errors
    ///
    /// If the collector runs out of memory.
    pub fn exactly_one(&mut self, lits: &[Lit]) -> Result<(), Error> {
        self.at_least_one(lits)?;
        self.at_most_one(lits)
    }

    /// Enforces that all of `lits` are false
    ///
    /// # Errors
    ///
    /// If the collector runs out of memory.
    pub fn none_of(&mut self, lits: &[Lit]) -> Result<(), Error> {
        for &lit in lits {
            self.assert(Bit::Lit(!lit))?;
        }
        Ok(())
    }
}
