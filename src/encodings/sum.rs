//! # Conditional Summation
//!
//! Encodes `decision = sum of terms[i] where conditions[i]` as a chain of
//! partial sums. For every step both implications are emitted:
//! `cond -> next = prev + term` and `!cond -> next = prev`.

use rustsat::{encodings::CollectClauses, types::Lit};

use super::{check_width, Builder, Cmp, Error};
use crate::bitvec::BitVector;

impl<Col> Builder<'_, Col>
where
    Col: CollectClauses,
{
    /// Enforces that `decision` equals the sum of the `terms` whose condition
    /// holds. All terms must have the width of `decision`. An enabled step may
    /// not overflow.
    ///
    /// Terms that are the constant zero do not get a step of their own.
    ///
    /// # Errors
    ///
    /// - [`Error::LengthMismatch`] if there are not as many conditions as terms
    /// - [`Error::WidthMismatch`] if a term differs in width from `decision`
    pub fn conditional_sum(
        &mut self,
        decision: &BitVector,
        terms: &[BitVector],
        conditions: &[Lit],
    ) -> Result<(), Error> {
        if terms.len() != conditions.len() {
            return Err(Error::LengthMismatch {
                what: "conditions of conditional sum",
                expected: terms.len(),
                found: conditions.len(),
            });
        }
        for term in terms {
            check_width(decision.width(), term.width())?;
        }
        let Some(last) = terms.iter().rposition(|term| !term.is_zero()) else {
            return self.assert_compare(decision, &BitVector::zero(decision.width()), Cmp::Eq);
        };
        let mut partial = BitVector::zero(decision.width());
        for (idx, (term, &cond)) in terms.iter().zip(conditions).enumerate().take(last + 1) {
            if term.is_zero() {
                continue;
            }
            let next = if idx == last {
                decision.clone()
            } else {
                self.new_vector(decision.width())
            };
            self.guarded(cond, |b| {
                let overflow = b.add(&partial, term, &next)?;
                b.assert(!overflow)
            })?;
            self.guarded(!cond, |b| b.assert_compare(&partial, &next, Cmp::Eq))?;
            partial = next;
        }
        Ok(())
    }
}
