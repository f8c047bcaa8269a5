//! # Bit Vectors
//!
//! Unsigned integers represented as fixed-width sequences of [`Bit`]s, most
//! significant bit first. A bit is either a solver literal or a boolean
//! constant, so input data (item sizes, distances, bounds) and decision
//! vectors (loads, distances, the objective) share one representation.

use std::{fmt, ops};

use rustsat::{
    instances::ManageVars,
    types::{Assignment, Lit, TernaryVal},
};

use crate::{encodings::Error, utils};

/// A single bit of a [`BitVector`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Bit {
    /// A fixed truth value
    Const(bool),
    /// A solver literal
    Lit(Lit),
}

impl Bit {
    /// The constant true bit
    pub const TRUE: Bit = Bit::Const(true);
    /// The constant false bit
    pub const FALSE: Bit = Bit::Const(false);

    /// Gets the value of the bit if it is a constant
    #[must_use]
    pub fn as_const(self) -> Option<bool> {
        match self {
            Bit::Const(val) => Some(val),
            Bit::Lit(_) => None,
        }
    }

    /// Evaluates the bit under an assignment. Unassigned literals count as
    /// false.
    #[must_use]
    pub fn value(self, assign: &Assignment) -> bool {
        match self {
            Bit::Const(val) => val,
            Bit::Lit(lit) => assign.lit_value(lit) == TernaryVal::True,
        }
    }
}

impl ops::Not for Bit {
    type Output = Bit;

    fn not(self) -> Self::Output {
        match self {
            Bit::Const(val) => Bit::Const(!val),
            Bit::Lit(lit) => Bit::Lit(!lit),
        }
    }
}

impl From<Lit> for Bit {
    fn from(lit: Lit) -> Self {
        Bit::Lit(lit)
    }
}

impl From<bool> for Bit {
    fn from(val: bool) -> Self {
        Bit::Const(val)
    }
}

impl fmt::Display for Bit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bit::Const(true) => write!(f, "1"),
            Bit::Const(false) => write!(f, "0"),
            Bit::Lit(lit) => write!(f, "{lit}"),
        }
    }
}

/// Number of bits needed to represent `value`, at least one
#[must_use]
pub fn bits_for(value: u64) -> usize {
    utils::digits(value)
}

/// Converts big-endian booleans to the integer they represent
#[must_use]
pub fn to_int(bits: &[bool]) -> u64 {
    bits.iter().fold(0, |acc, &bit| (acc << 1) | u64::from(bit))
}

/// A fixed-width unsigned integer made of [`Bit`]s, most significant bit first
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct BitVector {
    bits: Vec<Bit>,
}

impl BitVector {
    /// Creates the constant vector for `value` in `width` bits
    ///
    /// # Errors
    ///
    /// [`Error::InsufficientWidth`] if `value` does not fit into `width` bits.
    pub fn from_int(value: u64, width: usize) -> Result<Self, Error> {
        let needed = if value == 0 { 0 } else { bits_for(value) };
        if width < needed {
            return Err(Error::InsufficientWidth { value, width });
        }
        let bits = (0..width)
            .rev()
            .map(|pos| Bit::Const(pos < 64 && (value >> pos) & 1 == 1))
            .collect();
        Ok(Self { bits })
    }

    /// The constant zero of the given width
    #[must_use]
    pub fn zero(width: usize) -> Self {
        Self {
            bits: vec![Bit::FALSE; width],
        }
    }

    /// Creates a vector of `width` fresh variables
    pub fn new_vars(width: usize, var_manager: &mut dyn ManageVars) -> Self {
        (0..width)
            .map(|_| Bit::Lit(var_manager.new_var().pos_lit()))
            .collect()
    }

    /// Gets the width of the vector
    #[must_use]
    pub fn width(&self) -> usize {
        self.bits.len()
    }

    /// Gets the bits, most significant first
    #[must_use]
    pub fn bits(&self) -> &[Bit] {
        &self.bits
    }

    /// Iterates over the bits, most significant first
    pub fn iter(&self) -> std::iter::Copied<std::slice::Iter<'_, Bit>> {
        self.bits.iter().copied()
    }

    /// Iterates over the literals in the vector, skipping constants
    pub fn lits(&self) -> impl Iterator<Item = Lit> + '_ {
        self.bits.iter().filter_map(|bit| match bit {
            Bit::Lit(lit) => Some(*lit),
            Bit::Const(_) => None,
        })
    }

    /// Left-pads the vector with constant false bits up to `width`
    ///
    /// # Errors
    ///
    /// [`Error::WidthMismatch`] if the vector is already wider than `width`.
    pub fn pad(&self, width: usize) -> Result<Self, Error> {
        if width < self.width() {
            return Err(Error::WidthMismatch {
                left: self.width(),
                right: width,
            });
        }
        let mut bits = vec![Bit::FALSE; width - self.width()];
        bits.extend_from_slice(&self.bits);
        Ok(Self { bits })
    }

    /// Gets the value of the vector if all bits are constants
    #[must_use]
    pub fn as_const(&self) -> Option<u64> {
        self.bits
            .iter()
            .try_fold(0, |acc, bit| Some((acc << 1) | u64::from(bit.as_const()?)))
    }

    /// Checks whether the vector is the constant zero
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.bits.iter().all(|bit| *bit == Bit::FALSE)
    }

    /// Evaluates the vector under an assignment
    #[must_use]
    pub fn to_int(&self, assign: &Assignment) -> u64 {
        self.bits
            .iter()
            .fold(0, |acc, bit| (acc << 1) | u64::from(bit.value(assign)))
    }
}

impl ops::Index<usize> for BitVector {
    type Output = Bit;

    fn index(&self, index: usize) -> &Self::Output {
        &self.bits[index]
    }
}

impl FromIterator<Bit> for BitVector {
    fn from_iter<T: IntoIterator<Item = Bit>>(iter: T) -> Self {
        Self {
            bits: iter.into_iter().collect(),
        }
    }
}

impl FromIterator<Lit> for BitVector {
    fn from_iter<T: IntoIterator<Item = Lit>>(iter: T) -> Self {
        iter.into_iter().map(Bit::Lit).collect()
    }
}

impl From<Vec<Bit>> for BitVector {
    fn from(bits: Vec<Bit>) -> Self {
        Self { bits }
    }
}

impl<'vec> IntoIterator for &'vec BitVector {
    type Item = Bit;

    type IntoIter = std::iter::Copied<std::slice::Iter<'vec, Bit>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (idx, bit) in self.bits.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{bit}")?;
        }
        write!(f, "]")
    }
}
