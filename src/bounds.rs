//! # Distance Bounds and Bit Widths
//!
//! Plain integer computations over an [`Instance`], done once before any
//! literal is created.

use crate::{bitvec::bits_for, instance::Instance};

/// Bounds on the objective and on individual courier distances
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bounds {
    /// Largest depot round trip to a single item. Some courier has to make
    /// this trip, so the objective is at least this large.
    pub lower: u64,
    /// Smallest depot round trip to a single item, a lower bound for every
    /// courier that leaves the depot
    pub lowest: u64,
    /// Sum over all items of the largest distance leaving that item
    pub upper: u64,
}

impl Bounds {
    /// Computes the bounds for an instance
    #[must_use]
    pub fn for_instance(inst: &Instance) -> Self {
        let depot = inst.depot();
        // instances guarantee that the row maxima sum up without overflow,
        // which bounds every round trip and the upper bound
        let round_trips = (0..inst.n_items())
            .map(|item| inst.distance(item, depot) + inst.distance(depot, item));
        let (lower, lowest) = round_trips.fold((0, None), |(hi, lo): (u64, Option<u64>), trip| {
            (hi.max(trip), Some(lo.map_or(trip, |lo| lo.min(trip))))
        });
        let upper = (0..inst.n_items())
            .map(|item| inst.distance_row(item).iter().copied().max().unwrap_or(0))
            .sum();
        Self {
            lower,
            lowest: lowest.unwrap_or(0),
            upper,
        }
    }
}

/// Bit widths of the integer quantities in the model
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Widths {
    /// Width of courier loads, capacities and item sizes
    pub load: usize,
    /// Width of courier distances, matrix entries, bounds and the objective
    pub dist: usize,
}

impl Widths {
    /// Chooses the smallest widths that can hold every value the quantities
    /// can take: the total item size or the largest capacity for loads, the
    /// upper bound or the largest matrix entry for distances.
    #[must_use]
    pub fn for_instance(inst: &Instance, bounds: &Bounds) -> Self {
        let max_capacity = inst.capacities().iter().copied().max().unwrap_or(0);
        Self {
            load: bits_for(inst.total_size().max(max_capacity)),
            dist: bits_for(bounds.upper.max(inst.max_distance()).max(bounds.lower)),
        }
    }
}
