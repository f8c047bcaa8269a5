//! # Decoding and Checking Solutions
//!
//! Turns a satisfying assignment of an [`Encoding`] into integer loads and
//! distances and into one ordered route per courier. Routes are recomputed
//! from the instance by [`check_routes`], which makes [`Solution::check`] an
//! independent test of a decoded (or externally provided) solution.

use std::fmt;

use rustsat::types::{Assignment, TernaryVal};
use thiserror::Error;

use crate::{instance::Instance, model::Encoding};

/// Errors from walking the route graph of an assignment
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// No arc of the courier leaves the given node
    #[error("route of courier {courier} ends at node {node}")]
    BrokenRoute {
        /// The courier
        courier: usize,
        /// The node without an outgoing arc
        node: usize,
    },
    /// The route never returns to the depot
    #[error("route of courier {courier} revisits node {node}")]
    Cycle {
        /// The courier
        courier: usize,
        /// The node that is visited twice
        node: usize,
    },
}

/// Reasons why a solution does not solve an instance
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    /// The number of routes is not the number of couriers
    #[error("expected {expected} routes, found {found}")]
    CourierCount {
        /// The number of couriers
        expected: usize,
        /// The number of routes
        found: usize,
    },
    /// A route contains a node that is not an item
    #[error("courier {courier} visits unknown item {item}")]
    UnknownItem {
        /// The courier
        courier: usize,
        /// The invalid item
        item: usize,
    },
    /// An item is on no route
    #[error("item {item} is not delivered")]
    Undelivered {
        /// The item
        item: usize,
    },
    /// An item is on more than one route or twice on the same
    #[error("item {item} is delivered more than once")]
    Duplicate {
        /// The item
        item: usize,
    },
    /// A courier carries more than it can
    #[error("courier {courier} carries {load} but has capacity {capacity}")]
    Capacity {
        /// The courier
        courier: usize,
        /// The load of the route
        load: u64,
        /// The capacity of the courier
        capacity: u64,
    },
    /// A courier is idle although every courier has to deliver something
    #[error("courier {courier} delivers nothing")]
    EmptyRoute {
        /// The courier
        courier: usize,
    },
    /// A stored load or distance differs from the recomputed one
    #[error("{what} of courier {courier} is {claimed}, recomputed {actual}")]
    Mismatch {
        /// `"load"` or `"distance"`
        what: &'static str,
        /// The courier
        courier: usize,
        /// The stored value
        claimed: u64,
        /// The recomputed value
        actual: u64,
    },
    /// The objective is not the largest route distance
    #[error("objective is {claimed}, largest route distance is {actual}")]
    Objective {
        /// The stored objective
        claimed: u64,
        /// The largest recomputed distance
        actual: u64,
    },
}

/// A decoded solution, with 0-based item indices
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Solution {
    /// The largest courier distance
    pub objective: u64,
    /// The distance travelled by every courier
    pub distances: Vec<u64>,
    /// The load of every courier
    pub loads: Vec<u64>,
    /// The items of every courier in delivery order, without the depot
    pub routes: Vec<Vec<usize>>,
}

impl Solution {
    /// Decodes the solution from a satisfying assignment of `enc`
    ///
    /// # Errors
    ///
    /// If a route does not lead back to the depot, which indicates an
    /// assignment that does not satisfy the encoding.
    pub fn decode(enc: &Encoding, assign: &Assignment) -> Result<Self, DecodeError> {
        let routes = (0..enc.loads().len())
            .map(|courier| walk_route(enc, assign, courier))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            objective: enc.max_dist().to_int(assign),
            distances: enc.dists().iter().map(|dist| dist.to_int(assign)).collect(),
            loads: enc.loads().iter().map(|load| load.to_int(assign)).collect(),
            routes,
        })
    }

    /// Checks the solution against the instance: every item is delivered
    /// exactly once, capacities hold, loads and distances match the routes and
    /// the objective is the largest route distance. Empty routes are accepted
    /// only if `allow_empty_routes` is set.
    ///
    /// # Errors
    ///
    /// The first violation found.
    pub fn check(&self, inst: &Instance, allow_empty_routes: bool) -> Result<(), CheckError> {
        let (loads, distances) = check_routes(inst, &self.routes)?;
        if !allow_empty_routes {
            if let Some(courier) = self.routes.iter().position(Vec::is_empty) {
                return Err(CheckError::EmptyRoute { courier });
            }
        }
        for (what, claimed, actual) in [("load", &self.loads, &loads), ("distance", &self.distances, &distances)] {
            if claimed.len() != actual.len() {
                return Err(CheckError::CourierCount {
                    expected: actual.len(),
                    found: claimed.len(),
                });
            }
            if let Some((courier, (&claimed, &actual))) =
                claimed.iter().zip(actual).enumerate().find(|(_, (a, b))| a != b)
            {
                return Err(CheckError::Mismatch {
                    what,
                    courier,
                    claimed,
                    actual,
                });
            }
        }
        let actual = distances.iter().copied().max().unwrap_or(0);
        if self.objective != actual {
            return Err(CheckError::Objective {
                claimed: self.objective,
                actual,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "objective {}", self.objective)?;
        for (courier, route) in self.routes.iter().enumerate() {
            write!(f, "courier {courier}: depot")?;
            for item in route {
                write!(f, " -> {item}")?;
            }
            writeln!(
                f,
                " -> depot (load {}, distance {})",
                self.loads.get(courier).copied().unwrap_or_default(),
                self.distances.get(courier).copied().unwrap_or_default()
            )?;
        }
        Ok(())
    }
}

/// Follows the arcs of one courier from the depot until it returns
fn walk_route(enc: &Encoding, assign: &Assignment, courier: usize) -> Result<Vec<usize>, DecodeError> {
    let graph = enc.graph();
    let depot = graph.n_nodes() - 1;
    let successor = |node: usize| {
        graph
            .outgoing(courier, node)
            .iter()
            .position(|&lit| assign.lit_value(lit) == TernaryVal::True)
            .ok_or(DecodeError::BrokenRoute { courier, node })
    };
    let mut route = Vec::new();
    let mut node = successor(depot)?;
    while node != depot {
        if route.contains(&node) || route.len() >= depot {
            return Err(DecodeError::Cycle { courier, node });
        }
        route.push(node);
        node = successor(node)?;
    }
    Ok(route)
}

/// Distance of a route that starts and ends at the depot
#[must_use]
pub fn route_distance(inst: &Instance, route: &[usize]) -> u64 {
    let depot = inst.depot();
    let mut prev = depot;
    let mut total = 0;
    for &item in route.iter().chain([&depot]) {
        total += inst.distance(prev, item);
        prev = item;
    }
    total
}

/// Checks that the routes deliver every item exactly once within capacities
/// and recomputes the load and distance of every courier
///
/// # Errors
///
/// The first violation found.
pub fn check_routes(inst: &Instance, routes: &[Vec<usize>]) -> Result<(Vec<u64>, Vec<u64>), CheckError> {
    if routes.len() != inst.n_couriers() {
        return Err(CheckError::CourierCount {
            expected: inst.n_couriers(),
            found: routes.len(),
        });
    }
    let mut delivered = vec![false; inst.n_items()];
    let mut loads = Vec::with_capacity(routes.len());
    for (courier, route) in routes.iter().enumerate() {
        let mut load = 0;
        for &item in route {
            if item >= inst.n_items() {
                return Err(CheckError::UnknownItem { courier, item });
            }
            if delivered[item] {
                return Err(CheckError::Duplicate { item });
            }
            delivered[item] = true;
            load += inst.sizes()[item];
        }
        let capacity = inst.capacities()[courier];
        if load > capacity {
            return Err(CheckError::Capacity {
                courier,
                load,
                capacity,
            });
        }
        loads.push(load);
    }
    if let Some(item) = delivered.iter().position(|&done| !done) {
        return Err(CheckError::Undelivered { item });
    }
    let distances = routes.iter().map(|route| route_distance(inst, route)).collect();
    Ok((loads, distances))
}
