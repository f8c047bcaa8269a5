//! # The Routing Model
//!
//! Builds the complete CNF encoding of a multiple courier routing instance on
//! a [`Builder`]. The decision variables live in three arenas:
//!
//! - [`AssignmentMatrix`]: `carries(i, j)` is true iff courier `i` delivers
//!     item `j`
//! - [`RouteGraph`]: `arc(i, j, k)` is true iff the route of courier `i` goes
//!     from node `j` to node `k`, where nodes `0..n` are items and node `n`
//!     is the depot
//! - [`VisitOrder`]: `position(j, p)` is true iff item `j` is the `p`-th item
//!     on the route of its courier
//!
//! On top of these the model defines one load and one distance vector per
//! courier and the objective vector, the largest courier distance.

use std::time::Instant;

use rustsat::{encodings::CollectClauses, instances::ManageVars, types::Lit};

use crate::{
    bitvec::{Bit, BitVector},
    bounds::{Bounds, Widths},
    encodings::{Builder, Cmp, EncodeStats, Error},
    events::{Event, EventSink, Phase},
    instance::Instance,
};

/// Options changing the model
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModelOptions {
    /// Only keep one direction of every route. Applied only if the distance
    /// matrix is symmetric.
    pub symmetry_breaking: bool,
    /// Allow couriers that deliver nothing. An idle courier uses the depot
    /// self-loop as its route.
    pub allow_empty_routes: bool,
}

/// Allocates a block of fresh literals
fn alloc(n: usize, var_manager: &mut dyn ManageVars) -> Vec<Lit> {
    (0..n).map(|_| var_manager.new_var().pos_lit()).collect()
}

/// Which courier delivers which item
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssignmentMatrix {
    lits: Vec<Lit>,
    n_items: usize,
}

impl AssignmentMatrix {
    /// Allocates the variables for `n_couriers x n_items`
    pub fn new(n_couriers: usize, n_items: usize, var_manager: &mut dyn ManageVars) -> Self {
        Self {
            lits: alloc(n_couriers * n_items, var_manager),
            n_items,
        }
    }

    /// Literal for "courier `courier` delivers item `item`"
    #[must_use]
    pub fn carries(&self, courier: usize, item: usize) -> Lit {
        debug_assert!(item < self.n_items);
        self.lits[courier * self.n_items + item]
    }

    /// The items of one courier
    #[must_use]
    pub fn courier(&self, courier: usize) -> &[Lit] {
        &self.lits[courier * self.n_items..(courier + 1) * self.n_items]
    }

    /// The couriers that could deliver one item
    #[must_use]
    pub fn item(&self, item: usize) -> Vec<Lit> {
        self.lits.iter().skip(item).step_by(self.n_items).copied().collect()
    }
}

/// The arcs of every courier's route
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteGraph {
    lits: Vec<Lit>,
    n_nodes: usize,
}

impl RouteGraph {
    /// Allocates the variables for `n_couriers x n_nodes x n_nodes`
    pub fn new(n_couriers: usize, n_nodes: usize, var_manager: &mut dyn ManageVars) -> Self {
        Self {
            lits: alloc(n_couriers * n_nodes * n_nodes, var_manager),
            n_nodes,
        }
    }

    /// Gets the number of nodes, items plus the depot
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.n_nodes
    }

    /// Literal for "courier `courier` travels from `from` to `to`"
    #[must_use]
    pub fn arc(&self, courier: usize, from: usize, to: usize) -> Lit {
        debug_assert!(from < self.n_nodes && to < self.n_nodes);
        self.lits[(courier * self.n_nodes + from) * self.n_nodes + to]
    }

    /// All arcs of one courier, row-major by origin node
    #[must_use]
    pub fn courier(&self, courier: usize) -> &[Lit] {
        let size = self.n_nodes * self.n_nodes;
        &self.lits[courier * size..(courier + 1) * size]
    }

    /// The arcs of one courier leaving `from`
    #[must_use]
    pub fn outgoing(&self, courier: usize, from: usize) -> &[Lit] {
        let start = (courier * self.n_nodes + from) * self.n_nodes;
        &self.lits[start..start + self.n_nodes]
    }

    /// The arcs of one courier entering `to`
    #[must_use]
    pub fn incoming(&self, courier: usize, to: usize) -> Vec<Lit> {
        (0..self.n_nodes).map(|from| self.arc(courier, from, to)).collect()
    }
}

/// The position of every item on the route of its courier
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisitOrder {
    lits: Vec<Lit>,
    n_items: usize,
}

impl VisitOrder {
    /// Allocates the variables for `n_items x n_items`
    pub fn new(n_items: usize, var_manager: &mut dyn ManageVars) -> Self {
        Self {
            lits: alloc(n_items * n_items, var_manager),
            n_items,
        }
    }

    /// Literal for "item `item` is visited at position `pos`"
    #[must_use]
    pub fn position(&self, item: usize, pos: usize) -> Lit {
        debug_assert!(pos < self.n_items);
        self.lits[item * self.n_items + pos]
    }

    /// The one-hot position vector of an item
    #[must_use]
    pub fn positions(&self, item: usize) -> &[Lit] {
        &self.lits[item * self.n_items..(item + 1) * self.n_items]
    }
}

/// The encoded routing model of one instance
#[derive(Clone, Debug)]
pub struct Encoding {
    assignment: AssignmentMatrix,
    graph: RouteGraph,
    order: VisitOrder,
    loads: Vec<BitVector>,
    dists: Vec<BitVector>,
    max_dist: BitVector,
    bounds: Bounds,
    widths: Widths,
    options: ModelOptions,
    symmetry_broken: bool,
}

/// Reports one finished constraint group
fn report<Col>(
    builder: &mut Builder<'_, Col>,
    sink: &mut dyn EventSink,
    start: Instant,
    detail: &str,
) where
    Col: CollectClauses,
{
    let n_vars = builder.var_manager().max_var().map_or(0, |var| var.idx32() + 1);
    sink.record(Event {
        phase: Phase::Encode,
        elapsed: start.elapsed(),
        n_vars,
        n_clauses: builder.n_clauses(),
        detail: detail.to_string(),
    });
}

impl Encoding {
    /// Encodes `inst` into the builder's collector
    ///
    /// # Errors
    ///
    /// If a constant does not fit its width, which can only happen for
    /// inconsistent bounds, or if the collector runs out of memory.
    pub fn new<Col>(
        inst: &Instance,
        bounds: &Bounds,
        options: ModelOptions,
        builder: &mut Builder<'_, Col>,
        sink: &mut dyn EventSink,
    ) -> Result<Self, Error>
    where
        Col: CollectClauses,
    {
        let start = Instant::now();
        let widths = Widths::for_instance(inst, bounds);
        let (n_couriers, n_items) = (inst.n_couriers(), inst.n_items());
        let depot = inst.depot();
        let n_nodes = depot + 1;

        let assignment = AssignmentMatrix::new(n_couriers, n_items, builder.var_manager());
        let graph = RouteGraph::new(n_couriers, n_nodes, builder.var_manager());
        let order = VisitOrder::new(n_items, builder.var_manager());
        report(builder, sink, start, "allocated decision variables");

        // every item goes with exactly one courier
        for item in 0..n_items {
            builder.exactly_one(&assignment.item(item))?;
        }
        // couriers deliver something, or idle on the depot self-loop
        for courier in 0..n_couriers {
            if options.allow_empty_routes {
                let idle = graph.arc(courier, depot, depot);
                builder.guarded(idle, |b| b.none_of(assignment.courier(courier)))?;
                let mut lits = assignment.courier(courier).to_vec();
                lits.push(idle);
                builder.at_least_one(&lits)?;
            } else {
                builder.at_least_one(assignment.courier(courier))?;
            }
        }
        report(builder, sink, start, "assignment");

        let sizes = inst
            .sizes()
            .iter()
            .map(|&size| BitVector::from_int(size, widths.load))
            .collect::<Result<Vec<_>, _>>()?;
        let mut loads = Vec::with_capacity(n_couriers);
        for (courier, &capacity) in inst.capacities().iter().enumerate() {
            let load = builder.new_vector(widths.load);
            builder.conditional_sum(&load, &sizes, assignment.courier(courier))?;
            builder.assert_compare(&load, &BitVector::from_int(capacity, widths.load)?, Cmp::Le)?;
            loads.push(load);
        }
        report(builder, sink, start, "loads");

        for item in 0..n_items {
            builder.exactly_one(order.positions(item))?;
        }
        report(builder, sink, start, "visit order");

        for courier in 0..n_couriers {
            // no self-loops, except the idle depot loop
            for node in 0..n_nodes {
                if !(options.allow_empty_routes && node == depot) {
                    builder.assert(Bit::Lit(!graph.arc(courier, node, node)))?;
                }
            }
            // arcs touch exactly the items of the courier
            for item in 0..n_items {
                let carries = assignment.carries(courier, item);
                let outgoing = graph.outgoing(courier, item);
                let incoming = graph.incoming(courier, item);
                builder.guarded(carries, |b| {
                    b.exactly_one(outgoing)?;
                    b.exactly_one(&incoming)
                })?;
                builder.guarded(!carries, |b| {
                    b.none_of(outgoing)?;
                    b.none_of(&incoming)
                })?;
            }
            // leave and return to the depot once
            builder.exactly_one(graph.outgoing(courier, depot))?;
            builder.exactly_one(&graph.incoming(courier, depot))?;
        }
        report(builder, sink, start, "route graph");

        for courier in 0..n_couriers {
            for from in 0..n_items {
                for to in (0..n_items).filter(|&to| to != from) {
                    builder.guarded(graph.arc(courier, from, to), |b| {
                        consecutive(b, order.positions(from), order.positions(to))
                    })?;
                }
                // the first item of a route is at position zero
                builder.guarded(graph.arc(courier, depot, from), |b| {
                    b.assert(Bit::Lit(order.position(from, 0)))
                })?;
            }
        }
        report(builder, sink, start, "subtour elimination");

        let matrix = (0..n_nodes)
            .flat_map(|from| (0..n_nodes).map(move |to| (from, to)))
            .map(|(from, to)| BitVector::from_int(inst.distance(from, to), widths.dist))
            .collect::<Result<Vec<_>, _>>()?;
        let mut dists = Vec::with_capacity(n_couriers);
        for courier in 0..n_couriers {
            let dist = builder.new_vector(widths.dist);
            builder.conditional_sum(&dist, &matrix, graph.courier(courier))?;
            dists.push(dist);
        }
        report(builder, sink, start, "distances");

        let max_dist = builder.new_vector(widths.dist);
        let mut attained = Vec::with_capacity(n_couriers);
        for dist in &dists {
            builder.assert_compare(&max_dist, dist, Cmp::Ge)?;
            attained.push(builder.compare(&max_dist, dist, Cmp::Eq)?);
        }
        builder.clause(attained)?;
        report(builder, sink, start, "objective");

        builder.assert_compare(&max_dist, &BitVector::from_int(bounds.lower, widths.dist)?, Cmp::Ge)?;
        let upper = BitVector::from_int(bounds.upper, widths.dist)?;
        let lowest = BitVector::from_int(bounds.lowest, widths.dist)?;
        for (courier, dist) in dists.iter().enumerate() {
            builder.assert_compare(dist, &upper, Cmp::Le)?;
            if options.allow_empty_routes {
                let idle = graph.arc(courier, depot, depot);
                builder.guarded(!idle, |b| b.assert_compare(dist, &lowest, Cmp::Ge))?;
            } else {
                builder.assert_compare(dist, &lowest, Cmp::Ge)?;
            }
        }
        report(builder, sink, start, "bounds");

        let symmetry_broken = options.symmetry_breaking && inst.is_symmetric();
        if symmetry_broken {
            // the first item has a smaller index than the last one
            for courier in 0..n_couriers {
                for first in 0..n_items {
                    for last in 0..first {
                        builder.clause([
                            Bit::Lit(!graph.arc(courier, depot, first)),
                            Bit::Lit(!graph.arc(courier, last, depot)),
                        ])?;
                    }
                }
            }
            report(builder, sink, start, "symmetry breaking");
        }

        Ok(Self {
            assignment,
            graph,
            order,
            loads,
            dists,
            max_dist,
            bounds: *bounds,
            widths,
            options,
            symmetry_broken,
        })
    }

    /// Gets the assignment matrix
    #[must_use]
    pub fn assignment(&self) -> &AssignmentMatrix {
        &self.assignment
    }

    /// Gets the route graph
    #[must_use]
    pub fn graph(&self) -> &RouteGraph {
        &self.graph
    }

    /// Gets the visit order
    #[must_use]
    pub fn order(&self) -> &VisitOrder {
        &self.order
    }

    /// Gets the load vector of every courier
    #[must_use]
    pub fn loads(&self) -> &[BitVector] {
        &self.loads
    }

    /// Gets the distance vector of every courier
    #[must_use]
    pub fn dists(&self) -> &[BitVector] {
        &self.dists
    }

    /// Gets the objective, the largest courier distance
    #[must_use]
    pub fn max_dist(&self) -> &BitVector {
        &self.max_dist
    }

    /// Gets the bounds the model was built with
    #[must_use]
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Gets the widths of the integer vectors
    #[must_use]
    pub fn widths(&self) -> &Widths {
        &self.widths
    }

    /// Gets the options the model was built with
    #[must_use]
    pub fn options(&self) -> ModelOptions {
        self.options
    }

    /// Whether symmetry breaking constraints were added
    #[must_use]
    pub fn symmetry_broken(&self) -> bool {
        self.symmetry_broken
    }

    /// The idle literal of a courier, if empty routes are allowed
    #[must_use]
    pub fn idle(&self, courier: usize) -> Option<Lit> {
        let depot = self.graph.n_nodes() - 1;
        self.options
            .allow_empty_routes
            .then(|| self.graph.arc(courier, depot, depot))
    }
}

/// Enforces that the one-hot position `after` directly follows `before`:
/// `after` is not at the first position, `before` not at the last, and
/// `before[p] == after[p + 1]` everywhere else
fn consecutive<Col>(builder: &mut Builder<'_, Col>, before: &[Lit], after: &[Lit]) -> Result<(), Error>
where
    Col: CollectClauses,
{
    debug_assert_eq!(before.len(), after.len());
    let (Some(&first), Some(&last)) = (after.first(), before.last()) else {
        return Ok(());
    };
    builder.assert(Bit::Lit(!first))?;
    builder.assert(Bit::Lit(!last))?;
    for (&cur, &next) in before.iter().zip(&after[1..]) {
        builder.clause([Bit::Lit(!cur), Bit::Lit(next)])?;
        builder.clause([Bit::Lit(cur), Bit::Lit(!next)])?;
    }
    Ok(())
}
