//! # mcrsat - Multiple Courier Routing as Boolean Constraints
//!
//! `mcrsat` encodes the multiple courier routing problem (`m` couriers with
//! capacities, `n` items with sizes, a depot and a distance matrix) into CNF on
//! top of the [RustSAT](https://github.com/chrjabs/rustsat) types and minimises
//! the largest courier distance with an incremental SAT solver.
//!
//! The crate is layered bottom-up:
//!
//! - [`bitvec`]: fixed-width, most-significant-bit-first vectors of literals
//!     and constants representing unsigned integers
//! - [`encodings`]: a clause [`encodings::Builder`] with guarded implications,
//!     cardinality constraints, ripple-carry addition, comparison and
//!     conditional summation
//! - [`bounds`]: distance bounds and bit widths derived from an instance
//! - [`model`]: the routing model (assignment, route graph, visit order,
//!     loads, distances, objective)
//! - [`solve`]: the solver adapter running the minimisation loop under a
//!     wall-clock budget
//! - [`decode`]: turning a satisfying assignment back into routes
//!
//! ## Example Usage
//!
//! ```no_run
//! use mcrsat::{
//!     events::LogSink,
//!     instance::Instance,
//!     solve::{self, SolveOptions},
//! };
//!
//! let inst = Instance::from_path("data/inst01.dat").unwrap();
//! let outcome =
//!     solve::solve::<rustsat_minisat::core::Minisat>(&inst, &SolveOptions::default(), &mut LogSink)
//!         .unwrap();
//! println!("{:?}: {:?}", outcome.status, outcome.best.map(|sol| sol.objective));
//! ```

#![warn(clippy::pedantic)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod bitvec;
pub mod bounds;
pub mod decode;
pub mod encodings;
pub mod events;
pub mod instance;
pub mod model;
pub mod solve;

mod utils;

pub use bitvec::{Bit, BitVector};
pub use encodings::Error as EncodingError;
pub use solve::ModelError;
