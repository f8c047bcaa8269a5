//! # mcrsat-tools - Command Line Tools for mcrsat
//!
//! - `mcrsat`: solves an instance file and writes a JSON result record
//! - `check-solution`: checks a result record against an instance file

pub mod utils;

/// The SAT solver the tools run on
pub type Solver = rustsat_minisat::core::Minisat;
