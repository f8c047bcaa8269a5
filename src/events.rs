//! # Structured Progress Events
//!
//! The model builder and the solver adapter report what they do through an
//! [`EventSink`] that is passed in explicitly. [`LogSink`] forwards to the
//! [`log`] facade, a `Vec<Event>` collects events (handy in tests) and `()`
//! discards them.

use std::{fmt, time::Duration};

/// The phase an event belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Reading the instance
    Parse,
    /// Computing distance bounds and bit widths
    Bounds,
    /// Building one part of the routing model
    Encode,
    /// A call to the SAT solver
    Solve,
    /// A new best solution
    Improve,
    /// Turning a solver assignment into routes
    Decode,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Parse => write!(f, "parse"),
            Phase::Bounds => write!(f, "bounds"),
            Phase::Encode => write!(f, "encode"),
            Phase::Solve => write!(f, "solve"),
            Phase::Improve => write!(f, "improve"),
            Phase::Decode => write!(f, "decode"),
        }
    }
}

/// A single progress record
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    /// The phase of the event
    pub phase: Phase,
    /// Wall-clock time since the reporting component started
    pub elapsed: Duration,
    /// Number of variables created so far
    pub n_vars: u32,
    /// Number of clauses emitted so far
    pub n_clauses: usize,
    /// Short description, e.g., the constraint group or the solver result
    pub detail: String,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {:.3}s vars={} clauses={} {}",
            self.phase,
            self.elapsed.as_secs_f64(),
            self.n_vars,
            self.n_clauses,
            self.detail
        )
    }
}

/// Receiver of progress events
pub trait EventSink {
    /// Records an event
    fn record(&mut self, event: Event);
}

/// Forwards events to the [`log`] facade: solve and improvement events at
/// `info`, everything else at `debug`
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn record(&mut self, event: Event) {
        match event.phase {
            Phase::Solve | Phase::Improve => log::info!(target: "mcrsat", "{event}"),
            _ => log::debug!(target: "mcrsat", "{event}"),
        }
    }
}

impl EventSink for Vec<Event> {
    fn record(&mut self, event: Event) {
        self.push(event);
    }
}

impl EventSink for () {
    fn record(&mut self, _: Event) {}
}
