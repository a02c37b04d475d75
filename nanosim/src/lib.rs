//! # Nanosim
//!
//! A discrete-event network simulation kernel.
//!
//! The kernel advances a virtual clock by executing scheduled events in
//! strict (time, insertion-order) order:
//! - Virtual time and event scheduling with cancel/remove semantics
//! - A simulator facade with run/stop/destroy lifecycle and per-event
//!   execution contexts
//! - Timers with suspend/resume and destruction policies
//! - Identity-comparable callbacks and multicast trace sources
//! - A reflective attribute system (typed values, validators, accessors)
//!   over registered object types
//! - Path-based bulk configuration over the live object graph
//!
//! Everything is deterministic: the same program with the same seed
//! produces the same event order and the same random draws.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

/// Values, validators and accessors for the attribute system.
pub mod attribute;
/// Identity-comparable callbacks and multicast trace sources.
pub mod callback;
/// Path-based bulk configuration over the object graph.
pub mod config;
/// Error types for simulation operations.
pub mod error;
/// Scheduled event closures and their handles.
pub mod event;
/// Reflective base machinery: objects, aggregation, TypeId records.
pub mod object;
/// Thread-local seeded random number generation.
pub mod rng;
/// The event scheduler: time-ordered queue with O(1) cancellation.
pub mod scheduler;
/// The simulator facade: clock, lifecycle, scheduling entry points.
pub mod simulator;
/// Virtual time arithmetic.
pub mod time;
/// One-shot rescheduleable timers.
pub mod timer;

/// Process-scoped registry for types, names and root objects.
pub mod registry;

pub mod prelude;

// Public API exports
pub use attribute::{AttributeAccessor, AttributeChecker, AttributeValue};
pub use callback::{Callback, ContextCallback, TracedCallback};
pub use config::{lookup_matches, lookup_matches_with, Match, MatchContainer};
pub use error::{SimError, SimResult};
pub use event::EventId;
pub use object::{
    aggregate, aggregate_members, AttributeInfo, Object, ObjectCore, ObjectRc, TraceSourceAccessor,
    TraceSourceInfo, TypeId,
};
pub use registry::Registry;
pub use rng::{current_sim_seed, set_sim_seed, sim_random, sim_random_range};
pub use simulator::{SimHandle, SimState, Simulator, NO_CONTEXT};
pub use time::Time;
pub use timer::{DestroyPolicy, Timer, TimerState};
