//! Prelude module for common nanosim imports.
//!
//! Re-exports the types most programs touch, so simulation code can start
//! with one glob import instead of remembering the module paths.
//!
//! # Usage
//!
//! ```rust
//! use nanosim::prelude::*;
//!
//! let mut sim = Simulator::new();
//! sim.schedule(Time::millis(10), || {});
//! sim.run();
//! ```

// Kernel types
pub use crate::error::{SimError, SimResult};
pub use crate::event::EventId;
pub use crate::simulator::{SimHandle, SimState, Simulator, NO_CONTEXT};
pub use crate::time::Time;
pub use crate::timer::{DestroyPolicy, Timer, TimerState};

// Instrumentation
pub use crate::callback::{Callback, ContextCallback, TracedCallback};

// Attribute and object system
pub use crate::attribute::{AttributeAccessor, AttributeChecker, AttributeValue};
pub use crate::object::{aggregate, Object, ObjectCore, ObjectRc, TraceSourceAccessor, TypeId};
pub use crate::registry::Registry;

// Configuration paths
pub use crate::config::{lookup_matches, MatchContainer};
