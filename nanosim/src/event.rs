//! Deferred calls and the handles used to cancel them.

use std::fmt;

use crate::time::Time;

/// A type-erased deferred call, invoked at most once.
///
/// An `EventImpl` is created by the `schedule` family of operations and is
/// exclusively owned by the scheduler once inserted. The simulator pops it
/// at its scheduled time and invokes it; cancellation drops it without
/// invocation. Either way the closure runs zero or one times.
pub struct EventImpl(Box<dyn FnOnce()>);

impl EventImpl {
    /// Wraps a closure as a schedulable event.
    pub fn new<F: FnOnce() + 'static>(f: F) -> Self {
        EventImpl(Box::new(f))
    }

    /// Consumes the event, running the deferred call.
    pub(crate) fn invoke(self) {
        (self.0)()
    }
}

impl fmt::Debug for EventImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EventImpl")
    }
}

/// A non-owning handle to a scheduled [`EventImpl`].
///
/// The handle is a generation-checked index into the scheduler's slot
/// arena. Holding an `EventId` does not keep the event alive: once the
/// event has fired or been cancelled, every operation on the handle is a
/// safe no-op. Two handles are equal iff they name the same slot in the
/// same generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventId {
    pub(crate) slot: usize,
    pub(crate) generation: u64,
    pub(crate) time: Time,
}

impl EventId {
    /// A handle that never names a live event.
    pub const INVALID: EventId = EventId {
        slot: usize::MAX,
        generation: 0,
        time: Time::ZERO,
    };

    /// The virtual time this event was scheduled for.
    ///
    /// Remains meaningful after the event fires or is cancelled; it is the
    /// key the event was inserted under, not a liveness query.
    pub fn time(&self) -> Time {
        self.time
    }
}
