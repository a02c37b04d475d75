//! The simulation main loop and its scheduling surface.
//!
//! `Simulator` owns all mutable kernel state behind a single
//! `Rc<RefCell<..>>` and hands out weak [`SimHandle`]s for code that must
//! schedule from inside an event callback. The centralized-ownership +
//! handle pattern keeps the borrow checker out of event dispatch: the loop
//! releases its borrow before invoking a callback, so the callback is free
//! to schedule, cancel, or stop.
//!
//! Execution is single-threaded and cooperative. "Waiting" is always
//! "schedule a later event and return"; nothing here suspends a stack
//! frame, and no event ever runs concurrently with another.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::error::{SimError, SimResult};
use crate::event::{EventId, EventImpl};
use crate::rng::{reset_sim_rng, set_sim_seed};
use crate::scheduler::Scheduler;
use crate::time::Time;

/// Execution context tag for events not bound to any particular context.
pub const NO_CONTEXT: u32 = u32::MAX;

/// Lifecycle of a [`Simulator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimState {
    /// Constructed; `run` has not been called yet.
    NotStarted,
    /// Inside `run`'s dispatch loop.
    Running,
    /// `run` returned (stop requested or queue exhausted).
    Stopped,
    /// `destroy` was called. Terminal: scheduling is now fatal.
    Destroyed,
}

#[derive(Debug)]
struct SimInner {
    scheduler: Scheduler,
    now: Time,
    context: u32,
    state: SimState,
    stop_requested: bool,
    events_executed: u64,
    destroy_hooks: Vec<EventImpl>,
}

impl SimInner {
    fn new() -> Self {
        Self {
            scheduler: Scheduler::new(),
            now: Time::ZERO,
            context: NO_CONTEXT,
            state: SimState::NotStarted,
            stop_requested: false,
            events_executed: 0,
            destroy_hooks: Vec::new(),
        }
    }

    fn insert(&mut self, delay: Time, context: u32, event: EventImpl) -> EventId {
        assert!(
            self.state != SimState::Destroyed,
            "schedule called after destroy"
        );
        assert!(
            !delay.is_negative(),
            "negative delay {delay} passed to schedule"
        );
        self.scheduler.insert(self.now + delay, context, event)
    }
}

/// The virtual-time event loop.
///
/// Protocol and device models hand the simulator deferred calls via the
/// `schedule` family; `run` drains them in non-decreasing time order,
/// advancing [`now`](Simulator::now) to each event's timestamp before
/// invoking it. Events scheduled for the same virtual time run in
/// insertion order, and a zero-delay event scheduled from inside a
/// callback runs only after that callback returns.
#[derive(Debug)]
pub struct Simulator {
    inner: Rc<RefCell<SimInner>>,
}

impl Simulator {
    /// Creates a simulator with the default RNG seed (0).
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Creates a simulator seeding this thread's simulation RNG, so runs
    /// replay deterministically.
    pub fn with_seed(seed: u64) -> Self {
        reset_sim_rng();
        set_sim_seed(seed);
        Simulator {
            inner: Rc::new(RefCell::new(SimInner::new())),
        }
    }

    /// The current virtual time.
    pub fn now(&self) -> Time {
        self.inner.borrow().now
    }

    /// The execution context of the currently dispatched event, or
    /// [`NO_CONTEXT`] outside dispatch.
    pub fn context(&self) -> u32 {
        self.inner.borrow().context
    }

    /// The current lifecycle state.
    pub fn state(&self) -> SimState {
        self.inner.borrow().state
    }

    /// Number of events invoked so far.
    pub fn events_executed(&self) -> u64 {
        self.inner.borrow().events_executed
    }

    /// Number of events waiting to be processed.
    pub fn pending_event_count(&self) -> usize {
        self.inner.borrow().scheduler.len()
    }

    /// Returns `true` if events are waiting to be processed.
    pub fn has_pending_events(&self) -> bool {
        !self.inner.borrow().scheduler.is_empty()
    }

    /// Creates a weak handle for use inside event callbacks and timers.
    pub fn handle(&self) -> SimHandle {
        SimHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Schedules `f` to run `delay` after the current time, in the current
    /// execution context.
    ///
    /// # Panics
    ///
    /// Panics if `delay` is negative or the simulator was destroyed; both
    /// are contract violations.
    pub fn schedule<F: FnOnce() + 'static>(&self, delay: Time, f: F) -> EventId {
        let mut inner = self.inner.borrow_mut();
        let context = inner.context;
        inner.insert(delay, context, EventImpl::new(f))
    }

    /// Schedules `f` at the current time.
    ///
    /// The event still goes through the queue: when called from inside a
    /// callback it runs after that callback returns, never reentrantly.
    pub fn schedule_now<F: FnOnce() + 'static>(&self, f: F) -> EventId {
        self.schedule(Time::ZERO, f)
    }

    /// Schedules `f` tagged with an explicit execution context.
    ///
    /// Contexts are opaque to the kernel; cross-node causality bookkeeping
    /// and real-time variants use them to track which logical node an
    /// event belongs to.
    pub fn schedule_with_context<F: FnOnce() + 'static>(
        &self,
        context: u32,
        delay: Time,
        f: F,
    ) -> EventId {
        let mut inner = self.inner.borrow_mut();
        inner.insert(delay, context, EventImpl::new(f))
    }

    /// Registers `f` to run during [`destroy`](Simulator::destroy), after
    /// pending events have been dropped. Hooks run in registration order.
    pub fn schedule_destroy<F: FnOnce() + 'static>(&self, f: F) {
        let mut inner = self.inner.borrow_mut();
        assert!(
            inner.state != SimState::Destroyed,
            "schedule_destroy called after destroy"
        );
        inner.destroy_hooks.push(EventImpl::new(f));
    }

    /// Cancels a scheduled event.
    ///
    /// Idempotent: cancelling twice, or cancelling an event that already
    /// fired, is a safe no-op. O(1).
    pub fn cancel(&self, id: EventId) {
        self.inner.borrow_mut().scheduler.cancel(id);
    }

    /// Eagerly removes a scheduled event, releasing its storage now
    /// instead of at its original fire time.
    pub fn remove(&self, id: EventId) {
        self.inner.borrow_mut().scheduler.remove(id);
    }

    /// Returns `true` if the event behind `id` has fired or been
    /// cancelled (or `id` never named an event of this simulator).
    pub fn is_expired(&self, id: EventId) -> bool {
        !self.inner.borrow().scheduler.is_valid(id)
    }

    /// Requests loop termination after the currently executing event.
    pub fn stop(&self) {
        self.inner.borrow_mut().stop_requested = true;
    }

    /// Requests loop termination at `delay` past the current time.
    ///
    /// Implemented as an ordinary scheduled event, so events inserted
    /// earlier for the same virtual time still run first (FIFO).
    pub fn stop_after(&self, delay: Time) -> EventId {
        let handle = self.handle();
        self.schedule(delay, move || {
            let _ = handle.stop();
        })
    }

    /// Processes the next scheduled event and advances virtual time.
    ///
    /// Returns `true` if more events remain afterwards. Used by test
    /// harnesses that want to single-step the simulation.
    pub fn step(&mut self) -> bool {
        let (time, context, event) = {
            let mut inner = self.inner.borrow_mut();
            if inner.scheduler.is_empty() {
                return false;
            }
            let (time, context, event) = inner.scheduler.pop_earliest();
            debug_assert!(time >= inner.now, "scheduler returned an event in the past");
            inner.now = time;
            inner.context = context;
            inner.events_executed += 1;
            (time, context, event)
        };
        tracing::trace!(time = %time, context, "dispatching event");
        // Borrow released: the callback may schedule, cancel, or stop.
        event.invoke();
        {
            let mut inner = self.inner.borrow_mut();
            inner.context = NO_CONTEXT;
            !inner.scheduler.is_empty()
        }
    }

    /// Runs the dispatch loop until the queue empties or a stop is
    /// requested.
    ///
    /// # Panics
    ///
    /// Panics if the simulator was destroyed.
    pub fn run(&mut self) {
        {
            let mut inner = self.inner.borrow_mut();
            assert!(
                inner.state != SimState::Destroyed,
                "run called after destroy"
            );
            inner.state = SimState::Running;
        }
        tracing::debug!("simulation loop starting");
        loop {
            {
                let inner = self.inner.borrow();
                if inner.stop_requested || inner.scheduler.is_empty() {
                    break;
                }
            }
            self.step();
        }
        let mut inner = self.inner.borrow_mut();
        inner.state = SimState::Stopped;
        inner.stop_requested = false;
        tracing::debug!(
            now = %inner.now,
            events = inner.events_executed,
            "simulation loop stopped"
        );
    }

    /// Tears down the simulator: drops every not-yet-invoked event, then
    /// runs the registered destroy hooks in order.
    ///
    /// Idempotent, and callable even if [`run`](Simulator::run) never was.
    /// Scheduling anything afterwards is fatal.
    pub fn destroy(&mut self) {
        let hooks = {
            let mut inner = self.inner.borrow_mut();
            if inner.state == SimState::Destroyed {
                return;
            }
            inner.state = SimState::Destroyed;
            let dropped = inner.scheduler.len();
            inner.scheduler.clear();
            if dropped > 0 {
                tracing::debug!(dropped, "destroy dropped pending events");
            }
            std::mem::take(&mut inner.destroy_hooks)
        };
        for hook in hooks {
            hook.invoke();
        }
    }
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

/// A weak, non-owning handle to a [`Simulator`].
///
/// Handles are what event callbacks, timers, and configuration code hold:
/// they never keep the simulator alive and every operation reports
/// [`SimError::SimulatorShutdown`] once it is gone.
#[derive(Debug, Clone)]
pub struct SimHandle {
    inner: Weak<RefCell<SimInner>>,
}

impl SimHandle {
    fn upgrade(&self) -> SimResult<Rc<RefCell<SimInner>>> {
        self.inner.upgrade().ok_or(SimError::SimulatorShutdown)
    }

    /// The current virtual time.
    pub fn now(&self) -> SimResult<Time> {
        Ok(self.upgrade()?.borrow().now)
    }

    /// The execution context of the currently dispatched event.
    pub fn context(&self) -> SimResult<u32> {
        Ok(self.upgrade()?.borrow().context)
    }

    /// Schedules `f` to run `delay` after the current time.
    ///
    /// Same contract as [`Simulator::schedule`], including the fatal
    /// negative-delay and after-destroy checks.
    pub fn schedule<F: FnOnce() + 'static>(&self, delay: Time, f: F) -> SimResult<EventId> {
        let inner = self.upgrade()?;
        let mut inner = inner.borrow_mut();
        let context = inner.context;
        Ok(inner.insert(delay, context, EventImpl::new(f)))
    }

    /// Schedules `f` at the current time.
    pub fn schedule_now<F: FnOnce() + 'static>(&self, f: F) -> SimResult<EventId> {
        self.schedule(Time::ZERO, f)
    }

    /// Schedules `f` tagged with an explicit execution context.
    pub fn schedule_with_context<F: FnOnce() + 'static>(
        &self,
        context: u32,
        delay: Time,
        f: F,
    ) -> SimResult<EventId> {
        let inner = self.upgrade()?;
        let mut inner = inner.borrow_mut();
        Ok(inner.insert(delay, context, EventImpl::new(f)))
    }

    /// Cancels a scheduled event (idempotent).
    pub fn cancel(&self, id: EventId) -> SimResult<()> {
        self.upgrade()?.borrow_mut().scheduler.cancel(id);
        Ok(())
    }

    /// Eagerly removes a scheduled event.
    pub fn remove(&self, id: EventId) -> SimResult<()> {
        self.upgrade()?.borrow_mut().scheduler.remove(id);
        Ok(())
    }

    /// Returns `true` if the event behind `id` has fired or been
    /// cancelled. A stale handle reports expired rather than failing.
    pub fn is_expired(&self, id: EventId) -> bool {
        match self.upgrade() {
            Ok(inner) => !inner.borrow().scheduler.is_valid(id),
            Err(_) => true,
        }
    }

    /// Requests loop termination after the currently executing event.
    pub fn stop(&self) -> SimResult<()> {
        self.upgrade()?.borrow_mut().stop_requested = true;
        Ok(())
    }
}
