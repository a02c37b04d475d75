//! A convenience one-shot timer over the simulator.
//!
//! A timer remembers a bound function and a delay, and wraps the
//! schedule/cancel lifecycle in a small state machine. The state lives in
//! a shared cell (the same handle pattern the simulator uses) so the
//! scheduled event can flip the timer to `Expired` before invoking the
//! user function, so re-entrant `is_running` queries from inside the
//! callback observe "it already fired".

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::SimResult;
use crate::event::EventId;
use crate::simulator::SimHandle;
use crate::time::Time;

/// The observable state of a [`Timer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    /// An underlying event is scheduled and has not fired.
    Running,
    /// No event outstanding: freshly constructed, fired, or cancelled.
    Expired,
    /// Previously running; the remaining delay is captured and the
    /// underlying event cancelled.
    Suspended,
}

/// What a timer does with a still-running event when dropped.
///
/// The default is [`DestroyPolicy::CheckOnDestroy`]: dropping a running
/// timer is treated as a bug and fails fast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DestroyPolicy {
    /// Silently cancel a still-running timer on drop.
    CancelOnDestroy = 0b001,
    /// Eagerly remove the underlying event from the scheduler on drop.
    RemoveOnDestroy = 0b010,
    /// Panic if the timer is still running when dropped.
    CheckOnDestroy = 0b100,
}

#[derive(Default)]
struct TimerInner {
    state: Option<TimerStateData>,
    delay: Time,
    function: Option<Rc<dyn Fn()>>,
}

/// Concrete per-state bookkeeping. `None` in [`TimerInner::state`] means
/// `Expired`.
enum TimerStateData {
    Running(EventId),
    Suspended(Time),
}

/// A one-shot timer with suspend/resume and a configurable destroy policy.
///
/// ```text
/// Expired --schedule--> Running --fires--> Expired
///    ^                     | \--cancel--> Expired
///    |                 suspend
///    |                     v
///    \----cancel---- Suspended --resume--> Running
/// ```
pub struct Timer {
    sim: SimHandle,
    inner: Rc<RefCell<TimerInner>>,
    policy: DestroyPolicy,
}

impl Timer {
    /// Creates an expired timer with the default
    /// [`DestroyPolicy::CheckOnDestroy`] policy.
    pub fn new(sim: SimHandle) -> Self {
        Self::with_destroy_policy(sim, DestroyPolicy::CheckOnDestroy)
    }

    /// Creates an expired timer with an explicit destroy policy.
    pub fn with_destroy_policy(sim: SimHandle, policy: DestroyPolicy) -> Self {
        Timer {
            sim,
            inner: Rc::new(RefCell::new(TimerInner::default())),
            policy,
        }
    }

    /// Binds the function invoked on expiry.
    ///
    /// Arguments are bound by capture: a closure holding whatever the
    /// callback needs replaces separate function/argument setters.
    pub fn set_function<F: Fn() + 'static>(&self, f: F) {
        self.inner.borrow_mut().function = Some(Rc::new(f));
    }

    /// Sets the default delay used by [`schedule`](Timer::schedule).
    pub fn set_delay(&self, delay: Time) {
        self.inner.borrow_mut().delay = delay;
    }

    /// The configured default delay.
    pub fn delay(&self) -> Time {
        self.inner.borrow().delay
    }

    /// Schedules the timer with its configured delay.
    pub fn schedule(&self) -> SimResult<()> {
        let delay = self.inner.borrow().delay;
        self.schedule_with_delay(delay)
    }

    /// Schedules the timer with an explicit delay.
    ///
    /// # Panics
    ///
    /// Panics if the timer is already running, or if no function was
    /// bound. Both are usage errors.
    pub fn schedule_with_delay(&self, delay: Time) -> SimResult<()> {
        {
            let inner = self.inner.borrow();
            assert!(
                !matches!(inner.state, Some(TimerStateData::Running(_))),
                "schedule called on a running timer"
            );
            assert!(
                inner.function.is_some(),
                "schedule called before set_function"
            );
        }
        let function = self
            .inner
            .borrow()
            .function
            .clone()
            .expect("checked above");
        let state = Rc::clone(&self.inner);
        let id = self.sim.schedule(delay, move || {
            // Transition before invoking: the callback observes Expired.
            state.borrow_mut().state = None;
            function();
        })?;
        self.inner.borrow_mut().state = Some(TimerStateData::Running(id));
        Ok(())
    }

    /// Cancels the underlying event, if any. Transitions to `Expired`
    /// from any state; cancelling an expired timer is a no-op.
    pub fn cancel(&self) {
        if let Some(TimerStateData::Running(id)) = self.inner.borrow_mut().state.take() {
            let _ = self.sim.cancel(id);
        }
    }

    /// Like [`cancel`](Timer::cancel), but eagerly removes the event from
    /// the scheduler's storage.
    pub fn remove(&self) {
        if let Some(TimerStateData::Running(id)) = self.inner.borrow_mut().state.take() {
            let _ = self.sim.remove(id);
        }
    }

    /// Suspends a running timer, capturing the remaining delay.
    ///
    /// # Panics
    ///
    /// Panics if the timer is not running; suspending an expired or
    /// already-suspended timer is a contract violation.
    pub fn suspend(&self) {
        let mut inner = self.inner.borrow_mut();
        match inner.state.take() {
            Some(TimerStateData::Running(id)) => {
                let now = self.sim.now().unwrap_or(Time::ZERO);
                let left = id.time().saturating_sub(now);
                let _ = self.sim.cancel(id);
                inner.state = Some(TimerStateData::Suspended(left));
            }
            other => {
                inner.state = other;
                panic!("suspend called on a timer that is not running");
            }
        }
    }

    /// Resumes a suspended timer with its captured remaining delay.
    ///
    /// # Panics
    ///
    /// Panics if the timer is not suspended.
    pub fn resume(&self) -> SimResult<()> {
        let left = {
            let mut inner = self.inner.borrow_mut();
            match inner.state.take() {
                Some(TimerStateData::Suspended(left)) => left,
                other => {
                    inner.state = other;
                    panic!("resume called on a timer that is not suspended");
                }
            }
        };
        self.schedule_with_delay(left)
    }

    /// The current state.
    pub fn state(&self) -> TimerState {
        match self.inner.borrow().state {
            Some(TimerStateData::Running(_)) => TimerState::Running,
            Some(TimerStateData::Suspended(_)) => TimerState::Suspended,
            None => TimerState::Expired,
        }
    }

    /// Returns `true` if an underlying event is outstanding.
    pub fn is_running(&self) -> bool {
        self.state() == TimerState::Running
    }

    /// Returns `true` if no underlying event is outstanding.
    pub fn is_expired(&self) -> bool {
        self.state() == TimerState::Expired
    }

    /// Returns `true` if the timer is suspended.
    pub fn is_suspended(&self) -> bool {
        self.state() == TimerState::Suspended
    }

    /// Virtual time remaining until expiry: the distance to the scheduled
    /// fire time while running, the captured remainder while suspended,
    /// zero when expired.
    pub fn delay_left(&self) -> Time {
        match self.inner.borrow().state {
            Some(TimerStateData::Running(id)) => {
                let now = self.sim.now().unwrap_or(Time::ZERO);
                id.time().saturating_sub(now)
            }
            Some(TimerStateData::Suspended(left)) => left,
            None => Time::ZERO,
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        match self.policy {
            DestroyPolicy::CancelOnDestroy => self.cancel(),
            DestroyPolicy::RemoveOnDestroy => self.remove(),
            DestroyPolicy::CheckOnDestroy => {
                if self.is_running() && !std::thread::panicking() {
                    panic!("timer destroyed while still running");
                }
            }
        }
    }
}

impl std::fmt::Debug for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timer")
            .field("state", &self.state())
            .field("delay", &self.delay())
            .field("policy", &self.policy)
            .finish()
    }
}
