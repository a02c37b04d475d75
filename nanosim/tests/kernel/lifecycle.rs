use std::cell::RefCell;
use std::rc::Rc;

use nanosim::{SimError, SimState, Simulator, Time};

#[test]
fn stop_halts_after_the_current_event() {
    let mut sim = Simulator::new();
    let log = Rc::new(RefCell::new(Vec::new()));

    let handle = sim.handle();
    {
        let log = Rc::clone(&log);
        sim.schedule(Time::millis(1), move || {
            log.borrow_mut().push("ran");
            handle.stop().expect("simulator is alive");
        });
    }
    {
        let log = Rc::clone(&log);
        sim.schedule(Time::millis(2), move || log.borrow_mut().push("after stop"));
    }
    sim.run();

    assert_eq!(*log.borrow(), vec!["ran"]);
    assert_eq!(sim.state(), SimState::Stopped);
    // The stop consumed the request but left the later event queued.
    assert_eq!(sim.pending_event_count(), 1);
}

#[test]
fn stop_after_lets_earlier_same_time_events_run_first() {
    let mut sim = Simulator::new();
    let log = Rc::new(RefCell::new(Vec::new()));

    {
        let log = Rc::clone(&log);
        sim.schedule(Time::millis(5), move || log.borrow_mut().push("before"));
    }
    sim.stop_after(Time::millis(5));
    {
        let log = Rc::clone(&log);
        // Same virtual time but inserted after the stop event, so it must
        // not run.
        sim.schedule(Time::millis(5), move || log.borrow_mut().push("after"));
    }
    sim.run();

    assert_eq!(*log.borrow(), vec!["before"]);
    assert_eq!(sim.now(), Time::millis(5));
}

#[test]
fn run_resumes_after_a_stop() {
    let mut sim = Simulator::new();
    let log = Rc::new(RefCell::new(Vec::new()));

    let handle = sim.handle();
    {
        let log = Rc::clone(&log);
        sim.schedule(Time::millis(1), move || {
            log.borrow_mut().push("first");
            handle.stop().expect("simulator is alive");
        });
    }
    {
        let log = Rc::clone(&log);
        sim.schedule(Time::millis(2), move || log.borrow_mut().push("second"));
    }
    sim.run();
    assert_eq!(*log.borrow(), vec!["first"]);

    // The stop request does not survive into the next run.
    sim.run();
    assert_eq!(*log.borrow(), vec!["first", "second"]);
}

#[test]
fn destroy_drops_pending_events_and_runs_hooks_in_order() {
    let mut sim = Simulator::new();
    let log = Rc::new(RefCell::new(Vec::new()));

    {
        let log = Rc::clone(&log);
        sim.schedule(Time::millis(1), move || log.borrow_mut().push("event"));
    }
    for tag in ["hook one", "hook two"] {
        let log = Rc::clone(&log);
        sim.schedule_destroy(move || log.borrow_mut().push(tag));
    }
    sim.destroy();

    assert_eq!(*log.borrow(), vec!["hook one", "hook two"]);
    assert_eq!(sim.state(), SimState::Destroyed);
    assert_eq!(sim.pending_event_count(), 0);

    // Idempotent: hooks do not run twice.
    sim.destroy();
    assert_eq!(log.borrow().len(), 2);
}

#[test]
fn destroy_without_run_is_legal() {
    let mut sim = Simulator::new();
    sim.schedule(Time::millis(1), || {});
    sim.destroy();
    assert_eq!(sim.state(), SimState::Destroyed);
}

#[test]
#[should_panic(expected = "after destroy")]
fn scheduling_after_destroy_panics() {
    let mut sim = Simulator::new();
    sim.destroy();
    sim.schedule(Time::millis(1), || {});
}

#[test]
#[should_panic(expected = "negative delay")]
fn negative_delay_panics() {
    let sim = Simulator::new();
    sim.schedule(Time::millis(-1), || {});
}

#[test]
fn handles_outlive_the_simulator_gracefully() {
    let handle = {
        let sim = Simulator::new();
        sim.handle()
    };

    assert!(matches!(handle.now(), Err(SimError::SimulatorShutdown)));
    assert!(matches!(
        handle.schedule(Time::millis(1), || {}),
        Err(SimError::SimulatorShutdown)
    ));
    let stale = {
        let sim = Simulator::new();
        sim.schedule(Time::millis(1), || {})
    };
    // A handle to a gone simulator reports every event as expired.
    assert!(handle.is_expired(stale));
}
