use std::cell::RefCell;
use std::rc::Rc;

use nanosim::{sim_random, SimState, Simulator, Time, NO_CONTEXT};

fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) -> Box<dyn FnOnce()>) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let make = {
        let log = Rc::clone(&log);
        move |tag: &'static str| -> Box<dyn FnOnce()> {
            let log = Rc::clone(&log);
            Box::new(move || log.borrow_mut().push(tag))
        }
    };
    (log, make)
}

#[test]
fn events_run_in_time_order_regardless_of_insertion_order() {
    let mut sim = Simulator::new();
    let (log, event) = recorder();

    sim.schedule(Time::millis(30), event("c"));
    sim.schedule(Time::millis(10), event("a"));
    sim.schedule(Time::millis(20), event("b"));
    sim.run();

    assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
    assert_eq!(sim.now(), Time::millis(30));
    assert_eq!(sim.events_executed(), 3);
}

#[test]
fn same_time_events_run_in_insertion_order() {
    let mut sim = Simulator::new();
    let (log, event) = recorder();

    for tag in ["first", "second", "third"] {
        sim.schedule(Time::millis(5), event(tag));
    }
    sim.run();

    assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
}

#[test]
fn zero_delay_event_is_never_reentrant() {
    let mut sim = Simulator::new();
    let log = Rc::new(RefCell::new(Vec::new()));

    let handle = sim.handle();
    let inner_log = Rc::clone(&log);
    sim.schedule(Time::millis(1), move || {
        let nested_log = Rc::clone(&inner_log);
        handle
            .schedule_now(move || nested_log.borrow_mut().push("nested"))
            .expect("simulator is alive");
        // Runs to completion before the nested event is dispatched.
        inner_log.borrow_mut().push("outer");
    });
    sim.run();

    assert_eq!(*log.borrow(), vec!["outer", "nested"]);
    // Time did not advance for the zero-delay event.
    assert_eq!(sim.now(), Time::millis(1));
}

#[test]
fn clock_advances_to_each_event_and_stays_put_after() {
    let mut sim = Simulator::new();
    assert_eq!(sim.now(), Time::ZERO);

    let handle = sim.handle();
    let observed = Rc::new(RefCell::new(Time::ZERO));
    let observed_in_event = Rc::clone(&observed);
    sim.schedule(Time::seconds(2), move || {
        *observed_in_event.borrow_mut() = handle.now().expect("simulator is alive");
    });
    sim.run();

    assert_eq!(*observed.borrow(), Time::seconds(2));
    assert_eq!(sim.now(), Time::seconds(2));
    assert_eq!(sim.state(), SimState::Stopped);
}

#[test]
fn context_is_visible_during_dispatch_only() {
    let mut sim = Simulator::new();
    assert_eq!(sim.context(), NO_CONTEXT);

    let handle = sim.handle();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let seen_in_event = Rc::clone(&seen);
    let inner_handle = handle.clone();
    sim.schedule_with_context(7, Time::millis(1), move || {
        seen_in_event
            .borrow_mut()
            .push(inner_handle.context().expect("simulator is alive"));
        // An event scheduled from inside inherits the current context.
        let nested_seen = Rc::clone(&seen_in_event);
        let nested_handle = inner_handle.clone();
        inner_handle
            .schedule(Time::millis(1), move || {
                nested_seen
                    .borrow_mut()
                    .push(nested_handle.context().expect("simulator is alive"));
            })
            .expect("simulator is alive");
    });
    sim.run();

    assert_eq!(*seen.borrow(), vec![7, 7]);
    assert_eq!(sim.context(), NO_CONTEXT);
}

#[test]
fn step_single_steps_and_reports_remaining_work() {
    let mut sim = Simulator::new();
    let (log, event) = recorder();

    sim.schedule(Time::millis(1), event("a"));
    sim.schedule(Time::millis(2), event("b"));

    assert!(sim.step());
    assert_eq!(*log.borrow(), vec!["a"]);
    assert_eq!(sim.now(), Time::millis(1));
    assert!(!sim.step());
    assert_eq!(*log.borrow(), vec!["a", "b"]);
    assert!(!sim.step());
}

#[test]
fn identical_seeds_replay_identical_random_draws() {
    let draws = |seed: u64| {
        let mut sim = Simulator::with_seed(seed);
        let out = Rc::new(RefCell::new(Vec::new()));
        for i in 0..5 {
            let out = Rc::clone(&out);
            sim.schedule(Time::millis(i), move || {
                out.borrow_mut().push(sim_random::<u64>());
            });
        }
        sim.run();
        Rc::try_unwrap(out).expect("events dropped their clones").into_inner()
    };

    let first = draws(42);
    let second = draws(42);
    let different = draws(43);
    assert_eq!(first, second);
    assert_ne!(first, different);
}
