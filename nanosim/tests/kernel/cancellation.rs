use std::cell::RefCell;
use std::rc::Rc;

use nanosim::{EventId, Simulator, Time};

#[test]
fn cancelled_event_never_runs_but_others_do() {
    let mut sim = Simulator::new();
    let log = Rc::new(RefCell::new(Vec::new()));

    let doomed = {
        let log = Rc::clone(&log);
        sim.schedule(Time::millis(10), move || log.borrow_mut().push("doomed"))
    };
    {
        let log = Rc::clone(&log);
        sim.schedule(Time::millis(20), move || log.borrow_mut().push("kept"));
    }

    assert!(!sim.is_expired(doomed));
    sim.cancel(doomed);
    assert!(sim.is_expired(doomed));
    sim.run();

    assert_eq!(*log.borrow(), vec!["kept"]);
    assert_eq!(sim.events_executed(), 1);
    // Time never advanced to the cancelled event's timestamp alone; the
    // surviving event carried the clock forward.
    assert_eq!(sim.now(), Time::millis(20));
}

#[test]
fn cancel_is_idempotent_and_safe_after_firing() {
    let mut sim = Simulator::new();
    let fired = Rc::new(RefCell::new(0));

    let id = {
        let fired = Rc::clone(&fired);
        sim.schedule(Time::millis(1), move || *fired.borrow_mut() += 1)
    };
    sim.cancel(id);
    sim.cancel(id);
    sim.run();
    assert_eq!(*fired.borrow(), 0);

    let id = {
        let fired = Rc::clone(&fired);
        sim.schedule(Time::millis(1), move || *fired.borrow_mut() += 1)
    };
    sim.run();
    assert_eq!(*fired.borrow(), 1);
    assert!(sim.is_expired(id));
    // Cancelling after the event fired is a no-op.
    sim.cancel(id);
    assert_eq!(*fired.borrow(), 1);
}

#[test]
fn cancel_from_inside_an_earlier_event() {
    let mut sim = Simulator::new();
    let fired = Rc::new(RefCell::new(false));

    let victim = {
        let fired = Rc::clone(&fired);
        sim.schedule(Time::millis(10), move || *fired.borrow_mut() = true)
    };
    let handle = sim.handle();
    sim.schedule(Time::millis(5), move || {
        handle.cancel(victim).expect("simulator is alive");
    });
    sim.run();

    assert!(!*fired.borrow());
    assert_eq!(sim.events_executed(), 1);
}

#[test]
fn removed_event_slot_is_reused_without_confusing_stale_handles() {
    let mut sim = Simulator::new();
    let log = Rc::new(RefCell::new(Vec::new()));

    let removed = {
        let log = Rc::clone(&log);
        sim.schedule(Time::millis(10), move || log.borrow_mut().push("removed"))
    };
    sim.remove(removed);
    assert!(sim.is_expired(removed));

    // Eager removal recycles storage; a new event may land in the same
    // slot, and the stale handle must not be able to touch it.
    let replacement = {
        let log = Rc::clone(&log);
        sim.schedule(Time::millis(20), move || log.borrow_mut().push("replacement"))
    };
    sim.cancel(removed);
    sim.remove(removed);
    assert!(!sim.is_expired(replacement));

    sim.run();
    assert_eq!(*log.borrow(), vec!["replacement"]);
}

#[test]
fn the_invalid_handle_names_nothing() {
    let sim = Simulator::new();
    let pending = sim.schedule(Time::millis(1), || {});

    assert!(sim.is_expired(EventId::INVALID));
    sim.cancel(EventId::INVALID);
    sim.remove(EventId::INVALID);
    assert!(!sim.is_expired(pending));
}

#[test]
fn pending_count_tracks_cancellation() {
    let mut sim = Simulator::new();
    let a = sim.schedule(Time::millis(1), || {});
    let _b = sim.schedule(Time::millis(2), || {});
    assert_eq!(sim.pending_event_count(), 2);
    assert!(sim.has_pending_events());

    sim.cancel(a);
    assert_eq!(sim.pending_event_count(), 1);

    sim.run();
    assert!(!sim.has_pending_events());
}
