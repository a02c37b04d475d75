//! Priority-ordered event storage with deterministic tie-breaking.
//!
//! The scheduler pairs a binary heap of ordering keys with a
//! generation-checked slot arena that owns the events themselves. Keys are
//! ordered by (time, insertion sequence), so events scheduled for the same
//! virtual time pop in FIFO order, a correctness guarantee for replayable
//! simulations rather than an implementation accident. Cancellation tombstones
//! the slot in O(1) and leaves the heap key to be skipped lazily.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::event::{EventId, EventImpl};
use crate::time::Time;

/// Heap key for a scheduled event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EventKey {
    time: Time,
    sequence: u64,
    slot: usize,
    generation: u64,
}

impl PartialOrd for EventKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EventKey {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max heap, but we want earliest time first, so the
        // comparison is reversed. Sequence numbers break ties at equal time
        // (also reversed) to keep FIFO insertion order.
        match other.time.cmp(&self.time) {
            Ordering::Equal => other.sequence.cmp(&self.sequence),
            ord => ord,
        }
    }
}

#[derive(Debug)]
struct Slot {
    generation: u64,
    entry: Option<Entry>,
}

#[derive(Debug)]
struct Entry {
    context: u32,
    event: EventImpl,
}

/// Priority-ordered container of (time, event) pairs.
///
/// Insert and pop are O(log n); cancel and remove are O(1). Popping an
/// empty scheduler is a contract violation and panics.
#[derive(Debug, Default)]
pub struct Scheduler {
    heap: BinaryHeap<EventKey>,
    slots: Vec<Slot>,
    free: Vec<usize>,
    next_sequence: u64,
    live: usize,
}

impl Scheduler {
    /// Creates an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an event to run at `time` under execution context `context`.
    pub fn insert(&mut self, time: Time, context: u32, event: EventImpl) -> EventId {
        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    entry: None,
                });
                self.slots.len() - 1
            }
        };
        let generation = self.slots[slot].generation;
        self.slots[slot].entry = Some(Entry { context, event });

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.heap.push(EventKey {
            time,
            sequence,
            slot,
            generation,
        });
        self.live += 1;

        EventId {
            slot,
            generation,
            time,
        }
    }

    /// Returns `true` if `id` still names a pending (not fired, not
    /// cancelled) event.
    pub fn is_valid(&self, id: EventId) -> bool {
        self.slots
            .get(id.slot)
            .map(|s| s.generation == id.generation && s.entry.is_some())
            .unwrap_or(false)
    }

    /// Cancels the event named by `id`.
    ///
    /// The deferred call is dropped immediately; the heap key stays behind
    /// as a tombstone and is reclaimed when it reaches the front. Stale
    /// handles are a safe no-op, so double-cancel and cancel-after-fire
    /// cost nothing.
    pub fn cancel(&mut self, id: EventId) {
        if let Some(slot) = self.slots.get_mut(id.slot) {
            if slot.generation == id.generation && slot.entry.take().is_some() {
                self.live -= 1;
            }
        }
    }

    /// Eagerly removes the event named by `id`, releasing its slot now.
    ///
    /// Differs from [`cancel`](Scheduler::cancel) only in reclaiming the
    /// arena slot immediately; the heap key is skipped later via the
    /// generation check.
    pub fn remove(&mut self, id: EventId) {
        if let Some(slot) = self.slots.get_mut(id.slot) {
            if slot.generation == id.generation && slot.entry.take().is_some() {
                slot.generation += 1;
                self.free.push(id.slot);
                self.live -= 1;
            }
        }
    }

    /// Drops tombstoned keys sitting at the front of the heap.
    fn prune(&mut self) {
        while let Some(&key) = self.heap.peek() {
            let slot = &mut self.slots[key.slot];
            if slot.generation == key.generation && slot.entry.is_some() {
                return;
            }
            self.heap.pop();
            if slot.generation == key.generation {
                // Cancelled lazily: the slot was kept allocated until its
                // key surfaced. Reclaim it now.
                slot.generation += 1;
                self.free.push(key.slot);
            }
        }
    }

    /// The virtual time of the earliest pending event, if any.
    pub fn peek_earliest_time(&mut self) -> Option<Time> {
        self.prune();
        self.heap.peek().map(|k| k.time)
    }

    /// Removes and returns the earliest pending event.
    ///
    /// # Panics
    ///
    /// Panics if the scheduler is empty. That is a programming error in
    /// the caller, never a condition to paper over with a dummy event.
    pub fn pop_earliest(&mut self) -> (Time, u32, EventImpl) {
        self.prune();
        let key = self
            .heap
            .pop()
            .expect("pop_earliest called on an empty scheduler");
        let slot = &mut self.slots[key.slot];
        let entry = slot.entry.take().expect("pruned head must be live");
        slot.generation += 1;
        self.free.push(key.slot);
        self.live -= 1;
        (key.time, entry.context, entry.event)
    }

    /// Returns `true` if no pending events remain.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// The number of pending events.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Drops every pending event without invoking it.
    ///
    /// Rebuilds the free list from scratch: with the heap gone, lazily
    /// cancelled slots would otherwise never see their tombstone key
    /// surface and would leak. Every slot gets a fresh generation, so
    /// handles issued before the clear stay stale.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.free.clear();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            slot.entry = None;
            slot.generation += 1;
            self.free.push(index);
        }
        self.live = 0;
    }
}
