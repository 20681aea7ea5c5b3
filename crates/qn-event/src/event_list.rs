//! `EventList`: time-ordered set of scheduled events.
//!
//! Events are keyed by `(time, sequence)`, so events scheduled for the same
//! time fire in the order they were scheduled.  Delivery is strictly
//! non-decreasing in time.
//!
//! `BTreeMap` gives O(log E) insert, pop and cancel where E is the number of
//! pending events.  A side map from `EventId` to its time makes cancel-by-id
//! possible without a scan.

use std::collections::BTreeMap;

use qn_core::{EntityId, EventId, SimTime};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::{EventAction, EventError, EventResult, ScheduledEvent};

/// A priority queue of [`ScheduledEvent`]s plus the current simulation time.
pub struct EventList {
    inner:   BTreeMap<(SimTime, u64), ScheduledEvent>,
    /// Event id → time, for `cancel`.  The sequence number is the id itself.
    pending: FxHashMap<EventId, SimTime>,
    time:    SimTime,
    next:    u64,
}

impl Default for EventList {
    fn default() -> Self {
        Self {
            inner:   BTreeMap::new(),
            pending: FxHashMap::default(),
            time:    SimTime::NEG_INFINITY,
            next:    0,
        }
    }
}

impl EventList {
    /// An empty list at time minus infinity.
    pub fn new() -> Self {
        Self::default()
    }

    /// The time of the last delivered event (or of the last reset).
    #[inline]
    pub fn current_time(&self) -> SimTime {
        self.time
    }

    /// Schedule `action` on `target` at `time`.
    pub fn schedule(
        &mut self,
        time:   SimTime,
        target: EntityId,
        action: EventAction,
    ) -> EventResult<EventId> {
        let time = SimTime::try_new(time.0)?;
        if time < self.time {
            return Err(EventError::InThePast { now: self.time, requested: time });
        }
        let id = EventId(self.next);
        self.next += 1;
        self.inner.insert((time, id.0), ScheduledEvent { id, time, target, action });
        self.pending.insert(id, time);
        trace!(?id, %time, %target, ?action, "event scheduled");
        Ok(id)
    }

    /// Remove a pending event.  Returns `false` if it already fired or was
    /// cancelled before.
    pub fn cancel(&mut self, id: EventId) -> bool {
        match self.pending.remove(&id) {
            Some(time) => self.inner.remove(&(time, id.0)).is_some(),
            None => false,
        }
    }

    /// Remove and return the earliest event, advancing the current time.
    pub fn pop_next(&mut self) -> Option<ScheduledEvent> {
        let (_, event) = self.inner.pop_first()?;
        self.pending.remove(&event.id);
        self.time = event.time;
        Some(event)
    }

    /// Time of the earliest pending event, or `None` if empty.
    pub fn peek_time(&self) -> Option<SimTime> {
        self.inner.keys().next().map(|&(t, _)| t)
    }

    /// Drop every pending event and move the clock to `start`.
    pub fn reset(&mut self, start: SimTime) {
        self.inner.clear();
        self.pending.clear();
        self.time = start;
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// `true` if `id` is still pending.
    pub fn is_pending(&self, id: EventId) -> bool {
        self.pending.contains_key(&id)
    }
}
