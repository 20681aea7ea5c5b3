//! Scheduled events.

use qn_core::{EntityId, EventId, JobId, QueueRequest, SimTime};

/// What happens when a scheduled event fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventAction {
    /// An external operation scheduled for later (workload, credits, ...).
    Request(QueueRequest),
    /// A discipline timer: `job` has completed service at the target.
    Departure(JobId),
}

/// An entry of the [`EventList`][crate::EventList].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledEvent {
    pub id:     EventId,
    pub time:   SimTime,
    pub target: EntityId,
    pub action: EventAction,
}
