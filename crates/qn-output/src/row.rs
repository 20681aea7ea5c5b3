//! Plain data row types written by output backends.

use qn_core::{JobId, Notification, QueueRequest, SimTime};
use qn_event::{EventAction, ScheduledEvent};

/// Placeholder for "no job" in the `job` columns.
pub const NONE: u32 = JobId::INVALID.0;

/// One notification record of a fired batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NotificationRow {
    pub time:   f64,
    /// Position of the batch in the trace; records of one batch share it.
    pub batch:  u64,
    pub entity: u32,
    pub kind:   &'static str,
    /// `NONE` for queue-level notifications.
    pub job:    u32,
}

impl NotificationRow {
    pub fn new(time: SimTime, batch: u64, n: &Notification) -> Self {
        Self {
            time:   time.0,
            batch,
            entity: n.queue.0,
            kind:   n.kind.as_str(),
            job:    n.job.map_or(NONE, |j| j.0),
        }
    }
}

/// One dispatched event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventRow {
    pub event:  u64,
    pub time:   f64,
    pub target: u32,
    pub action: &'static str,
    pub job:    u32,
}

impl From<&ScheduledEvent> for EventRow {
    fn from(e: &ScheduledEvent) -> Self {
        let (action, job) = match e.action {
            EventAction::Departure(job) => ("departure", Some(job)),
            EventAction::Request(request) => match request {
                QueueRequest::Reset => ("reset", None),
                QueueRequest::Update => ("update", None),
                QueueRequest::Arrive { job } => ("arrive", Some(job)),
                QueueRequest::Revoke { job, .. } => ("revoke", Some(job)),
                QueueRequest::SetQueueAccessVacation(_) => ("queue-access-vacation", None),
                QueueRequest::SetServerAccessCredits(_) => ("server-access-credits", None),
            },
        };
        Self {
            event:  e.id.0,
            time:   e.time.0,
            target: e.target.0,
            action,
            job:    job.map_or(NONE, |j| j.0),
        }
    }
}
