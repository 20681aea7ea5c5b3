//! Structured requests for indirect (event-list-driven) operation invocation.

use crate::{Credits, JobId};

/// An external queue operation, either invoked directly or carried by a
/// scheduled event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueRequest {
    Reset,
    Update,
    Arrive { job: JobId },
    Revoke { job: JobId, interrupt_service: bool },
    SetQueueAccessVacation(bool),
    SetServerAccessCredits(Credits),
}

/// The reply to a [`QueueRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueReply {
    Done,
    /// Whether the revocation was accepted.
    Revoked(bool),
}
