//! Queue error type.
//!
//! Two classes only, both unrecoverable for the current run:
//!
//! - [`QueueError::InvalidArgument`]: malformed caller input, rejected before
//!   any state mutation.
//! - [`QueueError::IllegalState`]: an internal invariant was violated.  This
//!   points at a defect in the kernel or in a discipline and must stop the
//!   simulation.

use qn_core::{EntityId, JobId, QnError, SimTime};
use qn_event::EventError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("invalid argument at {entity} ({time}, job {job:?}): {reason}")]
    InvalidArgument {
        entity: EntityId,
        time:   SimTime,
        job:    Option<JobId>,
        reason: String,
    },

    #[error("illegal state at {entity} ({time}, job {job:?}): {reason}")]
    IllegalState {
        entity: EntityId,
        time:   SimTime,
        job:    Option<JobId>,
        reason: String,
    },

    #[error(transparent)]
    Core(#[from] QnError),

    #[error(transparent)]
    Event(#[from] EventError),
}

impl QueueError {
    pub fn invalid(
        entity: EntityId,
        time:   SimTime,
        job:    Option<JobId>,
        reason: impl Into<String>,
    ) -> Self {
        QueueError::InvalidArgument { entity, time, job, reason: reason.into() }
    }

    pub fn illegal(
        entity: EntityId,
        time:   SimTime,
        job:    Option<JobId>,
        reason: impl Into<String>,
    ) -> Self {
        QueueError::IllegalState { entity, time, job, reason: reason.into() }
    }

    /// `true` for internal invariant violations, which must abort the run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, QueueError::IllegalState { .. })
    }

    /// `true` for rejected caller input (including unknown job handles and
    /// events scheduled in the past).
    pub fn is_invalid_argument(&self) -> bool {
        !self.is_fatal()
    }
}

pub type QueueResult<T> = Result<T, QueueError>;
