use qn_core::{EntityId, QnError};
use qn_event::EventError;
use qn_queue::QueueError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("queue {0} is not a root queue of this simulation")]
    UnknownQueue(EntityId),

    #[error("no registered queue owns entity {0}")]
    UnownedTarget(EntityId),

    #[error("event limit reached after {0} dispatched events")]
    EventLimit(u64),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Event(#[from] EventError),

    #[error(transparent)]
    Core(#[from] QnError),
}

impl SimError {
    /// `true` if a queue reported an internal invariant violation.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SimError::Queue(e) if e.is_fatal())
    }
}

pub type SimResult<T> = Result<T, SimError>;
