use qn_core::{QnError, SimTime};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("cannot schedule at {requested}: event list is already at {now}")]
    InThePast { now: SimTime, requested: SimTime },

    #[error(transparent)]
    Core(#[from] QnError),
}

pub type EventResult<T> = Result<T, EventError>;
