//! Framework error type.
//!
//! Sub-crates define their own error enums and wrap `QnError` as one variant
//! via `#[from]`.

use thiserror::Error;

use crate::JobId;

/// The base error type for `qn-core` lookups and configuration.
#[derive(Debug, Error)]
pub enum QnError {
    #[error("job {0} not found")]
    JobNotFound(JobId),

    #[error("invalid simulation time {0}")]
    InvalidTime(f64),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for `qn-core`.
pub type QnResult<T> = Result<T, QnError>;
