//! The `OutputWriter` trait implemented by all backend writers.

use crate::{EventRow, NotificationRow, OutputResult};

/// Trait implemented by trace backends.
///
/// Errors surface through [`TraceObserver::take_error`][crate::TraceObserver::take_error]
/// when the writer is driven by the observer.
pub trait OutputWriter {
    /// Write the records of one batch.
    fn write_notifications(&mut self, rows: &[NotificationRow]) -> OutputResult<()>;

    /// Write one dispatched event.
    fn write_event(&mut self, row: &EventRow) -> OutputResult<()>;

    /// Flush all underlying file handles.
    ///
    /// Idempotent: safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
