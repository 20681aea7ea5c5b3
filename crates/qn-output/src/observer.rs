//! `TraceObserver<W>`: bridges `SimObserver` to an `OutputWriter`.

use qn_core::{NotificationBatch, SimTime};
use qn_event::ScheduledEvent;
use qn_sim::SimObserver;

use crate::row::{EventRow, NotificationRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`SimObserver`] that writes every dispatched event and every fired
/// notification to any [`OutputWriter`] backend.
///
/// Errors from the writer are stored internally because `SimObserver` methods
/// have no return value.  After `sim.run()` returns, check for errors with
/// [`take_error`][Self::take_error].
pub struct TraceObserver<W: OutputWriter> {
    writer:     W,
    batches:    u64,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> TraceObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, batches: 0, last_error: None }
    }

    /// Take the stored write error (if any) after `sim.run()` returns.
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Number of batches written so far.
    pub fn batches(&self) -> u64 {
        self.batches
    }

    /// Unwrap the inner writer (e.g. to inspect files after the run).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> SimObserver for TraceObserver<W> {
    fn on_event(&mut self, event: &ScheduledEvent) {
        let result = self.writer.write_event(&EventRow::from(event));
        self.store_err(result);
    }

    fn on_batch(&mut self, batch: &NotificationBatch) {
        let index = self.batches;
        self.batches += 1;
        let rows: Vec<NotificationRow> = batch
            .records
            .iter()
            .map(|n| NotificationRow::new(batch.time, index, n))
            .collect();
        let result = self.writer.write_notifications(&rows);
        self.store_err(result);
    }

    fn on_sim_end(&mut self, _final_time: SimTime, _dispatched: u64) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}
