//! Simulation observer trait for tracing and data collection.

use qn_core::{NotificationBatch, SimTime};
use qn_event::ScheduledEvent;

/// Callbacks invoked by [`Simulation`][crate::Simulation] as it dispatches
/// events.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example: departure counter
///
/// ```rust
/// use qn_core::{NotificationBatch, NotificationKind};
/// use qn_sim::SimObserver;
///
/// #[derive(Default)]
/// struct Departures(usize);
///
/// impl SimObserver for Departures {
///     fn on_batch(&mut self, batch: &NotificationBatch) {
///         self.0 += batch.count(NotificationKind::Departure);
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called before an event is handed to its target's root queue.
    fn on_event(&mut self, _event: &ScheduledEvent) {}

    /// Called once for every batch a root queue fired, in firing order.
    ///
    /// Batches fired by sub-queues of a composite never reach the observer;
    /// the composite reduces them into its own batches.
    fn on_batch(&mut self, _batch: &NotificationBatch) {}

    /// Called once when [`run`][crate::Simulation::run] finishes.
    fn on_sim_end(&mut self, _final_time: SimTime, _dispatched: u64) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
