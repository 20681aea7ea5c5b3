//! Listener trait and two stock listeners.

use std::cell::RefCell;
use std::rc::Rc;

use qn_core::{EntityId, Notification, NotificationBatch, SimTime};
use tracing::trace;

/// Observer of an entity's notifications.
///
/// All methods default to no-ops.  A fired batch is delivered once through
/// [`on_batch`][Self::on_batch], then record by record through
/// [`on_notification`][Self::on_notification].
pub trait QueueListener {
    /// The entity advanced its clock to `time`.
    fn on_update(&mut self, _time: SimTime, _entity: EntityId) {}

    fn on_batch(&mut self, _batch: &NotificationBatch) {}

    fn on_notification(&mut self, _time: SimTime, _notification: &Notification) {}
}

/// Logs every batch at `trace` level.
#[derive(Debug, Default)]
pub struct TracingListener;

impl QueueListener for TracingListener {
    fn on_batch(&mut self, batch: &NotificationBatch) {
        trace!(
            entity = %batch.entity,
            time = %batch.time,
            kinds = ?batch.kinds(),
            "notification batch"
        );
    }
}

/// Records every batch it receives.  Clones share the same log, so a test
/// can keep one handle and register another with the queue.
#[derive(Debug, Clone, Default)]
pub struct NotificationLog {
    batches: Rc<RefCell<Vec<NotificationBatch>>>,
    updates: Rc<RefCell<Vec<SimTime>>>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all batches received so far.
    pub fn batches(&self) -> Vec<NotificationBatch> {
        self.batches.borrow().clone()
    }

    /// Drain the log.
    pub fn take(&self) -> Vec<NotificationBatch> {
        std::mem::take(&mut *self.batches.borrow_mut())
    }

    /// Times reported through `on_update`.
    pub fn updates(&self) -> Vec<SimTime> {
        self.updates.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.batches.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.borrow().is_empty()
    }
}

impl QueueListener for NotificationLog {
    fn on_update(&mut self, time: SimTime, _entity: EntityId) {
        self.updates.borrow_mut().push(time);
    }

    fn on_batch(&mut self, batch: &NotificationBatch) {
        self.batches.borrow_mut().push(batch.clone());
    }
}
