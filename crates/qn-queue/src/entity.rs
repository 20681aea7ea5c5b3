//! `EntityCore`: state shared by every simulated entity.
//!
//! Identity, last-update time, the pending-notification batch, listeners,
//! and the outbox of fired batches.  The outbox is how an owner (a composite
//! queue or the simulation runner) consumes what an entity released: after
//! calling a top-level operation it drains the entity's fired batches with
//! [`take_fired`][EntityCore::take_fired].

use std::fmt;

use qn_core::{EntityId, JobId, Notification, NotificationBatch, NotificationKind, SimTime};

use crate::batch::PendingBatch;
use crate::QueueListener;

pub struct EntityCore {
    id:          EntityId,
    name:        String,
    last_update: SimTime,
    /// Set for sub-queues of a composite, which resets them itself.
    ignore_event_list_reset: bool,
    pub(crate) batch:     PendingBatch,
    pub(crate) listeners: Vec<Box<dyn QueueListener>>,
    pub(crate) fired:     Vec<NotificationBatch>,
}

impl EntityCore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id:                      EntityId::next(),
            name:                    name.into(),
            last_update:             SimTime::NEG_INFINITY,
            ignore_event_list_reset: false,
            batch:                   PendingBatch::default(),
            listeners:               Vec::new(),
            fired:                   Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn last_update(&self) -> SimTime {
        self.last_update
    }

    pub(crate) fn set_last_update(&mut self, time: SimTime) {
        self.last_update = time;
    }

    pub fn ignores_event_list_reset(&self) -> bool {
        self.ignore_event_list_reset
    }

    pub fn set_ignore_event_list_reset(&mut self, ignore: bool) {
        self.ignore_event_list_reset = ignore;
    }

    pub fn batch(&self) -> &PendingBatch {
        &self.batch
    }

    /// Append a record to the open batch.  Returns `false` if the batch is
    /// locked, i.e. no top-level operation is running.
    pub(crate) fn push(&mut self, kind: NotificationKind, job: Option<JobId>) -> bool {
        let id = self.id;
        self.batch.push(Notification::new(kind, id, job))
    }

    pub fn add_listener(&mut self, listener: Box<dyn QueueListener>) {
        self.listeners.push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Drain batches fired since the last call, oldest first.
    pub fn take_fired(&mut self) -> Vec<NotificationBatch> {
        std::mem::take(&mut self.fired)
    }

    pub(crate) fn notify_update(&mut self, time: SimTime) {
        let id = self.id;
        for listener in self.listeners.iter_mut() {
            listener.on_update(time, id);
        }
    }

    pub(crate) fn deliver(&mut self, batch: NotificationBatch) {
        for listener in self.listeners.iter_mut() {
            listener.on_batch(&batch);
            for n in &batch.records {
                listener.on_notification(batch.time, n);
            }
        }
        self.fired.push(batch);
    }
}

impl fmt::Debug for EntityCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityCore")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("last_update", &self.last_update)
            .field("batch", &self.batch.state())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
