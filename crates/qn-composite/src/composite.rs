//! `CompositeQueue`: a queue built from sub-queues.
//!
//! Each admitted real job gets a delegate job that visits the sub-queues on
//! its behalf.  Sub-queue operations run as top-level operations on the
//! sub-queue while the composite's own batch is open; every batch a
//! sub-queue fires lands in its outbox, is collected onto the composite's
//! worklist and reduced into composite transitions (see `reducer`).  The
//! composite releases a single batch once its own top-level operation ends.

use std::collections::VecDeque;
use std::fmt;

use qn_core::{Credits, EntityId, JobId, NotificationBatch, SimTime};
use qn_event::ScheduledEvent;
use qn_queue::{kernel, QueueContext, QueueCore, QueueDiscipline, QueueError, QueueResult, SimQueue};
use tracing::{debug, trace};

use crate::delegate::{BijectionError, DelegateJobFactory, DelegateMap};
use crate::handshake::RevocationHandshake;
use crate::selector::SubQueueSelector;
use crate::StartModel;

pub struct CompositeQueue {
    pub(crate) core:             QueueCore,
    pub(crate) sub_queues:       Vec<Box<dyn SimQueue>>,
    pub(crate) start_model:      StartModel,
    pub(crate) selector:         Box<dyn SubQueueSelector>,
    pub(crate) factory:          Box<dyn DelegateJobFactory>,
    pub(crate) delegates:        DelegateMap,
    pub(crate) drop_destination: Option<usize>,
    pub(crate) handshake:        RevocationHandshake,
    /// Sub-queue batches not yet reduced, oldest first.
    pub(crate) worklist:         VecDeque<(usize, NotificationBatch)>,
    /// Set while the worklist is being drained.
    pub(crate) reducing:         bool,
}

impl CompositeQueue {
    // ── Inspection ────────────────────────────────────────────────────────

    pub fn start_model(&self) -> StartModel {
        self.start_model
    }

    pub fn sub_queues(&self) -> &[Box<dyn SimQueue>] {
        &self.sub_queues
    }

    pub fn sub_queue(&self, index: usize) -> Option<&dyn SimQueue> {
        self.sub_queues.get(index).map(|q| q.as_ref())
    }

    pub fn sub_queue_mut(&mut self, index: usize) -> Option<&mut (dyn SimQueue + 'static)> {
        self.sub_queues.get_mut(index).map(|q| q.as_mut())
    }

    /// Index of the sub-queue with entity id `id`.
    pub fn sub_queue_index(&self, id: EntityId) -> Option<usize> {
        self.sub_queues.iter().position(|q| q.id() == id)
    }

    pub fn drop_destination(&self) -> Option<usize> {
        self.drop_destination
    }

    pub fn pending_revocation(&self) -> RevocationHandshake {
        self.handshake
    }

    /// Number of admitted real jobs with a delegate.
    pub fn delegate_count(&self) -> usize {
        self.delegates.len()
    }

    /// The delegate standing in for `real`.  Fails if the bijection does not
    /// hold for this pair.
    pub fn delegate_of(&self, real: JobId) -> QueueResult<JobId> {
        self.delegates.delegate_of(real).map_err(|e| self.bijection_error(e))
    }

    /// The real job behind `delegate`.  Fails if the bijection does not hold
    /// for this pair.
    pub fn real_of(&self, delegate: JobId) -> QueueResult<JobId> {
        self.delegates.real_of(delegate).map_err(|e| self.bijection_error(e))
    }

    /// Verify both bijection directions and that exactly the admitted real
    /// jobs are mapped.
    pub fn check_bijection(&self) -> QueueResult<()> {
        self.delegates.check().map_err(|e| self.bijection_error(e))?;
        if self.delegates.len() != self.core.number_of_jobs() {
            return Err(self.core.illegal(
                None,
                format!(
                    "{} delegates for {} admitted jobs",
                    self.delegates.len(),
                    self.core.number_of_jobs()
                ),
            ));
        }
        for real in self.core.jobs().iter() {
            self.delegate_of(real)?;
        }
        Ok(())
    }

    fn bijection_error(&self, e: BijectionError) -> QueueError {
        self.core.illegal(None, e.to_string())
    }

    // ── Routing ───────────────────────────────────────────────────────────

    fn checked_index(&self, index: Option<usize>, real: JobId) -> QueueResult<Option<usize>> {
        match index {
            Some(i) if i >= self.sub_queues.len() => Err(self.core.invalid(
                Some(real),
                format!("selector chose unregistered sub-queue {i} of {}", self.sub_queues.len()),
            )),
            other => Ok(other),
        }
    }

    pub(crate) fn select_first(&mut self, time: SimTime, real: JobId) -> QueueResult<Option<usize>> {
        let index = self.selector.first(time, real);
        self.checked_index(index, real)
    }

    pub(crate) fn select_next(
        &mut self,
        time:     SimTime,
        real:     JobId,
        previous: usize,
    ) -> QueueResult<Option<usize>> {
        let index = self.selector.next(time, real, previous);
        self.checked_index(index, real)
    }

    /// Send `delegate` into sub-queue `index` and reduce what it fires.
    pub(crate) fn dispatch(
        &mut self,
        ctx:      &mut QueueContext<'_>,
        time:     SimTime,
        index:    usize,
        delegate: JobId,
    ) -> QueueResult<()> {
        trace!(composite = %self.core.id(), sub_queue = index, job = %delegate, "delegate arrives");
        self.sub_queues[index].arrive(ctx, time, delegate)?;
        self.collect(index);
        self.drain(ctx, time)
    }

    // ── Worklist ──────────────────────────────────────────────────────────

    /// Move the batches sub-queue `index` fired onto the worklist.
    pub(crate) fn collect(&mut self, index: usize) {
        for batch in self.sub_queues[index].take_fired_batches() {
            self.worklist.push_back((index, batch));
        }
    }

    /// Reduce the worklist until it is empty.  A nested call (made while an
    /// outer call is draining) returns at once; the outer call picks up
    /// whatever was added.
    pub(crate) fn drain(&mut self, ctx: &mut QueueContext<'_>, time: SimTime) -> QueueResult<()> {
        if self.reducing {
            return Ok(());
        }
        self.reducing = true;
        let result = self.drain_worklist(ctx, time);
        self.reducing = false;
        if result.is_err() {
            self.worklist.clear();
        }
        result
    }

    fn drain_worklist(&mut self, ctx: &mut QueueContext<'_>, time: SimTime) -> QueueResult<()> {
        while let Some((index, batch)) = self.worklist.pop_front() {
            self.reduce_batch(ctx, time, index, batch)?;
        }
        if let Some((sub_queue, delegate)) = self.handshake.pending() {
            return Err(self.core.illegal(
                Some(delegate),
                format!("revocation at sub-queue {sub_queue} never completed"),
            ));
        }
        Ok(())
    }

    // ── Real-job bookkeeping ──────────────────────────────────────────────

    /// Create and map the delegate of a newly admitted real job.
    fn add_real_job(&mut self, ctx: &mut QueueContext<'_>, time: SimTime, real: JobId) -> QueueResult<()> {
        let id = self.core.id();
        let delegate = self.factory.create(ctx.jobs, time, real, id)?;
        self.delegates.insert(real, delegate).map_err(|e| self.bijection_error(e))
    }

    /// Unmap `real` whose delegate has left every sub-queue and discard the
    /// delegate.
    fn release_real_job(&mut self, ctx: &mut QueueContext<'_>, real: JobId) -> QueueResult<()> {
        let delegate = self.delegates.remove(real).map_err(|e| self.bijection_error(e))?;
        if let Some(at) = ctx.jobs.queue_of(delegate)? {
            return Err(self.core.illegal(
                Some(real),
                format!("delegate {delegate} still visiting {at} when its real job left"),
            ));
        }
        ctx.jobs.remove(delegate)?;
        self.selector.release(real);
        Ok(())
    }

    // ── Credits ───────────────────────────────────────────────────────────

    /// Credits sub-queue 0 must hold under `CompressedTandem2`.
    pub(crate) fn compressed_tandem_credits(&self) -> Credits {
        if self.core.has_server_access_credits() && self.sub_queues[1].is_start_armed() {
            Credits::ONE
        } else {
            Credits::ZERO
        }
    }

    /// Bring sub-queue 0's credits in line with the composite's credits and
    /// sub-queue 1's start-armed state.
    pub(crate) fn update_compressed_tandem_credits(
        &mut self,
        ctx:  &mut QueueContext<'_>,
        time: SimTime,
    ) -> QueueResult<()> {
        let target = self.compressed_tandem_credits();
        if self.sub_queues[0].core().server_access_credits() == target {
            return Ok(());
        }
        debug!(composite = %self.core.id(), %time, credits = %target, "compressed tandem credits");
        self.sub_queues[0].set_server_access_credits(ctx, time, target)?;
        self.collect(0);
        self.drain(ctx, time)
    }

    fn mirror_credits(&mut self, ctx: &mut QueueContext<'_>, time: SimTime) -> QueueResult<()> {
        let credits = self.core.server_access_credits();
        if self.sub_queues[0].core().server_access_credits() == credits {
            return Ok(());
        }
        self.sub_queues[0].set_server_access_credits(ctx, time, credits)?;
        self.collect(0);
        self.drain(ctx, time)
    }

    fn start_waiting_jobs(&mut self, ctx: &mut QueueContext<'_>, time: SimTime) -> QueueResult<()> {
        while self.core.has_server_access_credits() {
            let Some(head) = self.core.waiting().first() else {
                break;
            };
            kernel::start(self, ctx, time, head)?;
        }
        Ok(())
    }
}

impl QueueDiscipline for CompositeQueue {
    fn core(&self) -> &QueueCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut QueueCore {
        &mut self.core
    }

    fn is_start_armed(&self) -> bool {
        match self.start_model {
            StartModel::Local => true,
            StartModel::EncapsulatorQueue => self.sub_queues[0].is_start_armed(),
            StartModel::EncapsulatorHideStart => false,
            StartModel::CompressedTandem2 => self.sub_queues[1].is_start_armed(),
        }
    }

    // ── Arrival ───────────────────────────────────────────────────────────

    fn insert_job_upon_arrival(
        &mut self,
        ctx:  &mut QueueContext<'_>,
        time: SimTime,
        job:  JobId,
    ) -> QueueResult<()> {
        self.add_real_job(ctx, time, job)
    }

    fn reschedule_after_arrival(
        &mut self,
        ctx:  &mut QueueContext<'_>,
        time: SimTime,
        job:  JobId,
    ) -> QueueResult<()> {
        match self.start_model {
            StartModel::Local => {
                if self.core.has_server_access_credits() {
                    kernel::start(self, ctx, time, job)?;
                }
                Ok(())
            }
            StartModel::EncapsulatorQueue
            | StartModel::EncapsulatorHideStart
            | StartModel::CompressedTandem2 => {
                let delegate = self.delegate_of(job)?;
                self.dispatch(ctx, time, 0, delegate)
            }
        }
    }

    // ── Drop ──────────────────────────────────────────────────────────────

    fn remove_job_upon_drop(&mut self, ctx: &mut QueueContext<'_>, _time: SimTime, job: JobId) -> QueueResult<()> {
        self.release_real_job(ctx, job)
    }

    fn reschedule_after_drop(&mut self, _: &mut QueueContext<'_>, _: SimTime, _: JobId) -> QueueResult<()> {
        Ok(())
    }

    // ── Revocation ────────────────────────────────────────────────────────

    /// Phase one: unmap the pair and, if the delegate is on a sub-queue,
    /// record the revocation to be carried out there.
    fn remove_job_upon_revocation(
        &mut self,
        ctx:   &mut QueueContext<'_>,
        _time: SimTime,
        job:   JobId,
        _auto: bool,
    ) -> QueueResult<()> {
        let delegate = self.delegates.remove(job).map_err(|e| self.bijection_error(e))?;
        self.selector.release(job);
        let Some(at) = ctx.jobs.queue_of(delegate)? else {
            ctx.jobs.remove(delegate)?;
            return Ok(());
        };
        let Some(index) = self.sub_queue_index(at) else {
            return Err(self.core.illegal(
                Some(job),
                format!("delegate {delegate} is at {at}, which is not a sub-queue"),
            ));
        };
        if !self.handshake.arm(index, delegate) {
            return Err(self.core.illegal(
                Some(job),
                format!("revocation requested while {:?} is unfinished", self.handshake),
            ));
        }
        debug!(composite = %self.core.id(), sub_queue = index, %delegate, "revocation armed");
        Ok(())
    }

    /// Phase two: revoke the recorded delegate at its sub-queue.  The
    /// reducer clears the slot and discards the delegate when it sees the
    /// sub-queue's revocation.
    fn reschedule_after_revocation(
        &mut self,
        ctx:   &mut QueueContext<'_>,
        time:  SimTime,
        job:   JobId,
        _auto: bool,
    ) -> QueueResult<()> {
        let Some((index, delegate)) = self.handshake.pending() else {
            return Ok(());
        };
        if !self.sub_queues[index].revoke(ctx, time, delegate, true)? {
            return Err(self.core.illegal(
                Some(job),
                format!("sub-queue {index} refused to revoke delegate {delegate}"),
            ));
        }
        self.collect(index);
        self.drain(ctx, time)
    }

    // ── Start ─────────────────────────────────────────────────────────────

    fn insert_job_upon_start(&mut self, _: &mut QueueContext<'_>, _: SimTime, _: JobId) -> QueueResult<()> {
        Ok(())
    }

    fn reschedule_after_start(
        &mut self,
        ctx:  &mut QueueContext<'_>,
        time: SimTime,
        job:  JobId,
    ) -> QueueResult<()> {
        match self.start_model {
            StartModel::Local => match self.select_first(time, job)? {
                Some(index) => {
                    let delegate = self.delegate_of(job)?;
                    self.dispatch(ctx, time, index, delegate)
                }
                None => kernel::depart(self, ctx, time, job),
            },
            StartModel::CompressedTandem2 => {
                let delegate = self.delegate_of(job)?;
                self.dispatch(ctx, time, 1, delegate)
            }
            StartModel::EncapsulatorQueue | StartModel::EncapsulatorHideStart => Ok(()),
        }
    }

    // ── Departure ─────────────────────────────────────────────────────────

    fn remove_job_upon_departure(
        &mut self,
        ctx:   &mut QueueContext<'_>,
        _time: SimTime,
        job:   JobId,
    ) -> QueueResult<()> {
        self.release_real_job(ctx, job)
    }

    fn reschedule_after_departure(&mut self, _: &mut QueueContext<'_>, _: SimTime, _: JobId) -> QueueResult<()> {
        Ok(())
    }

    // ── Credits ───────────────────────────────────────────────────────────

    fn reschedule_for_new_server_access_credits(
        &mut self,
        ctx:  &mut QueueContext<'_>,
        time: SimTime,
    ) -> QueueResult<()> {
        match self.start_model {
            StartModel::Local => self.start_waiting_jobs(ctx, time),
            _ => Ok(()),
        }
    }

    fn on_server_access_credits_changed(
        &mut self,
        ctx:  &mut QueueContext<'_>,
        time: SimTime,
    ) -> QueueResult<()> {
        match self.start_model {
            StartModel::Local | StartModel::EncapsulatorHideStart => Ok(()),
            StartModel::EncapsulatorQueue => self.mirror_credits(ctx, time),
            StartModel::CompressedTandem2 => self.update_compressed_tandem_credits(ctx, time),
        }
    }

    // ── Reset ─────────────────────────────────────────────────────────────

    /// Sub-queues are reset in index order.
    fn reset_discipline(&mut self, ctx: &mut QueueContext<'_>) -> QueueResult<()> {
        self.handshake.clear();
        self.worklist.clear();
        self.reducing = false;
        let time = ctx.events.current_time();
        for index in 0..self.sub_queues.len() {
            self.sub_queues[index].reset(ctx)?;
            self.collect(index);
            self.drain(ctx, time)?;
        }
        for (_, delegate) in self.delegates.drain() {
            if ctx.jobs.contains(delegate) {
                ctx.jobs.remove(delegate)?;
            }
        }
        self.selector.reset();
        if self.start_model == StartModel::CompressedTandem2 {
            let credits = self.compressed_tandem_credits();
            self.sub_queues[0].core_mut().initialize_server_access_credits(credits);
        }
        Ok(())
    }

    // ── Ownership ─────────────────────────────────────────────────────────

    fn owns_entity(&self, entity: EntityId) -> bool {
        entity == self.core.id() || self.sub_queues.iter().any(|q| q.owns_entity(entity))
    }

    /// An event for a sub-queue (or something inside one) is a top-level
    /// stimulus of the composite: its effects are reduced and released in
    /// one composite batch.
    fn handle_foreign_event(
        &mut self,
        ctx:   &mut QueueContext<'_>,
        event: &ScheduledEvent,
    ) -> QueueResult<()> {
        let Some(index) = self.sub_queues.iter().position(|q| q.owns_entity(event.target)) else {
            return Err(QueueError::invalid(
                self.core.id(),
                event.time,
                None,
                format!("event targets unknown entity {}", event.target),
            ));
        };
        kernel::update(self, event.time)?;
        let top = kernel::begin(self);
        self.sub_queues[index].handle_event(ctx, event)?;
        self.collect(index);
        self.drain(ctx, event.time)?;
        kernel::finish(self, top)
    }
}

impl fmt::Debug for CompositeQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeQueue")
            .field("core", &self.core)
            .field("start_model", &self.start_model)
            .field("sub_queues", &self.sub_queues.iter().map(|q| q.id()).collect::<Vec<_>>())
            .field("delegates", &self.delegates.len())
            .field("drop_destination", &self.drop_destination)
            .field("handshake", &self.handshake)
            .field("worklist", &self.worklist.len())
            .finish()
    }
}
