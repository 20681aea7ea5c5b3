//! `SimQueue`: the public operation surface of every queue.
//!
//! Implemented for every [`QueueDiscipline`] by a blanket impl, so
//! disciplines cannot override the kernel's operations.  `Box<dyn SimQueue>`
//! is how composite queues and the simulation runner hold queues of mixed
//! disciplines.

use qn_core::{Credits, EntityId, JobId, NotificationBatch, QueueReply, QueueRequest, SimTime};
use qn_event::ScheduledEvent;

use crate::{kernel, QueueContext, QueueDiscipline, QueueListener, QueueResult};

pub trait SimQueue: QueueDiscipline {
    fn id(&self) -> EntityId;

    fn name(&self) -> &str;

    /// Reset to the empty state at the event list's current time.
    fn reset(&mut self, ctx: &mut QueueContext<'_>) -> QueueResult<()>;

    /// Advance the clock; fails on time regression.
    fn update(&mut self, time: SimTime) -> QueueResult<()>;

    fn arrive(&mut self, ctx: &mut QueueContext<'_>, time: SimTime, job: JobId) -> QueueResult<()>;

    /// Returns whether the revocation was accepted.
    fn revoke(
        &mut self,
        ctx:               &mut QueueContext<'_>,
        time:              SimTime,
        job:               JobId,
        interrupt_service: bool,
    ) -> QueueResult<bool>;

    fn set_queue_access_vacation(&mut self, time: SimTime, start: bool) -> QueueResult<()>;

    fn set_server_access_credits(
        &mut self,
        ctx:     &mut QueueContext<'_>,
        time:    SimTime,
        credits: Credits,
    ) -> QueueResult<()>;

    fn trigger_potential_new_start_armed(&mut self, time: SimTime) -> QueueResult<()>;

    fn execute(
        &mut self,
        ctx:     &mut QueueContext<'_>,
        time:    SimTime,
        request: QueueRequest,
    ) -> QueueResult<QueueReply>;

    fn handle_event(&mut self, ctx: &mut QueueContext<'_>, event: &ScheduledEvent) -> QueueResult<()>;

    /// Drain the batches fired since the last call.
    fn take_fired_batches(&mut self) -> Vec<NotificationBatch>;

    fn add_listener(&mut self, listener: Box<dyn QueueListener>);
}

impl<T: QueueDiscipline> SimQueue for T {
    fn id(&self) -> EntityId {
        self.core().id()
    }

    fn name(&self) -> &str {
        self.core().name()
    }

    fn reset(&mut self, ctx: &mut QueueContext<'_>) -> QueueResult<()> {
        kernel::reset(self, ctx)
    }

    fn update(&mut self, time: SimTime) -> QueueResult<()> {
        kernel::update(self, time)
    }

    fn arrive(&mut self, ctx: &mut QueueContext<'_>, time: SimTime, job: JobId) -> QueueResult<()> {
        kernel::arrive(self, ctx, time, job)
    }

    fn revoke(
        &mut self,
        ctx:               &mut QueueContext<'_>,
        time:              SimTime,
        job:               JobId,
        interrupt_service: bool,
    ) -> QueueResult<bool> {
        kernel::revoke(self, ctx, time, job, interrupt_service)
    }

    fn set_queue_access_vacation(&mut self, time: SimTime, start: bool) -> QueueResult<()> {
        kernel::set_queue_access_vacation(self, time, start)
    }

    fn set_server_access_credits(
        &mut self,
        ctx:     &mut QueueContext<'_>,
        time:    SimTime,
        credits: Credits,
    ) -> QueueResult<()> {
        kernel::set_server_access_credits(self, ctx, time, credits)
    }

    fn trigger_potential_new_start_armed(&mut self, time: SimTime) -> QueueResult<()> {
        kernel::trigger_potential_new_start_armed(self, time)
    }

    fn execute(
        &mut self,
        ctx:     &mut QueueContext<'_>,
        time:    SimTime,
        request: QueueRequest,
    ) -> QueueResult<QueueReply> {
        kernel::execute(self, ctx, time, request)
    }

    fn handle_event(&mut self, ctx: &mut QueueContext<'_>, event: &ScheduledEvent) -> QueueResult<()> {
        kernel::handle_event(self, ctx, event)
    }

    fn take_fired_batches(&mut self) -> Vec<NotificationBatch> {
        self.core_mut().entity_mut().take_fired()
    }

    fn add_listener(&mut self, listener: Box<dyn QueueListener>) {
        self.core_mut().entity_mut().add_listener(listener);
    }
}
