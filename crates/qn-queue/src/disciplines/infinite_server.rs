//! Infinite server: every job starts as soon as a credit allows it.

use qn_core::{JobId, SimTime};

use super::DepartureTimers;
use crate::{kernel, QueueContext, QueueCore, QueueDiscipline, QueueResult};

#[derive(Debug)]
pub struct InfiniteServer {
    core:   QueueCore,
    timers: DepartureTimers,
}

impl InfiniteServer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            core:   QueueCore::new(name, true),
            timers: DepartureTimers::default(),
        }
    }
}

impl QueueDiscipline for InfiniteServer {
    fn core(&self) -> &QueueCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut QueueCore {
        &mut self.core
    }

    fn is_start_armed(&self) -> bool {
        true
    }

    fn insert_job_upon_arrival(&mut self, _: &mut QueueContext<'_>, _: SimTime, _: JobId) -> QueueResult<()> {
        Ok(())
    }

    fn reschedule_after_arrival(
        &mut self,
        ctx:  &mut QueueContext<'_>,
        time: SimTime,
        job:  JobId,
    ) -> QueueResult<()> {
        if self.core.has_server_access_credits() {
            kernel::start(self, ctx, time, job)?;
        }
        Ok(())
    }

    fn remove_job_upon_drop(&mut self, ctx: &mut QueueContext<'_>, _: SimTime, job: JobId) -> QueueResult<()> {
        self.timers.cancel(ctx, job);
        Ok(())
    }

    fn reschedule_after_drop(&mut self, _: &mut QueueContext<'_>, _: SimTime, _: JobId) -> QueueResult<()> {
        Ok(())
    }

    fn remove_job_upon_revocation(
        &mut self,
        ctx:   &mut QueueContext<'_>,
        _time: SimTime,
        job:   JobId,
        _auto: bool,
    ) -> QueueResult<()> {
        self.timers.cancel(ctx, job);
        Ok(())
    }

    fn reschedule_after_revocation(
        &mut self,
        _ctx:  &mut QueueContext<'_>,
        _time: SimTime,
        _job:  JobId,
        _auto: bool,
    ) -> QueueResult<()> {
        Ok(())
    }

    fn insert_job_upon_start(&mut self, _: &mut QueueContext<'_>, _: SimTime, _: JobId) -> QueueResult<()> {
        Ok(())
    }

    fn reschedule_after_start(
        &mut self,
        ctx:  &mut QueueContext<'_>,
        time: SimTime,
        job:  JobId,
    ) -> QueueResult<()> {
        let id = self.core.id();
        self.timers.schedule(ctx, id, time, job)
    }

    fn remove_job_upon_departure(&mut self, ctx: &mut QueueContext<'_>, _: SimTime, job: JobId) -> QueueResult<()> {
        self.timers.cancel(ctx, job);
        Ok(())
    }

    fn reschedule_after_departure(&mut self, _: &mut QueueContext<'_>, _: SimTime, _: JobId) -> QueueResult<()> {
        Ok(())
    }

    fn reschedule_for_new_server_access_credits(
        &mut self,
        ctx:  &mut QueueContext<'_>,
        time: SimTime,
    ) -> QueueResult<()> {
        while self.core.has_server_access_credits() {
            let Some(head) = self.core.waiting().first() else {
                break;
            };
            kernel::start(self, ctx, time, head)?;
        }
        Ok(())
    }

    fn reset_discipline(&mut self, ctx: &mut QueueContext<'_>) -> QueueResult<()> {
        self.timers.clear(ctx);
        Ok(())
    }
}
