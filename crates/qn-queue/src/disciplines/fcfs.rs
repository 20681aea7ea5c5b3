//! First-come first-served, single server, optional finite waiting buffer.

use qn_core::{JobId, SimTime};

use super::DepartureTimers;
use crate::{kernel, QueueContext, QueueCore, QueueDiscipline, QueueResult};

#[derive(Debug)]
pub struct Fcfs {
    core:   QueueCore,
    /// Maximum number of waiting jobs; `None` = unlimited.
    buffer: Option<usize>,
    timers: DepartureTimers,
}

impl Fcfs {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            core:   QueueCore::new(name, true),
            buffer: None,
            timers: DepartureTimers::default(),
        }
    }

    /// FCFS with room for at most `buffer` waiting jobs.  Arrivals that find
    /// the buffer full are dropped.
    pub fn with_buffer(name: impl Into<String>, buffer: usize) -> Self {
        Self { buffer: Some(buffer), ..Self::new(name) }
    }

    pub fn buffer(&self) -> Option<usize> {
        self.buffer
    }

    /// Start the head of the waiting line if the server is idle and a credit
    /// is available.
    fn start_head(&mut self, ctx: &mut QueueContext<'_>, time: SimTime) -> QueueResult<()> {
        while self.core.service().is_empty() && self.core.has_server_access_credits() {
            let Some(head) = self.core.waiting().first() else {
                break;
            };
            kernel::start(self, ctx, time, head)?;
        }
        Ok(())
    }
}

impl QueueDiscipline for Fcfs {
    fn core(&self) -> &QueueCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut QueueCore {
        &mut self.core
    }

    fn is_start_armed(&self) -> bool {
        self.core.service().is_empty()
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
        self.start_head(ctx, time)?;
        if let Some(buffer) = self.buffer {
            if self.core.waiting().len() > buffer && self.core.is_waiting(job) {
                kernel::drop(self, ctx, time, job)?;
            }
        }
        Ok(())
    }

    fn remove_job_upon_drop(&mut self, ctx: &mut QueueContext<'_>, _: SimTime, job: JobId) -> QueueResult<()> {
        self.timers.cancel(ctx, job);
        Ok(())
    }

    fn reschedule_after_drop(&mut self, ctx: &mut QueueContext<'_>, time: SimTime, _: JobId) -> QueueResult<()> {
        self.start_head(ctx, time)
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
        ctx:   &mut QueueContext<'_>,
        time:  SimTime,
        _job:  JobId,
        _auto: bool,
    ) -> QueueResult<()> {
        self.start_head(ctx, time)
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

    fn reschedule_after_departure(&mut self, ctx: &mut QueueContext<'_>, time: SimTime, _: JobId) -> QueueResult<()> {
        self.start_head(ctx, time)
    }

    fn reschedule_for_new_server_access_credits(
        &mut self,
        ctx:  &mut QueueContext<'_>,
        time: SimTime,
    ) -> QueueResult<()> {
        self.start_head(ctx, time)
    }

    fn reset_discipline(&mut self, ctx: &mut QueueContext<'_>) -> QueueResult<()> {
        self.timers.clear(ctx);
        Ok(())
    }
}
