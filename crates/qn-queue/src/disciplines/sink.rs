//! A queue that never serves: jobs stay in the waiting area until revoked.

use qn_core::{JobId, SimTime};

use crate::{QueueContext, QueueCore, QueueDiscipline, QueueResult};

#[derive(Debug)]
pub struct Sink {
    core: QueueCore,
}

impl Sink {
    pub fn new(name: impl Into<String>) -> Self {
        Self { core: QueueCore::new(name, false) }
    }
}

impl QueueDiscipline for Sink {
    fn core(&self) -> &QueueCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut QueueCore {
        &mut self.core
    }

    fn is_start_armed(&self) -> bool {
        false
    }

    fn insert_job_upon_arrival(&mut self, _: &mut QueueContext<'_>, _: SimTime, _: JobId) -> QueueResult<()> {
        Ok(())
    }

    fn reschedule_after_arrival(&mut self, _: &mut QueueContext<'_>, _: SimTime, _: JobId) -> QueueResult<()> {
        Ok(())
    }

    fn remove_job_upon_drop(&mut self, _: &mut QueueContext<'_>, _: SimTime, _: JobId) -> QueueResult<()> {
        Ok(())
    }

    fn reschedule_after_drop(&mut self, _: &mut QueueContext<'_>, _: SimTime, _: JobId) -> QueueResult<()> {
        Ok(())
    }

    fn remove_job_upon_revocation(
        &mut self,
        _ctx:  &mut QueueContext<'_>,
        _time: SimTime,
        _job:  JobId,
        _auto: bool,
    ) -> QueueResult<()> {
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

    fn reschedule_after_start(&mut self, _: &mut QueueContext<'_>, _: SimTime, _: JobId) -> QueueResult<()> {
        Ok(())
    }

    fn remove_job_upon_departure(&mut self, _: &mut QueueContext<'_>, _: SimTime, _: JobId) -> QueueResult<()> {
        Ok(())
    }

    fn reschedule_after_departure(&mut self, _: &mut QueueContext<'_>, _: SimTime, _: JobId) -> QueueResult<()> {
        Ok(())
    }

    fn reschedule_for_new_server_access_credits(&mut self, _: &mut QueueContext<'_>, _: SimTime) -> QueueResult<()> {
        Ok(())
    }
}
