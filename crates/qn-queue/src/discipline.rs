//! The `QueueDiscipline` trait: the extension point for queue behavior.

use qn_core::{EntityId, JobArena, JobId, SimTime};
use qn_event::{EventList, ScheduledEvent};

use crate::{QueueCore, QueueError, QueueResult};

/// Mutable access to the collaborators of a running operation: the event
/// list (for timers) and the job arena (for service times and owner
/// back-references).
pub struct QueueContext<'a> {
    pub events: &'a mut EventList,
    pub jobs:   &'a mut JobArena,
}

impl<'a> QueueContext<'a> {
    pub fn new(events: &'a mut EventList, jobs: &'a mut JobArena) -> Self {
        Self { events, jobs }
    }
}

/// Hooks a queue discipline supplies to the kernel.
///
/// The kernel (see [`crate::kernel`]) owns every container move, every
/// notification of the standard taxonomy, and every invariant check.  A
/// discipline only keeps its own structures in step (`insert_*`/`remove_*`)
/// and decides what happens next (`reschedule_*`), typically by calling
/// [`kernel::start`][crate::kernel::start] or scheduling a departure.
///
/// Every `insert_*`/`remove_*` hook runs before the kernel moves the job in
/// the containers; every `reschedule_*` hook runs after, with the batch open.
///
/// # Example
///
/// ```rust,ignore
/// impl QueueDiscipline for Sink {
///     fn core(&self) -> &QueueCore { &self.core }
///     fn core_mut(&mut self) -> &mut QueueCore { &mut self.core }
///     fn is_start_armed(&self) -> bool { false }
///     // ... every hook returns Ok(())
/// }
/// ```
pub trait QueueDiscipline {
    fn core(&self) -> &QueueCore;

    fn core_mut(&mut self) -> &mut QueueCore;

    /// Would this queue start a waiting job right now if granted a credit?
    fn is_start_armed(&self) -> bool;

    // ── Arrival ───────────────────────────────────────────────────────────

    fn insert_job_upon_arrival(
        &mut self,
        ctx:  &mut QueueContext<'_>,
        time: SimTime,
        job:  JobId,
    ) -> QueueResult<()>;

    fn reschedule_after_arrival(
        &mut self,
        ctx:  &mut QueueContext<'_>,
        time: SimTime,
        job:  JobId,
    ) -> QueueResult<()>;

    // ── Drop ──────────────────────────────────────────────────────────────

    fn remove_job_upon_drop(
        &mut self,
        ctx:  &mut QueueContext<'_>,
        time: SimTime,
        job:  JobId,
    ) -> QueueResult<()>;

    fn reschedule_after_drop(
        &mut self,
        ctx:  &mut QueueContext<'_>,
        time: SimTime,
        job:  JobId,
    ) -> QueueResult<()>;

    // ── Revocation ────────────────────────────────────────────────────────

    fn remove_job_upon_revocation(
        &mut self,
        ctx:  &mut QueueContext<'_>,
        time: SimTime,
        job:  JobId,
        auto: bool,
    ) -> QueueResult<()>;

    fn reschedule_after_revocation(
        &mut self,
        ctx:  &mut QueueContext<'_>,
        time: SimTime,
        job:  JobId,
        auto: bool,
    ) -> QueueResult<()>;

    // ── Start ─────────────────────────────────────────────────────────────

    fn insert_job_upon_start(
        &mut self,
        ctx:  &mut QueueContext<'_>,
        time: SimTime,
        job:  JobId,
    ) -> QueueResult<()>;

    fn reschedule_after_start(
        &mut self,
        ctx:  &mut QueueContext<'_>,
        time: SimTime,
        job:  JobId,
    ) -> QueueResult<()>;

    // ── Departure ─────────────────────────────────────────────────────────

    fn remove_job_upon_departure(
        &mut self,
        ctx:  &mut QueueContext<'_>,
        time: SimTime,
        job:  JobId,
    ) -> QueueResult<()>;

    fn reschedule_after_departure(
        &mut self,
        ctx:  &mut QueueContext<'_>,
        time: SimTime,
        job:  JobId,
    ) -> QueueResult<()>;

    // ── Credits ───────────────────────────────────────────────────────────

    /// Credits went from zero to positive; typically start waiting jobs.
    fn reschedule_for_new_server_access_credits(
        &mut self,
        ctx:  &mut QueueContext<'_>,
        time: SimTime,
    ) -> QueueResult<()>;

    // ── Optional hooks ────────────────────────────────────────────────────

    /// Discipline-specific reset, after the kernel emptied the containers.
    fn reset_discipline(&mut self, _ctx: &mut QueueContext<'_>) -> QueueResult<()> {
        Ok(())
    }

    /// Runs on every `update`, even if time does not advance.
    fn on_pre_event(&mut self, _time: SimTime) {}

    /// Runs when time advances, before the new time is committed.
    fn on_pre_update(&mut self, _time: SimTime) {}

    /// An arrival was dropped because of a queue-access vacation.
    fn queue_access_vacation_drop(
        &mut self,
        _ctx:  &mut QueueContext<'_>,
        _time: SimTime,
        _job:  JobId,
    ) -> QueueResult<()> {
        Ok(())
    }

    /// The raw credit counter changed (after any new-credit rescheduling).
    fn on_server_access_credits_changed(
        &mut self,
        _ctx:  &mut QueueContext<'_>,
        _time: SimTime,
    ) -> QueueResult<()> {
        Ok(())
    }

    /// Runs after a fired batch has been delivered to listeners.
    fn after_notification(&mut self) {}

    /// `true` if `entity` is this queue or is owned by it.
    fn owns_entity(&self, entity: EntityId) -> bool {
        entity == self.core().id()
    }

    /// An event targets an entity owned by this queue but not the queue
    /// itself.  Only composite queues own other entities.
    fn handle_foreign_event(
        &mut self,
        _ctx:  &mut QueueContext<'_>,
        event: &ScheduledEvent,
    ) -> QueueResult<()> {
        Err(QueueError::invalid(
            self.core().id(),
            event.time,
            None,
            format!("event targets unknown entity {}", event.target),
        ))
    }
}
