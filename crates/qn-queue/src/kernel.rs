//! The queue kernel: the operations every queue shares.
//!
//! # Operation shape
//!
//! Every operation follows the same template:
//!
//! ```text
//! validate arguments          (InvalidArgument, nothing mutated yet)
//! update(time)                (monotonic clock)
//! top = open batch            (Some only for the outermost operation)
//! hook → containers → record → reschedule hook
//! if top: fire_and_lock(top)  (one batch per top-level operation)
//! ```
//!
//! Internal transitions (`start`, `depart`, `drop`, `auto_revoke`) are only
//! legal while a batch is open; calling them between operations is a
//! reentrancy violation.

use qn_core::{Credits, JobId, NotificationBatch, NotificationKind, QueueReply, QueueRequest, SimTime};
use qn_event::{EventAction, ScheduledEvent};
use tracing::{debug, trace};

use crate::batch::TopLevel;
use crate::core::AutoRevocationPolicy;
use crate::{QueueContext, QueueDiscipline, QueueError, QueueResult};

// ── Entity lifecycle ──────────────────────────────────────────────────────────

/// Advance the entity clock to `time`.
///
/// Pre-event hooks always run.  Pre-update hooks and listener update
/// callbacks only run if time actually advances.
pub fn update<Q: QueueDiscipline + ?Sized>(q: &mut Q, time: SimTime) -> QueueResult<()> {
    let last = q.core().last_update();
    if time.0.is_nan() || time < last {
        return Err(q.core().invalid(None, format!("time regression to {time}")));
    }
    q.on_pre_event(time);
    if time > last {
        q.on_pre_update(time);
        let entity = &mut q.core_mut().entity;
        entity.notify_update(time);
        entity.set_last_update(time);
    }
    Ok(())
}

/// Reset to the empty state at the event list's current time.
///
/// Always emits exactly one `Reset` notification.
pub fn reset<Q: QueueDiscipline + ?Sized>(q: &mut Q, ctx: &mut QueueContext<'_>) -> QueueResult<()> {
    let time = ctx.events.current_time();
    let top = q.core_mut().entity.batch.clear_and_unlock();
    let core = q.core_mut();
    core.entity.set_last_update(time);
    for job in core.clear_containers() {
        if ctx.jobs.contains(job) {
            ctx.jobs.set_queue(job, None)?;
        }
    }
    core.queue_access_vacation = false;
    core.server_access_credits = Credits::INFINITE;
    q.reset_discipline(ctx)?;

    let armed = q.is_start_armed();
    let core = q.core_mut();
    core.previous_sac_available = core.server_access_credits.is_available();
    core.previous_start_armed = armed;
    core.record(NotificationKind::Reset, None)?;
    debug!(entity = %core.id(), %time, "queue reset");
    fire_and_lock(q, top)
}

/// Open the batch.  `Some` iff this begins a top-level operation.
pub fn begin<Q: QueueDiscipline + ?Sized>(q: &mut Q) -> Option<TopLevel> {
    q.core_mut().entity.batch.clear_and_unlock_if_locked()
}

/// Fire the batch if `top` says this is the outermost operation.
pub fn finish<Q: QueueDiscipline + ?Sized>(q: &mut Q, top: Option<TopLevel>) -> QueueResult<()> {
    match top {
        Some(token) => fire_and_lock(q, token),
        None => Ok(()),
    }
}

/// Release the batch assembled by the top-level operation holding `token`.
///
/// Before delivery, synthesizes server-access-credit and start-armed edge
/// notifications by comparing against the values cached at the previous
/// fire; any such records a discipline added itself are discarded.  Empty
/// batches are not delivered.
pub fn fire_and_lock<Q: QueueDiscipline + ?Sized>(q: &mut Q, token: TopLevel) -> QueueResult<()> {
    let armed = q.is_start_armed();
    let core = q.core_mut();
    core.check_partition()?;
    let id = core.id();
    let time = core.last_update();

    core.entity.batch.records_mut().retain(|n| {
        !(n.queue == id && (n.kind.is_server_access_credits() || n.kind.is_start_armed()))
    });
    let sac = core.server_access_credits.is_available();
    if sac != core.previous_sac_available {
        core.previous_sac_available = sac;
        let kind = if sac {
            NotificationKind::RegainedServerAccessCredits
        } else {
            NotificationKind::OutOfServerAccessCredits
        };
        core.record(kind, None)?;
    }
    if armed != core.previous_start_armed {
        core.previous_start_armed = armed;
        let kind = if armed {
            NotificationKind::StartArmedTrue
        } else {
            NotificationKind::StartArmedFalse
        };
        core.record(kind, None)?;
    }

    let records = core
        .entity
        .batch
        .lock(token)
        .map_err(|_| QueueError::illegal(id, time, None, "batch fired by a stale top-level token"))?;
    if records.is_empty() {
        return Ok(());
    }
    let batch = NotificationBatch { entity: id, time, records };
    trace!(entity = %id, %time, kinds = ?batch.kinds(), "fire");
    core.entity.deliver(batch);
    q.after_notification();
    Ok(())
}

/// Re-evaluate start-armed outside of any other operation.
pub fn trigger_potential_new_start_armed<Q: QueueDiscipline + ?Sized>(
    q:    &mut Q,
    time: SimTime,
) -> QueueResult<()> {
    update(q, time)?;
    let top = begin(q);
    finish(q, top)
}

// ── External operations ───────────────────────────────────────────────────────

pub fn arrive<Q: QueueDiscipline + ?Sized>(
    q:    &mut Q,
    ctx:  &mut QueueContext<'_>,
    time: SimTime,
    job:  JobId,
) -> QueueResult<()> {
    let id = q.core().id();
    if !ctx.jobs.contains(job) {
        return Err(q.core().invalid(Some(job), "arrival of unknown job"));
    }
    if let Some(owner) = ctx.jobs.queue_of(job)? {
        return Err(q.core().invalid(Some(job), format!("arriving job is still at {owner}")));
    }
    if q.core().contains(job) {
        return Err(q.core().illegal(Some(job), "unowned job found in the job containers"));
    }
    update(q, time)?;
    let top = begin(q);
    q.core_mut().record(NotificationKind::Arrival, Some(job))?;
    if q.core().is_queue_access_vacation() {
        q.core_mut().record(NotificationKind::Drop, Some(job))?;
        q.queue_access_vacation_drop(ctx, time, job)?;
    } else {
        q.insert_job_upon_arrival(ctx, time, job)?;
        q.core_mut().admit(job)?;
        ctx.jobs.set_queue(job, Some(id))?;
        q.reschedule_after_arrival(ctx, time, job)?;
    }
    finish(q, top)
}

/// Revoke `job`.  Returns `false`, changing nothing, if the job is not in
/// this queue or is in service and `interrupt_service` is `false`.
///
/// A handle the job arena does not know is an invalid argument, not an
/// absent job.
pub fn revoke<Q: QueueDiscipline + ?Sized>(
    q:                 &mut Q,
    ctx:               &mut QueueContext<'_>,
    time:              SimTime,
    job:               JobId,
    interrupt_service: bool,
) -> QueueResult<bool> {
    if !ctx.jobs.contains(job) {
        return Err(q.core().invalid(Some(job), "revocation of unknown job"));
    }
    update(q, time)?;
    if !q.core().contains(job) {
        return Ok(false);
    }
    if q.core().is_in_service(job) && !interrupt_service {
        return Ok(false);
    }
    let top = begin(q);
    revoke_internal(q, ctx, time, job, false)?;
    finish(q, top)?;
    Ok(true)
}

pub fn set_queue_access_vacation<Q: QueueDiscipline + ?Sized>(
    q:     &mut Q,
    time:  SimTime,
    start: bool,
) -> QueueResult<()> {
    update(q, time)?;
    if q.core().is_queue_access_vacation() == start {
        return Ok(());
    }
    let top = begin(q);
    let core = q.core_mut();
    core.queue_access_vacation = start;
    let kind = if start {
        NotificationKind::QueueAccessVacationStart
    } else {
        NotificationKind::QueueAccessVacationEnd
    };
    core.record(kind, None)?;
    finish(q, top)
}

pub fn set_server_access_credits<Q: QueueDiscipline + ?Sized>(
    q:       &mut Q,
    ctx:     &mut QueueContext<'_>,
    time:    SimTime,
    credits: Credits,
) -> QueueResult<()> {
    update(q, time)?;
    let top = begin(q);
    let core = q.core_mut();
    let old = core.server_access_credits;
    core.server_access_credits = credits;
    if old.is_available() != credits.is_available() {
        debug!(entity = %core.id(), %time, %old, new = %credits, "server-access credits crossed zero");
    }
    if !old.is_available() && credits.is_available() {
        q.reschedule_for_new_server_access_credits(ctx, time)?;
    }
    q.on_server_access_credits_changed(ctx, time)?;
    finish(q, top)
}

/// Dispatch a structured request.
pub fn execute<Q: QueueDiscipline + ?Sized>(
    q:       &mut Q,
    ctx:     &mut QueueContext<'_>,
    time:    SimTime,
    request: QueueRequest,
) -> QueueResult<QueueReply> {
    match request {
        QueueRequest::Reset => reset(q, ctx)?,
        QueueRequest::Update => update(q, time)?,
        QueueRequest::Arrive { job } => arrive(q, ctx, time, job)?,
        QueueRequest::Revoke { job, interrupt_service } => {
            return Ok(QueueReply::Revoked(revoke(q, ctx, time, job, interrupt_service)?));
        }
        QueueRequest::SetQueueAccessVacation(start) => set_queue_access_vacation(q, time, start)?,
        QueueRequest::SetServerAccessCredits(credits) => {
            set_server_access_credits(q, ctx, time, credits)?
        }
    }
    Ok(QueueReply::Done)
}

/// Handle an event from the event list targeting `q` or an entity it owns.
pub fn handle_event<Q: QueueDiscipline + ?Sized>(
    q:     &mut Q,
    ctx:   &mut QueueContext<'_>,
    event: &ScheduledEvent,
) -> QueueResult<()> {
    if event.target != q.core().id() {
        return q.handle_foreign_event(ctx, event);
    }
    match event.action {
        EventAction::Departure(job) => {
            if !q.core().contains(job) {
                return Err(q.core().illegal(Some(job), "departure timer fired for absent job"));
            }
            update(q, event.time)?;
            let top = begin(q);
            depart(q, ctx, event.time, job)?;
            finish(q, top)
        }
        EventAction::Request(request) => execute(q, ctx, event.time, request).map(|_| ()),
    }
}

// ── Internal transitions ──────────────────────────────────────────────────────

fn require_open<Q: QueueDiscipline + ?Sized>(q: &Q, job: JobId, what: &str) -> QueueResult<()> {
    if !q.core().is_batch_open() {
        return Err(q.core().illegal(Some(job), format!("{what} outside of an operation")));
    }
    Ok(())
}

fn require_present<Q: QueueDiscipline + ?Sized>(q: &Q, job: JobId, what: &str) -> QueueResult<()> {
    if !q.core().contains(job) {
        return Err(q.core().illegal(Some(job), format!("{what} of a job not present")));
    }
    Ok(())
}

/// Start a waiting job, consuming one server-access credit.
///
/// Under [`AutoRevocationPolicy::UponStart`] the job is auto-revoked right
/// after its `Start` notification and never enters the service area.
pub fn start<Q: QueueDiscipline + ?Sized>(
    q:    &mut Q,
    ctx:  &mut QueueContext<'_>,
    time: SimTime,
    job:  JobId,
) -> QueueResult<()> {
    require_open(q, job, "start")?;
    if !q.core().is_waiting(job) {
        return Err(q.core().illegal(Some(job), "start of a job not in the waiting area"));
    }
    let core = q.core_mut();
    let Some(left) = core.server_access_credits.consume_one() else {
        return Err(core.illegal(Some(job), "start without server-access credits"));
    };
    core.server_access_credits = left;
    if core.auto_revocation == AutoRevocationPolicy::UponStart {
        core.record(NotificationKind::Start, Some(job))?;
        return auto_revoke(q, ctx, time, job);
    }
    q.insert_job_upon_start(ctx, time, job)?;
    let core = q.core_mut();
    core.enter_service(job)?;
    core.record(NotificationKind::Start, Some(job))?;
    q.reschedule_after_start(ctx, time, job)
}

pub fn depart<Q: QueueDiscipline + ?Sized>(
    q:    &mut Q,
    ctx:  &mut QueueContext<'_>,
    time: SimTime,
    job:  JobId,
) -> QueueResult<()> {
    require_open(q, job, "departure")?;
    require_present(q, job, "departure")?;
    q.remove_job_upon_departure(ctx, time, job)?;
    q.core_mut().evict(job)?;
    ctx.jobs.set_queue(job, None)?;
    q.core_mut().record(NotificationKind::Departure, Some(job))?;
    q.reschedule_after_departure(ctx, time, job)
}

pub fn drop<Q: QueueDiscipline + ?Sized>(
    q:    &mut Q,
    ctx:  &mut QueueContext<'_>,
    time: SimTime,
    job:  JobId,
) -> QueueResult<()> {
    require_open(q, job, "drop")?;
    require_present(q, job, "drop")?;
    q.remove_job_upon_drop(ctx, time, job)?;
    q.core_mut().evict(job)?;
    ctx.jobs.set_queue(job, None)?;
    q.core_mut().record(NotificationKind::Drop, Some(job))?;
    q.reschedule_after_drop(ctx, time, job)
}

pub fn auto_revoke<Q: QueueDiscipline + ?Sized>(
    q:    &mut Q,
    ctx:  &mut QueueContext<'_>,
    time: SimTime,
    job:  JobId,
) -> QueueResult<()> {
    require_open(q, job, "auto-revocation")?;
    require_present(q, job, "auto-revocation")?;
    revoke_internal(q, ctx, time, job, true)
}

fn revoke_internal<Q: QueueDiscipline + ?Sized>(
    q:    &mut Q,
    ctx:  &mut QueueContext<'_>,
    time: SimTime,
    job:  JobId,
    auto: bool,
) -> QueueResult<()> {
    q.remove_job_upon_revocation(ctx, time, job, auto)?;
    q.core_mut().evict(job)?;
    ctx.jobs.set_queue(job, None)?;
    let kind = if auto {
        NotificationKind::AutoRevocation
    } else {
        NotificationKind::Revocation
    };
    q.core_mut().record(kind, Some(job))?;
    q.reschedule_after_revocation(ctx, time, job, auto)
}
