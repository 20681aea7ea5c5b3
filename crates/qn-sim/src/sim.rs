//! The `Simulation` struct and its event loop.

use qn_core::{
    Credits, EntityId, EventId, JobArena, JobId, QueueReply, QueueRequest, ServiceTime, SimConfig,
    SimTime,
};
use qn_event::{EventAction, EventList, ScheduledEvent};
use qn_queue::{QueueContext, QueueDiscipline, SimQueue};
use tracing::{debug, trace};

use crate::{SimError, SimObserver, SimResult};

/// The main simulation runner.
///
/// `Simulation` owns every piece of shared state:
///
/// - the [`EventList`], which orders external requests and discipline timers;
/// - the [`JobArena`], which issues job handles and tracks which queue each
///   job visits;
/// - the root queues, held as `Box<dyn SimQueue>` so disciplines and
///   composites mix freely.
///
/// Each dispatched event goes to the root queue that owns its target.  After
/// the root returns, the batches it fired are handed to the observer, one
/// [`SimObserver::on_batch`] call per batch.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Simulation {
    /// Start/end times, seed and event cap.
    pub config: SimConfig,

    pub(crate) events:     EventList,
    pub(crate) jobs:       JobArena,
    pub(crate) queues:     Vec<Box<dyn SimQueue>>,
    pub(crate) dispatched: u64,
}

impl Simulation {
    // ── Accessors ─────────────────────────────────────────────────────────

    /// Time of the last dispatched event (or of the last reset).
    pub fn now(&self) -> SimTime {
        self.events.current_time()
    }

    pub fn events(&self) -> &EventList {
        &self.events
    }

    pub fn jobs(&self) -> &JobArena {
        &self.jobs
    }

    /// Number of events dispatched since the last reset.
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    pub fn queues(&self) -> &[Box<dyn SimQueue>] {
        &self.queues
    }

    /// The root queue with id `id`.
    pub fn queue(&self, id: EntityId) -> Option<&dyn SimQueue> {
        self.queues.iter().find(|q| q.id() == id).map(|q| &**q)
    }

    pub fn queue_mut(&mut self, id: EntityId) -> Option<&mut (dyn SimQueue + 'static)> {
        self.queues.iter_mut().find(|q| q.id() == id).map(|q| &mut **q)
    }

    // ── Workload ──────────────────────────────────────────────────────────

    /// Create a job.  It belongs to no queue until it arrives somewhere.
    pub fn add_job(&mut self, name: impl Into<String>, service_time: ServiceTime) -> JobId {
        self.jobs.add(name, service_time)
    }

    /// Schedule an arbitrary request on root queue `queue`.
    pub fn schedule(
        &mut self,
        time:    SimTime,
        queue:   EntityId,
        request: QueueRequest,
    ) -> SimResult<EventId> {
        self.root_index(queue)?;
        let id = self.events.schedule(time, queue, EventAction::Request(request))?;
        trace!(event = %id, %time, %queue, ?request, "scheduled");
        Ok(id)
    }

    pub fn schedule_arrival(&mut self, time: SimTime, queue: EntityId, job: JobId) -> SimResult<EventId> {
        self.schedule(time, queue, QueueRequest::Arrive { job })
    }

    pub fn schedule_revocation(
        &mut self,
        time:              SimTime,
        queue:             EntityId,
        job:               JobId,
        interrupt_service: bool,
    ) -> SimResult<EventId> {
        self.schedule(time, queue, QueueRequest::Revoke { job, interrupt_service })
    }

    pub fn schedule_server_access_credits(
        &mut self,
        time:    SimTime,
        queue:   EntityId,
        credits: Credits,
    ) -> SimResult<EventId> {
        self.schedule(time, queue, QueueRequest::SetServerAccessCredits(credits))
    }

    pub fn schedule_queue_access_vacation(
        &mut self,
        time:  SimTime,
        queue: EntityId,
        start: bool,
    ) -> SimResult<EventId> {
        self.schedule(time, queue, QueueRequest::SetQueueAccessVacation(start))
    }

    /// Withdraw a scheduled event.  Returns `false` if it already fired.
    pub fn cancel(&mut self, event: EventId) -> bool {
        self.events.cancel(event)
    }

    // ── Control ───────────────────────────────────────────────────────────

    /// Reset the event list to the configured start time and every root
    /// queue that does not ignore event-list resets.
    pub fn reset<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        debug!(start = %self.config.start_time, "simulation reset");
        self.events.reset(self.config.start_time);
        self.dispatched = 0;
        let mut ctx = QueueContext::new(&mut self.events, &mut self.jobs);
        for queue in self.queues.iter_mut() {
            if queue.core().entity().ignores_event_list_reset() {
                continue;
            }
            queue.reset(&mut ctx)?;
            deliver(&mut **queue, observer);
        }
        Ok(())
    }

    /// Apply `request` to root queue `queue` at the current time.
    pub fn execute<O: SimObserver>(
        &mut self,
        queue:    EntityId,
        request:  QueueRequest,
        observer: &mut O,
    ) -> SimResult<QueueReply> {
        let index = self.root_index(queue)?;
        let time = self.events.current_time();
        let mut ctx = QueueContext::new(&mut self.events, &mut self.jobs);
        let root = &mut *self.queues[index];
        let reply = root.execute(&mut ctx, time, request)?;
        deliver(root, observer);
        Ok(reply)
    }

    /// Dispatch the next event.  Returns `false` when the list is empty or
    /// the next event lies beyond the configured end time.
    pub fn step<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<bool> {
        let Some(next) = self.events.peek_time() else {
            return Ok(false);
        };
        if self.config.end_time.is_some_and(|end| next > end) {
            return Ok(false);
        }
        if self.config.max_events.is_some_and(|max| self.dispatched >= max) {
            return Err(SimError::EventLimit(self.dispatched));
        }
        let Some(event) = self.events.pop_next() else {
            return Ok(false);
        };
        self.dispatch(&event, observer)?;
        Ok(true)
    }

    /// Dispatch events until the list is empty or the end time is reached.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        while self.step(observer)? {}
        observer.on_sim_end(self.now(), self.dispatched);
        Ok(())
    }

    /// Dispatch every event scheduled at or before `time`.
    pub fn run_until<O: SimObserver>(&mut self, time: SimTime, observer: &mut O) -> SimResult<()> {
        while self.events.peek_time().is_some_and(|next| next <= time) {
            if !self.step(observer)? {
                break;
            }
        }
        Ok(())
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn root_index(&self, queue: EntityId) -> SimResult<usize> {
        self.queues
            .iter()
            .position(|q| q.id() == queue)
            .ok_or(SimError::UnknownQueue(queue))
    }

    fn dispatch<O: SimObserver>(&mut self, event: &ScheduledEvent, observer: &mut O) -> SimResult<()> {
        let index = self
            .queues
            .iter()
            .position(|q| q.owns_entity(event.target))
            .ok_or(SimError::UnownedTarget(event.target))?;
        trace!(
            event = %event.id,
            time = %event.time,
            target = %event.target,
            action = ?event.action,
            "dispatch"
        );
        observer.on_event(event);
        let mut ctx = QueueContext::new(&mut self.events, &mut self.jobs);
        let root = &mut *self.queues[index];
        root.handle_event(&mut ctx, event)?;
        self.dispatched += 1;
        deliver(root, observer);
        Ok(())
    }
}

/// Hand everything `root` fired to the observer.
fn deliver<O: SimObserver>(root: &mut dyn SimQueue, observer: &mut O) {
    for batch in root.take_fired_batches() {
        observer.on_batch(&batch);
    }
}
