//! Unit tests for qn-composite.

use std::cell::Cell;
use std::rc::Rc;

use qn_core::{
    Credits, EventId, JobArena, JobId, NotificationKind, QueueRequest, ServiceTime, SimRng, SimTime,
};
use qn_event::{EventAction, EventList, ScheduledEvent};
use qn_queue::{
    kernel, AutoRevocationPolicy, DropQueue, Fcfs, InfiniteServer, NotificationLog, QueueContext,
    QueueCore, QueueDiscipline, QueueResult, Sink, SimQueue,
};

use crate::{
    compressed_tandem2, encapsulator, encapsulator_hide_start, feedback, jackson, tandem,
    CompositeQueue, CompositeQueueBuilder, DelegateMap, RandomSelector, StartModel,
    SubQueueSelector,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn t(x: f64) -> SimTime {
    SimTime(x)
}

#[derive(Default)]
struct Bench {
    events: EventList,
    jobs:   JobArena,
}

impl Bench {
    fn new() -> Self {
        Self::default()
    }

    fn ctx(&mut self) -> QueueContext<'_> {
        QueueContext::new(&mut self.events, &mut self.jobs)
    }

    fn job(&mut self, name: &str, service: f64) -> JobId {
        self.jobs.add(name, ServiceTime::Fixed(service))
    }

    fn step<Q: SimQueue>(&mut self, q: &mut Q) -> Option<ScheduledEvent> {
        let event = self.events.pop_next()?;
        let mut ctx = QueueContext::new(&mut self.events, &mut self.jobs);
        q.handle_event(&mut ctx, &event).unwrap();
        Some(event)
    }

    fn run<Q: SimQueue>(&mut self, q: &mut Q) {
        while self.step(q).is_some() {}
    }
}

fn logged<Q: SimQueue>(q: &mut Q) -> NotificationLog {
    let log = NotificationLog::new();
    q.add_listener(Box::new(log.clone()));
    log
}

fn boxed(q: impl SimQueue + 'static) -> Box<dyn SimQueue> {
    Box::new(q)
}

fn sub_credits(c: &CompositeQueue, index: usize) -> Credits {
    c.sub_queue(index).unwrap().core().server_access_credits()
}

/// Sub-queue 0's credits under the compressed tandem rule.
fn assert_compressed_tandem_credits(c: &CompositeQueue) {
    let expected = c.core().has_server_access_credits() && c.sub_queue(1).unwrap().is_start_armed();
    assert_eq!(sub_credits(c, 0), if expected { Credits::ONE } else { Credits::ZERO });
    assert_eq!(c.is_start_armed(), c.sub_queue(1).unwrap().is_start_armed());
}

/// A sink that tags every arrival with a discipline-specific notification.
struct Beacon {
    core: QueueCore,
}

const BEACON: NotificationKind = NotificationKind::Custom("BEACON");

impl Beacon {
    fn new(name: &str) -> Self {
        Self { core: QueueCore::new(name, false) }
    }
}

impl QueueDiscipline for Beacon {
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
    fn reschedule_after_arrival(&mut self, _: &mut QueueContext<'_>, _: SimTime, job: JobId) -> QueueResult<()> {
        self.core.record(BEACON, Some(job))
    }
    fn remove_job_upon_drop(&mut self, _: &mut QueueContext<'_>, _: SimTime, _: JobId) -> QueueResult<()> {
        Ok(())
    }
    fn reschedule_after_drop(&mut self, _: &mut QueueContext<'_>, _: SimTime, _: JobId) -> QueueResult<()> {
        Ok(())
    }
    fn remove_job_upon_revocation(&mut self, _: &mut QueueContext<'_>, _: SimTime, _: JobId, _: bool) -> QueueResult<()> {
        Ok(())
    }
    fn reschedule_after_revocation(&mut self, _: &mut QueueContext<'_>, _: SimTime, _: JobId, _: bool) -> QueueResult<()> {
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

enum Quirk {
    /// Revokes every job as it arrives, unasked.
    RevokeOnArrival,
    /// Holds jobs until two wait, then grants itself credits and starts both.
    StartInPairs,
    /// Discards every batch it fires.
    Mute,
    /// Start-armed follows a flag flipped from outside.
    Armed(Rc<Cell<bool>>),
}

/// A sink with one misbehaviour, to drive the composite's fatal checks.
struct Rogue {
    core:  QueueCore,
    quirk: Quirk,
}

impl Rogue {
    fn new(name: &str, quirk: Quirk) -> Self {
        let armed = matches!(&quirk, Quirk::Armed(flag) if flag.get());
        Self { core: QueueCore::new(name, armed), quirk }
    }
}

impl QueueDiscipline for Rogue {
    fn core(&self) -> &QueueCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut QueueCore {
        &mut self.core
    }
    fn is_start_armed(&self) -> bool {
        matches!(&self.quirk, Quirk::Armed(flag) if flag.get())
    }
    fn insert_job_upon_arrival(&mut self, _: &mut QueueContext<'_>, _: SimTime, _: JobId) -> QueueResult<()> {
        Ok(())
    }
    fn reschedule_after_arrival(&mut self, ctx: &mut QueueContext<'_>, time: SimTime, job: JobId) -> QueueResult<()> {
        if matches!(self.quirk, Quirk::RevokeOnArrival) {
            kernel::revoke(self, ctx, time, job, true)?;
        } else if matches!(self.quirk, Quirk::StartInPairs) && self.core.waiting().len() >= 2 {
            let waiting: Vec<JobId> = self.core.waiting().iter().collect();
            self.core.initialize_server_access_credits(Credits::new(waiting.len() as u64));
            for job in waiting {
                kernel::start(self, ctx, time, job)?;
            }
        }
        Ok(())
    }
    fn remove_job_upon_drop(&mut self, _: &mut QueueContext<'_>, _: SimTime, _: JobId) -> QueueResult<()> {
        Ok(())
    }
    fn reschedule_after_drop(&mut self, _: &mut QueueContext<'_>, _: SimTime, _: JobId) -> QueueResult<()> {
        Ok(())
    }
    fn remove_job_upon_revocation(&mut self, _: &mut QueueContext<'_>, _: SimTime, _: JobId, _: bool) -> QueueResult<()> {
        Ok(())
    }
    fn reschedule_after_revocation(&mut self, _: &mut QueueContext<'_>, _: SimTime, _: JobId, _: bool) -> QueueResult<()> {
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
    fn after_notification(&mut self) {
        if matches!(self.quirk, Quirk::Mute) {
            self.core.entity_mut().take_fired();
        }
    }
}

/// Always picks a sub-queue that does not exist.
struct OutOfRange;

impl SubQueueSelector for OutOfRange {
    fn first(&mut self, _: SimTime, _: JobId) -> Option<usize> {
        Some(5)
    }
    fn next(&mut self, _: SimTime, _: JobId, _: usize) -> Option<usize> {
        None
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use super::*;

    #[test]
    fn empty_composite_is_rejected() {
        let err = CompositeQueueBuilder::new("c").build().unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn start_model_cardinality_is_enforced() {
        let err = CompositeQueueBuilder::new("c")
            .sub_queue(Fcfs::new("a"))
            .start_model(StartModel::CompressedTandem2)
            .build()
            .unwrap_err();
        assert!(err.is_invalid_argument());

        let err = CompositeQueueBuilder::new("c")
            .sub_queue(Fcfs::new("a"))
            .sub_queue(Fcfs::new("b"))
            .start_model(StartModel::EncapsulatorQueue)
            .build()
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn drop_destination_must_be_a_sub_queue() {
        let err = CompositeQueueBuilder::new("c")
            .sub_queue(Fcfs::new("a"))
            .drop_destination(1)
            .build()
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn sub_queues_ignore_event_list_resets() {
        let c = tandem("c", vec![boxed(Fcfs::new("a")), boxed(Sink::new("b"))]).unwrap();
        for q in c.sub_queues() {
            assert!(q.core().entity().ignores_event_list_reset());
        }
        assert!(!c.core().entity().ignores_event_list_reset());
    }

    #[test]
    fn compressed_tandem_starts_with_consistent_credits() {
        let c = compressed_tandem2("ct", Fcfs::new("wait"), Fcfs::new("serve")).unwrap();
        assert_eq!(sub_credits(&c, 0), Credits::ONE);
        assert_compressed_tandem_credits(&c);

        let c = compressed_tandem2("ct", Fcfs::new("wait"), Sink::new("never")).unwrap();
        assert_eq!(sub_credits(&c, 0), Credits::ZERO);
        assert!(!c.is_start_armed());
    }

    #[test]
    fn jackson_validates_routing() {
        let subs = || vec![boxed(Fcfs::new("a")), boxed(Fcfs::new("b"))];
        let err = jackson("j", subs(), vec![0.5, 0.6], vec![vec![0.0; 2]; 2], SimRng::new(1)).unwrap_err();
        assert!(err.is_invalid_argument());
        let err = jackson("j", subs(), vec![1.0, 0.0], vec![vec![0.0; 2]], SimRng::new(1)).unwrap_err();
        assert!(err.is_invalid_argument());
        let err = jackson("j", subs(), vec![1.0], vec![vec![0.0]], SimRng::new(1)).unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(jackson("j", subs(), vec![1.0, 0.0], vec![vec![0.0, 1.0], vec![0.0; 2]], SimRng::new(1)).is_ok());
    }
}

// ── Delegate bijection ────────────────────────────────────────────────────────

#[cfg(test)]
mod delegate_tests {
    use super::*;

    #[test]
    fn map_rejects_double_mapping() {
        let mut map = DelegateMap::new();
        map.insert(JobId(1), JobId(10)).unwrap();
        assert!(map.insert(JobId(1), JobId(11)).is_err());
        assert!(map.insert(JobId(2), JobId(10)).is_err());
        assert_eq!(map.delegate_of(JobId(1)).unwrap(), JobId(10));
        assert_eq!(map.real_of(JobId(10)).unwrap(), JobId(1));
        assert_eq!(map.remove(JobId(1)).unwrap(), JobId(10));
        assert!(map.real_of(JobId(10)).is_err());
        assert!(map.is_empty());
        assert!(map.check().is_ok());
    }

    #[test]
    fn composite_round_trips_delegates() {
        let mut bench = Bench::new();
        let mut c = tandem("c", vec![boxed(Sink::new("s"))]).unwrap();
        let a = bench.job("a", 1.0);
        c.arrive(&mut bench.ctx(), t(0.0), a).unwrap();

        let d = c.delegate_of(a).unwrap();
        assert_ne!(d, a);
        assert_eq!(c.real_of(d).unwrap(), a);
        assert!(c.check_bijection().is_ok());
        assert_eq!(bench.jobs.queue_of(a).unwrap(), Some(c.id()));
        assert_eq!(bench.jobs.queue_of(d).unwrap(), Some(c.sub_queue(0).unwrap().id()));
        assert_eq!(bench.jobs.service_time(d, Some(c.sub_queue(0).unwrap().id())).unwrap(), 1.0);
        assert!(c.real_of(a).unwrap_err().is_fatal());
    }
}

// ── Local start model ─────────────────────────────────────────────────────────

#[cfg(test)]
mod local_tests {
    use super::*;

    #[test]
    fn tandem_visits_sub_queues_in_order() {
        let mut bench = Bench::new();
        let mut c = tandem("c", vec![boxed(Fcfs::new("q0")), boxed(Fcfs::new("q1"))]).unwrap();
        let log = logged(&mut c);
        let a = bench.job("a", 2.0);
        c.arrive(&mut bench.ctx(), t(0.0), a).unwrap();
        assert_eq!(log.take()[0].kinds(), vec![NotificationKind::Arrival, NotificationKind::Start]);
        assert!(c.core().is_in_service(a));

        // Departure from q0 moves the delegate on; nothing visible outside.
        let first = bench.step(&mut c).unwrap();
        assert_eq!(first.time, t(2.0));
        assert!(log.is_empty());
        assert_eq!(c.sub_queue(1).unwrap().core().number_of_jobs(), 1);

        bench.run(&mut c);
        let batches = log.take();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].kinds(), vec![NotificationKind::Departure]);
        assert_eq!(batches[0].time, t(4.0));
        assert_eq!(c.core().number_of_jobs(), 0);
        assert_eq!(c.delegate_count(), 0);
        assert_eq!(bench.jobs.len(), 1, "delegate discarded");
    }

    #[test]
    fn nested_transitions_release_one_batch() {
        let mut bench = Bench::new();
        let inner = tandem("inner", vec![boxed(DropQueue::new("drop"))]).unwrap();
        let mut outer = tandem("outer", vec![boxed(inner)]).unwrap();
        let log = logged(&mut outer);
        let a = bench.job("a", 1.0);
        outer.arrive(&mut bench.ctx(), t(0.0), a).unwrap();

        let batches = log.take();
        assert_eq!(batches.len(), 1);
        assert_eq!(
            batches[0].kinds(),
            vec![NotificationKind::Arrival, NotificationKind::Start, NotificationKind::Drop]
        );
        assert_eq!(outer.core().number_of_jobs(), 0);
        assert_eq!(bench.jobs.len(), 1);
        assert!(outer.sub_queue_mut(0).unwrap().take_fired_batches().is_empty());
    }

    #[test]
    fn zero_visits_depart_on_start() {
        let mut bench = Bench::new();
        let mut c = feedback("fb", Fcfs::new("q"), 0).unwrap();
        let log = logged(&mut c);
        let a = bench.job("a", 1.0);
        c.arrive(&mut bench.ctx(), t(0.0), a).unwrap();
        assert_eq!(
            log.take()[0].kinds(),
            vec![NotificationKind::Arrival, NotificationKind::Start, NotificationKind::Departure]
        );
    }

    #[test]
    fn feedback_repeats_visits() {
        let mut bench = Bench::new();
        let mut sub = Fcfs::new("q");
        let sub_log = logged(&mut sub);
        let mut c = feedback("fb", sub, 3).unwrap();
        let a = bench.job("a", 1.0);
        c.arrive(&mut bench.ctx(), t(0.0), a).unwrap();
        bench.run(&mut c);

        let starts: usize = sub_log.batches().iter().map(|b| b.count(NotificationKind::Start)).sum();
        assert_eq!(starts, 3);
        assert_eq!(c.core().last_update(), t(3.0));
        assert_eq!(c.core().number_of_jobs(), 0);
    }

    #[test]
    fn jackson_follows_certain_routes() {
        let mut bench = Bench::new();
        let mut q1 = Fcfs::new("q1");
        let q1_log = logged(&mut q1);
        let mut c = jackson(
            "j",
            vec![boxed(Fcfs::new("q0")), boxed(q1)],
            vec![1.0, 0.0],
            vec![vec![0.0, 1.0], vec![0.0, 0.0]],
            SimRng::new(7),
        )
        .unwrap();
        let a = bench.job("a", 1.0);
        c.arrive(&mut bench.ctx(), t(0.0), a).unwrap();
        bench.run(&mut c);
        assert_eq!(q1_log.batches().iter().filter(|b| b.contains(NotificationKind::Departure)).count(), 1);
        assert_eq!(c.core().last_update(), t(2.0));
    }

    #[test]
    fn credits_hold_jobs_in_the_composite() {
        let mut bench = Bench::new();
        let mut c = tandem("c", vec![boxed(Fcfs::new("q"))]).unwrap();
        c.set_server_access_credits(&mut bench.ctx(), t(0.0), Credits::ZERO).unwrap();
        let a = bench.job("a", 1.0);
        let b = bench.job("b", 1.0);
        c.arrive(&mut bench.ctx(), t(0.0), a).unwrap();
        c.arrive(&mut bench.ctx(), t(0.0), b).unwrap();
        assert!(c.core().is_waiting(a));
        assert_eq!(c.sub_queue(0).unwrap().core().number_of_jobs(), 0);

        let log = logged(&mut c);
        c.set_server_access_credits(&mut bench.ctx(), t(1.0), Credits::ONE).unwrap();
        let batch = &log.take()[0];
        assert_eq!(batch.kinds(), vec![NotificationKind::Start]);
        assert_eq!(batch.records[0].job, Some(a));
        assert!(c.core().is_waiting(b));
    }

    #[test]
    fn drop_destination_catches_dropped_delegates() {
        let mut bench = Bench::new();
        let mut c = CompositeQueueBuilder::new("c")
            .sub_queue(Fcfs::with_buffer("small", 0))
            .sub_queue(Sink::new("overflow"))
            .drop_destination(1)
            .build()
            .unwrap();
        let log = logged(&mut c);
        let a = bench.job("a", 5.0);
        let b = bench.job("b", 5.0);
        c.arrive(&mut bench.ctx(), t(0.0), a).unwrap();
        c.arrive(&mut bench.ctx(), t(0.0), b).unwrap();

        assert_eq!(log.take()[1].kinds(), vec![NotificationKind::Arrival, NotificationKind::Start]);
        assert!(c.core().is_in_service(b));
        let d = c.delegate_of(b).unwrap();
        assert_eq!(bench.jobs.queue_of(d).unwrap(), Some(c.sub_queue(1).unwrap().id()));
    }

    #[test]
    fn drop_at_the_destination_drops_the_real_job() {
        let mut bench = Bench::new();
        let mut c = CompositeQueueBuilder::new("c")
            .sub_queue(DropQueue::new("d"))
            .drop_destination(0)
            .build()
            .unwrap();
        let log = logged(&mut c);
        let a = bench.job("a", 1.0);
        c.arrive(&mut bench.ctx(), t(0.0), a).unwrap();

        assert_eq!(
            log.take()[0].kinds(),
            vec![NotificationKind::Arrival, NotificationKind::Start, NotificationKind::Drop]
        );
        assert_eq!(c.core().number_of_jobs(), 0);
        assert_eq!(c.delegate_count(), 0);
        assert_eq!(bench.jobs.len(), 1);
    }

    #[test]
    fn full_drop_destination_drops_the_real_job() {
        let mut bench = Bench::new();
        let mut c = CompositeQueueBuilder::new("c")
            .sub_queue(Fcfs::with_buffer("small", 0))
            .sub_queue(Fcfs::with_buffer("overflow", 0))
            .drop_destination(1)
            .build()
            .unwrap();
        let log = logged(&mut c);
        let a = bench.job("a", 5.0);
        let b = bench.job("b", 5.0);
        let x = bench.job("x", 5.0);
        for job in [a, b, x] {
            c.arrive(&mut bench.ctx(), t(0.0), job).unwrap();
        }

        let batches = log.take();
        assert_eq!(
            batches[2].kinds(),
            vec![NotificationKind::Arrival, NotificationKind::Start, NotificationKind::Drop]
        );
        assert_eq!(batches[2].find(NotificationKind::Drop).unwrap().job, Some(x));
        assert!(c.core().is_in_service(a));
        assert!(c.core().is_in_service(b));
        assert!(!c.core().contains(x));
        assert_eq!(bench.jobs.queue_of(x).unwrap(), None);
        assert!(c.check_bijection().is_ok());
    }

    #[test]
    fn random_selector_sends_each_job_to_one_sub_queue() {
        fn arrivals_per_sub_queue(seed: u64) -> Vec<usize> {
            let mut bench = Bench::new();
            let mut logs = Vec::new();
            let mut subs = Vec::new();
            for name in ["q0", "q1", "q2"] {
                let mut q = InfiniteServer::new(name);
                logs.push(logged(&mut q));
                subs.push(boxed(q));
            }
            let mut c = CompositeQueueBuilder::new("r")
                .sub_queues(subs)
                .selector(RandomSelector::new(3, SimRng::new(seed)))
                .build()
                .unwrap();
            for i in 0..12 {
                let job = bench.job(&format!("j{i}"), 1.0);
                c.arrive(&mut bench.ctx(), t(0.0), job).unwrap();
            }
            bench.run(&mut c);
            assert_eq!(c.core().number_of_jobs(), 0);
            assert_eq!(bench.jobs.len(), 12);
            logs.iter()
                .map(|log| log.batches().iter().map(|b| b.count(NotificationKind::Arrival)).sum::<usize>())
                .collect()
        }

        let visits = arrivals_per_sub_queue(11);
        assert_eq!(visits.iter().sum::<usize>(), 12);
        assert_eq!(arrivals_per_sub_queue(11), visits);
    }

    #[test]
    fn unregistered_sub_queue_is_invalid() {
        let mut bench = Bench::new();
        let mut c = CompositeQueueBuilder::new("c")
            .sub_queue(Sink::new("s"))
            .selector(OutOfRange)
            .build()
            .unwrap();
        let a = bench.job("a", 1.0);
        let err = c.arrive(&mut bench.ctx(), t(0.0), a).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn custom_notifications_are_not_re_emitted() {
        let mut bench = Bench::new();
        let mut c = tandem("c", vec![boxed(Beacon::new("b"))]).unwrap();
        let log = logged(&mut c);
        let a = bench.job("a", 1.0);
        c.arrive(&mut bench.ctx(), t(0.0), a).unwrap();
        assert!(!log.take()[0].contains(BEACON));
    }
}

// ── Encapsulator models ───────────────────────────────────────────────────────

#[cfg(test)]
mod encapsulator_tests {
    use super::*;

    #[test]
    fn encapsulator_mirrors_the_sub_queue() {
        let mut bench = Bench::new();
        let mut c = encapsulator("e", Fcfs::new("q")).unwrap();
        let log = logged(&mut c);
        let a = bench.job("a", 1.0);
        let b = bench.job("b", 1.0);
        c.arrive(&mut bench.ctx(), t(0.0), a).unwrap();
        c.arrive(&mut bench.ctx(), t(0.0), b).unwrap();

        assert_eq!(
            log.take()[0].kinds(),
            vec![NotificationKind::Arrival, NotificationKind::Start, NotificationKind::StartArmedFalse]
        );
        assert!(c.core().is_in_service(a));
        assert!(c.core().is_waiting(b));
        assert!(!c.is_start_armed());

        bench.step(&mut c).unwrap();
        let batch = &log.take()[0];
        assert_eq!(batch.kinds(), vec![NotificationKind::Departure, NotificationKind::Start]);
        assert_eq!(batch.records[0].job, Some(a));
        assert_eq!(batch.records[1].job, Some(b));
    }

    #[test]
    fn encapsulator_passes_credits_down() {
        let mut bench = Bench::new();
        let mut c = encapsulator("e", Fcfs::new("q")).unwrap();
        c.set_server_access_credits(&mut bench.ctx(), t(0.0), Credits::ZERO).unwrap();
        assert_eq!(sub_credits(&c, 0), Credits::ZERO);
        let a = bench.job("a", 1.0);
        c.arrive(&mut bench.ctx(), t(0.0), a).unwrap();
        assert!(c.core().is_waiting(a));

        let log = logged(&mut c);
        c.set_server_access_credits(&mut bench.ctx(), t(1.0), Credits::new(2)).unwrap();
        let batch = &log.take()[0];
        assert_eq!(batch.count(NotificationKind::Start), 1);
        assert!(!batch.contains(NotificationKind::OutOfServerAccessCredits));
        assert_eq!(c.core().server_access_credits(), Credits::ONE);
        assert_eq!(sub_credits(&c, 0), Credits::ONE);
    }

    #[test]
    fn hide_start_keeps_jobs_waiting() {
        let mut bench = Bench::new();
        let mut c = encapsulator_hide_start("h", Fcfs::new("q")).unwrap();
        let log = logged(&mut c);
        let a = bench.job("a", 1.0);
        c.arrive(&mut bench.ctx(), t(0.0), a).unwrap();
        assert_eq!(log.take()[0].kinds(), vec![NotificationKind::Arrival]);
        assert!(c.core().is_waiting(a));
        assert!(c.sub_queue(0).unwrap().core().is_in_service(c.delegate_of(a).unwrap()));
        assert!(!c.is_start_armed());

        bench.run(&mut c);
        assert_eq!(log.take()[0].kinds(), vec![NotificationKind::Departure]);
        assert!(!c.is_start_armed());
    }

    #[test]
    fn hide_start_leaves_sub_queue_credits_alone() {
        let mut bench = Bench::new();
        let mut c = encapsulator_hide_start("h", Fcfs::new("q")).unwrap();
        c.set_server_access_credits(&mut bench.ctx(), t(0.0), Credits::ZERO).unwrap();
        assert!(sub_credits(&c, 0).is_infinite());
    }

    #[test]
    fn custom_notifications_are_re_emitted() {
        let mut bench = Bench::new();
        let mut c = encapsulator("e", Beacon::new("b")).unwrap();
        let log = logged(&mut c);
        let a = bench.job("a", 1.0);
        c.arrive(&mut bench.ctx(), t(0.0), a).unwrap();
        let batch = &log.take()[0];
        let beacon = batch.find(BEACON).unwrap();
        assert_eq!(beacon.job, Some(a));
        assert_eq!(beacon.queue, c.id());
    }

    #[test]
    fn autonomous_start_armed_change_shows_up_on_trigger() {
        let armed = Rc::new(Cell::new(false));
        let mut c = encapsulator("e", Rogue::new("s", Quirk::Armed(armed.clone()))).unwrap();
        let log = logged(&mut c);
        assert!(!c.is_start_armed());

        armed.set(true);
        assert!(c.is_start_armed());
        assert!(log.is_empty());
        c.trigger_potential_new_start_armed(t(1.0)).unwrap();
        let batches = log.take();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].kinds(), vec![NotificationKind::StartArmedTrue]);
        assert_eq!(batches[0].time, t(1.0));

        // Nothing changed since: no batch.
        c.trigger_potential_new_start_armed(t(2.0)).unwrap();
        assert!(log.is_empty());
        assert_eq!(c.core().last_update(), t(2.0));

        armed.set(false);
        c.trigger_potential_new_start_armed(t(2.0)).unwrap();
        assert_eq!(log.take()[0].kinds(), vec![NotificationKind::StartArmedFalse]);
    }
}

// ── Compressed tandem ─────────────────────────────────────────────────────────

#[cfg(test)]
mod compressed_tandem_tests {
    use super::*;

    #[test]
    fn arrival_moves_straight_to_service() {
        let mut bench = Bench::new();
        let mut c = compressed_tandem2("ct", Fcfs::new("wait"), Fcfs::new("serve")).unwrap();
        let log = logged(&mut c);
        let a = bench.job("a", 1.0);
        c.arrive(&mut bench.ctx(), t(0.0), a).unwrap();

        assert_eq!(
            log.take()[0].kinds(),
            vec![NotificationKind::Arrival, NotificationKind::Start, NotificationKind::StartArmedFalse]
        );
        let d = c.delegate_of(a).unwrap();
        assert!(c.core().is_in_service(a));
        assert!(c.sub_queue(1).unwrap().core().is_in_service(d));
        assert_eq!(c.sub_queue(0).unwrap().core().number_of_jobs(), 0);
        assert_compressed_tandem_credits(&c);
    }

    #[test]
    fn waiting_job_starts_when_service_frees_up() {
        let mut bench = Bench::new();
        let mut c = compressed_tandem2("ct", Fcfs::new("wait"), Fcfs::new("serve")).unwrap();
        let a = bench.job("a", 1.0);
        let b = bench.job("b", 1.0);
        c.arrive(&mut bench.ctx(), t(0.0), a).unwrap();
        c.arrive(&mut bench.ctx(), t(0.5), b).unwrap();
        assert!(c.core().is_waiting(b));
        assert!(c.sub_queue(0).unwrap().core().is_waiting(c.delegate_of(b).unwrap()));
        assert_compressed_tandem_credits(&c);

        let log = logged(&mut c);
        bench.step(&mut c).unwrap();
        let batch = &log.take()[0];
        assert_eq!(batch.kinds(), vec![NotificationKind::Departure, NotificationKind::Start]);
        assert_eq!(batch.records[0].job, Some(a));
        assert_eq!(batch.records[1].job, Some(b));
        assert!(c.core().is_in_service(b));
        assert_compressed_tandem_credits(&c);

        bench.run(&mut c);
        assert_eq!(c.core().number_of_jobs(), 0);
        assert!(c.is_start_armed());
        assert_compressed_tandem_credits(&c);
    }

    #[test]
    fn composite_credits_gate_sub_queue_zero() {
        let mut bench = Bench::new();
        let mut c = compressed_tandem2("ct", Fcfs::new("wait"), Fcfs::new("serve")).unwrap();
        c.set_server_access_credits(&mut bench.ctx(), t(0.0), Credits::ZERO).unwrap();
        assert_compressed_tandem_credits(&c);

        let a = bench.job("a", 1.0);
        c.arrive(&mut bench.ctx(), t(0.0), a).unwrap();
        assert!(c.core().is_waiting(a));

        let log = logged(&mut c);
        c.set_server_access_credits(&mut bench.ctx(), t(1.0), Credits::ONE).unwrap();
        let batch = &log.take()[0];
        assert_eq!(
            batch.kinds(),
            vec![NotificationKind::Start, NotificationKind::StartArmedFalse]
        );
        assert_eq!(c.core().server_access_credits(), Credits::ZERO);
        assert_compressed_tandem_credits(&c);
    }

    #[test]
    fn revoking_a_waiting_job_uses_the_handshake() {
        let mut bench = Bench::new();
        let mut c = compressed_tandem2("ct", Fcfs::new("wait"), Fcfs::new("serve")).unwrap();
        let a = bench.job("a", 1.0);
        let b = bench.job("b", 1.0);
        c.arrive(&mut bench.ctx(), t(0.0), a).unwrap();
        c.arrive(&mut bench.ctx(), t(0.0), b).unwrap();

        let log = logged(&mut c);
        assert!(c.revoke(&mut bench.ctx(), t(0.5), b, false).unwrap());
        assert_eq!(log.take()[0].kinds(), vec![NotificationKind::Revocation]);
        assert!(c.pending_revocation().is_idle());
        assert_eq!(c.sub_queue(0).unwrap().core().number_of_jobs(), 0);
        assert_eq!(bench.jobs.len(), 3, "two real jobs and a's delegate");
        assert!(c.check_bijection().is_ok());
    }
}

// ── Revocation ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod revocation_tests {
    use super::*;

    #[test]
    fn delegate_in_service_needs_interrupt() {
        let mut bench = Bench::new();
        let mut c = tandem("c", vec![boxed(Fcfs::new("q"))]).unwrap();
        let a = bench.job("a", 3.0);
        c.arrive(&mut bench.ctx(), t(0.0), a).unwrap();
        let log = logged(&mut c);
        let d = c.delegate_of(a).unwrap();

        assert!(!c.revoke(&mut bench.ctx(), t(1.0), a, false).unwrap());
        assert!(log.is_empty());
        assert!(c.sub_queue(0).unwrap().core().is_in_service(d));
        assert_eq!(c.delegate_of(a).unwrap(), d);

        assert!(c.revoke(&mut bench.ctx(), t(1.0), a, true).unwrap());
        assert_eq!(log.take()[0].kinds(), vec![NotificationKind::Revocation]);
        assert!(c.pending_revocation().is_idle());
        assert_eq!(c.sub_queue(0).unwrap().core().number_of_jobs(), 0);
        assert!(!bench.jobs.contains(d));
        assert!(bench.events.is_empty());
    }

    #[test]
    fn encapsulated_waiting_job_is_revoked_without_interrupt() {
        let mut bench = Bench::new();
        let mut c = encapsulator("e", Fcfs::new("q")).unwrap();
        let a = bench.job("a", 3.0);
        let b = bench.job("b", 3.0);
        c.arrive(&mut bench.ctx(), t(0.0), a).unwrap();
        c.arrive(&mut bench.ctx(), t(0.0), b).unwrap();
        assert!(c.revoke(&mut bench.ctx(), t(1.0), b, false).unwrap());
        assert_eq!(c.core().number_of_jobs(), 1);
        assert_eq!(c.sub_queue(0).unwrap().core().number_of_jobs(), 1);
        assert!(c.check_bijection().is_ok());
    }

    #[test]
    fn unstarted_local_job_needs_no_handshake() {
        let mut bench = Bench::new();
        let mut c = tandem("c", vec![boxed(Fcfs::new("q"))]).unwrap();
        c.set_server_access_credits(&mut bench.ctx(), t(0.0), Credits::ZERO).unwrap();
        let a = bench.job("a", 1.0);
        c.arrive(&mut bench.ctx(), t(0.0), a).unwrap();
        assert!(c.revoke(&mut bench.ctx(), t(0.0), a, false).unwrap());
        assert_eq!(bench.jobs.len(), 1);
        assert_eq!(c.delegate_count(), 0);
    }
}

// ── Reset and failure modes ───────────────────────────────────────────────────

#[cfg(test)]
mod reset_tests {
    use super::*;

    #[test]
    fn reset_empties_everything_and_is_idempotent() {
        let mut bench = Bench::new();
        let mut c = compressed_tandem2("ct", Fcfs::new("wait"), Fcfs::new("serve")).unwrap();
        let a = bench.job("a", 1.0);
        let b = bench.job("b", 1.0);
        c.arrive(&mut bench.ctx(), t(0.0), a).unwrap();
        c.arrive(&mut bench.ctx(), t(0.0), b).unwrap();
        c.set_server_access_credits(&mut bench.ctx(), t(0.0), Credits::ZERO).unwrap();
        let log = logged(&mut c);

        c.reset(&mut bench.ctx()).unwrap();
        c.reset(&mut bench.ctx()).unwrap();
        let batches = log.take();
        assert_eq!(batches.len(), 2);
        for batch in &batches {
            assert_eq!(batch.kinds(), vec![NotificationKind::Reset]);
        }
        assert_eq!(c.core().number_of_jobs(), 0);
        assert_eq!(c.delegate_count(), 0);
        assert_eq!(bench.jobs.len(), 2, "delegates discarded");
        assert!(bench.events.is_empty());
        for q in c.sub_queues() {
            assert_eq!(q.core().number_of_jobs(), 0);
        }
        assert_compressed_tandem_credits(&c);
        assert!(c.sub_queue_mut(0).unwrap().take_fired_batches().is_empty());
    }

    #[test]
    fn sub_queue_vacation_is_fatal() {
        let mut bench = Bench::new();
        let mut c = tandem("c", vec![boxed(Fcfs::new("q"))]).unwrap();
        let event = ScheduledEvent {
            id:     EventId(0),
            time:   t(1.0),
            target: c.sub_queue(0).unwrap().id(),
            action: EventAction::Request(QueueRequest::SetQueueAccessVacation(true)),
        };
        let err = c.handle_event(&mut bench.ctx(), &event).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn unknown_event_target_is_invalid() {
        let mut bench = Bench::new();
        let mut c = tandem("c", vec![boxed(Fcfs::new("q"))]).unwrap();
        let stranger = Sink::new("elsewhere");
        let event = ScheduledEvent {
            id:     EventId(0),
            time:   t(1.0),
            target: stranger.id(),
            action: EventAction::Request(QueueRequest::Update),
        };
        let err = c.handle_event(&mut bench.ctx(), &event).unwrap_err();
        assert!(err.is_invalid_argument());
    }
}

// ── Fatal sub-queue behaviour ─────────────────────────────────────────────────

#[cfg(test)]
mod invariant_tests {
    use super::*;

    #[test]
    fn two_start_pairs_in_one_batch_are_fatal() {
        let mut bench = Bench::new();
        let mut c = compressed_tandem2(
            "ct",
            Rogue::new("pairs", Quirk::StartInPairs),
            InfiniteServer::new("serve"),
        )
        .unwrap();
        let a = bench.job("a", 1.0);
        let b = bench.job("b", 1.0);
        c.arrive(&mut bench.ctx(), t(0.0), a).unwrap();
        assert!(c.core().is_waiting(a));

        let err = c.arrive(&mut bench.ctx(), t(0.0), b).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("single job per batch"));
    }

    #[test]
    fn unsolicited_sub_queue_revocation_is_fatal() {
        let mut bench = Bench::new();
        let mut c = tandem("c", vec![boxed(Rogue::new("r", Quirk::RevokeOnArrival))]).unwrap();
        let a = bench.job("a", 1.0);
        let err = c.arrive(&mut bench.ctx(), t(0.0), a).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("unexpected revocation"));
        assert!(c.pending_revocation().is_idle());
    }

    #[test]
    fn auto_revocation_outside_compressed_tandem_is_fatal() {
        let mut bench = Bench::new();
        let mut q = Fcfs::new("q");
        q.core_mut().set_auto_revocation_policy(AutoRevocationPolicy::UponStart);
        let mut c = tandem("c", vec![boxed(q)]).unwrap();
        let a = bench.job("a", 1.0);
        let err = c.arrive(&mut bench.ctx(), t(0.0), a).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("auto-revocation at sub-queue 0"));
    }

    #[test]
    fn auto_revocation_at_the_serving_sub_queue_is_fatal() {
        let mut bench = Bench::new();
        let mut serve = Fcfs::new("serve");
        serve.core_mut().set_auto_revocation_policy(AutoRevocationPolicy::UponStart);
        let mut c = compressed_tandem2("ct", Fcfs::new("wait"), serve).unwrap();
        let a = bench.job("a", 1.0);
        let err = c.arrive(&mut bench.ctx(), t(0.0), a).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("auto-revocation at sub-queue 1"));
    }

    #[test]
    fn unfinished_revocation_handshake_is_fatal() {
        let mut bench = Bench::new();
        let mut c = tandem("c", vec![boxed(Rogue::new("m", Quirk::Mute))]).unwrap();
        let a = bench.job("a", 1.0);
        c.arrive(&mut bench.ctx(), t(0.0), a).unwrap();
        let d = c.delegate_of(a).unwrap();
        assert_eq!(bench.jobs.queue_of(d).unwrap(), Some(c.sub_queue(0).unwrap().id()));

        let err = c.revoke(&mut bench.ctx(), t(1.0), a, true).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("never completed"));
    }
}

// ── Random operation sequences ────────────────────────────────────────────────

#[cfg(test)]
mod property_tests {
    use proptest::prelude::*;

    use super::*;

    #[derive(Debug, Clone)]
    enum Op {
        Arrive,
        Revoke(usize, bool),
        Credits(u64),
        Step,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => Just(Op::Arrive),
            1 => (0usize..32, any::<bool>()).prop_map(|(i, interrupt)| Op::Revoke(i, interrupt)),
            1 => (0u64..3).prop_map(Op::Credits),
            3 => Just(Op::Step),
        ]
    }

    fn drive(c: &mut CompositeQueue, ops: Vec<Op>, check: impl Fn(&CompositeQueue)) {
        let mut bench = Bench::new();
        let mut created: Vec<JobId> = Vec::new();
        let mut now = 0.0;
        for op in ops {
            while bench.events.peek_time().is_some_and(|at| at.0 <= now) {
                bench.step(c);
            }
            match op {
                Op::Arrive => {
                    let job = bench.job("j", 0.75);
                    created.push(job);
                    c.arrive(&mut bench.ctx(), t(now), job).unwrap();
                }
                Op::Revoke(i, interrupt) => {
                    if let Some(&job) = created.get(i % created.len().max(1)) {
                        c.revoke(&mut bench.ctx(), t(now), job, interrupt).unwrap();
                    }
                }
                Op::Credits(n) => {
                    c.set_server_access_credits(&mut bench.ctx(), t(now), Credits::new(n)).unwrap();
                }
                Op::Step => {
                    if let Some(event) = bench.step(c) {
                        now = f64::max(now, event.time.0);
                    }
                }
            }

            assert!(c.core().check_partition().is_ok());
            assert!(c.check_bijection().is_ok());
            assert!(c.pending_revocation().is_idle());
            for q in c.sub_queues() {
                assert!(q.core().check_partition().is_ok());
            }
            for &job in &created {
                let owner = bench.jobs.queue_of(job).unwrap();
                assert_eq!(owner == Some(c.id()), c.core().contains(job));
            }
            assert_eq!(bench.jobs.len(), created.len() + c.delegate_count());
            check(c);
            now += 0.25;
        }
    }

    proptest! {
        #[test]
        fn compressed_tandem_invariants(ops in prop::collection::vec(op_strategy(), 1..60)) {
            let mut c = compressed_tandem2("ct", Fcfs::new("wait"), Fcfs::new("serve")).unwrap();
            drive(&mut c, ops, |c| {
                assert_compressed_tandem_credits(c);
                assert_eq!(c.core().waiting().len(), c.sub_queue(0).unwrap().core().number_of_jobs());
                assert_eq!(c.core().service().len(), c.sub_queue(1).unwrap().core().number_of_jobs());
            });
        }

        #[test]
        fn tandem_invariants(ops in prop::collection::vec(op_strategy(), 1..60)) {
            let mut c = tandem("t", vec![boxed(Fcfs::new("a")), boxed(Fcfs::with_buffer("b", 1))]).unwrap();
            drive(&mut c, ops, |c| {
                let visiting: usize = c.sub_queues().iter().map(|q| q.core().number_of_jobs()).sum();
                assert_eq!(visiting, c.core().service().len());
            });
        }

        #[test]
        fn encapsulator_invariants(ops in prop::collection::vec(op_strategy(), 1..60)) {
            let mut c = encapsulator("e", Fcfs::new("q")).unwrap();
            drive(&mut c, ops, |c| {
                let sub = c.sub_queue(0).unwrap();
                assert_eq!(c.core().waiting().len(), sub.core().waiting().len());
                assert_eq!(c.core().service().len(), sub.core().service().len());
                assert_eq!(c.is_start_armed(), sub.is_start_armed());
            });
        }
    }
}
