//! tandem: a small worked example for the rust_qn engine.
//!
//! Two networks share one event list:
//!
//! - `checkout`: a compressed tandem.  Customers queue at `line` and are
//!   served at `till`; from the outside it behaves like one FCFS queue.
//!   Its server-access credits are withdrawn for a while mid-run (the till
//!   closes) and then restored.
//! - `clinic`: a Jackson network.  Patients see `triage`, then either the
//!   `lab` (and then the `doctor`) or the `doctor` directly.
//!
//! Traces land in `output/tandem/notifications.csv` and `events.csv`.

use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use qn_composite::{compressed_tandem2, jackson};
use qn_core::{Credits, EntityId, NotificationBatch, NotificationKind, ServiceTime, SimConfig, SimRng, SimTime};
use qn_event::ScheduledEvent;
use qn_output::{CsvWriter, OutputWriter, TraceObserver};
use qn_queue::{Fcfs, InfiniteServer, QueueDiscipline, SimQueue, TracingListener};
use qn_sim::{SimBuilder, SimObserver, Simulation};

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED:              u64 = 42;
const CUSTOMERS:         usize = 40;
const PATIENTS:          usize = 25;
const MEAN_INTERARRIVAL: f64 = 1.0;
const MEAN_CHECKOUT:     f64 = 0.8;
const MEAN_VISIT:        f64 = 1.5;
const TILL_CLOSED:       (f64, f64) = (10.0, 15.0);

// ── Workload ──────────────────────────────────────────────────────────────────

fn boxed(queue: impl SimQueue + 'static) -> Box<dyn SimQueue> {
    Box::new(queue)
}

fn exponential(rng: &mut SimRng, mean: f64) -> f64 {
    -mean * (1.0 - rng.unit()).ln()
}

/// Schedule `count` Poisson arrivals at `queue`.
fn poisson_arrivals(
    sim:   &mut Simulation,
    rng:   &mut SimRng,
    queue: EntityId,
    count: usize,
    mean:  f64,
    label: &str,
) -> Result<()> {
    let mut at = 0.0;
    for i in 0..count {
        at += exponential(rng, MEAN_INTERARRIVAL);
        let job = sim.add_job(format!("{label}-{i}"), ServiceTime::Fixed(exponential(rng, mean)));
        sim.schedule_arrival(SimTime(at), queue, job)?;
    }
    Ok(())
}

// ── Observer wrapper to count outcomes ───────────────────────────────────────

struct CountingObserver<W: OutputWriter> {
    inner:      TraceObserver<W>,
    events:     usize,
    departures: usize,
    starts:     usize,
}

impl<W: OutputWriter> CountingObserver<W> {
    fn new(inner: TraceObserver<W>) -> Self {
        Self { inner, events: 0, departures: 0, starts: 0 }
    }
}

impl<W: OutputWriter> SimObserver for CountingObserver<W> {
    fn on_event(&mut self, event: &ScheduledEvent) {
        self.events += 1;
        self.inner.on_event(event);
    }

    fn on_batch(&mut self, batch: &NotificationBatch) {
        self.departures += batch.count(NotificationKind::Departure);
        self.starts += batch.count(NotificationKind::Start);
        self.inner.on_batch(batch);
    }

    fn on_sim_end(&mut self, final_time: SimTime, dispatched: u64) {
        self.inner.on_sim_end(final_time, dispatched);
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== tandem: rust_qn queueing networks ===");
    println!("Customers: {CUSTOMERS}  |  Patients: {PATIENTS}  |  Seed: {SEED}");
    println!();

    let config = SimConfig { seed: SEED, ..SimConfig::default() };
    let mut rng = SimRng::new(config.seed);

    // 1. Networks.
    let mut checkout = compressed_tandem2("checkout", Fcfs::new("line"), Fcfs::new("till"))?;
    checkout.add_listener(Box::new(TracingListener));
    let clinic = jackson(
        "clinic",
        vec![
            boxed(Fcfs::new("triage")),
            boxed(InfiniteServer::new("lab")),
            boxed(Fcfs::new("doctor")),
        ],
        vec![1.0, 0.0, 0.0],
        vec![
            vec![0.0, 0.4, 0.6],
            vec![0.0, 0.0, 1.0],
            vec![0.0, 0.0, 0.0],
        ],
        rng.child(1),
    )?;
    let (checkout_id, clinic_id) = (checkout.id(), clinic.id());

    // 2. Simulation and workload.
    let mut sim = SimBuilder::new(config).queue(checkout).queue(clinic).build()?;
    poisson_arrivals(&mut sim, &mut rng, checkout_id, CUSTOMERS, MEAN_CHECKOUT, "customer")?;
    poisson_arrivals(&mut sim, &mut rng, clinic_id, PATIENTS, MEAN_VISIT, "patient")?;
    sim.schedule_server_access_credits(SimTime(TILL_CLOSED.0), checkout_id, Credits::ZERO)?;
    sim.schedule_server_access_credits(SimTime(TILL_CLOSED.1), checkout_id, Credits::INFINITE)?;
    info!(events = sim.events().len(), "workload scheduled");

    // 3. Output.
    std::fs::create_dir_all("output/tandem")?;
    let writer = CsvWriter::new(Path::new("output/tandem"))?;
    let mut obs = CountingObserver::new(TraceObserver::new(writer));

    // 4. Run.
    let t0 = Instant::now();
    sim.run(&mut obs)?;
    let elapsed = t0.elapsed();

    if let Some(e) = obs.inner.take_error() {
        eprintln!("output error: {e}");
    }

    // 5. Summary.
    println!("Simulation complete in {:.3} s", elapsed.as_secs_f64());
    println!("  events dispatched : {}", obs.events);
    println!("  batches written   : {}", obs.inner.batches());
    println!("  starts            : {}", obs.starts);
    println!("  departures        : {}", obs.departures);
    println!("  final time        : {}", sim.now());
    println!();

    println!("{:<10} {:<8} {:<8}", "Queue", "Waiting", "Serving");
    println!("{}", "-".repeat(28));
    for queue in sim.queues() {
        println!(
            "{:<10} {:<8} {:<8}",
            queue.name(),
            queue.core().waiting().len(),
            queue.core().service().len(),
        );
    }

    Ok(())
}
