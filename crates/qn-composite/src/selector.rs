//! Sub-queue selectors: routing of delegate jobs through a composite.
//!
//! Selectors answer with sub-queue indices.  The composite rejects an index
//! outside its sub-queue range as an invalid argument.

use qn_core::{JobId, QnError, QnResult, SimRng, SimTime};
use rustc_hash::FxHashMap;

pub trait SubQueueSelector {
    /// First sub-queue for `job`, or `None` to depart at once.
    fn first(&mut self, time: SimTime, job: JobId) -> Option<usize>;

    /// Sub-queue after `previous`, or `None` to depart.
    fn next(&mut self, time: SimTime, job: JobId, previous: usize) -> Option<usize>;

    /// The composite was reset.
    fn reset(&mut self) {}

    /// `job` left the composite.
    fn release(&mut self, _job: JobId) {}
}

/// Visits sub-queues `0..len` in order.
#[derive(Debug, Clone, Copy)]
pub struct TandemSelector {
    len: usize,
}

impl TandemSelector {
    pub fn new(len: usize) -> Self {
        Self { len }
    }
}

impl SubQueueSelector for TandemSelector {
    fn first(&mut self, _time: SimTime, _job: JobId) -> Option<usize> {
        (self.len > 0).then_some(0)
    }

    fn next(&mut self, _time: SimTime, _job: JobId, previous: usize) -> Option<usize> {
        let next = previous + 1;
        (next < self.len).then_some(next)
    }
}

/// Sends every job through sub-queue 0 exactly `visits` times.
#[derive(Debug, Clone)]
pub struct FeedbackSelector {
    visits: u32,
    done:   FxHashMap<JobId, u32>,
}

impl FeedbackSelector {
    pub fn new(visits: u32) -> Self {
        Self { visits, done: FxHashMap::default() }
    }

    pub fn visits(&self) -> u32 {
        self.visits
    }
}

impl SubQueueSelector for FeedbackSelector {
    fn first(&mut self, _time: SimTime, job: JobId) -> Option<usize> {
        if self.visits == 0 {
            return None;
        }
        self.done.insert(job, 1);
        Some(0)
    }

    fn next(&mut self, _time: SimTime, job: JobId, _previous: usize) -> Option<usize> {
        let done = self.done.entry(job).or_insert(0);
        if *done >= self.visits {
            self.done.remove(&job);
            return None;
        }
        *done += 1;
        Some(0)
    }

    fn reset(&mut self) {
        self.done.clear();
    }

    fn release(&mut self, job: JobId) {
        self.done.remove(&job);
    }
}

/// Probabilistic routing: `entry[i]` is the probability of entering at
/// sub-queue `i`, `routing[i][j]` of moving from `i` to `j`.  Residual mass
/// of a row means departure.
#[derive(Debug, Clone)]
pub struct JacksonSelector {
    entry:   Vec<f64>,
    routing: Vec<Vec<f64>>,
    rng:     SimRng,
}

impl JacksonSelector {
    pub fn new(entry: Vec<f64>, routing: Vec<Vec<f64>>, rng: SimRng) -> QnResult<Self> {
        let n = entry.len();
        check_distribution("entry vector", &entry)?;
        if routing.len() != n {
            return Err(QnError::Config(format!(
                "routing matrix has {} rows for {n} sub-queues",
                routing.len()
            )));
        }
        for (i, row) in routing.iter().enumerate() {
            if row.len() != n {
                return Err(QnError::Config(format!("routing row {i} has {} entries, expected {n}", row.len())));
            }
            check_distribution(&format!("routing row {i}"), row)?;
        }
        Ok(Self { entry, routing, rng })
    }

    pub fn len(&self) -> usize {
        self.entry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_empty()
    }
}

fn check_distribution(what: &str, weights: &[f64]) -> QnResult<()> {
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(QnError::Config(format!("{what} has a negative or non-finite probability")));
    }
    let sum: f64 = weights.iter().sum();
    if sum > 1.0 + 1e-9 {
        return Err(QnError::Config(format!("{what} sums to {sum} > 1")));
    }
    Ok(())
}

impl SubQueueSelector for JacksonSelector {
    fn first(&mut self, _time: SimTime, _job: JobId) -> Option<usize> {
        self.rng.pick_weighted(&self.entry)
    }

    fn next(&mut self, _time: SimTime, _job: JobId, previous: usize) -> Option<usize> {
        let row = self.routing.get(previous)?;
        self.rng.pick_weighted(row)
    }
}

/// Sends each job to one uniformly chosen sub-queue, then departs it.
#[derive(Debug, Clone)]
pub struct RandomSelector {
    len: usize,
    rng: SimRng,
}

impl RandomSelector {
    pub fn new(len: usize, rng: SimRng) -> Self {
        Self { len, rng }
    }
}

impl SubQueueSelector for RandomSelector {
    fn first(&mut self, _time: SimTime, _job: JobId) -> Option<usize> {
        (self.len > 0).then(|| self.rng.gen_range(0..self.len))
    }

    fn next(&mut self, _time: SimTime, _job: JobId, _previous: usize) -> Option<usize> {
        None
    }
}
