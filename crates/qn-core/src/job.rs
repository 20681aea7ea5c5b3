//! Job arena.
//!
//! Jobs are opaque handles ([`JobId`]) into a `JobArena` owned by the
//! simulation.  The arena keeps, per job, the service-time function and the
//! back-reference to the queue currently holding it.  Queues never own job
//! data; they only move handles between their containers and keep the
//! back-reference in agreement with container membership.

use rustc_hash::FxHashMap;

use crate::{EntityId, JobId, QnError, QnResult};

/// Requested service time of a job, parameterised by the visited queue.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceTime {
    /// The same service time at every queue.
    Fixed(f64),
    /// A default service time with per-queue overrides.
    PerQueue {
        default:   f64,
        overrides: FxHashMap<EntityId, f64>,
    },
}

impl ServiceTime {
    /// Service time requested at `queue` (`None` = not visiting any queue).
    pub fn at(&self, queue: Option<EntityId>) -> f64 {
        match self {
            ServiceTime::Fixed(t) => *t,
            ServiceTime::PerQueue { default, overrides } => queue
                .and_then(|q| overrides.get(&q).copied())
                .unwrap_or(*default),
        }
    }
}

/// Whether a job is visible to external callers or stands in for one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Real,
    /// Created by `composite` to visit its sub-queues on behalf of `real`.
    Delegate { real: JobId, composite: EntityId },
}

/// Per-job data held by the arena.
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub name:         String,
    pub service_time: ServiceTime,
    pub kind:         JobKind,
    queue:            Option<EntityId>,
}

impl JobRecord {
    /// The queue currently holding this job, if any.
    #[inline]
    pub fn queue(&self) -> Option<EntityId> {
        self.queue
    }
}

/// Issues [`JobId`]s and stores [`JobRecord`]s.
#[derive(Debug, Default)]
pub struct JobArena {
    records: FxHashMap<JobId, JobRecord>,
    next:    u32,
}

impl JobArena {
    pub fn new() -> Self {
        Self::default()
    }

    fn issue(&mut self, record: JobRecord) -> JobId {
        let id = JobId(self.next);
        self.next += 1;
        self.records.insert(id, record);
        id
    }

    /// Register a real job.
    pub fn add(&mut self, name: impl Into<String>, service_time: ServiceTime) -> JobId {
        self.issue(JobRecord {
            name: name.into(),
            service_time,
            kind: JobKind::Real,
            queue: None,
        })
    }

    /// Register a delegate job standing in for `real` inside `composite`.
    pub fn add_delegate(&mut self, real: JobId, composite: EntityId) -> QnResult<JobId> {
        let name = format!("{}@{}", self.get(real)?.name, composite);
        Ok(self.issue(JobRecord {
            name,
            service_time: ServiceTime::Fixed(0.0),
            kind: JobKind::Delegate { real, composite },
            queue: None,
        }))
    }

    /// Remove a job from the arena.
    pub fn remove(&mut self, job: JobId) -> QnResult<JobRecord> {
        self.records.remove(&job).ok_or(QnError::JobNotFound(job))
    }

    pub fn get(&self, job: JobId) -> QnResult<&JobRecord> {
        self.records.get(&job).ok_or(QnError::JobNotFound(job))
    }

    pub fn contains(&self, job: JobId) -> bool {
        self.records.contains_key(&job)
    }

    pub fn queue_of(&self, job: JobId) -> QnResult<Option<EntityId>> {
        Ok(self.get(job)?.queue)
    }

    pub fn set_queue(&mut self, job: JobId, queue: Option<EntityId>) -> QnResult<()> {
        let record = self.records.get_mut(&job).ok_or(QnError::JobNotFound(job))?;
        record.queue = queue;
        Ok(())
    }

    /// Service time `job` requests at `queue`.
    ///
    /// A delegate job requests whatever its real job requests at the
    /// composite that created it, regardless of the sub-queue it visits.
    pub fn service_time(&self, job: JobId, queue: Option<EntityId>) -> QnResult<f64> {
        let mut job = job;
        let mut queue = queue;
        loop {
            let record = self.get(job)?;
            match record.kind {
                JobKind::Real => return Ok(record.service_time.at(queue)),
                JobKind::Delegate { real, composite } => {
                    job = real;
                    queue = Some(composite);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
