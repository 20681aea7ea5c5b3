//! `QueueCore`: the state every queue carries, whatever its discipline.
//!
//! # Containers
//!
//! `jobs` holds every admitted job.  `waiting` and `service` partition it:
//! outside of a running operation, each job of `jobs` is in exactly one of
//! the two.  Only the kernel moves jobs between containers.

use qn_core::{Credits, EntityId, JobId, NotificationKind, SimTime};

use crate::entity::EntityCore;
use crate::{JobSet, QueueError, QueueResult};

/// What happens to a job the moment it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoRevocationPolicy {
    #[default]
    None,
    /// Started jobs are revoked immediately and never enter service.
    UponStart,
}

#[derive(Debug)]
pub struct QueueCore {
    pub(crate) entity:  EntityCore,
    pub(crate) jobs:    JobSet,
    pub(crate) waiting: JobSet,
    pub(crate) service: JobSet,

    pub(crate) queue_access_vacation: bool,
    pub(crate) server_access_credits: Credits,
    pub(crate) auto_revocation:       AutoRevocationPolicy,

    /// Availability of credits when the last batch fired.
    pub(crate) previous_sac_available: bool,
    /// Start-armed value when the last batch fired.
    pub(crate) previous_start_armed:   bool,
}

impl QueueCore {
    /// A fresh, empty queue state.  `start_armed` is the discipline's
    /// start-armed value for an empty queue.
    pub fn new(name: impl Into<String>, start_armed: bool) -> Self {
        Self {
            entity:                 EntityCore::new(name),
            jobs:                   JobSet::new(),
            waiting:                JobSet::new(),
            service:                JobSet::new(),
            queue_access_vacation:  false,
            server_access_credits:  Credits::INFINITE,
            auto_revocation:        AutoRevocationPolicy::None,
            previous_sac_available: true,
            previous_start_armed:   start_armed,
        }
    }

    // ── Identity and time ─────────────────────────────────────────────────

    #[inline]
    pub fn id(&self) -> EntityId {
        self.entity.id()
    }

    pub fn name(&self) -> &str {
        self.entity.name()
    }

    #[inline]
    pub fn last_update(&self) -> SimTime {
        self.entity.last_update()
    }

    pub fn entity(&self) -> &EntityCore {
        &self.entity
    }

    pub fn entity_mut(&mut self) -> &mut EntityCore {
        &mut self.entity
    }

    // ── Containers ────────────────────────────────────────────────────────

    pub fn jobs(&self) -> &JobSet {
        &self.jobs
    }

    pub fn waiting(&self) -> &JobSet {
        &self.waiting
    }

    pub fn service(&self) -> &JobSet {
        &self.service
    }

    #[inline]
    pub fn contains(&self, job: JobId) -> bool {
        self.jobs.contains(job)
    }

    #[inline]
    pub fn is_waiting(&self, job: JobId) -> bool {
        self.waiting.contains(job)
    }

    #[inline]
    pub fn is_in_service(&self, job: JobId) -> bool {
        self.service.contains(job)
    }

    pub fn number_of_jobs(&self) -> usize {
        self.jobs.len()
    }

    /// Put a newly admitted job into `jobs` and the waiting area.
    pub(crate) fn admit(&mut self, job: JobId) -> QueueResult<()> {
        if !self.jobs.insert(job) || !self.waiting.insert(job) {
            return Err(self.illegal(Some(job), "job admitted twice"));
        }
        Ok(())
    }

    /// Move a job from the waiting area into the service area.
    pub(crate) fn enter_service(&mut self, job: JobId) -> QueueResult<()> {
        if !self.waiting.remove(job) || !self.service.insert(job) {
            return Err(self.illegal(Some(job), "job not waiting when entering service"));
        }
        Ok(())
    }

    /// Remove a job from all containers, checking it was in exactly one area.
    pub(crate) fn evict(&mut self, job: JobId) -> QueueResult<()> {
        let in_jobs = self.jobs.remove(job);
        let in_waiting = self.waiting.remove(job);
        let in_service = self.service.remove(job);
        if !in_jobs || in_waiting == in_service {
            return Err(self.illegal(
                Some(job),
                format!(
                    "partition violated on removal (jobs={in_jobs}, waiting={in_waiting}, service={in_service})"
                ),
            ));
        }
        Ok(())
    }

    pub(crate) fn clear_containers(&mut self) -> Vec<JobId> {
        let jobs = self.jobs.to_vec();
        self.jobs.clear();
        self.waiting.clear();
        self.service.clear();
        jobs
    }

    /// Verify `jobs == waiting ∪ service` with the two areas disjoint.
    pub fn check_partition(&self) -> QueueResult<()> {
        if self.jobs.len() != self.waiting.len() + self.service.len() {
            return Err(self.illegal(None, "job containers out of balance"));
        }
        for job in self.jobs.iter() {
            if self.waiting.contains(job) == self.service.contains(job) {
                return Err(self.illegal(Some(job), "job not in exactly one area"));
            }
        }
        Ok(())
    }

    // ── Vacation and credits ──────────────────────────────────────────────

    pub fn is_queue_access_vacation(&self) -> bool {
        self.queue_access_vacation
    }

    pub fn server_access_credits(&self) -> Credits {
        self.server_access_credits
    }

    #[inline]
    pub fn has_server_access_credits(&self) -> bool {
        self.server_access_credits.is_available()
    }

    /// Set the credit counter outside of any operation, with no
    /// notification.  Only for construction, before the queue is used;
    /// otherwise go through `SimQueue::set_server_access_credits`.
    pub fn initialize_server_access_credits(&mut self, credits: Credits) {
        self.server_access_credits = credits;
        self.previous_sac_available = credits.is_available();
    }

    pub fn auto_revocation_policy(&self) -> AutoRevocationPolicy {
        self.auto_revocation
    }

    pub fn set_auto_revocation_policy(&mut self, policy: AutoRevocationPolicy) {
        self.auto_revocation = policy;
    }

    // ── Notifications ─────────────────────────────────────────────────────

    /// Record a notification into the open batch.  Disciplines use this for
    /// their own notification kinds.
    pub fn record(&mut self, kind: NotificationKind, job: Option<JobId>) -> QueueResult<()> {
        if !self.entity.push(kind, job) {
            return Err(self.illegal(job, format!("{kind} recorded outside of an operation")));
        }
        Ok(())
    }

    /// `true` while an operation is assembling a batch.
    pub fn is_batch_open(&self) -> bool {
        self.entity.batch.is_open()
    }

    // ── Error helpers ─────────────────────────────────────────────────────

    pub fn illegal(&self, job: Option<JobId>, reason: impl Into<String>) -> QueueError {
        QueueError::illegal(self.id(), self.last_update(), job, reason)
    }

    pub fn invalid(&self, job: Option<JobId>, reason: impl Into<String>) -> QueueError {
        QueueError::invalid(self.id(), self.last_update(), job, reason)
    }
}
