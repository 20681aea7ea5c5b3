//! Delegate jobs and the real ↔ delegate bijection.

use qn_core::{EntityId, JobArena, JobId, SimTime};
use qn_queue::QueueResult;
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Creates the delegate job that visits sub-queues for a real job.
pub trait DelegateJobFactory {
    fn create(
        &mut self,
        jobs:      &mut JobArena,
        time:      SimTime,
        real:      JobId,
        composite: EntityId,
    ) -> QueueResult<JobId>;
}

/// Issues arena delegates whose service time is the real job's service time
/// at the composite.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProxyJobFactory;

impl DelegateJobFactory for ProxyJobFactory {
    fn create(
        &mut self,
        jobs:      &mut JobArena,
        _time:     SimTime,
        real:      JobId,
        composite: EntityId,
    ) -> QueueResult<JobId> {
        Ok(jobs.add_delegate(real, composite)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BijectionError {
    #[error("no delegate for real job {0}")]
    NoDelegate(JobId),

    #[error("no real job for delegate {0}")]
    NoRealJob(JobId),

    #[error("maps disagree: real {real} -> delegate {delegate} -> real {back:?}")]
    Mismatch {
        real:     JobId,
        delegate: JobId,
        back:     Option<JobId>,
    },

    #[error("{0} is already mapped")]
    AlreadyMapped(JobId),
}

/// Two hash maps kept in strict agreement.  Every lookup checks the
/// reverse direction.
#[derive(Debug, Default)]
pub struct DelegateMap {
    real_to_delegate: FxHashMap<JobId, JobId>,
    delegate_to_real: FxHashMap<JobId, JobId>,
}

impl DelegateMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, real: JobId, delegate: JobId) -> Result<(), BijectionError> {
        if self.real_to_delegate.contains_key(&real) {
            return Err(BijectionError::AlreadyMapped(real));
        }
        if self.delegate_to_real.contains_key(&delegate) {
            return Err(BijectionError::AlreadyMapped(delegate));
        }
        self.real_to_delegate.insert(real, delegate);
        self.delegate_to_real.insert(delegate, real);
        Ok(())
    }

    pub fn delegate_of(&self, real: JobId) -> Result<JobId, BijectionError> {
        let delegate = *self
            .real_to_delegate
            .get(&real)
            .ok_or(BijectionError::NoDelegate(real))?;
        self.verify(real, delegate)?;
        Ok(delegate)
    }

    pub fn real_of(&self, delegate: JobId) -> Result<JobId, BijectionError> {
        let real = *self
            .delegate_to_real
            .get(&delegate)
            .ok_or(BijectionError::NoRealJob(delegate))?;
        self.verify(real, delegate)?;
        Ok(real)
    }

    /// Remove the pair of `real`, returning its delegate.
    pub fn remove(&mut self, real: JobId) -> Result<JobId, BijectionError> {
        let delegate = self.delegate_of(real)?;
        self.real_to_delegate.remove(&real);
        self.delegate_to_real.remove(&delegate);
        Ok(delegate)
    }

    /// Drain all pairs as `(real, delegate)`.
    pub fn drain(&mut self) -> Vec<(JobId, JobId)> {
        self.delegate_to_real.clear();
        self.real_to_delegate.drain().collect()
    }

    pub fn len(&self) -> usize {
        self.real_to_delegate.len()
    }

    pub fn is_empty(&self) -> bool {
        self.real_to_delegate.is_empty()
    }

    /// Full round-trip check of both directions.
    pub fn check(&self) -> Result<(), BijectionError> {
        for (&real, &delegate) in &self.real_to_delegate {
            self.verify(real, delegate)?;
        }
        for (&delegate, &real) in &self.delegate_to_real {
            self.verify(real, delegate)?;
        }
        Ok(())
    }

    fn verify(&self, real: JobId, delegate: JobId) -> Result<(), BijectionError> {
        let back = self.delegate_to_real.get(&delegate).copied();
        let forth = self.real_to_delegate.get(&real).copied();
        if back != Some(real) || forth != Some(delegate) {
            return Err(BijectionError::Mismatch { real, delegate, back });
        }
        Ok(())
    }
}
