//! `JobSet`: an insertion-ordered set of job handles.
//!
//! Waiting and service areas must iterate in arrival order (FCFS picks the
//! head) while supporting O(log n) removal from the middle (revocations).
//! A `BTreeMap` keyed by insertion sequence gives the order; a side index
//! gives membership.

use std::collections::BTreeMap;

use qn_core::JobId;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Default)]
pub struct JobSet {
    order: BTreeMap<u64, JobId>,
    index: FxHashMap<JobId, u64>,
    next:  u64,
}

impl JobSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `job` at the tail.  Returns `false` if it was already present.
    pub fn insert(&mut self, job: JobId) -> bool {
        if self.index.contains_key(&job) {
            return false;
        }
        let seq = self.next;
        self.next += 1;
        self.order.insert(seq, job);
        self.index.insert(job, seq);
        true
    }

    /// Returns `false` if `job` was not present.
    pub fn remove(&mut self, job: JobId) -> bool {
        match self.index.remove(&job) {
            Some(seq) => self.order.remove(&seq).is_some(),
            None => false,
        }
    }

    #[inline]
    pub fn contains(&self, job: JobId) -> bool {
        self.index.contains_key(&job)
    }

    /// The earliest inserted job still present.
    pub fn first(&self) -> Option<JobId> {
        self.order.values().next().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = JobId> + '_ {
        self.order.values().copied()
    }

    pub fn to_vec(&self) -> Vec<JobId> {
        self.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.index.clear();
    }
}
