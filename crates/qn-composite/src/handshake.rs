//! The two-phase revocation handshake.
//!
//! Revoking a real job whose delegate sits on a sub-queue takes two steps:
//! the composite's remove hook decides and records the revocation, then its
//! reschedule hook revokes the delegate at the sub-queue.  The slot is
//! cleared only when the reducer sees the sub-queue's matching `Revocation`.

use qn_core::JobId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevocationHandshake {
    #[default]
    Idle,
    /// `delegate` is to be (or is being) revoked at `sub_queue`.
    Pending { sub_queue: usize, delegate: JobId },
}

impl RevocationHandshake {
    #[inline]
    pub fn is_idle(&self) -> bool {
        matches!(self, RevocationHandshake::Idle)
    }

    pub fn pending(&self) -> Option<(usize, JobId)> {
        match *self {
            RevocationHandshake::Idle => None,
            RevocationHandshake::Pending { sub_queue, delegate } => Some((sub_queue, delegate)),
        }
    }

    /// Record a decided revocation.  Returns `false`, leaving the slot
    /// untouched, if another one is still pending.
    pub(crate) fn arm(&mut self, sub_queue: usize, delegate: JobId) -> bool {
        if !self.is_idle() {
            return false;
        }
        *self = RevocationHandshake::Pending { sub_queue, delegate };
        true
    }

    /// Clear the slot on the matching sub-queue revocation.  Returns `false`
    /// if nothing is pending or the pending pair differs.
    pub(crate) fn complete(&mut self, sub_queue: usize, delegate: JobId) -> bool {
        if self.pending() != Some((sub_queue, delegate)) {
            return false;
        }
        *self = RevocationHandshake::Idle;
        true
    }

    pub(crate) fn clear(&mut self) {
        *self = RevocationHandshake::Idle;
    }
}
