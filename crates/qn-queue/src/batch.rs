//! Pending-notification batch and its lock discipline.
//!
//! A batch is `Locked` between top-level operations and `Open` while one is
//! assembling notifications.  Opening a locked batch hands out a
//! [`TopLevel`] token; only the operation holding that token may fire the
//! batch.  Nested operations that find the batch already open get no token
//! and therefore cannot fire it.

use qn_core::Notification;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Locked,
    /// Open for the top-level operation holding the token of this generation.
    Open { generation: u64 },
}

/// Proof that the holder is the outermost operation on an entity.
#[must_use = "a top-level operation must fire its batch"]
#[derive(Debug)]
pub struct TopLevel {
    generation: u64,
}

#[derive(Debug)]
pub struct PendingBatch {
    state:      BatchState,
    records:    Vec<Notification>,
    generation: u64,
}

impl Default for PendingBatch {
    fn default() -> Self {
        Self {
            state:      BatchState::Locked,
            records:    Vec::new(),
            generation: 0,
        }
    }
}

impl PendingBatch {
    /// Open the batch if it is locked.  Returns the top-level token if this
    /// call began a top-level operation, `None` if one is already running.
    pub fn clear_and_unlock_if_locked(&mut self) -> Option<TopLevel> {
        match self.state {
            BatchState::Open { .. } => None,
            BatchState::Locked => Some(self.clear_and_unlock()),
        }
    }

    /// Unconditionally clear and (re)open the batch.  Any token handed out
    /// earlier becomes stale.
    pub fn clear_and_unlock(&mut self) -> TopLevel {
        self.generation += 1;
        self.records.clear();
        self.state = BatchState::Open { generation: self.generation };
        TopLevel { generation: self.generation }
    }

    #[inline]
    pub fn state(&self) -> BatchState {
        self.state
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        matches!(self.state, BatchState::Open { .. })
    }

    /// Append a record.  Returns `false` (and drops the record) if locked.
    pub fn push(&mut self, notification: Notification) -> bool {
        if !self.is_open() {
            return false;
        }
        self.records.push(notification);
        true
    }

    pub fn records(&self) -> &[Notification] {
        &self.records
    }

    /// Mutable access for pre-notification hooks.
    pub fn records_mut(&mut self) -> &mut Vec<Notification> {
        &mut self.records
    }

    /// Lock the batch and take its records.  Fails (returning the token) if
    /// the token does not belong to the currently open batch.
    pub fn lock(&mut self, token: TopLevel) -> Result<Vec<Notification>, TopLevel> {
        match self.state {
            BatchState::Open { generation } if generation == token.generation => {
                self.state = BatchState::Locked;
                Ok(std::mem::take(&mut self.records))
            }
            _ => Err(token),
        }
    }
}
