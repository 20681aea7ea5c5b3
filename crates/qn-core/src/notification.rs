//! Notification taxonomy and batches.
//!
//! Every state change of an entity is reported as a [`Notification`].  All
//! notifications produced by one top-level operation are delivered together
//! in a single [`NotificationBatch`] sharing one timestamp.

use std::fmt;

use crate::{EntityId, JobId, SimTime};

/// The kind of a single notification record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Reset,
    Update,
    Arrival,
    Drop,
    Revocation,
    AutoRevocation,
    Start,
    Departure,
    QueueAccessVacationStart,
    QueueAccessVacationEnd,
    OutOfServerAccessCredits,
    RegainedServerAccessCredits,
    StartArmedFalse,
    StartArmedTrue,
    /// Discipline-specific extension.
    Custom(&'static str),
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Reset => "RESET",
            NotificationKind::Update => "UPDATE",
            NotificationKind::Arrival => "ARRIVAL",
            NotificationKind::Drop => "DROP",
            NotificationKind::Revocation => "REVOCATION",
            NotificationKind::AutoRevocation => "AUTO_REVOCATION",
            NotificationKind::Start => "START",
            NotificationKind::Departure => "DEPARTURE",
            NotificationKind::QueueAccessVacationStart => "QAV_START",
            NotificationKind::QueueAccessVacationEnd => "QAV_END",
            NotificationKind::OutOfServerAccessCredits => "OUT_OF_SAC",
            NotificationKind::RegainedServerAccessCredits => "REGAINED_SAC",
            NotificationKind::StartArmedFalse => "STA_FALSE",
            NotificationKind::StartArmedTrue => "STA_TRUE",
            NotificationKind::Custom(name) => name,
        }
    }

    #[inline]
    pub fn is_queue_access_vacation(self) -> bool {
        matches!(
            self,
            NotificationKind::QueueAccessVacationStart | NotificationKind::QueueAccessVacationEnd
        )
    }

    #[inline]
    pub fn is_server_access_credits(self) -> bool {
        matches!(
            self,
            NotificationKind::OutOfServerAccessCredits
                | NotificationKind::RegainedServerAccessCredits
        )
    }

    #[inline]
    pub fn is_start_armed(self) -> bool {
        matches!(
            self,
            NotificationKind::StartArmedFalse | NotificationKind::StartArmedTrue
        )
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One notification record: what happened, where, and to which job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notification {
    pub kind:  NotificationKind,
    pub queue: EntityId,
    pub job:   Option<JobId>,
}

impl Notification {
    pub fn new(kind: NotificationKind, queue: EntityId, job: Option<JobId>) -> Self {
        Self { kind, queue, job }
    }
}

/// All notifications released by one top-level operation of one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationBatch {
    pub entity:  EntityId,
    pub time:    SimTime,
    pub records: Vec<Notification>,
}

impl NotificationBatch {
    pub fn new(entity: EntityId, time: SimTime) -> Self {
        Self { entity, time, records: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Record kinds in generation order.
    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.records.iter().map(|n| n.kind).collect()
    }

    pub fn count(&self, kind: NotificationKind) -> usize {
        self.records.iter().filter(|n| n.kind == kind).count()
    }

    pub fn contains(&self, kind: NotificationKind) -> bool {
        self.records.iter().any(|n| n.kind == kind)
    }

    /// The first record of `kind`, if any.
    pub fn find(&self, kind: NotificationKind) -> Option<&Notification> {
        self.records.iter().find(|n| n.kind == kind)
    }
}
