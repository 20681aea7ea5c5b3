//! Strongly typed identifier wrappers.
//!
//! Ids are opaque handles issued by an owner (the job arena, the event list,
//! or the entity counter).  All of them are `Copy + Ord + Hash` so they work
//! as map keys without ceremony.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID".
            pub const INVALID: $name = $name(<$inner>::MAX);
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

typed_id! {
    /// Identity of a simulated entity (a queue or a composite queue).
    pub struct EntityId(u32);
}

typed_id! {
    /// Handle of a job in the [`JobArena`][crate::JobArena].
    pub struct JobId(u32);
}

typed_id! {
    /// Handle of a scheduled event, used to cancel it.
    pub struct EventId(u64);
}

static NEXT_ENTITY: AtomicU32 = AtomicU32::new(0);

impl EntityId {
    /// Issue a fresh, process-unique entity id.
    pub fn next() -> EntityId {
        EntityId(NEXT_ENTITY.fetch_add(1, Ordering::Relaxed))
    }
}
