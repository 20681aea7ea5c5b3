//! `qn-core`: foundational types for the `rust_qn` queueing-network engine.
//!
//! This crate is a dependency of every other `qn-*` crate.  It has no `qn-*`
//! dependencies and only a handful of external ones (`rand`, `rustc-hash`,
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module           | Contents                                                   |
//! |------------------|------------------------------------------------------------|
//! | [`ids`]          | `EntityId`, `JobId`, `EventId`                             |
//! | [`time`]         | `SimTime`, `SimConfig`                                     |
//! | [`credits`]      | `Credits` (saturating-infinite server-access credits)      |
//! | [`job`]          | `JobArena`, `JobRecord`, `JobKind`, `ServiceTime`          |
//! | [`notification`] | `NotificationKind`, `Notification`, `NotificationBatch`    |
//! | [`request`]      | `QueueRequest`, `QueueReply`                               |
//! | [`rng`]          | `SimRng` (deterministic routing randomness)                |
//! | [`error`]        | `QnError`, `QnResult`                                      |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                      |
//! |---------|-------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to ids, time, credits and    |
//! |         | `SimConfig`.                                                |

pub mod credits;
pub mod error;
pub mod ids;
pub mod job;
pub mod notification;
pub mod request;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use credits::Credits;
pub use error::{QnError, QnResult};
pub use ids::{EntityId, EventId, JobId};
pub use job::{JobArena, JobKind, JobRecord, ServiceTime};
pub use notification::{Notification, NotificationBatch, NotificationKind};
pub use request::{QueueReply, QueueRequest};
pub use rng::SimRng;
pub use time::{SimConfig, SimTime};
