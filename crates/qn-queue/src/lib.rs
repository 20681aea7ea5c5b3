//! `qn-queue`: entity lifecycle, notification batching and the single-queue
//! state machine.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                     |
//! |-----------------|--------------------------------------------------------------|
//! | [`batch`]       | `PendingBatch` (`Locked | Open{generation}`), `TopLevel` token |
//! | [`entity`]      | `EntityCore`: id, clock, batch, listeners, fired outbox      |
//! | [`core`]        | `QueueCore`: job containers, vacation, credits, caches       |
//! | [`discipline`]  | `QueueDiscipline` hooks, `QueueContext`                      |
//! | [`kernel`]      | the shared operations and internal transitions               |
//! | [`sim_queue`]   | `SimQueue`, the public operation surface (blanket impl)      |
//! | [`listener`]    | `QueueListener`, `TracingListener`, `NotificationLog`        |
//! | [`disciplines`] | `Fcfs`, `InfiniteServer`, `Sink`, `DropQueue`                |
//! | [`job_set`]     | `JobSet`, an insertion-ordered set of job handles            |
//! | [`error`]       | `QueueError`, `QueueResult`                                  |
//!
//! # Writing a discipline
//!
//! Implement [`QueueDiscipline`]: hold a [`QueueCore`], answer
//! `is_start_armed`, and supply the five insert/reschedule hook pairs.  The
//! blanket [`SimQueue`] impl supplies every operation.

pub mod batch;
pub mod core;
pub mod discipline;
pub mod disciplines;
pub mod entity;
pub mod error;
pub mod job_set;
pub mod kernel;
pub mod listener;
pub mod sim_queue;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use batch::{BatchState, PendingBatch, TopLevel};
pub use crate::core::{AutoRevocationPolicy, QueueCore};
pub use discipline::{QueueContext, QueueDiscipline};
pub use disciplines::{DropQueue, Fcfs, InfiniteServer, Sink};
pub use entity::EntityCore;
pub use error::{QueueError, QueueResult};
pub use job_set::JobSet;
pub use listener::{NotificationLog, QueueListener, TracingListener};
pub use sim_queue::SimQueue;
