//! `qn-event`: the event list.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                  |
//! |----------------|-----------------------------------------------------------|
//! | [`event`]      | `ScheduledEvent`, `EventAction`                           |
//! | [`event_list`] | `EventList` (`BTreeMap<(SimTime, seq), ScheduledEvent>`)  |
//! | [`error`]      | `EventError`, `EventResult<T>`                            |
//!
//! Queues never hold callbacks.  A scheduled event names its target entity
//! by [`EntityId`][qn_core::EntityId]; the simulation runner routes it to the
//! root queue owning that entity, which forwards it down through any
//! composite layers.

pub mod error;
pub mod event;
pub mod event_list;


pub use error::{EventError, EventResult};
pub use event::{EventAction, ScheduledEvent};
pub use event_list::EventList;
