//! `qn-composite`: queues made of queues.
//!
//! A [`CompositeQueue`] owns a fixed, ordered set of sub-queues and behaves
//! as a single queue towards its callers.  Real jobs arriving at the
//! composite are represented inside it by delegate jobs; a
//! [`SubQueueSelector`] routes delegates between sub-queues, and the
//! [`StartModel`] fixes how the composite's waiting and service areas map
//! onto the sub-queues.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                    |
//! |-----------------|-------------------------------------------------------------|
//! | [`composite`]   | `CompositeQueue` and its `QueueDiscipline` hooks            |
//! | `reducer`       | sub-queue notification reduction                            |
//! | [`start_model`] | `StartModel`                                                |
//! | [`delegate`]    | `DelegateJobFactory`, `ProxyJobFactory`, `DelegateMap`      |
//! | [`selector`]    | `SubQueueSelector`: tandem, feedback, Jackson, random       |
//! | [`handshake`]   | `RevocationHandshake` (`Idle | Pending`)                    |
//! | [`builder`]     | `CompositeQueueBuilder` and the network shortcuts           |

pub mod builder;
pub mod composite;
pub mod delegate;
pub mod handshake;
mod reducer;
pub mod selector;
pub mod start_model;

#[cfg(test)]
mod tests;

pub use builder::{
    compressed_tandem2, encapsulator, encapsulator_hide_start, feedback, jackson, tandem,
    CompositeQueueBuilder,
};
pub use composite::CompositeQueue;
pub use delegate::{BijectionError, DelegateJobFactory, DelegateMap, ProxyJobFactory};
pub use handshake::RevocationHandshake;
pub use selector::{FeedbackSelector, JacksonSelector, RandomSelector, SubQueueSelector, TandemSelector};
pub use start_model::StartModel;
