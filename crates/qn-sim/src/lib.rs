//! `qn-sim`: event loop runner for the rust_qn engine.
//!
//! # Event loop
//!
//! ```text
//! while let Some(event) = events.pop_next():     (stops at end_time / max_events)
//!   ① Route  : find the root queue that owns event.target
//!   ② Handle : root.handle_event(ctx, event); composites forward events
//!                aimed at their sub-queues and reduce what those fire
//!   ③ Deliver: every batch the root fired goes to SimObserver::on_batch
//! ```
//!
//! External operations enter either through the event list
//! (`schedule_arrival`, `schedule_revocation`, ...) or immediately through
//! [`Simulation::execute`].
//!
//! # Quick-start
//!
//! ```rust
//! use qn_core::{ServiceTime, SimConfig, SimTime};
//! use qn_queue::{Fcfs, SimQueue};
//! use qn_sim::{NoopObserver, SimBuilder};
//!
//! let server = Fcfs::new("server");
//! let id = server.id();
//! let mut sim = SimBuilder::new(SimConfig::default()).queue(server).build().unwrap();
//! let job = sim.add_job("job-0", ServiceTime::Fixed(1.5));
//! sim.schedule_arrival(SimTime(0.0), id, job).unwrap();
//! sim.run(&mut NoopObserver).unwrap();
//! assert_eq!(sim.now(), SimTime(1.5));
//! ```

pub mod builder;
pub mod error;
pub mod observer;
pub mod sim;


pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver};
pub use sim::Simulation;
