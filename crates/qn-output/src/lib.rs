//! `qn-output`: trace writers for the rust_qn engine.
//!
//! | Backend | Files created                          |
//! |---------|----------------------------------------|
//! | CSV     | `notifications.csv`, `events.csv`      |
//!
//! Backends implement [`OutputWriter`] and are driven by [`TraceObserver`],
//! which implements `qn_sim::SimObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use qn_output::{CsvWriter, TraceObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output")).unwrap();
//! let mut obs = TraceObserver::new(writer);
//! sim.run(&mut obs).unwrap();
//! obs.take_error().map(|e| eprintln!("output error: {e}"));
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;


pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::TraceObserver;
pub use row::{EventRow, NotificationRow, NONE};
pub use writer::OutputWriter;
