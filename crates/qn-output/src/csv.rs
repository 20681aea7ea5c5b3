//! CSV output backend.
//!
//! Creates two files in the configured output directory:
//! - `notifications.csv`
//! - `events.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{EventRow, NotificationRow, OutputResult};

/// Writes a simulation trace to two CSV files.
pub struct CsvWriter {
    notifications: Writer<File>,
    events:        Writer<File>,
    finished:      bool,
}

impl CsvWriter {
    /// Create the two CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut notifications = Writer::from_path(dir.join("notifications.csv"))?;
        notifications.write_record(["time", "batch", "entity", "kind", "job"])?;

        let mut events = Writer::from_path(dir.join("events.csv"))?;
        events.write_record(["event", "time", "target", "action", "job"])?;

        Ok(Self {
            notifications,
            events,
            finished: false,
        })
    }
}

fn job_field(job: u32) -> String {
    if job == crate::NONE { String::new() } else { job.to_string() }
}

impl OutputWriter for CsvWriter {
    fn write_notifications(&mut self, rows: &[NotificationRow]) -> OutputResult<()> {
        for row in rows {
            self.notifications.write_record(&[
                row.time.to_string(),
                row.batch.to_string(),
                row.entity.to_string(),
                row.kind.to_owned(),
                job_field(row.job),
            ])?;
        }
        Ok(())
    }

    fn write_event(&mut self, row: &EventRow) -> OutputResult<()> {
        self.events.write_record(&[
            row.event.to_string(),
            row.time.to_string(),
            row.target.to_string(),
            row.action.to_owned(),
            job_field(row.job),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.notifications.flush()?;
        self.events.flush()?;
        Ok(())
    }
}
