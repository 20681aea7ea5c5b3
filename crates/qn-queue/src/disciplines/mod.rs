//! Reference queue disciplines.
//!
//! | Discipline         | Start-armed        | Behavior                                   |
//! |--------------------|--------------------|--------------------------------------------|
//! | [`Fcfs`]           | server idle        | one server, arrival order, optional buffer |
//! | [`InfiniteServer`] | always             | every job starts on arrival                |
//! | [`Sink`]           | never              | jobs wait until revoked                    |
//! | [`DropQueue`]      | never              | every arrival is dropped                   |

mod drop_queue;
mod fcfs;
mod infinite_server;
mod sink;

pub use drop_queue::DropQueue;
pub use fcfs::Fcfs;
pub use infinite_server::InfiniteServer;
pub use sink::Sink;

use qn_core::{EntityId, EventId, JobId, SimTime};
use qn_event::EventAction;
use rustc_hash::FxHashMap;

use crate::{QueueContext, QueueResult};

/// Pending departure timers, one per job in service.
#[derive(Debug, Default)]
pub(crate) struct DepartureTimers {
    pending: FxHashMap<JobId, EventId>,
}

impl DepartureTimers {
    /// Schedule `job`'s departure after its service time at `queue`.
    pub(crate) fn schedule(
        &mut self,
        ctx:   &mut QueueContext<'_>,
        queue: EntityId,
        time:  SimTime,
        job:   JobId,
    ) -> QueueResult<()> {
        let service_time = ctx.jobs.service_time(job, Some(queue))?;
        let event = ctx
            .events
            .schedule(time.after(service_time), queue, EventAction::Departure(job))?;
        self.pending.insert(job, event);
        Ok(())
    }

    /// Forget `job`'s timer, cancelling it if it has not fired.
    pub(crate) fn cancel(&mut self, ctx: &mut QueueContext<'_>, job: JobId) {
        if let Some(event) = self.pending.remove(&job) {
            ctx.events.cancel(event);
        }
    }

    pub(crate) fn clear(&mut self, ctx: &mut QueueContext<'_>) {
        for (_, event) in self.pending.drain() {
            ctx.events.cancel(event);
        }
    }
}
