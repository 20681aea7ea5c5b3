//! Reduction of sub-queue notification batches into composite transitions.
//!
//! | Sub-queue notification | Composite reaction                                         |
//! |------------------------|------------------------------------------------------------|
//! | leading `Reset`        | composite is resetting: clear the worklist, stop           |
//! | QAV start/end          | fatal: sub-queues are never vacationed on their own         |
//! | SAC / start-armed      | swallowed; the composite derives its own                   |
//! | `Arrival`              | none, the composite caused it                               |
//! | `Drop`                 | re-arrive at the drop destination, or drop the real job if  |
//! |                        | there is none or it is the sub-queue that dropped           |
//! | `Revocation`           | complete the pending handshake (fatal if none matches)      |
//! | `AutoRevocation`       | compressed tandem, sub-queue 0 only: start the real job     |
//! | `Start`                | encapsulator: start the real job; otherwise informational   |
//! | `Departure`            | route to the selector's next sub-queue, or depart           |
//! | discipline-specific    | re-emitted by the encapsulator models, ignored otherwise    |

use qn_core::{JobId, Notification, NotificationBatch, NotificationKind, SimTime};
use qn_queue::{kernel, QueueContext, QueueResult};
use tracing::{trace, warn};

use crate::{CompositeQueue, StartModel};

impl CompositeQueue {
    /// Process one batch fired by sub-queue `index`.
    pub(crate) fn reduce_batch(
        &mut self,
        ctx:   &mut QueueContext<'_>,
        time:  SimTime,
        index: usize,
        batch: NotificationBatch,
    ) -> QueueResult<()> {
        if batch.records.first().is_some_and(|n| n.kind == NotificationKind::Reset) {
            trace!(composite = %self.core.id(), sub_queue = index, "sub-queue reset");
            self.worklist.clear();
            return Ok(());
        }

        let mut starts: Vec<JobId> = Vec::new();
        let mut auto_revocations: Vec<JobId> = Vec::new();

        for n in &batch.records {
            trace!(
                composite = %self.core.id(),
                sub_queue = index,
                kind = %n.kind,
                job = ?n.job,
                "reduce"
            );
            match n.kind {
                NotificationKind::Reset => {
                    return Err(self.core.illegal(n.job, format!("reset inside a batch of sub-queue {index}")));
                }
                NotificationKind::QueueAccessVacationStart | NotificationKind::QueueAccessVacationEnd => {
                    return Err(self.core.illegal(
                        None,
                        format!("sub-queue {index} reported {} on its own", n.kind),
                    ));
                }
                NotificationKind::OutOfServerAccessCredits
                | NotificationKind::RegainedServerAccessCredits
                | NotificationKind::StartArmedFalse
                | NotificationKind::StartArmedTrue
                | NotificationKind::Update
                | NotificationKind::Arrival => {}
                NotificationKind::Drop => {
                    let delegate = self.job_of(n, index)?;
                    self.on_sub_drop(ctx, time, index, delegate)?;
                }
                NotificationKind::Revocation => {
                    let delegate = self.job_of(n, index)?;
                    if !self.handshake.complete(index, delegate) {
                        return Err(self.core.illegal(
                            Some(delegate),
                            format!(
                                "unexpected revocation at sub-queue {index} (handshake {:?})",
                                self.handshake
                            ),
                        ));
                    }
                    ctx.jobs.remove(delegate)?;
                }
                NotificationKind::AutoRevocation => {
                    let delegate = self.job_of(n, index)?;
                    if self.start_model != StartModel::CompressedTandem2 || index != 0 {
                        return Err(self.core.illegal(
                            Some(delegate),
                            format!("auto-revocation at sub-queue {index} under {}", self.start_model),
                        ));
                    }
                    auto_revocations.push(delegate);
                    let real = self.real_of(delegate)?;
                    kernel::start(self, ctx, time, real)?;
                }
                NotificationKind::Start => {
                    let delegate = self.job_of(n, index)?;
                    match self.start_model {
                        StartModel::EncapsulatorQueue => {
                            let real = self.real_of(delegate)?;
                            kernel::start(self, ctx, time, real)?;
                        }
                        StartModel::CompressedTandem2 if index == 0 => starts.push(delegate),
                        _ => {}
                    }
                }
                NotificationKind::Departure => {
                    let delegate = self.job_of(n, index)?;
                    self.on_sub_departure(ctx, time, index, delegate)?;
                }
                NotificationKind::Custom(_) => {
                    if self.start_model.is_encapsulator() {
                        let real = match n.job {
                            Some(delegate) => Some(self.real_of(delegate)?),
                            None => None,
                        };
                        self.core.record(n.kind, real)?;
                    } else {
                        warn!(
                            composite = %self.core.id(),
                            sub_queue = index,
                            kind = %n.kind,
                            model = %self.start_model,
                            "ignoring discipline-specific sub-queue notification"
                        );
                    }
                }
            }
        }

        if self.start_model == StartModel::CompressedTandem2 {
            if starts.len() > 1 || starts != auto_revocations {
                return Err(self.core.illegal(
                    None,
                    format!(
                        "sub-queue 0 must start and auto-revoke the same single job per batch \
                         (starts {starts:?}, auto-revocations {auto_revocations:?})"
                    ),
                ));
            }
            if index == 1 {
                self.update_compressed_tandem_credits(ctx, time)?;
            }
        }
        Ok(())
    }

    fn job_of(&self, n: &Notification, index: usize) -> QueueResult<JobId> {
        n.job.ok_or_else(|| {
            self.core.illegal(None, format!("{} from sub-queue {index} without a job", n.kind))
        })
    }

    /// A drop reported by the drop destination itself drops the real job.
    fn on_sub_drop(
        &mut self,
        ctx:      &mut QueueContext<'_>,
        time:     SimTime,
        index:    usize,
        delegate: JobId,
    ) -> QueueResult<()> {
        let real = self.real_of(delegate)?;
        match self.drop_destination {
            Some(destination) if destination != index => {
                self.sub_queues[destination].arrive(ctx, time, delegate)?;
                self.collect(destination);
                Ok(())
            }
            _ => kernel::drop(self, ctx, time, real),
        }
    }

    fn on_sub_departure(
        &mut self,
        ctx:      &mut QueueContext<'_>,
        time:     SimTime,
        index:    usize,
        delegate: JobId,
    ) -> QueueResult<()> {
        let real = self.real_of(delegate)?;
        match self.select_next(time, real, index)? {
            Some(next) => {
                self.sub_queues[next].arrive(ctx, time, delegate)?;
                self.collect(next);
                Ok(())
            }
            None => kernel::depart(self, ctx, time, real),
        }
    }
}
