//! Worker-to-simulation completion channel.

use crate::job::{Completion, JobOutcome, JobPhase, JobTicket, PhaseCell};
use tokio::sync::mpsc;

pub(crate) fn channel() -> (CompletionSender, CompletionReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (CompletionSender(tx), CompletionReceiver(rx))
}

/// Cloneable producer side, one clone per job.
#[derive(Clone, Debug)]
pub(crate) struct CompletionSender(mpsc::UnboundedSender<Completion>);

/// Single consumer, drained on the simulation thread.
#[derive(Debug)]
pub(crate) struct CompletionReceiver(mpsc::UnboundedReceiver<Completion>);

impl CompletionReceiver {
    /// Everything that arrived since the last drain. Never blocks.
    pub(crate) fn drain(&mut self) -> Vec<Completion> {
        let mut out = Vec::new();
        while let Ok(completion) = self.0.try_recv() {
            out.push(completion);
        }
        out
    }
}

/// Sends exactly one completion per job.
///
/// If the worker unwinds before calling [`CompletionGuard::complete`], the
/// guard reports the job as failed so the merchant's search flag is still
/// released on the next tick.
///
/// This needs unwinding. Under the release profile (`panic = "abort"`) a
/// panicking [`SpatialIndex`](cartography_types::SpatialIndex) takes the
/// whole process down; indexes should report trouble as a `ProbeError`.
pub(crate) struct CompletionGuard {
    ticket: Option<JobTicket>,
    phase: PhaseCell,
    tx: CompletionSender,
}

impl CompletionGuard {
    pub(crate) fn new(ticket: JobTicket, phase: PhaseCell, tx: CompletionSender) -> Self {
        Self {
            ticket: Some(ticket),
            phase,
            tx,
        }
    }

    pub(crate) fn complete(mut self, outcome: JobOutcome) {
        self.send(outcome);
    }

    fn send(&mut self, outcome: JobOutcome) {
        let Some(ticket) = self.ticket.take() else {
            return;
        };
        self.phase.set(JobPhase::Completed);
        let job_id = ticket.id;
        if self.tx.0.send(Completion { ticket, outcome }).is_err() {
            tracing::debug!(job_id = %job_id, "Orchestrator gone, dropping completion");
        }
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if self.ticket.is_some() {
            tracing::error!("Search worker exited without a result");
            self.send(JobOutcome::Failed("worker exited without a result".to_string()));
        }
    }
}
