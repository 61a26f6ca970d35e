//! Search jobs and their lifecycle.

use cartography_config::ConfigSnapshot;
use cartography_types::{HolderId, MerchantId, MerchantKind, SearchResult, SessionId, SlotId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Unique job identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// Job lifecycle.
///
/// `Submitted → Running → Completed → Applied | Discarded`. The first two
/// transitions happen on a worker, the last on the simulation thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum JobPhase {
    Submitted = 0,
    Running = 1,
    Completed = 2,
    Applied = 3,
    Discarded = 4,
}

impl JobPhase {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => JobPhase::Submitted,
            1 => JobPhase::Running,
            2 => JobPhase::Completed,
            3 => JobPhase::Applied,
            _ => JobPhase::Discarded,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobPhase::Applied | JobPhase::Discarded)
    }
}

/// Phase shared between the worker and the orchestrator.
#[derive(Clone, Debug)]
pub struct PhaseCell(Arc<AtomicU8>);

impl PhaseCell {
    pub(crate) fn new() -> Self {
        Self(Arc::new(AtomicU8::new(JobPhase::Submitted as u8)))
    }

    pub fn get(&self) -> JobPhase {
        JobPhase::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, phase: JobPhase) {
        self.0.store(phase as u8, Ordering::Release);
    }
}

/// What a job is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobKind {
    /// Initial or tier-up fill of `count` rewards
    Fill { count: usize },
    /// Replace one exhausted slot
    Restock,
    /// Turn a consumed unidentified map into a real one
    Decipher,
}

impl JobKind {
    pub fn count(&self) -> usize {
        match self {
            JobKind::Fill { count } => *count,
            JobKind::Restock | JobKind::Decipher => 1,
        }
    }
}

/// The merchant slot a fill or restock result goes to.
#[derive(Clone, Copy, Debug)]
pub struct MerchantTarget {
    pub merchant: MerchantId,
    pub merchant_kind: MerchantKind,
    /// Placeholder slot the result replaces
    pub placeholder: SlotId,
    /// Customer session open at submission
    pub session: Option<SessionId>,
}

/// Who receives a job's result.
#[derive(Clone, Copy, Debug)]
pub enum JobTarget {
    Merchant(MerchantTarget),
    Holder(HolderId),
}

/// Everything needed to apply a job's result once it comes back.
#[derive(Clone, Debug)]
pub struct JobTicket {
    pub id: JobId,
    pub kind: JobKind,
    pub target: JobTarget,
    /// Config the search ran under; costs are taken from it too
    pub snapshot: Arc<ConfigSnapshot>,
}

/// Worker outcome.
#[derive(Clone, Debug)]
pub enum JobOutcome {
    Found(Vec<SearchResult>),
    Failed(String),
}

/// A finished job on its way back to the simulation thread.
#[derive(Clone, Debug)]
pub struct Completion {
    pub ticket: JobTicket,
    pub outcome: JobOutcome,
}
