//! Runtime error types.

use cartography_types::{MerchantId, SlotId, TradeError};
use thiserror::Error;

/// Why a completed search could not be applied to its merchant.
#[derive(Error, Debug)]
pub enum ApplyError {
    #[error("merchant {0} is gone")]
    MerchantGone(MerchantId),

    #[error("placeholder {slot} is no longer present on merchant {merchant}")]
    PlaceholderMissing { merchant: MerchantId, slot: SlotId },

    #[error("search worker failed: {0}")]
    WorkerFailed(String),

    #[error(transparent)]
    Trade(#[from] TradeError),
}

/// Save record errors.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("save record is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Errors surfaced to the host by the orchestrator.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("failed to start search worker pool: {0}")]
    PoolStart(#[source] std::io::Error),

    #[error("search worker pool is shut down")]
    PoolShutDown,

    #[error(transparent)]
    Trade(#[from] TradeError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
