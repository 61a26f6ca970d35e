//! Error types shared across the cartography crates.

use crate::ids::{CategoryId, SlotId};
use thiserror::Error;

/// Errors from parsing namespaced keys.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// The key has no `namespace:path` separator
    #[error("key '{0}' is missing the ':' separator")]
    MissingSeparator(String),

    /// The namespace part is empty or contains invalid characters
    #[error("key '{0}' has an invalid namespace")]
    InvalidNamespace(String),

    /// The path part is empty or contains invalid characters
    #[error("key '{0}' has an invalid path")]
    InvalidPath(String),
}

/// A single spatial probe failed.
///
/// Probe failures are isolated per candidate: the search logs them and moves
/// on to the next category.
#[derive(Error, Debug, Clone)]
#[error("probe for '{category}' failed: {reason}")]
pub struct ProbeError {
    /// The category being probed
    pub category: CategoryId,
    /// What went wrong
    pub reason: String,
}

impl ProbeError {
    /// Create a new probe error.
    pub fn new(category: CategoryId, reason: impl Into<String>) -> Self {
        Self {
            category,
            reason: reason.into(),
        }
    }
}

/// A tier level outside `1..=MAX_TIER`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("tier {0} is out of range 1..={max}", max = crate::merchant::MAX_TIER)]
pub struct InvalidTier(pub u8);

/// Errors from trade-slot operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TradeError {
    /// The slot does not exist in the trade list
    #[error("slot not found: {0}")]
    SlotNotFound(SlotId),

    /// The slot is disabled (exhausted or a placeholder)
    #[error("slot {0} is disabled")]
    SlotDisabled(SlotId),

    /// The slot is not in the state the operation requires
    #[error("slot {slot} cannot {operation}: {reason}")]
    InvalidTransition {
        /// The slot involved
        slot: SlotId,
        /// The attempted operation
        operation: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

/// Result type for trade-slot operations
pub type TradeResult<T> = Result<T, TradeError>;
