//! Runtime for discovery rewards.
//!
//! The [`Orchestrator`] accepts fill, restock and decipher triggers from the
//! simulation thread, runs budgeted searches on a fixed worker pool and
//! applies the results back on the simulation thread during [`Orchestrator::tick`].
//!
//! # Module Organization
//!
//! - [`merchant`]: merchants, the tier fill rule and host lookup
//! - [`trade_book`]: the ordered slot list and its transitions
//! - [`orchestrator`]: job submission, completion handling, restocks
//! - [`job`]: job identity, phases and tickets
//! - [`pool`]: the search worker pool
//! - [`host`]: trade UI and holder inventory capabilities
//! - [`persistence`]: save records
//!
//! # Threading
//!
//! Workers never touch merchants. A merchant's `is_searching` flag is set
//! before submission and cleared when the result is applied or discarded,
//! so each merchant has at most one search in flight.

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod error;
mod handoff;
pub mod host;
pub mod job;
pub mod merchant;
pub mod orchestrator;
pub mod persistence;
pub mod pool;
pub mod trade_book;

pub use error::{ApplyError, PersistenceError, RuntimeError, RuntimeResult};
pub use host::{Deciphered, HolderLedger, NullSink, NullUi, Refresh, RefreshLog, RewardSink, TradeUi};
pub use job::{JobId, JobKind, JobPhase, JobTarget, MerchantTarget};
pub use merchant::{Merchant, MerchantAccess, MerchantDirectory};
pub use orchestrator::{FillRequest, Orchestrator, TickReport};
pub use persistence::{load_merchant, load_record, save_merchant, MerchantRecord, SAVE_KEY};
pub use pool::WorkerPool;
pub use trade_book::TradeBook;
