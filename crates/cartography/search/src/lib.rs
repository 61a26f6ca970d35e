//! Budgeted spatial search for discovery rewards.
//!
//! Given an origin, a whitelist of categories and an exclusion set, the
//! [`SearchBudgeter`] probes a random sample of candidate categories against
//! the host's spatial index and stops at the first hit, when the sample budget
//! is spent, or when the time budget has elapsed.
//!
//! The budgeter is synchronous. Callers that must not block run it on a worker
//! pool.

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod budgeter;
pub mod clock;

pub use budgeter::SearchBudgeter;
pub use clock::{Clock, ManualClock, SystemClock};
