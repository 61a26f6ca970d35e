//! Configuration for the discovery-reward economy.
//!
//! A line-oriented `key = value` source supplies the per-category cost table,
//! the default cost and the gameplay tunables. The store turns it into an
//! immutable [`ConfigSnapshot`] and publishes it through a [`ConfigHandle`].
//!
//! # Module Organization
//!
//! - [`parser`]: line classification and per-line diagnostics
//! - [`cost_spec`]: `count item_id` values
//! - [`tunables`]: compiled defaults and overrides for search and tiers
//! - [`catalog`]: which categories are eligible as rewards
//! - [`snapshot`]: building a snapshot from text
//! - [`store`]: file handling, first-run generation and atomic reload
//!
//! Parsing is fault tolerant: an unusable line is logged and skipped, an
//! invalid cost falls back to the default cost, and only an unreadable
//! source is reported as an error.

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod catalog;
pub mod cost_spec;
pub mod defaults;
pub mod error;
pub mod parser;
pub mod snapshot;
pub mod store;
pub mod tunables;

pub use catalog::RewardCatalog;
pub use cost_spec::{parse_cost, parse_cost_or};
pub use defaults::{compiled_default_cost, default_source};
pub use error::{ConfigError, ConfigParseError, ConfigResult, InvalidCostSpec};
pub use parser::{parse_source, ConfigEntry, ParsedSource, DEFAULT_COST_KEY};
pub use snapshot::{build_snapshot, BuiltSnapshot, ConfigSnapshot};
pub use store::{ConfigHandle, ConfigSource, ConfigStore};
pub use tunables::{DecipherTunables, SearchTunables, TierTunables, TunableError, Tunables, WanderingTunables};
