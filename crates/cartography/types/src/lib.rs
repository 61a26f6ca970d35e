//! # Cartography Types
//!
//! Data model shared by the discovery-reward crates: merchants hand out
//! maps to points of interest (POIs), priced per POI category, found by a
//! budgeted search over a world the host owns.
//!
//! ## Module Organization
//!
//! - [`ids`]: namespaced category/item keys and opaque entity ids
//! - [`world`]: positions and search radii
//! - [`cost`]: reward costs and the cost table
//! - [`search`]: search requests, results and reports
//! - [`slot`]: trade slots and reward payloads
//! - [`merchant`]: per-merchant reward state and tiers
//! - [`capability`]: traits the host world implements
//! - [`errors`]: shared error types

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod capability;
pub mod cost;
pub mod errors;
pub mod ids;
pub mod merchant;
pub mod search;
pub mod slot;
pub mod world;

pub use capability::{CategoryRegistry, InMemoryRegistry, ItemRegistry, SpatialIndex};
pub use cost::{CostTable, RewardCost};
pub use errors::{InvalidTier, KeyError, ProbeError, TradeError, TradeResult};
pub use ids::{CategoryId, HolderId, ItemId, MerchantId, SessionId, SlotId};
pub use merchant::{MerchantKind, MerchantState, Tier, MAX_TIER};
pub use search::{SearchReport, SearchRequest, SearchResult, SearchStrategy, StopReason};
pub use slot::{RewardPayload, SlotState, SlotUse, TradeSlot};
pub use world::{Position, SearchRadius};
