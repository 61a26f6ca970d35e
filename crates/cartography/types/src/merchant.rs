//! Per-merchant reward state.

use crate::errors::InvalidTier;
use crate::ids::CategoryId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Highest trade tier a merchant can reach.
pub const MAX_TIER: u8 = 5;

/// A merchant's trade level, `1..=MAX_TIER`.
///
/// Deserialization rejects out-of-range levels instead of clamping them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Tier(u8);

impl Tier {
    /// The entry tier.
    pub const NOVICE: Tier = Tier(1);

    /// Create a tier, clamping into `1..=MAX_TIER`.
    pub fn new(level: u8) -> Self {
        Self(level.clamp(1, MAX_TIER))
    }

    /// The numeric level.
    pub fn level(&self) -> u8 {
        self.0
    }

    /// Tiers from the entry tier up to and including this one.
    pub fn up_to(self) -> impl Iterator<Item = Tier> {
        (1..=self.0).map(Tier)
    }
}

impl TryFrom<u8> for Tier {
    type Error = InvalidTier;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        if (1..=MAX_TIER).contains(&level) {
            Ok(Self(level))
        } else {
            Err(InvalidTier(level))
        }
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> Self {
        tier.0
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tier {}", self.0)
    }
}

/// What sort of merchant hosts the trade list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MerchantKind {
    /// Untiered merchant that receives one fixed batch of rewards
    Wandering,
    /// Merchant whose reward count, radius and uses follow its tier
    Tiered(Tier),
}

impl MerchantKind {
    /// Tier used for bookkeeping; wandering merchants count as the entry tier.
    pub fn tier(&self) -> Tier {
        match self {
            MerchantKind::Wandering => Tier::NOVICE,
            MerchantKind::Tiered(tier) => *tier,
        }
    }
}

/// Reward bookkeeping for one merchant.
///
/// `offered_categories` only grows. `is_searching` is owned by the
/// simulation thread and is never persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MerchantState {
    offered_categories: BTreeSet<CategoryId>,
    is_searching: bool,
    last_tier_generated: u8,
}

impl MerchantState {
    /// Fresh state for a newly spawned merchant.
    pub fn new() -> Self {
        Self::default()
    }

    /// State restored from a save record; never searching.
    pub fn restore(offered: impl IntoIterator<Item = CategoryId>, last_tier_generated: u8) -> Self {
        Self {
            offered_categories: offered.into_iter().collect(),
            is_searching: false,
            last_tier_generated,
        }
    }

    /// Categories this merchant has already handed out.
    pub fn offered_categories(&self) -> &BTreeSet<CategoryId> {
        &self.offered_categories
    }

    /// Record a granted category. Returns `false` if it was already offered.
    pub fn record_offer(&mut self, category: CategoryId) -> bool {
        self.offered_categories.insert(category)
    }

    /// Whether a search job is outstanding.
    pub fn is_searching(&self) -> bool {
        self.is_searching
    }

    /// Claim the search slot. Returns `false` if a search is already running.
    pub fn begin_search(&mut self) -> bool {
        if self.is_searching {
            return false;
        }
        self.is_searching = true;
        true
    }

    /// Release the search slot.
    pub fn finish_search(&mut self) {
        self.is_searching = false;
    }

    /// Highest tier a fill has completed for (0 = never).
    pub fn last_tier_generated(&self) -> u8 {
        self.last_tier_generated
    }

    /// Record a completed fill for `tier`; never lowers the stored value.
    pub fn record_tier(&mut self, tier: Tier) {
        self.last_tier_generated = self.last_tier_generated.max(tier.level());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_is_clamped() {
        assert_eq!(Tier::new(0).level(), 1);
        assert_eq!(Tier::new(9).level(), MAX_TIER);
        assert_eq!(Tier::new(3).up_to().count(), 3);
    }

    #[test]
    fn tier_deserialization_rejects_out_of_range() {
        let tier: Tier = serde_json::from_str("4").unwrap();
        assert_eq!(tier.level(), 4);
        assert_eq!(serde_json::to_string(&tier).unwrap(), "4");

        assert!(serde_json::from_str::<Tier>("0").is_err());
        assert!(serde_json::from_str::<Tier>("6").is_err());
        assert!(serde_json::from_str::<MerchantKind>(r#"{"Tiered":0}"#).is_err());
        assert_eq!(Tier::try_from(0), Err(InvalidTier(0)));
    }

    #[test]
    fn search_slot_is_exclusive() {
        let mut state = MerchantState::new();
        assert!(state.begin_search());
        assert!(!state.begin_search());
        state.finish_search();
        assert!(state.begin_search());
    }

    #[test]
    fn offers_are_idempotent() {
        let mut state = MerchantState::new();
        let ruins = CategoryId::parse("zone:ruins").unwrap();
        assert!(state.record_offer(ruins.clone()));
        assert!(!state.record_offer(ruins));
        assert_eq!(state.offered_categories().len(), 1);
    }

    #[test]
    fn restored_state_is_idle() {
        let state = MerchantState::restore([CategoryId::parse("zone:ruins").unwrap()], 3);
        assert!(!state.is_searching());
        assert_eq!(state.last_tier_generated(), 3);
    }

    #[test]
    fn tier_record_never_lowers() {
        let mut state = MerchantState::new();
        state.record_tier(Tier::new(3));
        state.record_tier(Tier::new(2));
        assert_eq!(state.last_tier_generated(), 3);
    }
}
