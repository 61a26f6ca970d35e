//! Reward costs and the cost table.

use crate::ids::{CategoryId, ItemId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU32;

/// The currency demanded for one category's reward.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RewardCost {
    /// Item paid by the customer
    pub required_item: ItemId,
    /// How many of the item are paid (never zero)
    pub required_count: NonZeroU32,
}

impl RewardCost {
    /// Create a cost; returns `None` for a zero count.
    pub fn new(required_item: ItemId, required_count: u32) -> Option<Self> {
        NonZeroU32::new(required_count).map(|required_count| Self {
            required_item,
            required_count,
        })
    }

    /// The count as a plain integer.
    pub fn count(&self) -> u32 {
        self.required_count.get()
    }
}

impl fmt::Display for RewardCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.required_count, self.required_item)
    }
}

/// Mapping from category to cost, with a mandatory default.
///
/// A table is built once and then published behind a snapshot handle; it is
/// never mutated after publication.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostTable {
    entries: BTreeMap<CategoryId, RewardCost>,
    default_cost: RewardCost,
}

impl CostTable {
    /// Create an empty table with the given default cost.
    pub fn new(default_cost: RewardCost) -> Self {
        Self {
            entries: BTreeMap::new(),
            default_cost,
        }
    }

    /// Add or replace the cost for a category.
    pub fn insert(&mut self, category: CategoryId, cost: RewardCost) -> Option<RewardCost> {
        self.entries.insert(category, cost)
    }

    /// Replace the default cost.
    pub fn set_default_cost(&mut self, cost: RewardCost) {
        self.default_cost = cost;
    }

    /// Cost for a category, falling back to the default.
    pub fn cost_for(&self, category: &CategoryId) -> &RewardCost {
        self.entries.get(category).unwrap_or(&self.default_cost)
    }

    /// Cost listed for a category, if any.
    pub fn listed(&self, category: &CategoryId) -> Option<&RewardCost> {
        self.entries.get(category)
    }

    /// The fallback cost.
    pub fn default_cost(&self) -> &RewardCost {
        &self.default_cost
    }

    /// Categories listed in the table, in key order.
    pub fn categories(&self) -> impl Iterator<Item = &CategoryId> {
        self.entries.keys()
    }

    /// Number of listed categories.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no category is listed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cost(item: &str, count: u32) -> RewardCost {
        RewardCost::new(ItemId::parse(item).unwrap(), count).unwrap()
    }

    #[test]
    fn zero_count_is_rejected() {
        assert!(RewardCost::new(ItemId::parse("currency:gold").unwrap(), 0).is_none());
    }

    #[test]
    fn falls_back_to_default() {
        let mut table = CostTable::new(cost("currency:gold", 10));
        let ruins = CategoryId::parse("zone:ruins").unwrap();
        let tower = CategoryId::parse("zone:tower").unwrap();
        table.insert(ruins.clone(), cost("currency:silver", 1));

        assert_eq!(table.cost_for(&ruins), &cost("currency:silver", 1));
        assert_eq!(table.cost_for(&tower), &cost("currency:gold", 10));
        assert!(table.listed(&tower).is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn displays_as_config_value() {
        assert_eq!(cost("currency:gold", 10).to_string(), "10 currency:gold");
    }
}
