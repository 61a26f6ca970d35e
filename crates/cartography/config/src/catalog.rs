//! Reward catalog: which categories may be handed out.

use cartography_types::{CategoryId, CategoryRegistry, CostTable};
use std::collections::BTreeSet;

/// Whitelist of categories eligible for reward generation.
///
/// A category is eligible iff the cost table lists it (with its own cost or
/// the substituted default) and the world registry knows it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewardCatalog {
    whitelist: BTreeSet<CategoryId>,
}

impl RewardCatalog {
    /// Derive the catalog from a cost table.
    pub fn derive(costs: &CostTable, registry: &dyn CategoryRegistry) -> Self {
        let mut whitelist = BTreeSet::new();
        for category in costs.categories() {
            if registry.contains(category) {
                whitelist.insert(category.clone());
            } else {
                tracing::warn!(category = %category, "Cost listed for unknown category, not eligible");
            }
        }
        Self { whitelist }
    }

    /// Build a catalog from an explicit set.
    pub fn from_categories(categories: impl IntoIterator<Item = CategoryId>) -> Self {
        Self {
            whitelist: categories.into_iter().collect(),
        }
    }

    /// Whitelist minus `excluded`.
    pub fn eligible(&self, excluded: &BTreeSet<CategoryId>) -> Vec<CategoryId> {
        self.whitelist.difference(excluded).cloned().collect()
    }

    pub fn contains(&self, category: &CategoryId) -> bool {
        self.whitelist.contains(category)
    }

    pub fn categories(&self) -> impl Iterator<Item = &CategoryId> {
        self.whitelist.iter()
    }

    pub fn len(&self) -> usize {
        self.whitelist.len()
    }

    pub fn is_empty(&self) -> bool {
        self.whitelist.is_empty()
    }
}
