//! Capabilities consumed from the host world.
//!
//! The host owns its registries and its spatial index; this subsystem only
//! reads them. [`SpatialIndex`] implementations are shared with the search
//! worker pool and must tolerate concurrent read-only calls.

use crate::errors::ProbeError;
use crate::ids::{CategoryId, ItemId};
use crate::search::SearchResult;
use crate::world::{Position, SearchRadius};
use std::collections::BTreeSet;

/// Registry of every POI category the world knows about.
pub trait CategoryRegistry: Send + Sync {
    /// All known categories.
    fn categories(&self) -> Vec<CategoryId>;

    /// Whether a category is known.
    fn contains(&self, category: &CategoryId) -> bool {
        self.categories().iter().any(|c| c == category)
    }
}

/// Registry of every item the world knows about.
pub trait ItemRegistry: Send + Sync {
    /// Whether an item id resolves to a real item.
    fn is_known_item(&self, item: &ItemId) -> bool;
}

/// Read-only spatial query over the world.
pub trait SpatialIndex: Send + Sync {
    /// Find a POI of any of `categories` within `radius` of `origin`.
    ///
    /// Implementations may be slow; callers bound how often they call this,
    /// not how long a single call takes.
    fn locate(
        &self,
        categories: &[CategoryId],
        origin: Position,
        radius: SearchRadius,
    ) -> Result<Option<SearchResult>, ProbeError>;
}

/// Fixed registry backed by in-memory sets.
#[derive(Clone, Debug, Default)]
pub struct InMemoryRegistry {
    categories: BTreeSet<CategoryId>,
    items: BTreeSet<ItemId>,
}

impl InMemoryRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add categories.
    pub fn with_categories(mut self, categories: impl IntoIterator<Item = CategoryId>) -> Self {
        self.categories.extend(categories);
        self
    }

    /// Add items.
    pub fn with_items(mut self, items: impl IntoIterator<Item = ItemId>) -> Self {
        self.items.extend(items);
        self
    }
}

impl CategoryRegistry for InMemoryRegistry {
    fn categories(&self) -> Vec<CategoryId> {
        self.categories.iter().cloned().collect()
    }

    fn contains(&self, category: &CategoryId) -> bool {
        self.categories.contains(category)
    }
}

impl ItemRegistry for InMemoryRegistry {
    fn is_known_item(&self, item: &ItemId) -> bool {
        self.items.contains(item)
    }
}
