//! Synthetic world: a scatter of POIs, a category registry and an item
//! registry.

use cartography_types::{
    CategoryId, CategoryRegistry, InMemoryRegistry, ItemId, ItemRegistry, Position, ProbeError,
    SearchRadius, SearchResult, SpatialIndex,
};
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

const CATEGORIES: &[&str] = &[
    "zone:ruins",
    "zone:tower",
    "zone:cave",
    "zone:shipwreck",
    "zone:temple",
    "zone:monument",
    "zone:outpost",
    "zone:mansion",
    "zone:mineshaft",
    "zone:igloo",
    "zone:village/plains",
    "zone:village/desert",
    "zone:village/taiga",
    "zone:stronghold",
    "zone:ancient_city",
    "zone:trail_ruins",
];

const ITEMS: &[&str] = &["currency:gold", "currency:silver", "currency:emerald"];

/// How the synthetic index behaves.
#[derive(Debug, Clone)]
pub struct WorldSettings {
    /// POIs are scattered within `±extent` blocks on both axes
    pub extent: i32,
    pub pois_per_category: usize,
    /// Artificial cost of one probe
    pub probe_delay: Duration,
    /// Every n-th probe fails; 0 disables failures
    pub fail_every: u64,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            extent: 6000,
            pois_per_category: 4,
            probe_delay: Duration::from_millis(2),
            fail_every: 0,
        }
    }
}

/// World with a fixed set of POIs.
#[derive(Debug)]
pub struct GridWorld {
    registry: InMemoryRegistry,
    pois: BTreeMap<CategoryId, Vec<Position>>,
    settings: WorldSettings,
    probes: AtomicU64,
}

impl GridWorld {
    pub fn generate(settings: WorldSettings, rng: &mut StdRng) -> anyhow::Result<Self> {
        let categories = CATEGORIES
            .iter()
            .map(|c| CategoryId::parse(c))
            .collect::<Result<Vec<_>, _>>()?;
        let items = ITEMS
            .iter()
            .map(|i| ItemId::parse(i))
            .collect::<Result<Vec<_>, _>>()?;

        let extent = settings.extent.max(1);
        let mut pois = BTreeMap::new();
        for category in &categories {
            let positions = (0..settings.pois_per_category)
                .map(|_| {
                    Position::new(
                        rng.gen_range(-extent..=extent),
                        rng.gen_range(40..=90),
                        rng.gen_range(-extent..=extent),
                    )
                })
                .collect();
            pois.insert(category.clone(), positions);
        }

        tracing::info!(
            categories = categories.len(),
            pois_per_category = settings.pois_per_category,
            extent,
            "World generated"
        );

        Ok(Self {
            registry: InMemoryRegistry::new()
                .with_categories(categories)
                .with_items(items),
            pois,
            settings,
            probes: AtomicU64::new(0),
        })
    }

    pub fn probes(&self) -> u64 {
        self.probes.load(Ordering::Relaxed)
    }
}

impl SpatialIndex for GridWorld {
    fn locate(
        &self,
        categories: &[CategoryId],
        origin: Position,
        radius: SearchRadius,
    ) -> Result<Option<SearchResult>, ProbeError> {
        let n = self.probes.fetch_add(1, Ordering::Relaxed) + 1;
        if !self.settings.probe_delay.is_zero() {
            std::thread::sleep(self.settings.probe_delay);
        }
        if self.settings.fail_every > 0 && n % self.settings.fail_every == 0 {
            if let Some(category) = categories.first() {
                return Err(ProbeError::new(category.clone(), "chunk not loaded"));
            }
        }

        let max_sq = i64::from(radius.blocks()).pow(2);
        let nearest = categories
            .iter()
            .flat_map(|c| {
                self.pois
                    .get(c)
                    .into_iter()
                    .flatten()
                    .map(move |p| (p.horizontal_distance_sq(&origin), *p, c))
            })
            .filter(|(d, _, _)| *d <= max_sq)
            .min_by_key(|(d, _, _)| *d);

        Ok(nearest.map(|(_, position, category)| SearchResult::new(position, category.clone())))
    }
}

impl CategoryRegistry for GridWorld {
    fn categories(&self) -> Vec<CategoryId> {
        self.registry.categories()
    }

    fn contains(&self, category: &CategoryId) -> bool {
        self.registry.contains(category)
    }
}

impl ItemRegistry for GridWorld {
    fn is_known_item(&self, item: &ItemId) -> bool {
        self.registry.is_known_item(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn world(settings: WorldSettings) -> GridWorld {
        GridWorld::generate(settings, &mut StdRng::seed_from_u64(1)).unwrap()
    }

    #[test]
    fn locate_respects_radius() {
        let world = world(WorldSettings {
            probe_delay: Duration::ZERO,
            ..Default::default()
        });
        let ruins = CategoryId::parse("zone:ruins").unwrap();
        let target = world.pois[&ruins][0];

        let hit = world
            .locate(std::slice::from_ref(&ruins), target, SearchRadius(1))
            .unwrap()
            .unwrap();
        assert_eq!(hit.position, target);

        let far = Position::new(target.x + 100_000, 64, target.z);
        assert!(world
            .locate(std::slice::from_ref(&ruins), far, SearchRadius(500))
            .unwrap()
            .is_none());
    }

    #[test]
    fn failures_are_periodic() {
        let world = world(WorldSettings {
            probe_delay: Duration::ZERO,
            fail_every: 2,
            ..Default::default()
        });
        let ruins = [CategoryId::parse("zone:ruins").unwrap()];
        assert!(world.locate(&ruins, Position::default(), SearchRadius(10)).is_ok());
        assert!(world.locate(&ruins, Position::default(), SearchRadius(10)).is_err());
        assert_eq!(world.probes(), 2);
    }

    #[test]
    fn registries_know_generated_keys() {
        let world = world(WorldSettings::default());
        assert_eq!(world.categories().len(), CATEGORIES.len());
        assert!(world.is_known_item(&ItemId::parse("currency:silver").unwrap()));
        assert!(!world.is_known_item(&ItemId::parse("currency:copper").unwrap()));
    }
}
