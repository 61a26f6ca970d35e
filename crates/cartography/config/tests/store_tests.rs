//! File-backed config store behavior.

use cartography_config::{ConfigError, ConfigSource, ConfigStore};
use cartography_types::{CategoryId, CategoryRegistry, InMemoryRegistry, ItemId, ItemRegistry};
use std::sync::Arc;
use tempfile::TempDir;

fn cat(raw: &str) -> CategoryId {
    CategoryId::parse(raw).unwrap()
}

fn registries() -> (Arc<dyn CategoryRegistry>, Arc<dyn ItemRegistry>) {
    let registry = Arc::new(
        InMemoryRegistry::new()
            .with_categories([cat("zone:ruins"), cat("zone:tower"), cat("zone:cave")])
            .with_items(
                ["currency:gold", "currency:silver"]
                    .into_iter()
                    .map(|i| ItemId::parse(i).unwrap()),
            ),
    );
    (registry.clone(), registry)
}

#[test]
fn missing_file_is_generated_with_every_category() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("rewards.cfg");
    let (categories, items) = registries();

    let store = ConfigStore::load(ConfigSource::File(path.clone()), categories, items).unwrap();

    assert!(path.exists());
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("default.cost = 10 currency:gold"));
    assert!(text.contains("zone:cave = 10 currency:gold"));

    let snapshot = store.snapshot();
    assert_eq!(snapshot.catalog.len(), 3);
    assert_eq!(snapshot.tunables.search.sample_size, 40);
}

#[test]
fn scenario_costs_resolve() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rewards.cfg");
    std::fs::write(
        &path,
        "default.cost = 10 currency:gold\n\
         zone:ruins = 1 currency:silver\n\
         zone:tower = 3 currency:nothing\n\
         this line is junk\n",
    )
    .unwrap();
    let (categories, items) = registries();

    let store = ConfigStore::load(ConfigSource::File(path), categories, items).unwrap();
    let snapshot = store.snapshot();

    assert_eq!(snapshot.cost_for(&cat("zone:ruins")).to_string(), "1 currency:silver");
    assert_eq!(snapshot.cost_for(&cat("zone:tower")).to_string(), "10 currency:gold");
    assert!(snapshot.catalog.contains(&cat("zone:tower")));
    assert!(!snapshot.catalog.contains(&cat("zone:cave")));
}

#[test]
fn unreadable_source_falls_back_to_compiled_defaults() {
    let dir = TempDir::new().unwrap();
    // A directory cannot be read as a file.
    let path = dir.path().to_path_buf();
    let (categories, items) = registries();

    let err = ConfigStore::load(
        ConfigSource::File(path.clone()),
        Arc::clone(&categories),
        Arc::clone(&items),
    )
    .err()
    .unwrap();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.is_fatal());

    let store = ConfigStore::load_or_default(ConfigSource::File(path), categories, items);
    let snapshot = store.snapshot();
    assert_eq!(snapshot.generation, 1);
    assert_eq!(snapshot.catalog.len(), 3);
    assert_eq!(snapshot.cost_for(&cat("zone:ruins")).to_string(), "10 currency:gold");
}

#[test]
fn reload_swaps_snapshot_and_failed_reload_keeps_it() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rewards.cfg");
    std::fs::write(&path, "zone:ruins = 1 currency:silver\n").unwrap();
    let (categories, items) = registries();

    let store = ConfigStore::load(ConfigSource::File(path.clone()), categories, items).unwrap();
    let handle = store.handle();
    assert_eq!(handle.current().catalog.len(), 1);

    std::fs::write(
        &path,
        "zone:ruins = 2 currency:gold\nzone:cave = 1 currency:gold\ntrader.mapCount = 4\n",
    )
    .unwrap();
    let reloaded = store.reload().unwrap();
    assert_eq!(reloaded.generation, 2);
    assert_eq!(handle.current().catalog.len(), 2);
    assert_eq!(handle.current().tunables.wandering.reward_count, 4);

    // Replace the file with a directory so the next read fails.
    std::fs::remove_file(&path).unwrap();
    std::fs::create_dir(&path).unwrap();
    assert!(store.reload().is_err());
    assert_eq!(handle.generation(), 2);
    assert_eq!(handle.current().catalog.len(), 2);
}

#[test]
fn generation_increases_across_reloads() {
    let (categories, items) = registries();
    let store = ConfigStore::load(
        ConfigSource::Text("zone:ruins = 1 currency:gold\n".to_string()),
        categories,
        items,
    )
    .unwrap();

    let generations: Vec<u64> = (0..5).map(|_| store.reload().unwrap().generation).collect();
    assert_eq!(generations, vec![2, 3, 4, 5, 6]);
}
