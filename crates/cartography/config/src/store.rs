//! Config store with atomic snapshot publication.
//!
//! Readers take an `Arc<ConfigSnapshot>` from a [`ConfigHandle`] and keep it
//! for the duration of one search or restock. A reload builds a complete new
//! snapshot and swaps it in; readers never observe a partial table.

use crate::defaults::{compiled_default_cost, default_source};
use crate::error::{ConfigError, ConfigResult};
use crate::snapshot::{build_snapshot, ConfigSnapshot};
use crate::tunables::Tunables;
use arc_swap::ArcSwap;
use cartography_types::{CategoryRegistry, ItemRegistry, RewardCost};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where configuration text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// A file; generated with defaults on first use.
    File(PathBuf),
    /// Inline text, mostly for tests and embedding.
    Text(String),
}

/// Shared read handle to the current snapshot.
#[derive(Clone)]
pub struct ConfigHandle {
    inner: Arc<ArcSwap<ConfigSnapshot>>,
}

impl ConfigHandle {
    fn new(snapshot: ConfigSnapshot) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(snapshot)),
        }
    }

    /// Handle that always serves `snapshot`.
    pub fn fixed(snapshot: ConfigSnapshot) -> Self {
        Self::new(snapshot)
    }

    /// The snapshot published most recently.
    pub fn current(&self) -> Arc<ConfigSnapshot> {
        self.inner.load_full()
    }

    /// Generation of the current snapshot.
    pub fn generation(&self) -> u64 {
        self.inner.load().generation
    }

    /// Swap in `snapshot` with the next generation number.
    fn publish(&self, snapshot: ConfigSnapshot) -> Arc<ConfigSnapshot> {
        self.inner.rcu(|current| {
            let mut next = snapshot.clone();
            next.generation = current.generation + 1;
            next
        });
        self.inner.load_full()
    }
}

impl std::fmt::Debug for ConfigHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigHandle")
            .field("generation", &self.generation())
            .finish()
    }
}

/// Owns the config source and the registries used to validate it.
pub struct ConfigStore {
    source: ConfigSource,
    categories: Arc<dyn CategoryRegistry>,
    items: Arc<dyn ItemRegistry>,
    compiled_default: RewardCost,
    handle: ConfigHandle,
}

impl ConfigStore {
    /// Load `source`, generating a default file when it does not exist yet.
    ///
    /// Fails only when the source cannot be read or written at all.
    pub fn load(
        source: ConfigSource,
        categories: Arc<dyn CategoryRegistry>,
        items: Arc<dyn ItemRegistry>,
    ) -> ConfigResult<Self> {
        let compiled_default = compiled_default_cost();
        let text = read_source(&source, &compiled_default, categories.as_ref())?;
        let built = build_snapshot(&text, categories.as_ref(), items.as_ref(), &compiled_default);

        let mut snapshot = built.snapshot;
        snapshot.generation = 1;
        tracing::info!(
            eligible = snapshot.catalog.len(),
            diagnostics = built.diagnostics.len(),
            "Config loaded"
        );

        Ok(Self {
            source,
            categories,
            items,
            compiled_default,
            handle: ConfigHandle::new(snapshot),
        })
    }

    /// Like [`ConfigStore::load`], but an unreadable source yields the
    /// compiled defaults instead of an error.
    pub fn load_or_default(
        source: ConfigSource,
        categories: Arc<dyn CategoryRegistry>,
        items: Arc<dyn ItemRegistry>,
    ) -> Self {
        match Self::load(source.clone(), Arc::clone(&categories), Arc::clone(&items)) {
            Ok(store) => store,
            Err(err) => {
                tracing::error!(error = %err, "Config unreadable, using compiled defaults");
                let compiled_default = compiled_default_cost();
                let mut snapshot =
                    ConfigSnapshot::compiled_defaults(compiled_default.clone(), categories.as_ref());
                snapshot.generation = 1;
                Self {
                    source,
                    categories,
                    items,
                    compiled_default,
                    handle: ConfigHandle::new(snapshot),
                }
            }
        }
    }

    /// Re-read the source and publish a new snapshot.
    ///
    /// On error the current snapshot stays published.
    pub fn reload(&self) -> ConfigResult<Arc<ConfigSnapshot>> {
        let text = match read_source(&self.source, &self.compiled_default, self.categories.as_ref()) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    generation = self.handle.generation(),
                    "Config reload failed, keeping current snapshot"
                );
                return Err(err);
            }
        };

        let built = build_snapshot(
            &text,
            self.categories.as_ref(),
            self.items.as_ref(),
            &self.compiled_default,
        );
        let published = self.handle.publish(built.snapshot);
        tracing::info!(
            generation = published.generation,
            eligible = published.catalog.len(),
            diagnostics = built.diagnostics.len(),
            "Config reloaded"
        );
        Ok(published)
    }

    pub fn handle(&self) -> ConfigHandle {
        self.handle.clone()
    }

    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        self.handle.current()
    }

    pub fn source(&self) -> &ConfigSource {
        &self.source
    }
}

fn read_source(
    source: &ConfigSource,
    default_cost: &RewardCost,
    categories: &dyn CategoryRegistry,
) -> ConfigResult<String> {
    match source {
        ConfigSource::Text(text) => Ok(text.clone()),
        ConfigSource::File(path) => {
            if !path.exists() {
                write_default(path, default_cost, categories)?;
            }
            std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))
        }
    }
}

fn write_default(
    path: &Path,
    default_cost: &RewardCost,
    categories: &dyn CategoryRegistry,
) -> ConfigResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
    }
    let text = default_source(&Tunables::default(), default_cost, categories);
    std::fs::write(path, text).map_err(|e| ConfigError::io(path, e))?;
    tracing::info!(path = %path.display(), "Generated default config");
    Ok(())
}
