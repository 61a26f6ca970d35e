//! Immutable configuration snapshots.

use crate::catalog::RewardCatalog;
use crate::cost_spec::parse_cost;
use crate::error::{ConfigError, ConfigParseError};
use crate::parser::{parse_source, ConfigEntry};
use crate::tunables::{TunableError, Tunables};
use cartography_types::{CategoryId, CategoryRegistry, CostTable, ItemRegistry, RewardCost};

/// Everything a search or a restock needs from configuration.
///
/// Snapshots are never mutated after publication; a reload builds a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSnapshot {
    /// Increases by one with every publication
    pub generation: u64,
    pub costs: CostTable,
    pub catalog: RewardCatalog,
    pub tunables: Tunables,
}

impl ConfigSnapshot {
    /// Snapshot used when the source cannot be read at all: compiled tunables,
    /// `default_cost`, every registry category eligible at that cost.
    pub fn compiled_defaults(default_cost: RewardCost, categories: &dyn CategoryRegistry) -> Self {
        let mut costs = CostTable::new(default_cost.clone());
        for category in categories.categories() {
            costs.insert(category, default_cost.clone());
        }
        let catalog = RewardCatalog::derive(&costs, categories);
        Self {
            generation: 0,
            costs,
            catalog,
            tunables: Tunables::default(),
        }
    }

    /// Cost for a category under this snapshot.
    pub fn cost_for(&self, category: &CategoryId) -> &RewardCost {
        self.costs.cost_for(category)
    }
}

/// A snapshot built from text, with the non-fatal problems found on the way.
#[derive(Debug)]
pub struct BuiltSnapshot {
    pub snapshot: ConfigSnapshot,
    pub diagnostics: Vec<ConfigError>,
}

/// Build a snapshot from config text.
///
/// `default.cost` is resolved first so that category lines anywhere in the
/// file fall back to the configured default rather than the compiled one.
pub fn build_snapshot(
    text: &str,
    categories: &dyn CategoryRegistry,
    items: &dyn ItemRegistry,
    compiled_default: &RewardCost,
) -> BuiltSnapshot {
    let parsed = parse_source(text);
    let mut diagnostics: Vec<ConfigError> =
        parsed.errors.into_iter().map(ConfigError::Parse).collect();

    let mut default_cost = compiled_default.clone();
    for entry in &parsed.entries {
        if let ConfigEntry::DefaultCost { value, .. } = entry {
            match parse_cost(value, items) {
                Ok(cost) => default_cost = cost,
                Err(err) => {
                    tracing::warn!(error = %err, "Invalid default.cost, keeping previous default");
                    diagnostics.push(err.into());
                }
            }
        }
    }

    let mut costs = CostTable::new(default_cost.clone());
    let mut tunables = Tunables::default();

    for entry in parsed.entries {
        match entry {
            ConfigEntry::DefaultCost { .. } => {}
            ConfigEntry::CategoryCost {
                category, value, ..
            } => {
                let cost = match parse_cost(&value, items) {
                    Ok(cost) => cost,
                    Err(err) => {
                        tracing::warn!(
                            key = %category,
                            error = %err,
                            fallback = %default_cost,
                            "Invalid cost, using default"
                        );
                        diagnostics.push(err.into());
                        default_cost.clone()
                    }
                };
                costs.insert(category, cost);
            }
            ConfigEntry::Tunable { line, key, value } => {
                if let Err(err) = tunables.apply(&key, &value) {
                    let reason = match err {
                        TunableError::UnknownKey => format!("unknown key '{}'", key),
                        TunableError::InvalidValue(reason) => reason,
                    };
                    let err = ConfigParseError {
                        line,
                        content: format!("{} = {}", key, value),
                        reason,
                    };
                    tracing::warn!(error = %err, "Skipping config line");
                    diagnostics.push(err.into());
                }
            }
        }
    }

    for err in &diagnostics {
        if let ConfigError::Parse(parse) = err {
            tracing::debug!(line = parse.line, reason = %parse.reason, "Config diagnostic");
        }
    }

    let catalog = RewardCatalog::derive(&costs, categories);
    BuiltSnapshot {
        snapshot: ConfigSnapshot {
            generation: 0,
            costs,
            catalog,
            tunables,
        },
        diagnostics,
    }
}
