//! Compiled-in defaults and first-run source generation.

use crate::tunables::Tunables;
use cartography_types::{CategoryRegistry, ItemId, RewardCost};

/// Fallback cost used when the source does not set a valid `default.cost`.
pub fn compiled_default_cost() -> RewardCost {
    let item = ItemId::parse("currency:gold").expect("static item id is valid");
    RewardCost::new(item, 10).expect("static count is non-zero")
}

/// Render the default source listing every known category at `default_cost`.
pub fn default_source(
    tunables: &Tunables,
    default_cost: &RewardCost,
    registry: &dyn CategoryRegistry,
) -> String {
    let mut out = String::new();
    out.push_str("# Discovery reward configuration.\n");
    out.push_str("# Lines are 'key = value'. Category costs are '<namespace:path> = <count> <item>'.\n\n");
    out.push_str("# Probes per search and the wall-time budget per search.\n");

    for line in tunables.to_lines() {
        out.push_str(&line);
        out.push('\n');
    }

    out.push_str("\n# --- Reward costs ---\n");
    out.push_str(&format!("default.cost = {}\n\n", default_cost));

    let mut categories = registry.categories();
    categories.sort();
    for category in categories {
        out.push_str(&format!("{} = {}\n", category, default_cost));
    }
    out
}
