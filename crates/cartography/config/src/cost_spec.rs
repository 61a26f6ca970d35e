//! Parsing of `count item_id` cost values.

use crate::error::InvalidCostSpec;
use cartography_types::{ItemId, ItemRegistry, RewardCost};

/// Parse a cost value such as `10 currency:gold`.
///
/// The count must be a positive integer and the item must be known to the
/// registry.
pub fn parse_cost(value: &str, items: &dyn ItemRegistry) -> Result<RewardCost, InvalidCostSpec> {
    let invalid = |reason: String| InvalidCostSpec {
        value: value.to_string(),
        reason,
    };

    let parts: Vec<&str> = value.split_whitespace().collect();
    let [count, item] = parts.as_slice() else {
        return Err(invalid("expected 'count item_id'".to_string()));
    };

    let count: u32 = count
        .parse()
        .map_err(|_| invalid(format!("'{}' is not a count", count)))?;
    let item = ItemId::parse(item).map_err(|e| invalid(e.to_string()))?;

    if !items.is_known_item(&item) {
        return Err(invalid(format!("unknown item '{}'", item)));
    }

    RewardCost::new(item, count).ok_or_else(|| invalid("count must be greater than zero".to_string()))
}

/// Parse a cost value, substituting `fallback` and logging when it is invalid.
pub fn parse_cost_or(
    value: &str,
    items: &dyn ItemRegistry,
    fallback: &RewardCost,
    context: &str,
) -> RewardCost {
    match parse_cost(value, items) {
        Ok(cost) => cost,
        Err(err) => {
            tracing::warn!(key = context, error = %err, fallback = %fallback, "Invalid cost, using default");
            fallback.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartography_types::InMemoryRegistry;

    fn items() -> InMemoryRegistry {
        InMemoryRegistry::new().with_items([
            ItemId::parse("currency:gold").unwrap(),
            ItemId::parse("currency:silver").unwrap(),
        ])
    }

    #[test]
    fn parses_valid_cost() {
        let cost = parse_cost("  3   currency:silver ", &items()).unwrap();
        assert_eq!(cost.count(), 3);
        assert_eq!(cost.required_item.as_str(), "currency:silver");
    }

    #[test]
    fn rejects_invalid_costs() {
        let registry = items();
        for value in [
            "currency:gold",
            "1 currency:gold extra",
            "many currency:gold",
            "-1 currency:gold",
            "0 currency:gold",
            "1 gold",
            "1 currency:platinum",
        ] {
            assert!(parse_cost(value, &registry).is_err(), "accepted {value}");
        }
    }

    #[test]
    fn falls_back_to_default() {
        let registry = items();
        let fallback = RewardCost::new(ItemId::parse("currency:gold").unwrap(), 10).unwrap();
        let cost = parse_cost_or("0 currency:silver", &registry, &fallback, "zone:ruins");
        assert_eq!(cost, fallback);
    }
}
