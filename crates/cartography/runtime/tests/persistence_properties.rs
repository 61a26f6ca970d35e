//! Save records survive round trips regardless of ordering.

use cartography_runtime::{load_merchant, load_record, save_merchant, Merchant, SAVE_KEY};
use cartography_types::{CategoryId, MerchantKind, Position, Tier};
use proptest::prelude::*;
use serde_json::{json, Map};
use std::collections::BTreeSet;

fn category_strategy() -> impl Strategy<Value = String> {
    ("[a-z]{1,6}", "[a-z_/]{1,10}").prop_map(|(ns, path)| format!("{ns}:{path}"))
}

proptest! {
    #[test]
    fn offered_set_is_order_independent(
        categories in prop::collection::vec(category_strategy(), 0..20),
        last_tier in 0u8..=5,
    ) {
        let mut shuffled = categories.clone();
        shuffled.reverse();

        let load = |list: &[String]| {
            let mut record = Map::new();
            record.insert(
                SAVE_KEY.to_string(),
                json!({ "offered_categories": list, "last_tier_generated": last_tier }),
            );
            load_record(&record).unwrap().to_state()
        };
        let a = load(&categories);
        let b = load(&shuffled);

        prop_assert_eq!(a.offered_categories(), b.offered_categories());
        prop_assert!(!a.is_searching());
        let expected: BTreeSet<_> = categories.iter().map(|c| CategoryId::parse(c).unwrap()).collect();
        prop_assert_eq!(a.offered_categories(), &expected);
    }

    #[test]
    fn save_then_load_preserves_state(
        categories in prop::collection::btree_set(category_strategy(), 0..20),
        level in 1u8..=5,
    ) {
        let mut record = Map::new();
        record.insert(
            SAVE_KEY.to_string(),
            json!({ "offered_categories": categories, "last_tier_generated": level }),
        );
        let kind = MerchantKind::Tiered(Tier::new(level));
        let merchant = load_merchant(cartography_types::MerchantId::generate(), kind, Position::default(), &record).unwrap();

        let mut saved = Map::new();
        save_merchant(&merchant, &mut saved).unwrap();
        let reloaded: Merchant = load_merchant(merchant.id(), kind, Position::default(), &saved).unwrap();

        prop_assert_eq!(reloaded.state(), merchant.state());
        prop_assert_eq!(reloaded.state().offered_categories().len(), categories.len());
    }
}
