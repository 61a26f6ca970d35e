//! Merchant save records.
//!
//! The host owns the save file; this module reads and writes one JSON object
//! under [`SAVE_KEY`] inside each merchant's record.

use crate::error::PersistenceError;
use crate::merchant::Merchant;
use crate::trade_book::TradeBook;
use cartography_types::{CategoryId, MerchantId, MerchantKind, MerchantState, Position, TradeSlot};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key of the reward record inside a host save record.
pub const SAVE_KEY: &str = "cartography";

/// Persisted reward bookkeeping for one merchant.
///
/// `is_searching` is deliberately absent: a loaded merchant is never busy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantRecord {
    pub offered_categories: Vec<String>,
    #[serde(default)]
    pub last_tier_generated: u8,
    /// Reward slots; placeholders are never written
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub slots: Vec<TradeSlot>,
}

impl MerchantRecord {
    pub fn from_merchant(merchant: &Merchant) -> Self {
        Self {
            offered_categories: merchant
                .state()
                .offered_categories()
                .iter()
                .map(|c| c.as_str().to_string())
                .collect(),
            last_tier_generated: merchant.state().last_tier_generated(),
            slots: merchant.book().persistent_slots(),
        }
    }

    /// Rebuild the state, skipping ids that no longer parse.
    pub fn to_state(&self) -> MerchantState {
        let offered = self
            .offered_categories
            .iter()
            .filter_map(|raw| match CategoryId::parse(raw) {
                Ok(id) => Some(id),
                Err(err) => {
                    tracing::warn!(category = %raw, error = %err, "Skipping unreadable saved category");
                    None
                }
            });
        MerchantState::restore(offered, self.last_tier_generated)
    }

    pub fn to_book(&self) -> TradeBook {
        TradeBook::from_slots(
            self.slots
                .iter()
                .filter(|s| !s.is_placeholder())
                .cloned()
                .collect(),
        )
    }
}

/// Write `merchant`'s record into a host save record.
pub fn save_merchant(merchant: &Merchant, record: &mut Map<String, Value>) -> Result<(), PersistenceError> {
    let value = serde_json::to_value(MerchantRecord::from_merchant(merchant))?;
    record.insert(SAVE_KEY.to_string(), value);
    Ok(())
}

/// Read the reward record from a host save record.
///
/// A missing record yields a fresh state.
pub fn load_record(record: &Map<String, Value>) -> Result<MerchantRecord, PersistenceError> {
    match record.get(SAVE_KEY) {
        Some(value) => Ok(MerchantRecord::deserialize(value)?),
        None => Ok(MerchantRecord::default()),
    }
}

/// Rebuild a merchant from a host save record and the host's own fields.
pub fn load_merchant(
    id: MerchantId,
    kind: MerchantKind,
    position: Position,
    record: &Map<String, Value>,
) -> Result<Merchant, PersistenceError> {
    let saved = load_record(record)?;
    Ok(Merchant::restore(id, kind, position, saved.to_state(), saved.to_book()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartography_types::{ItemId, RewardCost, RewardPayload, Tier};
    use serde_json::json;

    fn merchant_with(categories: &[&str]) -> Merchant {
        let mut merchant = Merchant::new(MerchantKind::Tiered(Tier::new(2)), Position::new(5, 64, 5));
        for c in categories {
            let category = CategoryId::parse(c).unwrap();
            merchant.state.record_offer(category.clone());
            merchant.book.push(TradeSlot::reward(
                RewardCost::new(ItemId::parse("currency:gold").unwrap(), 10).unwrap(),
                RewardPayload::new(category, Position::new(1, 2, 3)),
                1,
            ));
        }
        merchant.state.record_tier(Tier::new(2));
        merchant
    }

    #[test]
    fn round_trip_clears_search_flag() {
        let mut merchant = merchant_with(&["zone:ruins", "zone:tower"]);
        merchant.state.begin_search();
        merchant.book.push_placeholder("Searching...");

        let mut record = Map::new();
        save_merchant(&merchant, &mut record).unwrap();
        assert!(!record[SAVE_KEY].to_string().contains("is_searching"));

        let loaded = load_merchant(merchant.id(), merchant.kind(), merchant.position(), &record).unwrap();
        assert!(!loaded.state().is_searching());
        assert_eq!(loaded.state().offered_categories(), merchant.state().offered_categories());
        assert_eq!(loaded.state().last_tier_generated(), 2);
        assert_eq!(loaded.book().len(), 2);
    }

    #[test]
    fn missing_record_is_fresh() {
        let record = Map::new();
        let loaded = load_merchant(MerchantId::generate(), MerchantKind::Wandering, Position::default(), &record)
            .unwrap();
        assert!(loaded.state().offered_categories().is_empty());
        assert_eq!(loaded.state().last_tier_generated(), 0);
    }

    #[test]
    fn unreadable_ids_are_skipped() {
        let mut record = Map::new();
        record.insert(
            SAVE_KEY.to_string(),
            json!({ "offered_categories": ["zone:ruins", "no separator", "Bad:Case"], "last_tier_generated": 1 }),
        );
        let state = load_record(&record).unwrap().to_state();
        assert_eq!(state.offered_categories().len(), 1);
        assert!(!state.is_searching());
    }

    #[test]
    fn malformed_record_is_an_error() {
        let mut record = Map::new();
        record.insert(SAVE_KEY.to_string(), json!({ "offered_categories": 7 }));
        assert!(matches!(load_record(&record), Err(PersistenceError::Malformed(_))));
    }
}
