//! Host capabilities: the trade UI and holder inventories.

use cartography_types::{HolderId, MerchantId, RewardPayload, SessionId, TradeSlot};
use std::collections::HashMap;

/// Pushes an updated slot list to whoever is viewing a merchant.
pub trait TradeUi {
    fn refresh(&mut self, merchant: MerchantId, session: SessionId, slots: &[TradeSlot]);
}

/// Discards refreshes. For headless hosts.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullUi;

impl TradeUi for NullUi {
    fn refresh(&mut self, _merchant: MerchantId, _session: SessionId, _slots: &[TradeSlot]) {}
}

/// One recorded refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refresh {
    pub merchant: MerchantId,
    pub session: SessionId,
    pub slot_count: usize,
}

/// Records refreshes instead of drawing them.
#[derive(Debug, Default, Clone)]
pub struct RefreshLog {
    pub refreshes: Vec<Refresh>,
}

impl RefreshLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_merchant(&self, merchant: MerchantId) -> usize {
        self.refreshes.iter().filter(|r| r.merchant == merchant).count()
    }
}

impl TradeUi for RefreshLog {
    fn refresh(&mut self, merchant: MerchantId, session: SessionId, slots: &[TradeSlot]) {
        self.refreshes.push(Refresh {
            merchant,
            session,
            slot_count: slots.len(),
        });
    }
}

/// What deciphering an unidentified map produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deciphered {
    /// A map to a discovered POI
    Map(RewardPayload),
    /// Nothing was found; the holder gets an item labelled
    /// [`CRUMBLED_LABEL`](cartography_types::slot::CRUMBLED_LABEL)
    Crumbled,
}

/// Inventory of whoever deciphers unidentified maps.
///
/// Called on the simulation thread only. Where an item lands when the
/// inventory is full is up to the host.
pub trait RewardSink {
    /// Consume one unidentified map. `false` if the holder has none.
    fn take_unidentified(&mut self, holder: HolderId) -> bool;

    /// Give the holder a stand-in item labelled `label`.
    fn give_placeholder(&mut self, holder: HolderId, label: &str);

    fn deliver(&mut self, holder: HolderId, result: Deciphered);

    /// Take back one stand-in labelled `label`.
    fn remove_placeholder(&mut self, holder: HolderId, label: &str);
}

/// Sink whose holders never carry unidentified maps.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl RewardSink for NullSink {
    fn take_unidentified(&mut self, _holder: HolderId) -> bool {
        false
    }

    fn give_placeholder(&mut self, _holder: HolderId, _label: &str) {}

    fn deliver(&mut self, _holder: HolderId, _result: Deciphered) {}

    fn remove_placeholder(&mut self, _holder: HolderId, _label: &str) {}
}

/// Per-holder counters and a delivery log, for headless hosts and tests.
#[derive(Debug, Default, Clone)]
pub struct HolderLedger {
    unidentified: HashMap<HolderId, u32>,
    placeholders: HashMap<(HolderId, String), u32>,
    pub delivered: Vec<(HolderId, Deciphered)>,
}

impl HolderLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give `holder` some unidentified maps.
    pub fn stock(&mut self, holder: HolderId, count: u32) {
        *self.unidentified.entry(holder).or_default() += count;
    }

    pub fn unidentified(&self, holder: HolderId) -> u32 {
        self.unidentified.get(&holder).copied().unwrap_or(0)
    }

    /// Stand-ins labelled `label` the holder currently carries.
    pub fn placeholders(&self, holder: HolderId, label: &str) -> u32 {
        self.placeholders
            .get(&(holder, label.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn delivered_to(&self, holder: HolderId) -> Vec<&Deciphered> {
        self.delivered
            .iter()
            .filter(|(h, _)| *h == holder)
            .map(|(_, d)| d)
            .collect()
    }
}

impl RewardSink for HolderLedger {
    fn take_unidentified(&mut self, holder: HolderId) -> bool {
        match self.unidentified.get_mut(&holder) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        }
    }

    fn give_placeholder(&mut self, holder: HolderId, label: &str) {
        *self.placeholders.entry((holder, label.to_string())).or_default() += 1;
    }

    fn deliver(&mut self, holder: HolderId, result: Deciphered) {
        self.delivered.push((holder, result));
    }

    fn remove_placeholder(&mut self, holder: HolderId, label: &str) {
        if let Some(count) = self.placeholders.get_mut(&(holder, label.to_string())) {
            *count = count.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartography_types::slot::DECIPHERING_LABEL;

    #[test]
    fn ledger_consumes_one_map_at_a_time() {
        let holder = HolderId::generate();
        let mut ledger = HolderLedger::new();
        assert!(!ledger.take_unidentified(holder));

        ledger.stock(holder, 2);
        assert!(ledger.take_unidentified(holder));
        assert!(ledger.take_unidentified(holder));
        assert!(!ledger.take_unidentified(holder));
        assert_eq!(ledger.unidentified(holder), 0);
    }

    #[test]
    fn ledger_tracks_placeholders_by_label() {
        let holder = HolderId::generate();
        let mut ledger = HolderLedger::new();
        ledger.give_placeholder(holder, DECIPHERING_LABEL);
        ledger.give_placeholder(holder, DECIPHERING_LABEL);
        ledger.remove_placeholder(holder, DECIPHERING_LABEL);
        ledger.remove_placeholder(holder, "something else");

        assert_eq!(ledger.placeholders(holder, DECIPHERING_LABEL), 1);
        ledger.deliver(holder, Deciphered::Crumbled);
        assert_eq!(ledger.delivered_to(holder), vec![&Deciphered::Crumbled]);
    }
}
