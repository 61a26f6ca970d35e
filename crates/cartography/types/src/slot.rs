//! Trade slots and reward payloads.

use crate::cost::RewardCost;
use crate::errors::{TradeError, TradeResult};
use crate::ids::{CategoryId, SlotId};
use crate::search::SearchResult;
use crate::world::Position;
use serde::{Deserialize, Serialize};

/// Label shown on a placeholder while a search is in flight.
pub const SEARCHING_LABEL: &str = "Searching for discoveries...";

/// Label shown on a placeholder that replaced an exhausted slot.
pub const RESTOCKING_LABEL: &str = "Restocking...";

/// Label on the stand-in a holder gets while an unidentified map is deciphered.
pub const DECIPHERING_LABEL: &str = "Deciphering Map...";

/// Label on what a holder gets when deciphering finds nothing.
pub const CRUMBLED_LABEL: &str = "The map crumbled to dust... (No structure found)";

/// The map-like item handed to the customer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RewardPayload {
    /// Category of the POI the map points at
    pub category_id: CategoryId,
    /// Target position marked on the map
    pub position: Position,
    /// Item name, e.g. "Ancient City Map"
    pub display_name: String,
    /// 24-bit RGB tint, stable per category
    pub color: u32,
}

impl RewardPayload {
    /// Bind a payload to a located POI.
    pub fn new(category_id: CategoryId, position: Position) -> Self {
        let display_name = format!("{} Map", display_name(category_id.path()));
        let color = category_color(&category_id);
        Self {
            category_id,
            position,
            display_name,
            color,
        }
    }

    /// Bind a payload to a search result.
    pub fn from_result(result: &SearchResult) -> Self {
        Self::new(result.category_id.clone(), result.position)
    }
}

/// Title-case a category path: `ancient_city` becomes `Ancient City`.
///
/// Only the last path segment is used, so `village/plains` becomes `Plains`.
pub fn display_name(path: &str) -> String {
    let last = path.rsplit('/').next().unwrap_or(path);
    last.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Stable 24-bit color for a category (FNV-1a over the key).
pub fn category_color(category: &CategoryId) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in category.as_str().bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash & 0x00ff_ffff
}

/// Lifecycle state of a slot as seen by the trade-slot state machine.
///
/// A removed slot is simply absent from the trade list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotState {
    /// Tradeable reward
    Active,
    /// Reward with no uses left
    Exhausted,
    /// Placeholder waiting for a search result
    Pending,
}

/// What happened when a customer used a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotUse {
    /// The slot still has uses left
    Remaining(u32),
    /// That was the last use; the slot is now disabled
    Exhausted,
}

/// One entry in a merchant's visible trade list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeSlot {
    /// Slot identity, stable across in-place swaps
    pub id: SlotId,
    /// Price; `None` for placeholders
    pub cost: Option<RewardCost>,
    /// Reward; `None` for placeholders
    pub reward_payload: Option<RewardPayload>,
    /// Uses granted when the slot was created
    pub max_uses: u32,
    /// Uses left
    pub uses_remaining: u32,
    /// Disabled slots cannot be traded
    pub disabled: bool,
    /// Text shown in the trade list
    pub label: String,
}

impl TradeSlot {
    /// Create a tradeable reward slot.
    pub fn reward(cost: RewardCost, payload: RewardPayload, max_uses: u32) -> Self {
        let max_uses = max_uses.max(1);
        Self {
            id: SlotId::generate(),
            label: payload.display_name.clone(),
            cost: Some(cost),
            reward_payload: Some(payload),
            max_uses,
            uses_remaining: max_uses,
            disabled: false,
        }
    }

    /// Create a disabled placeholder.
    pub fn placeholder(label: impl Into<String>) -> Self {
        Self {
            id: SlotId::generate(),
            cost: None,
            reward_payload: None,
            max_uses: 0,
            uses_remaining: 0,
            disabled: true,
            label: label.into(),
        }
    }

    /// Whether this slot is a placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.reward_payload.is_none()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SlotState {
        if self.is_placeholder() {
            SlotState::Pending
        } else if self.disabled {
            SlotState::Exhausted
        } else {
            SlotState::Active
        }
    }

    /// Category this slot rewards, if it is a reward slot.
    pub fn category(&self) -> Option<&CategoryId> {
        self.reward_payload.as_ref().map(|p| &p.category_id)
    }

    /// Consume one use.
    ///
    /// `uses_remaining` only ever decreases; reaching zero disables the slot.
    pub fn use_once(&mut self) -> TradeResult<SlotUse> {
        if self.disabled || self.uses_remaining == 0 {
            return Err(TradeError::SlotDisabled(self.id));
        }
        self.uses_remaining -= 1;
        if self.uses_remaining == 0 {
            self.disabled = true;
            Ok(SlotUse::Exhausted)
        } else {
            Ok(SlotUse::Remaining(self.uses_remaining))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ItemId;

    fn ruins_slot(max_uses: u32) -> TradeSlot {
        let category = CategoryId::parse("zone:ruins").unwrap();
        TradeSlot::reward(
            RewardCost::new(ItemId::parse("currency:silver").unwrap(), 1).unwrap(),
            RewardPayload::new(category, Position::new(10, 64, -20)),
            max_uses,
        )
    }

    #[test]
    fn names_are_title_cased() {
        assert_eq!(display_name("ancient_city"), "Ancient City");
        assert_eq!(display_name("village/plains"), "Plains");
        assert_eq!(display_name("ruins"), "Ruins");
        let payload = RewardPayload::new(
            CategoryId::parse("zone:trail_ruins").unwrap(),
            Position::default(),
        );
        assert_eq!(payload.display_name, "Trail Ruins Map");
    }

    #[test]
    fn color_is_stable_and_24_bit() {
        let id = CategoryId::parse("zone:ruins").unwrap();
        assert_eq!(category_color(&id), category_color(&id));
        assert!(category_color(&id) <= 0x00ff_ffff);
    }

    #[test]
    fn last_use_exhausts_slot() {
        let mut slot = ruins_slot(2);
        assert_eq!(slot.state(), SlotState::Active);
        assert_eq!(slot.use_once().unwrap(), SlotUse::Remaining(1));
        assert_eq!(slot.use_once().unwrap(), SlotUse::Exhausted);
        assert!(slot.disabled);
        assert_eq!(slot.state(), SlotState::Exhausted);
        assert_eq!(slot.use_once(), Err(TradeError::SlotDisabled(slot.id)));
        assert_eq!(slot.uses_remaining, 0);
    }

    #[test]
    fn placeholders_cannot_be_used() {
        let mut slot = TradeSlot::placeholder(SEARCHING_LABEL);
        assert!(slot.is_placeholder());
        assert_eq!(slot.state(), SlotState::Pending);
        assert!(slot.use_once().is_err());
    }

    #[test]
    fn zero_max_uses_is_clamped() {
        let slot = ruins_slot(0);
        assert_eq!(slot.max_uses, 1);
        assert_eq!(slot.uses_remaining, 1);
    }
}
