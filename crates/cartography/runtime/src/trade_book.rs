//! A merchant's ordered trade list.

use cartography_types::{SlotId, SlotState, SlotUse, TradeError, TradeResult, TradeSlot};
use cartography_types::slot::RESTOCKING_LABEL;
use serde::{Deserialize, Serialize};

/// Ordered list of trade slots as the customer sees it.
///
/// Positions matter: a restock swaps its placeholder in where the exhausted
/// slot was.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeBook {
    slots: Vec<TradeSlot>,
}

impl TradeBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_slots(slots: Vec<TradeSlot>) -> Self {
        Self { slots }
    }

    pub fn slots(&self) -> &[TradeSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, id: SlotId) -> Option<&TradeSlot> {
        self.slots.iter().find(|s| s.id == id)
    }

    fn position(&self, id: SlotId) -> Option<usize> {
        self.slots.iter().position(|s| s.id == id)
    }

    /// Slots that carry a reward (active or exhausted).
    pub fn reward_count(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_placeholder()).count()
    }

    /// First exhausted reward slot, if any.
    pub fn first_exhausted(&self) -> Option<SlotId> {
        self.slots
            .iter()
            .find(|s| s.state() == SlotState::Exhausted)
            .map(|s| s.id)
    }

    /// Whether `id` is a placeholder currently in the list.
    pub fn is_pending(&self, id: SlotId) -> bool {
        self.get(id).is_some_and(|s| s.state() == SlotState::Pending)
    }

    /// Append a slot.
    pub fn push(&mut self, slot: TradeSlot) -> SlotId {
        let id = slot.id;
        self.slots.push(slot);
        id
    }

    /// Append a disabled placeholder.
    pub fn push_placeholder(&mut self, label: &str) -> SlotId {
        self.push(TradeSlot::placeholder(label))
    }

    /// Consume one use of a slot.
    pub fn use_slot(&mut self, id: SlotId) -> TradeResult<SlotUse> {
        self.slots
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(TradeError::SlotNotFound(id))?
            .use_once()
    }

    /// Turn an exhausted slot into a restock placeholder in place.
    pub fn begin_restock(&mut self, id: SlotId) -> TradeResult<()> {
        let index = self.position(id).ok_or(TradeError::SlotNotFound(id))?;
        let slot = &mut self.slots[index];
        if slot.state() != SlotState::Exhausted {
            return Err(TradeError::InvalidTransition {
                slot: id,
                operation: "begin_restock",
                reason: format!("slot is {:?}", slot.state()),
            });
        }
        let mut placeholder = TradeSlot::placeholder(RESTOCKING_LABEL);
        placeholder.id = id;
        *slot = placeholder;
        Ok(())
    }

    /// Replace a placeholder with `rewards`.
    ///
    /// The first reward takes the placeholder's position and id; the rest
    /// follow it. With no rewards the placeholder is removed. Returns `false`
    /// if `id` is not a pending placeholder.
    pub fn resolve(&mut self, id: SlotId, rewards: Vec<TradeSlot>) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        if self.slots[index].state() != SlotState::Pending {
            return false;
        }

        let mut rewards = rewards.into_iter();
        match rewards.next() {
            Some(mut first) => {
                first.id = id;
                self.slots[index] = first;
                let rest: Vec<_> = rewards.collect();
                let tail = self.slots.split_off(index + 1);
                self.slots.extend(rest);
                self.slots.extend(tail);
            }
            None => {
                self.slots.remove(index);
            }
        }
        true
    }

    /// Remove a slot. Returns the removed slot, if present.
    pub fn remove(&mut self, id: SlotId) -> Option<TradeSlot> {
        let index = self.position(id)?;
        Some(self.slots.remove(index))
    }

    /// Reward slots only; placeholders are transient and never saved.
    pub fn persistent_slots(&self) -> Vec<TradeSlot> {
        self.slots
            .iter()
            .filter(|s| !s.is_placeholder())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartography_types::{CategoryId, ItemId, Position, RewardCost, RewardPayload};

    fn reward(category: &str, max_uses: u32) -> TradeSlot {
        TradeSlot::reward(
            RewardCost::new(ItemId::parse("currency:gold").unwrap(), 10).unwrap(),
            RewardPayload::new(CategoryId::parse(category).unwrap(), Position::new(0, 64, 0)),
            max_uses,
        )
    }

    #[test]
    fn restock_keeps_position_and_id() {
        let mut book = TradeBook::new();
        book.push(reward("zone:a", 1));
        let b = book.push(reward("zone:b", 1));
        book.push(reward("zone:c", 1));

        assert_eq!(book.use_slot(b).unwrap(), SlotUse::Exhausted);
        assert_eq!(book.first_exhausted(), Some(b));
        book.begin_restock(b).unwrap();
        assert!(book.is_pending(b));
        assert_eq!(book.slots()[1].label, RESTOCKING_LABEL);

        assert!(book.resolve(b, vec![reward("zone:d", 1)]));
        assert_eq!(book.slots()[1].id, b);
        assert_eq!(book.slots()[1].category().unwrap().as_str(), "zone:d");
        assert_eq!(book.slots()[1].state(), SlotState::Active);
    }

    #[test]
    fn resolve_without_rewards_removes_placeholder() {
        let mut book = TradeBook::new();
        book.push(reward("zone:a", 1));
        let p = book.push_placeholder("Searching...");
        assert_eq!(book.reward_count(), 1);

        assert!(book.resolve(p, Vec::new()));
        assert_eq!(book.len(), 1);
        assert!(!book.resolve(p, Vec::new()));
    }

    #[test]
    fn resolve_inserts_batch_in_order() {
        let mut book = TradeBook::new();
        let p = book.push_placeholder("Searching...");
        book.push(reward("zone:z", 1));

        book.resolve(p, vec![reward("zone:a", 1), reward("zone:b", 1)]);

        let categories: Vec<_> = book
            .slots()
            .iter()
            .map(|s| s.category().unwrap().as_str().to_string())
            .collect();
        assert_eq!(categories, vec!["zone:a", "zone:b", "zone:z"]);
    }

    #[test]
    fn restock_requires_exhausted_slot() {
        let mut book = TradeBook::new();
        let a = book.push(reward("zone:a", 2));
        assert!(matches!(
            book.begin_restock(a),
            Err(TradeError::InvalidTransition { .. })
        ));
        assert_eq!(book.use_slot(a).unwrap(), SlotUse::Remaining(1));
        assert!(matches!(
            book.use_slot(SlotId::generate()),
            Err(TradeError::SlotNotFound(_))
        ));
    }

    #[test]
    fn placeholders_are_not_persistent() {
        let mut book = TradeBook::new();
        book.push(reward("zone:a", 1));
        book.push_placeholder("Searching...");
        assert_eq!(book.persistent_slots().len(), 1);
    }
}
