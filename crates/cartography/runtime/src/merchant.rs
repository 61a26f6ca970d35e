//! Merchants as seen by the orchestrator.

use crate::trade_book::TradeBook;
use cartography_config::Tunables;
use cartography_types::{MerchantId, MerchantKind, MerchantState, Position, SessionId};
use std::collections::BTreeMap;

/// A trade entity hosting reward slots.
#[derive(Clone, Debug)]
pub struct Merchant {
    id: MerchantId,
    kind: MerchantKind,
    position: Position,
    pub(crate) book: TradeBook,
    pub(crate) state: MerchantState,
    session: Option<SessionId>,
}

impl Merchant {
    /// A freshly spawned merchant with no trades.
    pub fn new(kind: MerchantKind, position: Position) -> Self {
        Self::restore(
            MerchantId::generate(),
            kind,
            position,
            MerchantState::new(),
            TradeBook::new(),
        )
    }

    /// Rebuild a merchant from saved parts.
    pub fn restore(
        id: MerchantId,
        kind: MerchantKind,
        position: Position,
        state: MerchantState,
        book: TradeBook,
    ) -> Self {
        Self {
            id,
            kind,
            position,
            book,
            state,
            session: None,
        }
    }

    pub fn id(&self) -> MerchantId {
        self.id
    }

    pub fn kind(&self) -> MerchantKind {
        self.kind
    }

    /// Change kind, e.g. on tier-up. Call `request_fill` afterwards.
    pub fn set_kind(&mut self, kind: MerchantKind) {
        self.kind = kind;
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub fn book(&self) -> &TradeBook {
        &self.book
    }

    pub fn state(&self) -> &MerchantState {
        &self.state
    }

    /// Active customer session, if someone has the trade screen open.
    pub fn session(&self) -> Option<SessionId> {
        self.session
    }

    /// A customer opened the trade screen.
    pub fn open_session(&mut self) -> SessionId {
        let session = SessionId::generate();
        self.session = Some(session);
        session
    }

    pub fn close_session(&mut self) {
        self.session = None;
    }

    /// How many rewards a fill should search for right now.
    ///
    /// Tiered merchants hold the sum of all reward counts up to their tier;
    /// reaching a tier not yet generated always grants at least that tier's
    /// count. Wandering merchants get one batch, once.
    pub fn rewards_needed(&self, tunables: &Tunables) -> u32 {
        let current = u32::try_from(self.book.reward_count()).unwrap_or(u32::MAX);
        let last = self.state.last_tier_generated();

        match self.kind {
            MerchantKind::Wandering => {
                if last == 0 && current == 0 {
                    tunables.wandering.reward_count
                } else {
                    0
                }
            }
            MerchantKind::Tiered(tier) => {
                let required: u32 = tier.up_to().map(|t| tunables.tier(t).reward_count).sum();
                let needed = required.saturating_sub(current);
                if tier.level() > last {
                    needed.max(tunables.tier(tier).reward_count)
                } else {
                    needed
                }
            }
        }
    }
}

/// Host-side lookup of merchants, used on the simulation thread.
pub trait MerchantAccess {
    fn merchant_mut(&mut self, id: &MerchantId) -> Option<&mut Merchant>;

    /// Ids of every live merchant.
    fn merchant_ids(&self) -> Vec<MerchantId>;
}

/// Simple owned merchant collection.
#[derive(Debug, Default)]
pub struct MerchantDirectory {
    merchants: BTreeMap<MerchantId, Merchant>,
}

impl MerchantDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, merchant: Merchant) -> MerchantId {
        let id = merchant.id();
        self.merchants.insert(id, merchant);
        id
    }

    /// Despawn a merchant. Its outstanding search will be discarded.
    pub fn remove(&mut self, id: &MerchantId) -> Option<Merchant> {
        self.merchants.remove(id)
    }

    pub fn get(&self, id: &MerchantId) -> Option<&Merchant> {
        self.merchants.get(id)
    }

    pub fn get_mut(&mut self, id: &MerchantId) -> Option<&mut Merchant> {
        self.merchants.get_mut(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Merchant> {
        self.merchants.values()
    }

    pub fn len(&self) -> usize {
        self.merchants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.merchants.is_empty()
    }
}

impl MerchantAccess for MerchantDirectory {
    fn merchant_mut(&mut self, id: &MerchantId) -> Option<&mut Merchant> {
        self.merchants.get_mut(id)
    }

    fn merchant_ids(&self) -> Vec<MerchantId> {
        self.merchants.keys().copied().collect()
    }
}
