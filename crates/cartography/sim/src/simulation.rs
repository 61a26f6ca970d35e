//! Tick loop driving merchants, customers and config reloads.

use crate::world::GridWorld;
use cartography_config::ConfigStore;
use cartography_runtime::{
    save_merchant, Deciphered, FillRequest, HolderLedger, Merchant, MerchantDirectory, Orchestrator,
    RefreshLog, TickReport,
};
use cartography_types::{HolderId, MerchantId, MerchantKind, Position, SlotState, Tier, MAX_TIER};
use rand::seq::SliceRandom;
use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use rand::Rng;
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;

/// Knobs for one simulation run.
#[derive(Debug, Clone)]
pub struct SimulationSettings {
    pub tiered_merchants: usize,
    pub wandering_merchants: usize,
    pub ticks: u64,
    pub tick_interval: Duration,
    /// Chance per merchant per tick that a customer trades
    pub trade_chance: f64,
    /// Chance per tick that one tiered merchant levels up
    pub tier_up_chance: f64,
    /// Chance per tick that one merchant despawns
    pub despawn_chance: f64,
    pub holders: usize,
    pub maps_per_holder: u32,
    /// Chance per tick that one holder deciphers a map
    pub decipher_chance: f64,
    /// Reload the config store at this tick
    pub reload_at: Option<u64>,
    /// Time allowed for outstanding searches after the last tick
    pub drain_timeout: Duration,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            tiered_merchants: 8,
            wandering_merchants: 2,
            ticks: 200,
            tick_interval: Duration::from_millis(5),
            trade_chance: 0.1,
            tier_up_chance: 0.05,
            despawn_chance: 0.01,
            holders: 3,
            maps_per_holder: 2,
            decipher_chance: 0.05,
            reload_at: None,
            drain_timeout: Duration::from_secs(10),
        }
    }
}

/// Run totals, printed as JSON at the end.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Summary {
    pub ticks: u64,
    pub merchants_alive: usize,
    pub merchants_despawned: usize,
    pub fills_submitted: usize,
    pub fills_busy: usize,
    pub trades: usize,
    pub slots_exhausted: usize,
    pub jobs_applied: usize,
    pub jobs_discarded: usize,
    pub rewards_added: usize,
    pub restocks_started: usize,
    pub stale_refreshes: usize,
    pub ui_refreshes: usize,
    pub deciphers_submitted: usize,
    pub maps_deciphered: usize,
    pub maps_crumbled: usize,
    pub offered_total: usize,
    pub probes: u64,
    pub config_generation: u64,
    /// Save records keyed by merchant id
    pub saves: Map<String, Value>,
}

impl Summary {
    fn absorb(&mut self, report: TickReport) {
        self.jobs_applied += report.applied.len();
        self.jobs_discarded += report.discarded.len();
        self.rewards_added += report.rewards_added;
        self.restocks_started += report.restocks_started.len();
        self.stale_refreshes += report.stale_refreshes;
        self.maps_deciphered += report.maps_deciphered;
    }
}

pub struct Simulation<'a> {
    settings: SimulationSettings,
    world: &'a GridWorld,
    store: &'a ConfigStore,
    orchestrator: Orchestrator,
    merchants: MerchantDirectory,
    ui: RefreshLog,
    holders: Vec<HolderId>,
    inventories: HolderLedger,
    rng: StdRng,
    summary: Summary,
}

impl<'a> Simulation<'a> {
    pub fn new(
        settings: SimulationSettings,
        world: &'a GridWorld,
        store: &'a ConfigStore,
        orchestrator: Orchestrator,
        rng: StdRng,
    ) -> Self {
        Self {
            settings,
            world,
            store,
            orchestrator,
            merchants: MerchantDirectory::new(),
            ui: RefreshLog::new(),
            holders: Vec::new(),
            inventories: HolderLedger::new(),
            rng,
            summary: Summary::default(),
        }
    }

    fn spawn(&mut self, kind: MerchantKind) -> anyhow::Result<()> {
        let position = Position::new(
            self.rng.gen_range(-3000..=3000),
            64,
            self.rng.gen_range(-3000..=3000),
        );
        let id = self.merchants.insert(Merchant::new(kind, position));
        tracing::debug!(merchant_id = %id, kind = ?kind, "Merchant spawned");
        self.fill(id)
    }

    fn fill(&mut self, id: MerchantId) -> anyhow::Result<()> {
        let Some(merchant) = self.merchants.get_mut(&id) else {
            return Ok(());
        };
        match self.orchestrator.request_fill(merchant)? {
            FillRequest::Submitted { .. } => self.summary.fills_submitted += 1,
            FillRequest::Busy => self.summary.fills_busy += 1,
            FillRequest::NothingNeeded => {}
        }
        Ok(())
    }

    fn random_merchant(&mut self) -> Option<MerchantId> {
        self.merchants.iter().map(Merchant::id).choose(&mut self.rng)
    }

    fn customers(&mut self) -> anyhow::Result<()> {
        let ids: Vec<MerchantId> = self.merchants.iter().map(Merchant::id).collect();
        for id in ids {
            if !self.rng.gen_bool(self.settings.trade_chance) {
                continue;
            }
            let Some(merchant) = self.merchants.get_mut(&id) else {
                continue;
            };

            // Customers sometimes walk away mid-search.
            if merchant.session().is_some() && self.rng.gen_bool(0.5) {
                merchant.close_session();
                continue;
            }
            if merchant.session().is_none() {
                merchant.open_session();
            }

            let Some(slot) = merchant
                .book()
                .slots()
                .iter()
                .filter(|s| s.state() == SlotState::Active)
                .map(|s| s.id)
                .choose(&mut self.rng)
            else {
                continue;
            };

            match self.orchestrator.record_use(merchant, slot) {
                Ok(used) => {
                    self.summary.trades += 1;
                    if used == cartography_types::SlotUse::Exhausted {
                        self.summary.slots_exhausted += 1;
                    }
                }
                Err(err) => tracing::warn!(merchant_id = %id, error = %err, "Trade failed"),
            }
        }
        Ok(())
    }

    fn tier_up(&mut self) -> anyhow::Result<()> {
        let candidate = self
            .merchants
            .iter()
            .filter(|m| matches!(m.kind(), MerchantKind::Tiered(t) if t.level() < MAX_TIER))
            .map(Merchant::id)
            .choose(&mut self.rng);
        let Some(id) = candidate else {
            return Ok(());
        };
        if let Some(merchant) = self.merchants.get_mut(&id) {
            let next = Tier::new(merchant.kind().tier().level() + 1);
            merchant.set_kind(MerchantKind::Tiered(next));
            tracing::info!(merchant_id = %id, tier = %next, "Merchant tiered up");
        }
        self.fill(id)
    }

    fn decipher(&mut self) -> anyhow::Result<()> {
        let Some(holder) = self.holders.choose(&mut self.rng).copied() else {
            return Ok(());
        };
        let origin = Position::new(
            self.rng.gen_range(-3000..=3000),
            64,
            self.rng.gen_range(-3000..=3000),
        );
        if self
            .orchestrator
            .decipher(holder, origin, &mut self.inventories)?
            .is_some()
        {
            self.summary.deciphers_submitted += 1;
        }
        Ok(())
    }

    /// Run every tick, drain outstanding work and build the summary.
    pub fn run(mut self) -> anyhow::Result<Summary> {
        for _ in 0..self.settings.tiered_merchants {
            self.spawn(MerchantKind::Tiered(Tier::NOVICE))?;
        }
        for _ in 0..self.settings.wandering_merchants {
            self.spawn(MerchantKind::Wandering)?;
        }
        for _ in 0..self.settings.holders {
            let holder = HolderId::generate();
            self.inventories.stock(holder, self.settings.maps_per_holder);
            self.holders.push(holder);
        }

        for tick in 0..self.settings.ticks {
            self.customers()?;

            if self.rng.gen_bool(self.settings.tier_up_chance) {
                self.tier_up()?;
            }
            if self.rng.gen_bool(self.settings.despawn_chance) {
                if let Some(id) = self.random_merchant() {
                    self.merchants.remove(&id);
                    self.summary.merchants_despawned += 1;
                    tracing::info!(merchant_id = %id, "Merchant despawned");
                }
            }
            if self.rng.gen_bool(self.settings.decipher_chance) {
                self.decipher()?;
            }
            if self.settings.reload_at == Some(tick) {
                if let Err(err) = self.store.reload() {
                    tracing::warn!(error = %err, "Reload failed");
                }
            }

            let report = self
                .orchestrator
                .tick(&mut self.merchants, &mut self.ui, &mut self.inventories);
            self.summary.absorb(report);
            std::thread::sleep(self.settings.tick_interval);
        }

        let report = self.orchestrator.tick_until_idle(
            &mut self.merchants,
            &mut self.ui,
            &mut self.inventories,
            self.settings.drain_timeout,
        );
        self.summary.absorb(report);
        self.orchestrator.shutdown(Duration::from_secs(1));

        let mut summary = self.summary;
        summary.ticks = self.settings.ticks;
        summary.merchants_alive = self.merchants.len();
        summary.ui_refreshes = self.ui.refreshes.len();
        summary.maps_crumbled = self
            .inventories
            .delivered
            .iter()
            .filter(|(_, result)| *result == Deciphered::Crumbled)
            .count();
        summary.probes = self.world.probes();
        summary.config_generation = self.store.handle().generation();
        for merchant in self.merchants.iter() {
            summary.offered_total += merchant.state().offered_categories().len();
            let mut record = Map::new();
            save_merchant(merchant, &mut record)?;
            summary.saves.insert(merchant.id().to_string(), Value::Object(record));
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::WorldSettings;
    use cartography_config::ConfigSource;
    use rand::SeedableRng;
    use std::sync::Arc;

    #[test]
    fn short_run_hands_out_distinct_rewards() {
        let mut rng = StdRng::seed_from_u64(42);
        let world = Arc::new(
            GridWorld::generate(
                WorldSettings {
                    probe_delay: Duration::ZERO,
                    fail_every: 7,
                    ..Default::default()
                },
                &mut rng,
            )
            .unwrap(),
        );
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::load(
            ConfigSource::File(dir.path().join("rewards.cfg")),
            world.clone(),
            world.clone(),
        )
        .unwrap();
        let orchestrator = Orchestrator::new(store.handle(), world.clone()).unwrap();

        let settings = SimulationSettings {
            tiered_merchants: 3,
            wandering_merchants: 1,
            ticks: 30,
            tick_interval: Duration::from_millis(1),
            trade_chance: 0.5,
            tier_up_chance: 0.3,
            despawn_chance: 0.0,
            holders: 2,
            maps_per_holder: 1,
            decipher_chance: 1.0,
            reload_at: Some(10),
            ..Default::default()
        };
        let summary = Simulation::new(settings, &world, &store, orchestrator, rng)
            .run()
            .unwrap();

        assert_eq!(summary.merchants_alive, 4);
        assert_eq!(summary.config_generation, 2);
        assert!(summary.fills_submitted >= 4);
        assert_eq!(summary.saves.len(), 4);
        assert_eq!(summary.deciphers_submitted, 2);
        assert_eq!(summary.maps_deciphered + summary.maps_crumbled, 2);
        for save in summary.saves.values() {
            let offered = save["cartography"]["offered_categories"].as_array().unwrap();
            let mut unique: Vec<_> = offered.iter().map(|v| v.as_str().unwrap()).collect();
            unique.sort();
            unique.dedup();
            assert_eq!(unique.len(), offered.len());
        }
    }
}
