//! Gameplay tunables.
//!
//! Every tunable has a compiled-in default; config lines only override.

use cartography_types::{MerchantKind, SearchRadius, SearchStrategy, Tier, MAX_TIER};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Search budget and worker pool settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchTunables {
    /// Maximum probes per search.
    pub sample_size: usize,

    /// Wall-time budget per search.
    pub time_budget: Duration,

    /// Size of the background worker pool.
    pub worker_threads: usize,

    /// How hits are chosen.
    pub strategy: SearchStrategy,
}

impl Default for SearchTunables {
    fn default() -> Self {
        Self {
            sample_size: 40,
            time_budget: Duration::from_millis(250),
            worker_threads: 4,
            strategy: SearchStrategy::FirstMatch,
        }
    }
}

/// Reward settings for one merchant tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTunables {
    /// Rewards a merchant gains on reaching the tier.
    pub reward_count: u32,

    /// Search radius for the tier.
    pub search_radius: SearchRadius,

    /// Uses per reward slot.
    pub max_uses: u32,
}

/// Settings for wandering merchants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WanderingTunables {
    pub reward_count: u32,
    pub search_radius: SearchRadius,
}

impl Default for WanderingTunables {
    fn default() -> Self {
        Self {
            reward_count: 20,
            search_radius: SearchRadius(2500),
        }
    }
}

/// Settings for deciphering unidentified maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecipherTunables {
    /// Deciphering searches wider than any merchant.
    pub search_radius: SearchRadius,
}

impl Default for DecipherTunables {
    fn default() -> Self {
        Self {
            search_radius: SearchRadius(3000),
        }
    }
}

/// Complete tunable set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tunables {
    pub search: SearchTunables,
    pub wandering: WanderingTunables,
    pub tiers: [TierTunables; MAX_TIER as usize],
    pub decipher: DecipherTunables,
}

impl Default for Tunables {
    fn default() -> Self {
        let tier = |reward_count, radius| TierTunables {
            reward_count,
            search_radius: SearchRadius(radius),
            max_uses: 1,
        };
        Self {
            search: SearchTunables::default(),
            wandering: WanderingTunables::default(),
            tiers: [
                tier(5, 500),
                tier(5, 750),
                tier(5, 1000),
                tier(5, 1500),
                tier(3, 2500),
            ],
            decipher: DecipherTunables::default(),
        }
    }
}

/// Why a tunable line was not applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TunableError {
    UnknownKey,
    InvalidValue(String),
}

impl Tunables {
    /// Settings for a tier.
    pub fn tier(&self, tier: Tier) -> &TierTunables {
        &self.tiers[tier.level() as usize - 1]
    }

    /// Search radius for a merchant.
    pub fn radius_for(&self, kind: MerchantKind) -> SearchRadius {
        match kind {
            MerchantKind::Wandering => self.wandering.search_radius,
            MerchantKind::Tiered(tier) => self.tier(tier).search_radius,
        }
    }

    /// Uses granted to each reward slot of a merchant.
    pub fn max_uses_for(&self, kind: MerchantKind) -> u32 {
        match kind {
            MerchantKind::Wandering => 1,
            MerchantKind::Tiered(tier) => self.tier(tier).max_uses,
        }
    }

    /// Apply one `key = value` pair.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), TunableError> {
        match key {
            "search.sampleSize" => self.search.sample_size = parse_int(value)?,
            "search.timeBudgetMs" => {
                self.search.time_budget = Duration::from_millis(parse_int(value)?)
            }
            "search.workerThreads" => self.search.worker_threads = parse_int::<usize>(value)?.max(1),
            "search.strategy" => {
                self.search.strategy = SearchStrategy::from_config(value).ok_or_else(|| {
                    TunableError::InvalidValue(format!("unknown strategy '{}'", value))
                })?
            }
            "trader.mapCount" => self.wandering.reward_count = parse_int(value)?,
            "trader.searchRadius" => self.wandering.search_radius = SearchRadius(parse_int(value)?),
            "decipher.searchRadius" => self.decipher.search_radius = SearchRadius(parse_int(value)?),
            _ => return self.apply_tier_key(key, value),
        }
        Ok(())
    }

    /// `cartographer.levelN.<field>`
    fn apply_tier_key(&mut self, key: &str, value: &str) -> Result<(), TunableError> {
        let rest = key
            .strip_prefix("cartographer.level")
            .ok_or(TunableError::UnknownKey)?;
        let (level, field) = rest.split_once('.').ok_or(TunableError::UnknownKey)?;
        let level: u8 = level.parse().map_err(|_| TunableError::UnknownKey)?;
        if !(1..=MAX_TIER).contains(&level) {
            return Err(TunableError::UnknownKey);
        }
        let tier = &mut self.tiers[level as usize - 1];
        match field {
            "mapCount" => tier.reward_count = parse_int(value)?,
            "searchRadius" => tier.search_radius = SearchRadius(parse_int(value)?),
            "maxUses" => tier.max_uses = parse_int::<u32>(value)?.max(1),
            _ => return Err(TunableError::UnknownKey),
        }
        Ok(())
    }

    /// Render the tunables as config lines, in the order the generated file uses.
    pub fn to_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("search.sampleSize = {}", self.search.sample_size),
            format!("search.timeBudgetMs = {}", self.search.time_budget.as_millis()),
            format!("search.workerThreads = {}", self.search.worker_threads),
            format!(
                "search.strategy = {}",
                match self.search.strategy {
                    SearchStrategy::FirstMatch => "first",
                    SearchStrategy::NearestOfSample => "nearest",
                }
            ),
            String::new(),
            "# --- Wandering merchants ---".to_string(),
            format!("trader.mapCount = {}", self.wandering.reward_count),
            format!("trader.searchRadius = {}", self.wandering.search_radius.blocks()),
            String::new(),
            "# --- Tiered merchants (searchRadius in blocks) ---".to_string(),
        ];
        for (index, tier) in self.tiers.iter().enumerate() {
            let level = index + 1;
            lines.push(format!("cartographer.level{level}.mapCount = {}", tier.reward_count));
            lines.push(format!(
                "cartographer.level{level}.searchRadius = {}",
                tier.search_radius.blocks()
            ));
            lines.push(format!("cartographer.level{level}.maxUses = {}", tier.max_uses));
        }
        lines.push(String::new());
        lines.push("# --- Unidentified maps ---".to_string());
        lines.push(format!(
            "decipher.searchRadius = {}",
            self.decipher.search_radius.blocks()
        ));
        lines
    }
}

fn parse_int<T: std::str::FromStr>(value: &str) -> Result<T, TunableError> {
    value
        .trim()
        .parse()
        .map_err(|_| TunableError::InvalidValue(format!("'{}' is not a non-negative integer", value)))
}
