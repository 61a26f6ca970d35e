//! Cartography simulation daemon
//!
//! Spawns merchants in a synthetic world, lets customers trade with them and
//! prints a JSON summary of the rewards that were searched for, applied,
//! restocked and persisted.

use anyhow::Context;
use cartography_config::{ConfigSource, ConfigStore};
use cartography_runtime::Orchestrator;
use cartography_search::SearchBudgeter;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod simulation;
mod world;

use simulation::{Simulation, SimulationSettings};
use world::{GridWorld, WorldSettings};

/// Cartography simulation CLI
#[derive(Parser)]
#[command(name = "cartographd")]
#[command(about = "Cartography - discovery reward simulation", long_about = None)]
#[command(version)]
struct Cli {
    /// Reward config file; generated with defaults if missing
    #[arg(short, long, env = "CARTOGRAPHY_CONFIG", default_value = "config/cartography.cfg")]
    config: PathBuf,

    /// Number of tiered merchants
    #[arg(long, default_value_t = 8)]
    merchants: usize,

    /// Number of wandering merchants
    #[arg(long, default_value_t = 2)]
    wandering: usize,

    /// Simulation ticks to run
    #[arg(long, default_value_t = 200)]
    ticks: u64,

    /// Milliseconds between ticks
    #[arg(long, default_value_t = 5)]
    tick_ms: u64,

    /// Chance per merchant per tick that a customer trades
    #[arg(long, default_value_t = 0.1)]
    trade_chance: f64,

    /// Chance per tick that a merchant tiers up
    #[arg(long, default_value_t = 0.05)]
    tier_up_chance: f64,

    /// Chance per tick that a merchant despawns
    #[arg(long, default_value_t = 0.01)]
    despawn_chance: f64,

    /// Players carrying unidentified maps
    #[arg(long, default_value_t = 3)]
    holders: usize,

    /// Unidentified maps each player starts with
    #[arg(long, default_value_t = 2)]
    maps_per_holder: u32,

    /// Chance per tick that a player deciphers a map
    #[arg(long, default_value_t = 0.05)]
    decipher_chance: f64,

    /// Reload the config file at this tick
    #[arg(long)]
    reload_at: Option<u64>,

    /// Artificial delay per spatial probe, in milliseconds
    #[arg(long, default_value_t = 2)]
    probe_ms: u64,

    /// Make every n-th probe fail (0 = never)
    #[arg(long, default_value_t = 0)]
    fail_every: u64,

    /// Seed for world generation, merchant behavior and candidate order
    #[arg(long, env = "CARTOGRAPHY_SEED")]
    seed: Option<u64>,

    /// Write the summary here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log level
    #[arg(long, env = "CARTOGRAPHY_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "CARTOGRAPHY_LOG_JSON")]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the summary.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli.log_level.clone().into());

    if cli.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let world = Arc::new(GridWorld::generate(
        WorldSettings {
            probe_delay: Duration::from_millis(cli.probe_ms),
            fail_every: cli.fail_every,
            ..Default::default()
        },
        &mut rng,
    )?);

    let store = ConfigStore::load_or_default(
        ConfigSource::File(cli.config.clone()),
        world.clone(),
        world.clone(),
    );
    let snapshot = store.snapshot();
    tracing::info!(
        config = %cli.config.display(),
        eligible = snapshot.catalog.len(),
        sample_size = snapshot.tunables.search.sample_size,
        workers = snapshot.tunables.search.worker_threads,
        "Configuration ready"
    );

    let mut budgeter = SearchBudgeter::new(world.clone()).with_strategy(snapshot.tunables.search.strategy);
    if let Some(seed) = cli.seed {
        budgeter = budgeter.with_seed(seed);
    }
    let orchestrator =
        Orchestrator::with_budgeter(store.handle(), budgeter).context("starting orchestrator")?;

    let settings = SimulationSettings {
        tiered_merchants: cli.merchants,
        wandering_merchants: cli.wandering,
        ticks: cli.ticks,
        tick_interval: Duration::from_millis(cli.tick_ms),
        trade_chance: cli.trade_chance.clamp(0.0, 1.0),
        tier_up_chance: cli.tier_up_chance.clamp(0.0, 1.0),
        despawn_chance: cli.despawn_chance.clamp(0.0, 1.0),
        holders: cli.holders,
        maps_per_holder: cli.maps_per_holder,
        decipher_chance: cli.decipher_chance.clamp(0.0, 1.0),
        reload_at: cli.reload_at,
        ..Default::default()
    };

    let summary = Simulation::new(settings, &world, &store, orchestrator, rng).run()?;
    tracing::info!(
        applied = summary.jobs_applied,
        discarded = summary.jobs_discarded,
        rewards = summary.rewards_added,
        deciphered = summary.maps_deciphered,
        probes = summary.probes,
        "Simulation finished"
    );

    let json = serde_json::to_string_pretty(&summary)?;
    match cli.output {
        Some(path) => std::fs::write(&path, json)
            .with_context(|| format!("writing summary to {}", path.display()))?,
        None => println!("{}", json),
    }
    Ok(())
}
