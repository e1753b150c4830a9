//! Derby Engine - Headless Entry Point
//!
//! Plays a betting session without a UI: every race backs the favorite
//! with a fixed fraction of the available balance and narrates the race
//! through the console observer. Stops at game over, after `max_races`,
//! or on SIGINT (the race in progress is fast-forwarded and settled).
//!
//! Wiring sequence:
//! 1. Load derby.toml (or the path given as first argument) + validate
//! 2. Init tracing (plain or JSON structured logging)
//! 3. Seed the RNG (fixed seed for reproducible sessions)
//! 4. Spawn the SIGINT listener on a broadcast shutdown channel
//! 5. Create Session + RaceDriver(ConsoleObserver)
//! 6. Bet → drive → settle → next race, until a stop condition

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rust_decimal::{Decimal, RoundingStrategy};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use derby_engine::adapters::ConsoleObserver;
use derby_engine::config::loader::{load_config, validate_config};
use derby_engine::config::{AppConfig, EngineConfig, StrategyConfig};
use derby_engine::domain::bet::{BetRequest, BetType};
use derby_engine::domain::error::SessionError;
use derby_engine::usecases::race_driver::RaceDriver;
use derby_engine::usecases::session::Session;

/// Config file used when no path is given.
const DEFAULT_CONFIG_PATH: &str = "derby.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration ───────────────────────────────
    let config = match std::env::args().nth(1) {
        Some(path) => load_config(&path).context("Failed to load configuration")?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            load_config(DEFAULT_CONFIG_PATH).context("Failed to load configuration")?
        }
        None => {
            let config = AppConfig::default();
            validate_config(&config)?;
            config
        }
    };

    // ── 2. Initialize logging ───────────────────────────────
    init_tracing(&config.engine);

    info!(
        name = %config.engine.name,
        version = env!("CARGO_PKG_VERSION"),
        seed = ?config.engine.seed,
        max_races = config.engine.max_races,
        starting_balance = %config.session.starting_balance,
        "Starting derby engine"
    );

    // ── 3. Seed the RNG ─────────────────────────────────────
    let mut rng = match config.engine.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    // ── 4. Shutdown signal ──────────────────────────────────
    let (shutdown_tx, driver_shutdown) = broadcast::channel::<()>(1);
    let mut loop_shutdown = shutdown_tx.subscribe();
    let signal_handle = tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("SIGINT received, finishing current race");
            let _ = shutdown_tx.send(());
        }
    });

    // ── 5. Session and driver ───────────────────────────────
    let mut session = Session::new(&config);
    session.new_race(&mut rng)?;

    let observer = Arc::new(ConsoleObserver::new());
    let mut driver = RaceDriver::new(observer).with_shutdown(driver_shutdown);

    // ── 6. Race loop ────────────────────────────────────────
    for _ in 0..config.engine.max_races {
        place_strategy_bets(&mut session, &config.strategy)?;

        let result = driver.run_race(&mut session, &mut rng).await?;
        debug!(settlement = %serde_json::to_string(&result)?, "Settlement");

        if loop_shutdown.try_recv().is_ok() {
            info!("Shutdown requested, leaving the track");
            break;
        }
        if session.is_low_balance() && !session.is_game_over() {
            warn!(balance = %session.balance(), "Running low on funds");
        }

        match session.next_race(&mut rng) {
            Ok(card) => info!(race = %card.title(), "Next race"),
            Err(SessionError::GameOver { balance }) => {
                warn!(%balance, "Game over, out of money");
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    let bankroll = session.bankroll();
    info!(
        races_run = bankroll.races_run,
        balance = %bankroll.balance,
        total_won = %bankroll.total_won,
        total_lost = %bankroll.total_lost,
        lifetime_net = %bankroll.lifetime_net(),
        "Session complete"
    );

    signal_handle.abort();
    Ok(())
}

/// Install the tracing subscriber; `RUST_LOG` overrides the configured level.
fn init_tracing(engine: &EngineConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&engine.log_level));

    if engine.json_logs {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Back the favorite to win, plus the favorite → second favorite exacta
/// when enabled and affordable.
fn place_strategy_bets(session: &mut Session, strategy: &StrategyConfig) -> Result<()> {
    let favorites: Vec<_> = session.field().iter().take(2).map(|h| h.id).collect();
    let Some(&favorite) = favorites.first() else {
        anyhow::bail!("race card has no runners");
    };

    let available = session.available_stake();
    let stake = (available * strategy.stake_fraction)
        .round_dp_with_strategy(2, RoundingStrategy::ToZero)
        .max(Decimal::ONE)
        .min(available);

    session.place_bet(&BetRequest::single(BetType::Win, favorite, stake))?;

    if strategy.exacta {
        if let Some(&second) = favorites.get(1) {
            if session.available_stake() >= stake {
                session.place_bet(&BetRequest::exacta(favorite, second, stake))?;
            }
        }
    }

    debug!(
        bets = session.bets().len(),
        wagered = %session.total_wagered(),
        "Strategy bets placed"
    );
    Ok(())
}
