//! Configuration Loader - File Loading and Validation
//!
//! Handles loading the TOML config, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tracing::info;

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    horses = config.field.horse_count,
    starting_balance = %config.session.starting_balance,
    min_odds = %config.odds.min_odds,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig = toml::from_str(content)
    .with_context(|| "Failed to parse config TOML")?;

  validate_config(&config)?;

  Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Positive bankroll and thresholds
/// - A non-empty, positive ability range
/// - A sane race geometry and timing
pub fn validate_config(config: &AppConfig) -> Result<()> {
  // Session validation
  anyhow::ensure!(
    config.session.starting_balance > Decimal::ZERO,
    "starting_balance must be positive, got {}",
    config.session.starting_balance
  );
  anyhow::ensure!(
    config.session.game_over_threshold >= Decimal::ZERO,
    "game_over_threshold must not be negative, got {}",
    config.session.game_over_threshold
  );
  anyhow::ensure!(
    config.session.starting_balance >= config.session.game_over_threshold,
    "starting_balance {} is already below game_over_threshold {}",
    config.session.starting_balance,
    config.session.game_over_threshold
  );

  // Field validation
  anyhow::ensure!(
    config.field.horse_count >= 2 && config.field.horse_count <= usize::from(u8::MAX),
    "horse_count must be in [2, 255], got {}",
    config.field.horse_count
  );
  anyhow::ensure!(
    config.field.ability_min > 0.0 && config.field.ability_min < config.field.ability_max,
    "ability range must satisfy 0 < min < max, got [{}, {})",
    config.field.ability_min,
    config.field.ability_max
  );
  anyhow::ensure!(
    config.field.max_draw_attempts > 0,
    "max_draw_attempts must be positive"
  );

  // Odds validation
  anyhow::ensure!(
    config.odds.min_odds > Decimal::ZERO,
    "min_odds must be positive, got {}",
    config.odds.min_odds
  );

  // Race validation
  let race = &config.race;
  anyhow::ensure!(
    race.duration_secs > 0.0,
    "race duration_secs must be positive, got {}",
    race.duration_secs
  );
  anyhow::ensure!(race.grace_secs >= 0.0, "race grace_secs must not be negative");
  anyhow::ensure!(race.tick_ms > 0, "race tick_ms must be positive");
  anyhow::ensure!(
    race.track_length > 0.0 && race.start_offset >= 0.0 && race.start_offset < race.track_length,
    "race geometry must satisfy 0 <= start_offset < track_length, got {} / {}",
    race.start_offset,
    race.track_length
  );
  anyhow::ensure!(
    race.finish_tolerance >= 0.0 && race.finish_tolerance < race.track_length,
    "finish_tolerance must be in [0, track_length)"
  );

  // Strategy validation
  anyhow::ensure!(
    config.strategy.stake_fraction > Decimal::ZERO
      && config.strategy.stake_fraction <= Decimal::ONE,
    "stake_fraction must be in (0, 1], got {}",
    config.strategy.stake_fraction
  );

  Ok(())
}
