//! Configuration Module - TOML-based Engine Configuration
//!
//! Loads and validates configuration from `derby.toml`. Every section and
//! field has a default, so an empty file (or no file at all) yields the
//! standard game: 6 horses, $100 bankroll, 1.5 odds floor, 5 s races
//! ticking every 50 ms.

pub mod loader;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  /// Process identity, logging and run limits.
  pub engine: EngineConfig,
  /// Bankroll thresholds.
  pub session: SessionConfig,
  /// Field generation parameters.
  pub field: FieldConfig,
  /// Odds engine parameters.
  pub odds: OddsConfig,
  /// Race simulation parameters.
  pub race: RaceConfig,
  /// Staking strategy used by the headless driver.
  pub strategy: StrategyConfig,
}

/// Engine identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
  /// Human-readable name.
  #[serde(default = "default_name")]
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// Emit JSON log lines instead of human-readable text.
  #[serde(default)]
  pub json_logs: bool,
  /// Fixed RNG seed for reproducible sessions. Random when absent.
  #[serde(default)]
  pub seed: Option<u64>,
  /// Stop the headless driver after this many races.
  #[serde(default = "default_max_races")]
  pub max_races: u32,
}

/// Bankroll configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
  /// Balance at session start and after a restart.
  #[serde(default = "default_starting_balance")]
  pub starting_balance: Decimal,
  /// Balance below which the session is over.
  #[serde(default = "default_game_over_threshold")]
  pub game_over_threshold: Decimal,
  /// Balance below which an early restart is offered.
  #[serde(default = "default_low_balance_threshold")]
  pub low_balance_threshold: Decimal,
}

/// Field generation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldConfig {
  /// Runners per race.
  #[serde(default = "default_horse_count")]
  pub horse_count: usize,
  /// Inclusive lower bound of the ability draw.
  #[serde(default = "default_ability_min")]
  pub ability_min: f64,
  /// Exclusive upper bound of the ability draw.
  #[serde(default = "default_ability_max")]
  pub ability_max: f64,
  /// Draw attempts per name/jockey before giving up.
  #[serde(default = "default_max_draw_attempts")]
  pub max_draw_attempts: u32,
}

/// Odds engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct OddsConfig {
  /// House floor on decimal odds.
  #[serde(default = "default_min_odds")]
  pub min_odds: Decimal,
}

/// Race simulation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RaceConfig {
  /// Nominal race duration (seconds of race time).
  #[serde(default = "default_duration_secs")]
  pub duration_secs: f64,
  /// Extra time after `duration_secs` before stragglers are force-finished.
  #[serde(default = "default_grace_secs")]
  pub grace_secs: f64,
  /// Tick period of the driver loop (milliseconds).
  #[serde(default = "default_tick_ms")]
  pub tick_ms: u64,
  /// Countdown steps before the off.
  #[serde(default = "default_countdown_steps")]
  pub countdown_steps: u8,
  /// Pause per countdown step (milliseconds).
  #[serde(default = "default_countdown_step_ms")]
  pub countdown_step_ms: u64,
  /// Distance from the rail origin to the finish line, in track units.
  #[serde(default = "default_track_length")]
  pub track_length: f64,
  /// Gate position, in track units.
  #[serde(default = "default_start_offset")]
  pub start_offset: f64,
  /// A horse within this distance of the line counts as finished.
  #[serde(default = "default_finish_tolerance")]
  pub finish_tolerance: f64,
}

/// Headless driver staking strategy.
#[derive(Debug, Clone, Deserialize)]
pub struct StrategyConfig {
  /// Fraction of available balance staked on the favorite to win.
  #[serde(default = "default_stake_fraction")]
  pub stake_fraction: Decimal,
  /// Also back favorite → second favorite exacta with the same stake.
  #[serde(default)]
  pub exacta: bool,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      name: default_name(),
      log_level: default_log_level(),
      json_logs: false,
      seed: None,
      max_races: default_max_races(),
    }
  }
}

impl Default for SessionConfig {
  fn default() -> Self {
    Self {
      starting_balance: default_starting_balance(),
      game_over_threshold: default_game_over_threshold(),
      low_balance_threshold: default_low_balance_threshold(),
    }
  }
}

impl Default for FieldConfig {
  fn default() -> Self {
    Self {
      horse_count: default_horse_count(),
      ability_min: default_ability_min(),
      ability_max: default_ability_max(),
      max_draw_attempts: default_max_draw_attempts(),
    }
  }
}

impl Default for OddsConfig {
  fn default() -> Self {
    Self {
      min_odds: default_min_odds(),
    }
  }
}

impl Default for RaceConfig {
  fn default() -> Self {
    Self {
      duration_secs: default_duration_secs(),
      grace_secs: default_grace_secs(),
      tick_ms: default_tick_ms(),
      countdown_steps: default_countdown_steps(),
      countdown_step_ms: default_countdown_step_ms(),
      track_length: default_track_length(),
      start_offset: default_start_offset(),
      finish_tolerance: default_finish_tolerance(),
    }
  }
}

impl Default for StrategyConfig {
  fn default() -> Self {
    Self {
      stake_fraction: default_stake_fraction(),
      exacta: false,
    }
  }
}

impl RaceConfig {
  /// Race time advanced by one tick, in seconds.
  pub fn tick_secs(&self) -> f64 {
    self.tick_ms as f64 / 1000.0
  }

  /// Hard timeout after which stragglers are force-finished.
  pub fn timeout_secs(&self) -> f64 {
    self.duration_secs + self.grace_secs
  }
}

// Default value functions for serde

fn default_name() -> String {
  "Derby Engine".to_string()
}

fn default_log_level() -> String {
  "info".to_string()
}

fn default_max_races() -> u32 {
  25
}

fn default_starting_balance() -> Decimal {
  dec!(100)
}

fn default_game_over_threshold() -> Decimal {
  dec!(1)
}

fn default_low_balance_threshold() -> Decimal {
  dec!(5)
}

fn default_horse_count() -> usize {
  6
}

fn default_ability_min() -> f64 {
  40.0
}

fn default_ability_max() -> f64 {
  100.0
}

fn default_max_draw_attempts() -> u32 {
  1_000
}

fn default_min_odds() -> Decimal {
  dec!(1.5)
}

fn default_duration_secs() -> f64 {
  5.0
}

fn default_grace_secs() -> f64 {
  2.0
}

fn default_tick_ms() -> u64 {
  50
}

fn default_countdown_steps() -> u8 {
  3
}

fn default_countdown_step_ms() -> u64 {
  1_000
}

fn default_track_length() -> f64 {
  1_000.0
}

fn default_start_offset() -> f64 {
  20.0
}

fn default_finish_tolerance() -> f64 {
  5.0
}

fn default_stake_fraction() -> Decimal {
  dec!(0.1)
}
