//! Race Simulator - Tick-Driven Race State Machine
//!
//! Phases: `Idle → Countdown → Running → Finished`.
//!
//! The simulator owns no clock. A driver (real-time or accelerated) calls
//! [`RaceSimulator::advance`] with the elapsed race time; every call draws
//! fresh randomness from the injected RNG, moves each unfinished horse, and
//! records finishers in crossing order. Once `duration + grace` has elapsed
//! any stragglers are force-finished by descending position, so a race
//! always terminates with a full finish order.

use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::RaceConfig;
use crate::domain::error::RaceError;
use crate::domain::horse::{Horse, HorseId, RaceProgress};

/// Speed share contributed by ability (the rest is the flat floor).
const ABILITY_SPEED_WEIGHT: f64 = 0.8;
/// Minimum base speed of any horse.
const BASE_SPEED_FLOOR: f64 = 0.2;
/// Lower bound of the per-tick random speed factor.
const RANDOM_FACTOR_MIN: f64 = 0.7;
/// Width of the per-tick random speed factor range.
const RANDOM_FACTOR_SPAN: f64 = 0.6;

/// Race lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RacePhase {
  /// No race under way.
  Idle,
  /// Pre-race countdown; `remaining` steps left.
  Countdown { remaining: u8 },
  /// Horses are running.
  Running,
  /// Finish order is final.
  Finished,
}

impl std::fmt::Display for RacePhase {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Idle => write!(f, "idle"),
      Self::Countdown { remaining } => write!(f, "countdown({remaining})"),
      Self::Running => write!(f, "running"),
      Self::Finished => write!(f, "finished"),
    }
  }
}

/// Per-horse state after a tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HorseTick {
  pub id: HorseId,
  pub position: f64,
  pub finished: bool,
  pub finish_time: Option<f64>,
}

/// Result of one simulation step.
#[derive(Debug, Clone, Serialize)]
pub struct TickSnapshot {
  /// Race time this tick was computed for.
  pub elapsed: f64,
  /// Every horse, in field order.
  pub horses: Vec<HorseTick>,
  /// Horses that crossed the line on this tick, in crossing order.
  pub newly_finished: Vec<HorseId>,
  /// Horses force-finished by the timeout on this tick.
  pub forced: Vec<HorseId>,
  /// Whether the race is over.
  pub complete: bool,
}

/// Race state machine and movement model.
#[derive(Debug, Clone)]
pub struct RaceSimulator {
  config: RaceConfig,
  phase: RacePhase,
  finish_order: Vec<HorseId>,
}

impl RaceSimulator {
  /// Create an idle simulator.
  pub fn new(config: &RaceConfig) -> Self {
    Self {
      config: config.clone(),
      phase: RacePhase::Idle,
      finish_order: Vec::new(),
    }
  }

  /// Current phase.
  pub fn phase(&self) -> RacePhase {
    self.phase
  }

  /// Whether a race is in countdown or running.
  pub fn is_active(&self) -> bool {
    matches!(self.phase, RacePhase::Countdown { .. } | RacePhase::Running)
  }

  /// Finish order so far (complete once `Finished`).
  pub fn finish_order(&self) -> &[HorseId] {
    &self.finish_order
  }

  /// Simulation parameters.
  pub fn config(&self) -> &RaceConfig {
    &self.config
  }

  /// Return to `Idle`, discarding the previous result.
  pub fn reset(&mut self) {
    self.phase = RacePhase::Idle;
    self.finish_order.clear();
  }

  /// Enter the pre-race countdown.
  ///
  /// # Errors
  /// `RaceError::AlreadyStarted` unless idle.
  pub fn begin_countdown(&mut self) -> Result<(), RaceError> {
    if self.phase != RacePhase::Idle {
      return Err(RaceError::AlreadyStarted(self.phase.to_string()));
    }
    self.phase = RacePhase::Countdown {
      remaining: self.config.countdown_steps,
    };
    Ok(())
  }

  /// Consume one countdown step.
  ///
  /// Returns the number to announce ("3", "2", "1"), or `None` once the
  /// countdown is exhausted (or not in countdown at all).
  pub fn countdown_step(&mut self) -> Option<u8> {
    match self.phase {
      RacePhase::Countdown { remaining } if remaining > 0 => {
        self.phase = RacePhase::Countdown {
          remaining: remaining - 1,
        };
        Some(remaining)
      }
      _ => None,
    }
  }

  /// Put every horse in the gate and start running.
  ///
  /// Allowed from `Idle` (countdown skipped) or `Countdown`.
  ///
  /// # Errors
  /// `RaceError::AlreadyStarted` when running or finished.
  pub fn start(&mut self, horses: &mut [Horse]) -> Result<(), RaceError> {
    if !matches!(self.phase, RacePhase::Idle | RacePhase::Countdown { .. }) {
      return Err(RaceError::AlreadyStarted(self.phase.to_string()));
    }

    for horse in horses.iter_mut() {
      horse.progress = RaceProgress::at_gate(self.config.start_offset);
    }
    self.finish_order.clear();
    self.phase = RacePhase::Running;

    info!(runners = horses.len(), "And they're off");
    Ok(())
  }

  /// Advance the race to `elapsed` seconds of race time.
  ///
  /// # Errors
  /// `RaceError::NotRunning` outside the `Running` phase.
  pub fn advance<R: Rng + ?Sized>(
    &mut self,
    horses: &mut [Horse],
    elapsed: f64,
    rng: &mut R,
  ) -> Result<TickSnapshot, RaceError> {
    if self.phase != RacePhase::Running {
      return Err(RaceError::NotRunning(self.phase.to_string()));
    }

    let track = self.config.track_length;
    let finish_line = track - self.config.finish_tolerance;
    let progress = (elapsed / self.config.duration_secs).clamp(0.0, 1.0);
    let mut newly_finished = Vec::new();

    for horse in horses.iter_mut().filter(|h| !h.progress.finished) {
      let base_speed = horse.ability / 100.0 * ABILITY_SPEED_WEIGHT + BASE_SPEED_FLOOR;
      let random_factor = RANDOM_FACTOR_MIN + rng.r#gen::<f64>() * RANDOM_FACTOR_SPAN;
      let speed = base_speed * random_factor;

      let target = track * progress * speed;
      horse.progress.position = (self.config.start_offset + target).min(track);

      if horse.progress.position >= finish_line {
        horse.progress.finished = true;
        horse.progress.finish_time = Some(elapsed);
        self.finish_order.push(horse.id);
        newly_finished.push(horse.id);
      }
    }

    let mut forced = Vec::new();
    if self.finish_order.len() < horses.len() && elapsed >= self.config.timeout_secs() {
      forced = self.force_finish(horses, elapsed);
    }

    let complete = self.finish_order.len() >= horses.len();
    if complete {
      self.phase = RacePhase::Finished;
      info!(
        elapsed,
        winner = self.finish_order.first().copied(),
        forced = forced.len(),
        "Race finished"
      );
    } else {
      debug!(elapsed, finished = self.finish_order.len(), "Race tick");
    }

    Ok(TickSnapshot {
      elapsed,
      horses: horses
        .iter()
        .map(|h| HorseTick {
          id: h.id,
          position: h.progress.position,
          finished: h.progress.finished,
          finish_time: h.progress.finish_time,
        })
        .collect(),
      newly_finished,
      forced,
      complete,
    })
  }

  /// Run a whole race synchronously with a fixed tick step.
  ///
  /// Starts the race first if it is idle or counting down. Returns the
  /// finish order.
  ///
  /// # Errors
  /// `RaceError::AlreadyStarted` if the simulator is already finished.
  pub fn run_to_completion<R: Rng + ?Sized>(
    &mut self,
    horses: &mut [Horse],
    rng: &mut R,
  ) -> Result<Vec<HorseId>, RaceError> {
    if self.phase != RacePhase::Running {
      self.start(horses)?;
    }

    let tick = self.config.tick_secs();
    let mut step: u64 = 0;
    loop {
      step += 1;
      // Multiplying avoids drift from repeated float addition.
      let elapsed = step as f64 * tick;
      if self.advance(horses, elapsed, rng)?.complete {
        break;
      }
    }

    Ok(self.finish_order.clone())
  }

  /// Mark every unfinished horse finished, farthest-along first.
  fn force_finish(&mut self, horses: &mut [Horse], elapsed: f64) -> Vec<HorseId> {
    let mut stragglers: Vec<&mut Horse> =
      horses.iter_mut().filter(|h| !h.progress.finished).collect();
    stragglers.sort_by(|a, b| b.progress.position.total_cmp(&a.progress.position));

    warn!(
      count = stragglers.len(),
      elapsed,
      "Race timeout, force-finishing stragglers"
    );

    let mut forced = Vec::with_capacity(stragglers.len());
    for horse in stragglers {
      horse.progress.finished = true;
      horse.progress.finish_time = Some(elapsed);
      self.finish_order.push(horse.id);
      forced.push(horse.id);
    }
    forced
  }
}
