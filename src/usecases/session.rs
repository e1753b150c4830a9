//! Session Use Case - Game Loop Orchestration
//!
//! The session is the single owner of all mutable game state: bankroll,
//! bet ledger, current race card and race simulator. Every mutation goes
//! through `&mut Session`, so only the component currently driving the
//! race can touch horse progress or the balance.
//!
//! Flow per race:
//! 1. `new_race` draws a race card
//! 2. `place_bet` / `remove_bet` / `clear_bets` while the book is open
//! 3. `start_race` closes the book (at least one bet required)
//! 4. `countdown_step` ×N, then `begin_running`
//! 5. `advance_tick` until the snapshot reports completion
//! 6. `settle_race` pays out and updates statistics
//! 7. `next_race`, or `restart` once the balance is exhausted

use rand::Rng;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::config::{AppConfig, RaceConfig, SessionConfig};
use crate::domain::bankroll::{Bankroll, is_game_over};
use crate::domain::bet::{Bet, BetId, BetRequest};
use crate::domain::error::{BetRejection, RaceError, SessionError};
use crate::domain::horse::{Horse, HorseId, RaceCard};
use crate::domain::odds::OddsEngine;

use super::bet_ledger::{BetLedger, compute_payout};
use super::field_generator::FieldGenerator;
use super::race_simulator::{RacePhase, RaceSimulator, TickSnapshot};
use super::settlement::{SettlementEngine, SettlementResult};

/// Serializable view of the session for the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
  pub race_number: u32,
  pub card: Option<RaceCard>,
  pub balance: Decimal,
  pub races_run: u32,
  pub total_won: Decimal,
  pub total_lost: Decimal,
  pub bets: Vec<Bet>,
  pub total_wagered: Decimal,
  pub phase: RacePhase,
  pub last_finish_order: Vec<HorseId>,
  pub game_over: bool,
  pub low_balance: bool,
}

/// One player's betting session.
#[derive(Debug, Clone)]
pub struct Session {
  config: SessionConfig,
  generator: FieldGenerator,
  simulator: RaceSimulator,
  settlement: SettlementEngine,
  ledger: BetLedger,
  bankroll: Bankroll,
  race_number: u32,
  card: Option<RaceCard>,
  /// True from `start_race` until `settle_race`.
  racing: bool,
  last_finish_order: Vec<HorseId>,
  last_settlement: Option<SettlementResult>,
}

impl Session {
  /// Create a session with the configured starting balance and no race
  /// card yet.
  pub fn new(config: &AppConfig) -> Self {
    let odds = OddsEngine::new(config.odds.min_odds);
    Self::with_generator(config, FieldGenerator::new(&config.field, odds))
  }

  /// Create a session with a custom field generator (e.g. custom pools).
  pub fn with_generator(config: &AppConfig, generator: FieldGenerator) -> Self {
    Self {
      config: config.session.clone(),
      generator,
      simulator: RaceSimulator::new(&config.race),
      settlement: SettlementEngine::new(),
      ledger: BetLedger::new(),
      bankroll: Bankroll::new(config.session.starting_balance),
      race_number: 1,
      card: None,
      racing: false,
      last_finish_order: Vec::new(),
      last_settlement: None,
    }
  }

  // ── Race setup ──────────────────────────────────────────

  /// Draw a fresh race card for the current race number.
  ///
  /// Clears any pending bets and the previous result.
  ///
  /// # Errors
  /// `RaceInProgress` while racing, `GameOver` once the balance is below
  /// the threshold (only `restart` continues), or a `FieldError` from
  /// generation.
  #[instrument(skip(self, rng), fields(race = self.race_number))]
  pub fn new_race<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<&RaceCard, SessionError> {
    if self.racing {
      return Err(SessionError::RaceInProgress);
    }
    self.ensure_not_game_over()?;

    let card = self.generator.generate_card(self.race_number, rng)?;
    info!(title = %card.title(), distance = %card.distance, "Race card drawn");

    self.simulator.reset();
    self.ledger.clear_bets();
    self.last_finish_order.clear();
    self.last_settlement = None;

    Ok(&*self.card.insert(card))
  }

  /// Advance to the next race.
  ///
  /// # Errors
  /// `GameOver` when the balance is below the threshold; `RaceInProgress`
  /// if the current race has not been settled.
  pub fn next_race<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<&RaceCard, SessionError> {
    if self.racing {
      return Err(SessionError::RaceInProgress);
    }
    self.ensure_not_game_over()?;

    self.race_number += 1;
    self.new_race(rng)
  }

  /// Reset bankroll, counters and bets, and draw race 1.
  ///
  /// # Errors
  /// A `FieldError` from generation.
  pub fn restart<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<&RaceCard, SessionError> {
    info!(
      races_run = self.bankroll.races_run,
      total_won = %self.bankroll.total_won,
      total_lost = %self.bankroll.total_lost,
      "Restarting session"
    );

    self.bankroll = Bankroll::new(self.config.starting_balance);
    self.race_number = 1;
    self.racing = false;
    self.new_race(rng)
  }

  // ── Betting ─────────────────────────────────────────────

  /// Place a bet against the current field.
  ///
  /// # Errors
  /// `GameOver` once the balance is exhausted, `BettingClosed` from the
  /// start of the race until the next card is drawn, otherwise any ledger
  /// rejection.
  pub fn place_bet(&mut self, request: &BetRequest) -> Result<Bet, BetRejection> {
    if self.is_game_over() {
      return Err(BetRejection::GameOver);
    }
    if self.racing || self.simulator.phase() != RacePhase::Idle {
      return Err(BetRejection::BettingClosed);
    }
    let field = self.card.as_ref().map_or(&[][..], |c| c.horses.as_slice());
    self.ledger.place_bet(request, field, self.bankroll.balance)
  }

  /// Payout preview for a slip, without placing it.
  pub fn preview_payout(&self, request: &BetRequest) -> Decimal {
    let Some(horse_id) = request.horse_id else {
      return Decimal::ZERO;
    };
    compute_payout(
      self.field(),
      request.bet_type,
      horse_id,
      request.second_horse_id,
      request.amount,
    )
  }

  /// Remove one pending bet.
  ///
  /// # Errors
  /// `RaceInProgress` while racing.
  pub fn remove_bet(&mut self, id: BetId) -> Result<bool, SessionError> {
    if self.racing {
      return Err(SessionError::RaceInProgress);
    }
    Ok(self.ledger.remove_bet(id))
  }

  /// Remove all pending bets.
  ///
  /// # Errors
  /// `RaceInProgress` while racing.
  pub fn clear_bets(&mut self) -> Result<(), SessionError> {
    if self.racing {
      return Err(SessionError::RaceInProgress);
    }
    self.ledger.clear_bets();
    Ok(())
  }

  // ── Racing ──────────────────────────────────────────────

  /// Close the book and enter the countdown.
  ///
  /// # Errors
  /// `RaceInProgress` if already racing, `GameOver` once the balance is
  /// exhausted, `NoRaceCard` before the first `new_race`, `NoBets` with an
  /// empty ledger.
  pub fn start_race(&mut self) -> Result<(), SessionError> {
    if self.racing {
      return Err(SessionError::RaceInProgress);
    }
    self.ensure_not_game_over()?;
    if self.card.is_none() {
      return Err(SessionError::NoRaceCard);
    }
    if self.ledger.is_empty() {
      return Err(SessionError::NoBets);
    }

    self.simulator.begin_countdown()?;
    self.racing = true;

    info!(
      race = self.race_number,
      bets = self.ledger.len(),
      wagered = %self.ledger.total_wagered(),
      "Book closed, race starting"
    );
    Ok(())
  }

  /// Consume one countdown step; `None` once it is over.
  pub fn countdown_step(&mut self) -> Option<u8> {
    self.simulator.countdown_step()
  }

  /// Put the field in the gate and start the clock.
  ///
  /// # Errors
  /// `NoRaceInProgress` unless `start_race` was called.
  pub fn begin_running(&mut self) -> Result<(), SessionError> {
    if !self.racing {
      return Err(SessionError::NoRaceInProgress);
    }
    let card = self.card.as_mut().ok_or(SessionError::NoRaceCard)?;
    self.simulator.start(&mut card.horses)?;
    Ok(())
  }

  /// Advance the running race to `elapsed` seconds.
  ///
  /// # Errors
  /// `NoRaceCard`, or `RaceError::NotRunning` outside the running phase.
  pub fn advance_tick<R: Rng + ?Sized>(
    &mut self,
    elapsed: f64,
    rng: &mut R,
  ) -> Result<TickSnapshot, SessionError> {
    let card = self.card.as_mut().ok_or(SessionError::NoRaceCard)?;
    Ok(self.simulator.advance(&mut card.horses, elapsed, rng)?)
  }

  /// Settle the finished race and reopen the session for the next one.
  ///
  /// # Errors
  /// `NoRaceInProgress` if nothing is awaiting settlement,
  /// `RaceError::NotFinished` if the race is still running.
  pub fn settle_race(&mut self) -> Result<SettlementResult, SessionError> {
    if !self.racing {
      return Err(SessionError::NoRaceInProgress);
    }
    if self.simulator.phase() != RacePhase::Finished {
      return Err(RaceError::NotFinished(self.simulator.phase().to_string()).into());
    }

    let finish_order = self.simulator.finish_order().to_vec();
    let bets = self.ledger.take_bets();
    let result = self.settlement.settle(&finish_order, &bets, &mut self.bankroll);

    self.last_finish_order = finish_order;
    self.last_settlement = Some(result.clone());
    self.racing = false;

    if self.is_game_over() {
      warn!(balance = %self.bankroll.balance, "Balance exhausted");
    }

    Ok(result)
  }

  /// Run the whole race synchronously (countdown skipped) and settle it.
  ///
  /// # Errors
  /// Any error from `start_race` or the simulator.
  pub fn run_race<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<SettlementResult, SessionError> {
    self.start_race()?;
    while self.countdown_step().is_some() {}

    let card = self.card.as_mut().ok_or(SessionError::NoRaceCard)?;
    self.simulator.run_to_completion(&mut card.horses, rng)?;
    self.settle_race()
  }

  // ── Queries ─────────────────────────────────────────────

  /// Current race card, once drawn.
  pub fn card(&self) -> Option<&RaceCard> {
    self.card.as_ref()
  }

  /// Current field (empty before the first card).
  pub fn field(&self) -> &[Horse] {
    self.card.as_ref().map_or(&[][..], |c| c.horses.as_slice())
  }

  pub fn bankroll(&self) -> &Bankroll {
    &self.bankroll
  }

  pub fn balance(&self) -> Decimal {
    self.bankroll.balance
  }

  pub fn race_number(&self) -> u32 {
    self.race_number
  }

  pub fn bets(&self) -> &[Bet] {
    self.ledger.bets()
  }

  pub fn total_wagered(&self) -> Decimal {
    self.ledger.total_wagered()
  }

  /// Largest stake that can still be placed.
  pub fn available_stake(&self) -> Decimal {
    self.ledger.available(self.bankroll.balance)
  }

  pub fn phase(&self) -> RacePhase {
    self.simulator.phase()
  }

  pub fn is_racing(&self) -> bool {
    self.racing
  }

  pub fn race_config(&self) -> &RaceConfig {
    self.simulator.config()
  }

  /// Finish order of the race in progress (complete once finished).
  pub fn finish_order(&self) -> &[HorseId] {
    self.simulator.finish_order()
  }

  pub fn last_finish_order(&self) -> &[HorseId] {
    &self.last_finish_order
  }

  pub fn last_settlement(&self) -> Option<&SettlementResult> {
    self.last_settlement.as_ref()
  }

  /// Balance below the minimum stake: only a restart can continue.
  pub fn is_game_over(&self) -> bool {
    is_game_over(self.bankroll.balance, self.config.game_over_threshold)
  }

  fn ensure_not_game_over(&self) -> Result<(), SessionError> {
    if self.is_game_over() {
      warn!(balance = %self.bankroll.balance, "Game over");
      return Err(SessionError::GameOver {
        balance: self.bankroll.balance,
      });
    }
    Ok(())
  }

  /// Balance low enough that an early restart should be offered.
  pub fn is_low_balance(&self) -> bool {
    self.bankroll.balance < self.config.low_balance_threshold
  }

  /// Serializable view of the whole session.
  pub fn snapshot(&self) -> SessionSnapshot {
    SessionSnapshot {
      race_number: self.race_number,
      card: self.card.clone(),
      balance: self.bankroll.balance,
      races_run: self.bankroll.races_run,
      total_won: self.bankroll.total_won,
      total_lost: self.bankroll.total_lost,
      bets: self.ledger.bets().to_vec(),
      total_wagered: self.ledger.total_wagered(),
      phase: self.simulator.phase(),
      last_finish_order: self.last_finish_order.clone(),
      game_over: self.is_game_over(),
      low_balance: self.is_low_balance(),
    }
  }
}
