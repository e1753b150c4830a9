//! Bet Ledger - Pending Wager Book
//!
//! Validates bet slips against the current field and balance, freezes odds
//! and potential payout on acceptance, and tracks the active bets until the
//! race is settled.
//!
//! Invariant: the sum of active stakes never exceeds the balance the
//! ledger was last checked against.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::bet::{Bet, BetId, BetRequest, BetType};
use crate::domain::error::BetRejection;
use crate::domain::horse::{Horse, HorseId, find_horse};

/// Potential payout for a slip against a field.
///
/// Returns zero for a non-positive amount, an unknown horse, an exacta
/// without a (known) second leg, or a payout beyond `Decimal` range.
pub fn compute_payout(
  field: &[Horse],
  bet_type: BetType,
  horse_id: HorseId,
  second_horse_id: Option<HorseId>,
  amount: Decimal,
) -> Decimal {
  if amount <= Decimal::ZERO {
    return Decimal::ZERO;
  }
  let Some(horse) = find_horse(field, horse_id) else {
    return Decimal::ZERO;
  };

  let second_odds = if bet_type.is_exacta() {
    match second_horse_id.and_then(|id| find_horse(field, id)) {
      Some(second) => Some(second.odds),
      None => return Decimal::ZERO,
    }
  } else {
    None
  };

  amount
    .checked_mul(bet_type.payout_multiplier(horse.odds, second_odds))
    .unwrap_or(Decimal::ZERO)
}

/// Book of active bets for the upcoming race.
#[derive(Debug, Clone, Default)]
pub struct BetLedger {
  bets: Vec<Bet>,
}

impl BetLedger {
  /// Create an empty ledger.
  pub fn new() -> Self {
    Self::default()
  }

  /// Validate a slip and, if acceptable, record it.
  ///
  /// # Errors
  /// A `BetRejection` describing the first failed check. The ledger is
  /// unchanged on rejection.
  pub fn place_bet(
    &mut self,
    request: &BetRequest,
    field: &[Horse],
    balance: Decimal,
  ) -> Result<Bet, BetRejection> {
    let bet = match self.validate(request, field, balance) {
      Ok(bet) => bet,
      Err(rejection) => {
        warn!(
          code = rejection.code(),
          bet_type = %request.bet_type,
          amount = %request.amount,
          "Bet rejected"
        );
        return Err(rejection);
      }
    };

    info!(
      bet_id = %bet.id,
      bet = %bet.label(),
      amount = %bet.amount,
      potential_payout = %bet.potential_payout,
      "Bet placed"
    );

    self.bets.push(bet.clone());
    Ok(bet)
  }

  /// Remove a single bet. Returns whether it was present.
  pub fn remove_bet(&mut self, id: BetId) -> bool {
    let before = self.bets.len();
    self.bets.retain(|b| b.id != id);
    let removed = self.bets.len() != before;
    debug!(bet_id = %id, removed, "Bet removal");
    removed
  }

  /// Drop every active bet.
  pub fn clear_bets(&mut self) {
    debug!(count = self.bets.len(), "Clearing bets");
    self.bets.clear();
  }

  /// Sum of stakes of all active bets.
  pub fn total_wagered(&self) -> Decimal {
    self.bets.iter().map(|b| b.amount).sum()
  }

  /// Largest stake that could still be accepted ("all in").
  pub fn available(&self, balance: Decimal) -> Decimal {
    (balance - self.total_wagered()).max(Decimal::ZERO)
  }

  /// Active bets, in placement order.
  pub fn bets(&self) -> &[Bet] {
    &self.bets
  }

  /// Number of active bets.
  pub fn len(&self) -> usize {
    self.bets.len()
  }

  /// Whether no bets are active.
  pub fn is_empty(&self) -> bool {
    self.bets.is_empty()
  }

  /// Hand the bets over for settlement, leaving the ledger empty.
  pub fn take_bets(&mut self) -> Vec<Bet> {
    std::mem::take(&mut self.bets)
  }

  fn validate(
    &self,
    request: &BetRequest,
    field: &[Horse],
    balance: Decimal,
  ) -> Result<Bet, BetRejection> {
    if request.amount <= Decimal::ZERO {
      return Err(BetRejection::InvalidAmount);
    }

    let horse_id = request.horse_id.ok_or(BetRejection::NoHorseSelected)?;
    let horse = find_horse(field, horse_id).ok_or(BetRejection::UnknownHorse(horse_id))?;

    let second = if request.bet_type.is_exacta() {
      let second_id = request
        .second_horse_id
        .ok_or(BetRejection::MissingSecondHorse)?;
      if second_id == horse_id {
        return Err(BetRejection::SameHorse);
      }
      Some(find_horse(field, second_id).ok_or(BetRejection::UnknownHorse(second_id))?)
    } else {
      None
    };

    match self.total_wagered().checked_add(request.amount) {
      Some(total) if total <= balance => {}
      _ => return Err(BetRejection::InsufficientBalance),
    }

    let potential_payout = compute_payout(
      field,
      request.bet_type,
      horse_id,
      second.map(|h| h.id),
      request.amount,
    );

    Ok(Bet {
      id: Uuid::new_v4(),
      bet_type: request.bet_type,
      horse_id,
      horse_name: horse.name.clone(),
      second_horse_id: second.map(|h| h.id),
      second_horse_name: second.map(|h| h.name.clone()),
      amount: request.amount,
      odds: horse.odds,
      potential_payout,
      placed_at: Utc::now(),
    })
  }
}
