//! Settlement Use Case - Resolve Bets Against the Finish Order
//!
//! Settlement flow:
//! 1. Build a rank lookup from the finish order
//! 2. Resolve each bet (win / place / show / exacta)
//! 3. Pay the frozen potential payout on winners, nothing on losers
//! 4. Apply net = payouts - stakes to the bankroll and update stats
//!
//! Stakes never left the balance, so losers are not debited separately;
//! the net result accounts for them.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::domain::bankroll::Bankroll;
use crate::domain::bet::{Bet, BetId, BetType};
use crate::domain::horse::{HorseId, Rank};

/// Overall verdict for a settled race, as announced to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RaceVerdict {
  /// Net result positive.
  Winner,
  /// Net result negative.
  Loser,
  /// Net result exactly zero.
  Push,
}

/// Outcome of a single bet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BetOutcome {
  pub bet_id: BetId,
  pub label: String,
  pub bet_type: BetType,
  pub stake: Decimal,
  pub won: bool,
  /// Frozen potential payout if won, otherwise zero.
  pub payout: Decimal,
}

impl BetOutcome {
  /// Signed effect on the bankroll: `payout - stake`.
  pub fn net(&self) -> Decimal {
    self.payout - self.stake
  }
}

/// Summary of one race's settlement.
#[derive(Debug, Clone, Serialize)]
pub struct SettlementResult {
  /// Per-bet outcomes, in placement order.
  pub outcomes: Vec<BetOutcome>,
  /// Sum of payouts on winning bets.
  pub total_payout: Decimal,
  /// Sum of all stakes.
  pub total_staked: Decimal,
  /// `total_payout - total_staked`.
  pub net_result: Decimal,
  /// Balance after applying the net result.
  pub new_balance: Decimal,
  /// Session total won after this race.
  pub total_won: Decimal,
  /// Session total lost after this race.
  pub total_lost: Decimal,
  pub verdict: RaceVerdict,
}

/// Stateless bet resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct SettlementEngine;

impl SettlementEngine {
  /// Create a settlement engine.
  pub fn new() -> Self {
    Self
  }

  /// Rank (1-based) of every horse in a finish order.
  pub fn rank_lookup(finish_order: &[HorseId]) -> HashMap<HorseId, Rank> {
    finish_order
      .iter()
      .enumerate()
      .map(|(index, id)| (*id, index + 1))
      .collect()
  }

  /// Whether a bet wins given the rank lookup.
  ///
  /// A horse missing from the lookup never wins.
  pub fn is_winner(bet: &Bet, ranks: &HashMap<HorseId, Rank>) -> bool {
    let Some(&rank) = ranks.get(&bet.horse_id) else {
      return false;
    };

    match bet.bet_type {
      BetType::Exacta => {
        rank == 1
          && bet
            .second_horse_id
            .and_then(|id| ranks.get(&id))
            .is_some_and(|&second_rank| second_rank == 2)
      }
      other => other.covers(rank),
    }
  }

  /// Resolve every bet without touching any bankroll.
  pub fn resolve(&self, finish_order: &[HorseId], bets: &[Bet]) -> Vec<BetOutcome> {
    let ranks = Self::rank_lookup(finish_order);

    bets
      .iter()
      .map(|bet| {
        let won = Self::is_winner(bet, &ranks);
        BetOutcome {
          bet_id: bet.id,
          label: bet.label(),
          bet_type: bet.bet_type,
          stake: bet.amount,
          won,
          payout: if won { bet.potential_payout } else { Decimal::ZERO },
        }
      })
      .collect()
  }

  /// Settle a race: resolve bets and apply the net result to `bankroll`.
  pub fn settle(
    &self,
    finish_order: &[HorseId],
    bets: &[Bet],
    bankroll: &mut Bankroll,
  ) -> SettlementResult {
    let outcomes = self.resolve(finish_order, bets);

    let total_payout: Decimal = outcomes.iter().map(|o| o.payout).sum();
    let total_staked: Decimal = outcomes.iter().map(|o| o.stake).sum();
    let net_result = total_payout - total_staked;

    bankroll.apply_net(net_result);

    let verdict = if net_result > Decimal::ZERO {
      RaceVerdict::Winner
    } else if net_result < Decimal::ZERO {
      RaceVerdict::Loser
    } else {
      RaceVerdict::Push
    };

    info!(
      bets = outcomes.len(),
      winners = outcomes.iter().filter(|o| o.won).count(),
      total_payout = %total_payout,
      total_staked = %total_staked,
      net = %net_result,
      balance = %bankroll.balance,
      "Race settled"
    );

    SettlementResult {
      outcomes,
      total_payout,
      total_staked,
      net_result,
      new_balance: bankroll.balance,
      total_won: bankroll.total_won,
      total_lost: bankroll.total_lost,
      verdict,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;
  use rust_decimal_macros::dec;
  use uuid::Uuid;

  fn bet(
    bet_type: BetType,
    horse_id: HorseId,
    second: Option<HorseId>,
    amount: Decimal,
    payout: Decimal,
  ) -> Bet {
    Bet {
      id: Uuid::new_v4(),
      bet_type,
      horse_id,
      horse_name: format!("Horse {horse_id}"),
      second_horse_id: second,
      second_horse_name: second.map(|id| format!("Horse {id}")),
      amount,
      odds: dec!(3.0),
      potential_payout: payout,
      placed_at: Utc::now(),
    }
  }

  const ORDER: [HorseId; 6] = [4, 2, 6, 1, 5, 3];

  #[test]
  fn test_rank_lookup() {
    let ranks = SettlementEngine::rank_lookup(&ORDER);
    assert_eq!(ranks[&4], 1);
    assert_eq!(ranks[&2], 2);
    assert_eq!(ranks[&3], 6);
  }

  #[test]
  fn test_win_place_show_resolution() {
    let ranks = SettlementEngine::rank_lookup(&ORDER);
    let w = |t, h| SettlementEngine::is_winner(&bet(t, h, None, dec!(1), dec!(2)), &ranks);

    assert!(w(BetType::Win, 4));
    assert!(!w(BetType::Win, 2));
    assert!(w(BetType::Place, 2));
    assert!(!w(BetType::Place, 6));
    assert!(w(BetType::Show, 6));
    assert!(!w(BetType::Show, 1));
  }

  #[test]
  fn test_exacta_requires_exact_order() {
    let ranks = SettlementEngine::rank_lookup(&ORDER);
    let hit = bet(BetType::Exacta, 4, Some(2), dec!(5), dec!(42.5));
    let reversed = bet(BetType::Exacta, 2, Some(4), dec!(5), dec!(42.5));
    let third = bet(BetType::Exacta, 4, Some(6), dec!(5), dec!(42.5));
    let no_leg = bet(BetType::Exacta, 4, None, dec!(5), dec!(42.5));

    assert!(SettlementEngine::is_winner(&hit, &ranks));
    assert!(!SettlementEngine::is_winner(&reversed, &ranks));
    assert!(!SettlementEngine::is_winner(&third, &ranks));
    assert!(!SettlementEngine::is_winner(&no_leg, &ranks));
  }

  #[test]
  fn test_reference_win_bet_settles_to_57() {
    let engine = SettlementEngine::new();
    let mut bankroll = Bankroll::new(dec!(100));
    let bets = vec![bet(BetType::Win, 4, None, dec!(10), dec!(57))];

    let result = engine.settle(&ORDER, &bets, &mut bankroll);

    assert_eq!(result.total_payout, dec!(57));
    assert_eq!(result.net_result, dec!(47));
    assert_eq!(result.new_balance, dec!(147));
    assert_eq!(result.total_won, dec!(47));
    assert_eq!(result.verdict, RaceVerdict::Winner);
  }

  #[test]
  fn test_total_loss_and_stats() {
    let engine = SettlementEngine::new();
    let mut bankroll = Bankroll::new(dec!(100));
    let bets = vec![bet(BetType::Win, 3, None, dec!(100), dec!(570))];

    let result = engine.settle(&ORDER, &bets, &mut bankroll);

    assert_eq!(result.net_result, dec!(-100));
    assert_eq!(result.new_balance, Decimal::ZERO);
    assert_eq!(result.total_lost, dec!(100));
    assert_eq!(result.verdict, RaceVerdict::Loser);
    assert_eq!(bankroll.races_run, 1);
    assert_eq!(result.outcomes[0].net(), dec!(-100));
  }

  #[test]
  fn test_push_when_payout_equals_stake() {
    let engine = SettlementEngine::new();
    let mut bankroll = Bankroll::new(dec!(50));
    let bets = vec![
      bet(BetType::Show, 6, None, dec!(10), dec!(20)),
      bet(BetType::Win, 5, None, dec!(10), dec!(40)),
    ];

    let result = engine.settle(&ORDER, &bets, &mut bankroll);

    assert_eq!(result.net_result, Decimal::ZERO);
    assert_eq!(result.verdict, RaceVerdict::Push);
    assert_eq!(result.total_won, Decimal::ZERO);
    assert_eq!(result.total_lost, Decimal::ZERO);
  }

  #[test]
  fn test_settlement_is_deterministic() {
    let engine = SettlementEngine::new();
    let bets = vec![
      bet(BetType::Win, 4, None, dec!(10), dec!(57)),
      bet(BetType::Place, 1, None, dec!(5), dec!(12.5)),
      bet(BetType::Exacta, 4, Some(2), dec!(5), dec!(42.5)),
    ];
    let first = engine.settle(&ORDER, &bets, &mut Bankroll::new(dec!(100)));
    let second = engine.settle(&ORDER, &bets, &mut Bankroll::new(dec!(100)));
    assert_eq!(first.net_result, second.net_result);
    assert_eq!(first.outcomes, second.outcomes);
  }

  #[test]
  fn test_no_bets_is_a_push() {
    let engine = SettlementEngine::new();
    let mut bankroll = Bankroll::new(dec!(10));
    let result = engine.settle(&ORDER, &[], &mut bankroll);
    assert_eq!(result.verdict, RaceVerdict::Push);
    assert_eq!(bankroll.races_run, 1);
  }
}
