//! Player bankroll and running session statistics.
//!
//! Stakes stay inside `balance` until the race is settled; settlement
//! applies the single net result (payouts minus stakes). This is
//! equivalent to debiting each stake at placement and crediting payouts
//! afterwards, which the tests below check explicitly.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Balance plus cumulative win/loss counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bankroll {
    /// Current balance. Can only go negative transiently, never after
    /// settlement of a ledger that respected the balance bound.
    pub balance: Decimal,
    /// Races settled this session.
    pub races_run: u32,
    /// Sum of positive race results.
    pub total_won: Decimal,
    /// Sum of |negative race results|.
    pub total_lost: Decimal,
}

impl Bankroll {
    /// Fresh bankroll with the given starting balance.
    pub fn new(starting_balance: Decimal) -> Self {
        Self {
            balance: starting_balance,
            races_run: 0,
            total_won: Decimal::ZERO,
            total_lost: Decimal::ZERO,
        }
    }

    /// Apply one race's net result and bump the race counter.
    ///
    /// A net of exactly zero updates neither total.
    pub fn apply_net(&mut self, net: Decimal) {
        self.balance += net;
        self.races_run += 1;

        if net > Decimal::ZERO {
            self.total_won += net;
        } else if net < Decimal::ZERO {
            self.total_lost += net.abs();
        }
    }

    /// Lifetime profit: total won minus total lost.
    pub fn lifetime_net(&self) -> Decimal {
        self.total_won - self.total_lost
    }
}

/// Whether a balance has fallen below the minimum playable stake.
pub fn is_game_over(balance: Decimal, threshold: Decimal) -> bool {
    balance < threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_apply_positive_net() {
        let mut b = Bankroll::new(dec!(100));
        b.apply_net(dec!(47));
        assert_eq!(b.balance, dec!(147));
        assert_eq!(b.total_won, dec!(47));
        assert_eq!(b.total_lost, Decimal::ZERO);
        assert_eq!(b.races_run, 1);
    }

    #[test]
    fn test_apply_negative_net() {
        let mut b = Bankroll::new(dec!(100));
        b.apply_net(dec!(-30));
        assert_eq!(b.balance, dec!(70));
        assert_eq!(b.total_lost, dec!(30));
        assert_eq!(b.lifetime_net(), dec!(-30));
    }

    #[test]
    fn test_push_updates_neither_total() {
        let mut b = Bankroll::new(dec!(100));
        b.apply_net(Decimal::ZERO);
        assert_eq!(b.balance, dec!(100));
        assert_eq!(b.total_won, Decimal::ZERO);
        assert_eq!(b.total_lost, Decimal::ZERO);
        assert_eq!(b.races_run, 1);
    }

    #[test]
    fn test_total_loss_triggers_game_over() {
        let mut b = Bankroll::new(dec!(100));
        b.apply_net(dec!(-100));
        assert_eq!(b.balance, Decimal::ZERO);
        assert!(is_game_over(b.balance, dec!(1)));
        assert!(!is_game_over(dec!(1), dec!(1)));
    }

    #[test]
    fn test_net_model_matches_debit_at_placement_model() {
        let stakes = [dec!(10), dec!(25), dec!(5)];
        let payouts = [dec!(57), Decimal::ZERO, dec!(42.5)];

        // Net model: stakes never leave the balance until settlement.
        let mut net_model = Bankroll::new(dec!(100));
        let net: Decimal =
            payouts.iter().copied().sum::<Decimal>() - stakes.iter().copied().sum::<Decimal>();
        net_model.apply_net(net);

        // Debit model: each stake leaves on placement, payouts come back.
        let mut debit_balance = dec!(100);
        for s in stakes {
            debit_balance -= s;
        }
        for p in payouts {
            debit_balance += p;
        }

        assert_eq!(net_model.balance, debit_balance);
    }
}
