//! Wager domain types and payout formulas.
//!
//! Payouts include the returned stake:
//! - win:    amount × (odds + 1)
//! - place:  amount × (odds / 2 + 1)
//! - show:   amount × (odds / 3 + 1)
//! - exacta: amount × (odds₁ × odds₂ / 2 + 1)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::horse::{HorseId, Rank};

/// Unique identifier of a placed bet.
pub type BetId = Uuid;

/// Supported wager types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetType {
    /// Horse must finish 1st.
    Win,
    /// Horse must finish 1st or 2nd.
    Place,
    /// Horse must finish in the top 3.
    Show,
    /// Two horses must finish 1st and 2nd in that exact order.
    Exacta,
}

impl BetType {
    /// All bet types, in board order.
    pub const ALL: [Self; 4] = [Self::Win, Self::Place, Self::Show, Self::Exacta];

    /// Whether this type needs a second horse.
    pub fn is_exacta(self) -> bool {
        matches!(self, Self::Exacta)
    }

    /// Payout multiplier applied to the stake.
    ///
    /// `second_odds` is only consulted for exacta; an exacta without it
    /// pays nothing.
    pub fn payout_multiplier(self, odds: Decimal, second_odds: Option<Decimal>) -> Decimal {
        match self {
            Self::Win => odds + Decimal::ONE,
            Self::Place => odds / Decimal::TWO + Decimal::ONE,
            Self::Show => odds / dec!(3) + Decimal::ONE,
            Self::Exacta => match second_odds {
                Some(second) => odds * second / Decimal::TWO + Decimal::ONE,
                None => Decimal::ZERO,
            },
        }
    }

    /// Whether a single-horse rank satisfies this bet type.
    ///
    /// Exacta is resolved on both legs by the settlement engine; here it
    /// only checks the first leg.
    pub fn covers(self, rank: Rank) -> bool {
        match self {
            Self::Win | Self::Exacta => rank == 1,
            Self::Place => rank <= 2,
            Self::Show => rank <= 3,
        }
    }
}

impl std::fmt::Display for BetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Win => write!(f, "WIN"),
            Self::Place => write!(f, "PLACE"),
            Self::Show => write!(f, "SHOW"),
            Self::Exacta => write!(f, "EXACTA"),
        }
    }
}

impl std::str::FromStr for BetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "win" => Ok(Self::Win),
            "place" => Ok(Self::Place),
            "show" => Ok(Self::Show),
            "exacta" => Ok(Self::Exacta),
            other => Err(format!("unknown bet type: {other}")),
        }
    }
}

/// A bet slip as filled in by the player, before validation.
///
/// `horse_id` is optional so that "nothing selected" is representable and
/// can be rejected like any other invalid slip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetRequest {
    pub bet_type: BetType,
    pub horse_id: Option<HorseId>,
    pub second_horse_id: Option<HorseId>,
    pub amount: Decimal,
}

impl BetRequest {
    /// Single-horse slip (win / place / show).
    pub fn single(bet_type: BetType, horse_id: HorseId, amount: Decimal) -> Self {
        Self {
            bet_type,
            horse_id: Some(horse_id),
            second_horse_id: None,
            amount,
        }
    }

    /// Exacta slip: `first` to win, `second` to run second.
    pub fn exacta(first: HorseId, second: HorseId, amount: Decimal) -> Self {
        Self {
            bet_type: BetType::Exacta,
            horse_id: Some(first),
            second_horse_id: Some(second),
            amount,
        }
    }
}

/// An accepted wager. Immutable once placed.
///
/// Odds and potential payout are frozen at placement time so the bet is
/// decoupled from any later re-pricing of the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bet {
    pub id: BetId,
    pub bet_type: BetType,
    pub horse_id: HorseId,
    pub horse_name: String,
    pub second_horse_id: Option<HorseId>,
    pub second_horse_name: Option<String>,
    /// Stake.
    pub amount: Decimal,
    /// Odds of the first leg when the bet was placed.
    pub odds: Decimal,
    /// Amount returned (stake included) if the bet wins.
    pub potential_payout: Decimal,
    pub placed_at: DateTime<Utc>,
}

impl Bet {
    /// Short label for result lists: "EXACTA #2→#5".
    pub fn label(&self) -> String {
        match self.second_horse_id {
            Some(second) => format!("{} #{}→#{}", self.bet_type, self.horse_id, second),
            None => format!("{} #{}", self.bet_type, self.horse_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_win_multiplier() {
        assert_eq!(BetType::Win.payout_multiplier(dec!(4.7), None), dec!(5.7));
    }

    #[test]
    fn test_place_and_show_multipliers() {
        assert_eq!(BetType::Place.payout_multiplier(dec!(3.0), None), dec!(2.5));
        assert_eq!(BetType::Show.payout_multiplier(dec!(3.0), None), dec!(2.0));
    }

    #[test]
    fn test_exacta_multiplier_requires_second_leg() {
        assert_eq!(
            BetType::Exacta.payout_multiplier(dec!(3.0), Some(dec!(5.0))),
            dec!(8.5)
        );
        assert_eq!(BetType::Exacta.payout_multiplier(dec!(3.0), None), Decimal::ZERO);
    }

    #[test]
    fn test_covers_ranks() {
        assert!(BetType::Win.covers(1));
        assert!(!BetType::Win.covers(2));
        assert!(BetType::Place.covers(2));
        assert!(!BetType::Place.covers(3));
        assert!(BetType::Show.covers(3));
        assert!(!BetType::Show.covers(4));
    }

    #[test]
    fn test_bet_type_parse_and_display() {
        assert_eq!("Exacta".parse::<BetType>(), Ok(BetType::Exacta));
        assert!("trifecta".parse::<BetType>().is_err());
        assert_eq!(BetType::Show.to_string(), "SHOW");
    }

    #[test]
    fn test_bet_type_serde_lowercase() {
        let json = serde_json::to_string(&BetType::Place).unwrap();
        assert_eq!(json, "\"place\"");
    }

    #[test]
    fn test_bet_label() {
        let bet = Bet {
            id: Uuid::new_v4(),
            bet_type: BetType::Exacta,
            horse_id: 2,
            horse_name: "Iron Bolt".to_string(),
            second_horse_id: Some(5),
            second_horse_name: Some("Wild Heart".to_string()),
            amount: dec!(5),
            odds: dec!(3.0),
            potential_payout: dec!(42.5),
            placed_at: Utc::now(),
        };
        assert_eq!(bet.label(), "EXACTA #2→#5");
    }
}
