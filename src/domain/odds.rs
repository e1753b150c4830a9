//! Odds engine: ability → decimal odds with a house-edge floor.
//!
//! Each horse's implied probability is its share of the field's total
//! ability. Fair decimal odds are `1/p - 1`, rounded to one decimal place,
//! floored at the house minimum (1.5 by default) and capped at
//! [`MAX_ODDS`].
//!
//! Display uses the traditional fractional style, but only approximately:
//! anything under 2.0 renders as "EVS" and everything else as
//! `floor(odds - 1)/1`. A 4.7 horse therefore shows as "3/1". This is the
//! established board format and is kept as-is.

use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;

use super::horse::Horse;

/// Longest price the board will quote.
pub const MAX_ODDS: Decimal = dec!(999.9);

/// Converts per-horse ability into priced decimal odds.
#[derive(Debug, Clone)]
pub struct OddsEngine {
    /// House floor applied after rounding.
    min_odds: Decimal,
}

impl OddsEngine {
    /// Creates an engine with a custom odds floor.
    pub fn new(min_odds: Decimal) -> Self {
        Self { min_odds }
    }

    /// Returns the configured odds floor.
    pub fn min_odds(&self) -> Decimal {
        self.min_odds
    }

    /// Share of total ability held by one horse.
    ///
    /// Returns 0.0 for a non-positive total.
    pub fn implied_probability(ability: f64, total_ability: f64) -> f64 {
        if total_ability <= 0.0 {
            return 0.0;
        }
        ability / total_ability
    }

    /// Fair decimal odds for an implied probability: `1/p - 1`.
    pub fn fair_odds(implied_prob: f64) -> f64 {
        if implied_prob <= 0.0 {
            return f64::INFINITY;
        }
        1.0 / implied_prob - 1.0
    }

    /// Rounds fair odds to one decimal place and applies the house floor.
    ///
    /// Rounding is half away from zero on `fair * 10`. Anything longer than
    /// [`MAX_ODDS`] (including a zero-probability horse's infinite fair
    /// odds) prices at the cap; NaN prices at the floor.
    pub fn price(&self, fair_odds: f64) -> Decimal {
        if fair_odds.is_nan() {
            return self.min_odds;
        }
        let cap = MAX_ODDS.max(self.min_odds);
        if fair_odds >= cap.to_f64().unwrap_or(f64::MAX) {
            return cap;
        }
        let tenths = (fair_odds * 10.0).round();
        let rounded = Decimal::from_f64(tenths)
            .map(|t| t / Decimal::TEN)
            .unwrap_or(self.min_odds);
        rounded.clamp(self.min_odds, cap)
    }

    /// Prices every horse in the field and fills its display string.
    pub fn price_field(&self, horses: &mut [Horse]) {
        let total_ability: f64 = horses.iter().map(|h| h.ability).sum();

        for horse in horses.iter_mut() {
            let p = Self::implied_probability(horse.ability, total_ability);
            horse.odds = self.price(Self::fair_odds(p));
            horse.odds_display = Self::format_display(horse.odds);
        }
    }

    /// Traditional board rendering of decimal odds.
    ///
    /// `< 2.0` → "EVS", otherwise `floor(odds - 1)/1`.
    pub fn format_display(odds: Decimal) -> String {
        if odds < Decimal::TWO {
            return "EVS".to_string();
        }
        let whole = (odds - Decimal::ONE).floor();
        format!("{}/1", whole.normalize())
    }
}

impl Default for OddsEngine {
    /// Default: 1.5 house floor.
    fn default() -> Self {
        Self { min_odds: dec!(1.5) }
    }
}
