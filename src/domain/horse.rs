//! Race field domain types.
//!
//! A `Horse` is created once per race by the field generator, priced by the
//! odds engine, and afterwards only its `RaceProgress` changes (driven by the
//! race simulator). A `RaceCard` bundles the field with the cosmetic race
//! metadata shown by the presentation layer.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────
// Type aliases
// ────────────────────────────────────────────

/// Stable lane number of a horse within its field (1-based).
///
/// Assigned in draw order before the field is sorted by odds, so it is
/// independent of display order.
pub type HorseId = u8;

/// Finishing position (1 = winner).
pub type Rank = usize;

// ────────────────────────────────────────────
// Horse
// ────────────────────────────────────────────

/// Per-race progress state, owned by the race simulator while running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceProgress {
    /// Distance covered along the track, in track units.
    pub position: f64,
    /// Whether the horse has crossed (or been forced over) the finish line.
    pub finished: bool,
    /// Elapsed race time at which the horse finished.
    pub finish_time: Option<f64>,
}

impl RaceProgress {
    /// Progress of a horse standing in the gate.
    pub fn at_gate(start_offset: f64) -> Self {
        Self {
            position: start_offset,
            finished: false,
            finish_time: None,
        }
    }
}

/// A runner in the current field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Horse {
    /// Stable lane number (1..=field size).
    pub id: HorseId,
    /// Display name, unique within the field.
    pub name: String,
    /// Jockey name, unique within the field.
    pub jockey: String,
    /// Performance attribute in [40, 100). Drives both odds and speed.
    pub ability: f64,
    /// Decimal odds, one decimal place, never below the house floor.
    pub odds: Decimal,
    /// Traditional fractional rendering of `odds` (e.g. "3/1", "EVS").
    pub odds_display: String,
    /// Race progress.
    pub progress: RaceProgress,
}

impl Horse {
    /// Create an unpriced horse at the gate.
    ///
    /// Odds are filled in by `OddsEngine::price_field` once the whole field
    /// has been drawn.
    pub fn new(id: HorseId, name: String, jockey: String, ability: f64) -> Self {
        Self {
            id,
            name,
            jockey,
            ability,
            odds: Decimal::ZERO,
            odds_display: String::new(),
            progress: RaceProgress::at_gate(0.0),
        }
    }
}

/// Look up a horse in a field by its stable id.
pub fn find_horse(field: &[Horse], id: HorseId) -> Option<&Horse> {
    field.iter().find(|h| h.id == id)
}

// ────────────────────────────────────────────
// Race card
// ────────────────────────────────────────────

/// A generated race: metadata plus the priced field, favorite first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceCard {
    /// Session race number (1-based).
    pub number: u32,
    /// Stakes name, e.g. "Golden Mile".
    pub name: String,
    /// Distance label, e.g. "6 Furlongs".
    pub distance: String,
    /// The field, sorted by ascending odds.
    pub horses: Vec<Horse>,
}

impl RaceCard {
    /// Headline as shown above the track: "Race 3 - Derby Trial".
    pub fn title(&self) -> String {
        format!("Race {} - {}", self.number, self.name)
    }

    /// The shortest-priced horse, if the field is non-empty.
    pub fn favorite(&self) -> Option<&Horse> {
        self.horses.first()
    }
}
