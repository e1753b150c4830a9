//! Field Generator - Race Field and Race Card Creation
//!
//! Draws a field of horses for a new race:
//! 1. Unique name per horse (prefix + suffix)
//! 2. Unique jockey per horse
//! 3. Ability uniform in [min, max)
//! 4. Price the field via the odds engine
//! 5. Sort favorite-first (ids stay as drawn)
//!
//! Every uniqueness draw is bounded; exhausting the attempt budget is an
//! error rather than an endless loop.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::config::FieldConfig;
use crate::domain::error::FieldError;
use crate::domain::horse::{Horse, HorseId, RaceCard};
use crate::domain::odds::OddsEngine;

const NAME_PREFIXES: &[&str] = &[
  "Thunder", "Lightning", "Storm", "Golden", "Silver", "Midnight", "Royal", "Wild", "Lucky",
  "Swift", "Blazing", "Iron", "Steel", "Diamond", "Shadow", "Mystic", "Noble", "Brave", "Bold",
  "Fierce",
];

const NAME_SUFFIXES: &[&str] = &[
  "Runner", "Dancer", "Spirit", "Dream", "Star", "Wind", "Fire", "Flash", "Strike", "Glory",
  "Champion", "Legend", "Prince", "Knight", "Arrow", "Bolt", "Blaze", "Storm", "Heart", "Soul",
];

const JOCKEYS: &[&str] = &[
  "J. Smith", "M. Johnson", "R. Garcia", "T. Williams", "D. Brown", "C. Davis", "A. Martinez",
  "L. Anderson", "K. Thomas", "P. Jackson", "S. White", "N. Harris", "B. Martin", "E. Thompson",
  "F. Robinson",
];

const RACE_NAMES: &[&str] = &[
  "Maiden Stakes", "Sprint Classic", "Derby Trial", "Championship Cup", "Golden Mile",
  "Thunder Run", "Crown Jewel", "Victory Stakes", "Premier Handicap", "Grand Prix",
  "Legend Chase", "Elite Stakes",
];

const RACE_DISTANCES: &[&str] = &["5 Furlongs", "6 Furlongs", "7 Furlongs", "1 Mile", "1⅛ Miles"];

/// Word pools the generator draws from.
#[derive(Debug, Clone)]
pub struct NamePools {
  pub prefixes: Vec<String>,
  pub suffixes: Vec<String>,
  pub jockeys: Vec<String>,
  pub race_names: Vec<String>,
  pub distances: Vec<String>,
}

impl NamePools {
  /// Number of distinct horse names the pools can produce.
  pub fn name_capacity(&self) -> usize {
    let combos: HashSet<String> = self
      .prefixes
      .iter()
      .flat_map(|p| self.suffixes.iter().map(move |s| format!("{p} {s}")))
      .collect();
    combos.len()
  }

  /// Number of distinct jockeys in the pool.
  pub fn jockey_capacity(&self) -> usize {
    self.jockeys.iter().collect::<HashSet<_>>().len()
  }
}

impl Default for NamePools {
  fn default() -> Self {
    let owned = |xs: &[&str]| xs.iter().map(|s| (*s).to_string()).collect();
    Self {
      prefixes: owned(NAME_PREFIXES),
      suffixes: owned(NAME_SUFFIXES),
      jockeys: owned(JOCKEYS),
      race_names: owned(RACE_NAMES),
      distances: owned(RACE_DISTANCES),
    }
  }
}

/// Produces priced, favorite-first race fields.
#[derive(Debug, Clone)]
pub struct FieldGenerator {
  pools: NamePools,
  odds: OddsEngine,
  horse_count: usize,
  ability_min: f64,
  ability_max: f64,
  max_draw_attempts: u32,
}

impl FieldGenerator {
  /// Create a generator with the default name pools.
  pub fn new(config: &FieldConfig, odds: OddsEngine) -> Self {
    Self::with_pools(config, odds, NamePools::default())
  }

  /// Create a generator with custom pools.
  pub fn with_pools(config: &FieldConfig, odds: OddsEngine, pools: NamePools) -> Self {
    Self {
      pools,
      odds,
      horse_count: config.horse_count,
      ability_min: config.ability_min,
      ability_max: config.ability_max,
      max_draw_attempts: config.max_draw_attempts,
    }
  }

  /// Runners per field.
  pub fn horse_count(&self) -> usize {
    self.horse_count
  }

  /// Generate a priced field, sorted by ascending odds.
  ///
  /// # Errors
  /// `FieldError` if a pool cannot supply enough unique entries within
  /// the attempt budget, or the ability range is unusable.
  pub fn generate_field<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<Horse>, FieldError> {
    if !(self.ability_min > 0.0 && self.ability_min < self.ability_max) {
      return Err(FieldError::InvalidAbilityRange {
        min: self.ability_min,
        max: self.ability_max,
      });
    }
    if self.pools.name_capacity() < self.horse_count {
      return Err(FieldError::NamePoolExhausted {
        needed: self.horse_count,
        attempts: 0,
      });
    }
    if self.pools.jockey_capacity() < self.horse_count {
      return Err(FieldError::JockeyPoolExhausted {
        needed: self.horse_count,
        attempts: 0,
      });
    }

    let mut used_names = HashSet::with_capacity(self.horse_count);
    let mut used_jockeys = HashSet::with_capacity(self.horse_count);
    let mut horses = Vec::with_capacity(self.horse_count);

    for lane in 1..=self.horse_count {
      let name = self.draw_unique(rng, &used_names, |rng| self.draw_name(rng)).ok_or(
        FieldError::NamePoolExhausted {
          needed: self.horse_count,
          attempts: self.max_draw_attempts,
        },
      )?;
      used_names.insert(name.clone());

      let jockey = self
        .draw_unique(rng, &used_jockeys, |rng| self.pools.jockeys.choose(rng).cloned())
        .ok_or(FieldError::JockeyPoolExhausted {
          needed: self.horse_count,
          attempts: self.max_draw_attempts,
        })?;
      used_jockeys.insert(jockey.clone());

      let ability = rng.gen_range(self.ability_min..self.ability_max);
      // lane <= horse_count, validated to fit in a u8 by the config loader
      let id = HorseId::try_from(lane).unwrap_or(HorseId::MAX);

      debug!(id, name = %name, jockey = %jockey, ability, "Horse drawn");
      horses.push(Horse::new(id, name, jockey, ability));
    }

    self.odds.price_field(&mut horses);
    horses.sort_by(|a, b| a.odds.cmp(&b.odds));

    info!(
      runners = horses.len(),
      favorite = horses.first().map(|h| h.id),
      "Field generated"
    );

    Ok(horses)
  }

  /// Generate a full race card: stakes name, distance and field.
  ///
  /// # Errors
  /// See [`FieldGenerator::generate_field`].
  pub fn generate_card<R: Rng + ?Sized>(
    &self,
    race_number: u32,
    rng: &mut R,
  ) -> Result<RaceCard, FieldError> {
    let horses = self.generate_field(rng)?;
    let name = self
      .pools
      .race_names
      .choose(rng)
      .cloned()
      .unwrap_or_else(|| "Maiden Stakes".to_string());
    let distance = self
      .pools
      .distances
      .choose(rng)
      .cloned()
      .unwrap_or_else(|| "1 Mile".to_string());

    Ok(RaceCard {
      number: race_number,
      name,
      distance,
      horses,
    })
  }

  fn draw_name<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<String> {
    let prefix = self.pools.prefixes.choose(rng)?;
    let suffix = self.pools.suffixes.choose(rng)?;
    Some(format!("{prefix} {suffix}"))
  }

  /// Redraw until the value is unused, at most `max_draw_attempts` times.
  fn draw_unique<R, F>(&self, rng: &mut R, used: &HashSet<String>, mut draw: F) -> Option<String>
  where
    R: Rng + ?Sized,
    F: FnMut(&mut R) -> Option<String>,
  {
    for _ in 0..self.max_draw_attempts {
      let candidate = draw(rng)?;
      if !used.contains(&candidate) {
        return Some(candidate);
      }
    }
    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::SeedableRng;
  use rand::rngs::StdRng;
  use rust_decimal_macros::dec;

  fn generator() -> FieldGenerator {
    FieldGenerator::new(&FieldConfig::default(), OddsEngine::default())
  }

  #[test]
  fn test_field_has_six_unique_runners() {
    let mut rng = StdRng::seed_from_u64(7);
    let field = generator().generate_field(&mut rng).unwrap();

    assert_eq!(field.len(), 6);
    let names: HashSet<_> = field.iter().map(|h| &h.name).collect();
    let jockeys: HashSet<_> = field.iter().map(|h| &h.jockey).collect();
    assert_eq!(names.len(), 6);
    assert_eq!(jockeys.len(), 6);
  }

  #[test]
  fn test_ids_are_lanes_one_to_six() {
    let mut rng = StdRng::seed_from_u64(11);
    let field = generator().generate_field(&mut rng).unwrap();
    let mut ids: Vec<_> = field.iter().map(|h| h.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
  }

  #[test]
  fn test_field_sorted_favorite_first() {
    let mut rng = StdRng::seed_from_u64(3);
    let field = generator().generate_field(&mut rng).unwrap();
    assert!(field.windows(2).all(|w| w[0].odds <= w[1].odds));
    assert!(field.iter().all(|h| h.odds >= dec!(1.5)));
  }

  #[test]
  fn test_abilities_in_range() {
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..20 {
      let field = generator().generate_field(&mut rng).unwrap();
      assert!(field.iter().all(|h| (40.0..100.0).contains(&h.ability)));
    }
  }

  #[test]
  fn test_same_seed_same_field() {
    let a = generator().generate_field(&mut StdRng::seed_from_u64(42)).unwrap();
    let b = generator().generate_field(&mut StdRng::seed_from_u64(42)).unwrap();
    assert_eq!(a, b);
  }

  #[test]
  fn test_small_jockey_pool_fails_fast() {
    let pools = NamePools {
      jockeys: vec!["A. One".to_string(), "B. Two".to_string()],
      ..NamePools::default()
    };
    let generator =
      FieldGenerator::with_pools(&FieldConfig::default(), OddsEngine::default(), pools);
    let err = generator.generate_field(&mut StdRng::seed_from_u64(1)).unwrap_err();
    assert!(matches!(err, FieldError::JockeyPoolExhausted { needed: 6, .. }));
  }

  #[test]
  fn test_duplicate_words_do_not_count_toward_capacity() {
    let pools = NamePools {
      prefixes: vec!["Storm".to_string(), "Storm".to_string()],
      suffixes: vec!["Heart".to_string(), "Soul".to_string()],
      ..NamePools::default()
    };
    assert_eq!(pools.name_capacity(), 2);
    let generator =
      FieldGenerator::with_pools(&FieldConfig::default(), OddsEngine::default(), pools);
    let err = generator.generate_field(&mut StdRng::seed_from_u64(1)).unwrap_err();
    assert!(matches!(err, FieldError::NamePoolExhausted { .. }));
  }

  #[test]
  fn test_attempt_budget_is_enforced() {
    let config = FieldConfig {
      max_draw_attempts: 1,
      ..FieldConfig::default()
    };
    // Exactly six names available; one attempt each will collide quickly.
    let pools = NamePools {
      prefixes: vec!["Royal".to_string()],
      suffixes: (1..=6).map(|i| format!("Star{i}")).collect(),
      ..NamePools::default()
    };
    let generator = FieldGenerator::with_pools(&config, OddsEngine::default(), pools);
    let mut failures = 0;
    for seed in 0..50 {
      if generator.generate_field(&mut StdRng::seed_from_u64(seed)).is_err() {
        failures += 1;
      }
    }
    assert!(failures > 0, "single-attempt draws from a tight pool should fail");
  }

  #[test]
  fn test_race_card_has_metadata() {
    let card = generator().generate_card(4, &mut StdRng::seed_from_u64(5)).unwrap();
    assert_eq!(card.number, 4);
    assert!(RACE_NAMES.contains(&card.name.as_str()));
    assert!(RACE_DISTANCES.contains(&card.distance.as_str()));
    assert_eq!(card.horses.len(), 6);
  }
}
