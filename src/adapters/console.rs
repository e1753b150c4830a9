//! Console Observer - Tracing-Based Race Commentary
//!
//! Implements the `RaceObserver` port by narrating the race through
//! `tracing`: countdown and results at `info`, per-tick leader at `debug`.
//! Horse names are captured from the card when the gates open so the
//! finish can be announced by name.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::horse::{HorseId, RaceCard};
use crate::ports::race_observer::RaceObserver;
use crate::usecases::race_simulator::TickSnapshot;
use crate::usecases::settlement::SettlementResult;

/// Number of finishers announced by name.
const PODIUM: usize = 3;

/// Race commentary written to the tracing subscriber.
#[derive(Debug, Default)]
pub struct ConsoleObserver {
    /// Names of the runners in the current race.
    names: Mutex<HashMap<HorseId, String>>,
}

impl ConsoleObserver {
    /// Create an observer with no race in progress.
    pub fn new() -> Self {
        Self::default()
    }

    /// Display name for a runner, falling back to its number.
    pub fn name_of(&self, id: HorseId) -> String {
        self.names
            .lock()
            .ok()
            .and_then(|names| names.get(&id).cloned())
            .unwrap_or_else(|| format!("#{id}"))
    }

    /// Podium line such as `1. Thunder Bolt  2. Lucky Star  3. #4`.
    pub fn podium(&self, finish_order: &[HorseId]) -> String {
        finish_order
            .iter()
            .take(PODIUM)
            .enumerate()
            .map(|(i, id)| format!("{}. {}", i + 1, self.name_of(*id)))
            .collect::<Vec<_>>()
            .join("  ")
    }
}

#[async_trait]
impl RaceObserver for ConsoleObserver {
    async fn on_countdown(&self, remaining: u8) {
        info!(remaining, "{remaining}...");
    }

    async fn on_start(&self, card: &RaceCard) {
        if let Ok(mut names) = self.names.lock() {
            names.clear();
            names.extend(card.horses.iter().map(|h| (h.id, h.name.clone())));
        }

        info!(race = %card.title(), distance = %card.distance, "And they're off!");
        for horse in &card.horses {
            info!(
                id = horse.id,
                name = %horse.name,
                jockey = %horse.jockey,
                odds = %horse.odds_display,
                "Runner"
            );
        }
    }

    async fn on_tick(&self, snapshot: &TickSnapshot) {
        for id in &snapshot.newly_finished {
            info!(elapsed = snapshot.elapsed, horse = %self.name_of(*id), "Crosses the line");
        }

        let leader = snapshot
            .horses
            .iter()
            .filter(|h| !h.finished)
            .max_by(|a, b| a.position.total_cmp(&b.position));
        if let Some(leader) = leader {
            debug!(
                elapsed = snapshot.elapsed,
                leader = %self.name_of(leader.id),
                position = leader.position,
                "Leading the pack"
            );
        }
    }

    async fn on_finish(&self, finish_order: &[HorseId]) {
        info!(podium = %self.podium(finish_order), "Official result");
    }

    async fn on_settled(&self, result: &SettlementResult) {
        for outcome in &result.outcomes {
            info!(
                bet = %outcome.label,
                stake = %outcome.stake,
                won = outcome.won,
                payout = %outcome.payout,
                "Bet settled"
            );
        }
        info!(
            verdict = ?result.verdict,
            net = %result.net_result,
            balance = %result.new_balance,
            "Race settled"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::horse::Horse;

    fn card() -> RaceCard {
        RaceCard {
            number: 1,
            name: "Derby Stakes".to_string(),
            distance: "1 Mile".to_string(),
            horses: vec![
                Horse::new(1, "Thunder Bolt".into(), "Mike Smith".into(), 80.0),
                Horse::new(2, "Lucky Star".into(), "Frankie Dettori".into(), 60.0),
            ],
        }
    }

    #[tokio::test]
    async fn test_names_captured_on_start() {
        let observer = ConsoleObserver::new();
        assert_eq!(observer.name_of(1), "#1");

        observer.on_start(&card()).await;

        assert_eq!(observer.name_of(1), "Thunder Bolt");
        assert_eq!(observer.name_of(9), "#9");
    }

    #[tokio::test]
    async fn test_podium_stops_at_three() {
        let observer = ConsoleObserver::new();
        observer.on_start(&card()).await;

        assert_eq!(
            observer.podium(&[2, 1, 7, 8]),
            "1. Lucky Star  2. Thunder Bolt  3. #7"
        );
    }
}
