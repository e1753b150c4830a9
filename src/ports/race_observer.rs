//! Race Observer Port - Presentation Layer Interface
//!
//! The engine never renders anything. A presentation collaborator
//! (terminal, web socket bridge, test probe) implements this trait and is
//! notified as the race driver moves through the countdown, the running
//! ticks, the finish and the settlement.

use async_trait::async_trait;

use crate::domain::horse::{HorseId, RaceCard};
use crate::usecases::race_simulator::TickSnapshot;
use crate::usecases::settlement::SettlementResult;

/// Receives race lifecycle events from the race driver.
///
/// All methods default to no-ops so implementors only handle what they
/// display.
#[async_trait]
pub trait RaceObserver: Send + Sync + 'static {
  /// One countdown announcement ("3", "2", "1").
  async fn on_countdown(&self, _remaining: u8) {}

  /// The gates opened.
  async fn on_start(&self, _card: &RaceCard) {}

  /// Positions after one simulation tick.
  async fn on_tick(&self, _snapshot: &TickSnapshot) {}

  /// Final finish order, winner first.
  async fn on_finish(&self, _finish_order: &[HorseId]) {}

  /// Bets resolved and bankroll updated.
  async fn on_settled(&self, _result: &SettlementResult) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

#[async_trait]
impl RaceObserver for NullObserver {}
