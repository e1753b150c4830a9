//! Race Driver - Real-Time Countdown and Tick Loop
//!
//! Drives one race of a [`Session`] against the wall clock:
//! 1. Close the book (`start_race`)
//! 2. Announce each countdown step, one per `countdown_step_ms`
//! 3. Open the gates and tick every `tick_ms` with the measured elapsed time
//! 4. Report the finish order, settle, report the settlement
//!
//! Every state change goes through the session; observers only see
//! snapshots. A shutdown signal fast-forwards the race to its timeout so
//! stragglers are force-finished and the bets still settle.

use std::sync::Arc;

use rand::Rng;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use crate::domain::error::SessionError;
use crate::ports::race_observer::RaceObserver;

use super::session::Session;
use super::settlement::SettlementResult;

/// Real-time race driver notifying a presentation observer.
pub struct RaceDriver<O: RaceObserver> {
  /// Presentation collaborator.
  observer: Arc<O>,
  /// Optional shutdown signal receiver.
  shutdown_rx: Option<broadcast::Receiver<()>>,
}

impl<O: RaceObserver> RaceDriver<O> {
  /// Create a driver with no shutdown signal.
  pub fn new(observer: Arc<O>) -> Self {
    Self {
      observer,
      shutdown_rx: None,
    }
  }

  /// Attach a shutdown signal.
  #[must_use]
  pub fn with_shutdown(mut self, shutdown_rx: broadcast::Receiver<()>) -> Self {
    self.shutdown_rx = Some(shutdown_rx);
    self
  }

  /// Observer this driver reports to.
  pub fn observer(&self) -> &Arc<O> {
    &self.observer
  }

  /// Run the current race of `session` to settlement.
  ///
  /// # Errors
  /// Any `start_race` rejection (no card, no bets, already racing), or a
  /// simulator error.
  #[instrument(skip_all, fields(race = session.race_number()))]
  pub async fn run_race<R: Rng + ?Sized>(
    &mut self,
    session: &mut Session,
    rng: &mut R,
  ) -> Result<SettlementResult, SessionError> {
    session.start_race()?;
    let config = session.race_config().clone();
    let mut fast_forward = false;

    // ── Countdown ───────────────────────────────────────────
    let step = Duration::from_millis(config.countdown_step_ms);
    while let Some(remaining) = session.countdown_step() {
      self.observer.on_countdown(remaining).await;

      fast_forward = tokio::select! {
        () = Self::shutdown_signal(&mut self.shutdown_rx) => true,
        () = tokio::time::sleep(step) => false,
      };
      if fast_forward {
        warn!(remaining, "Shutdown during countdown, fast-forwarding race");
        break;
      }
    }

    // ── Running ─────────────────────────────────────────────
    session.begin_running()?;
    if let Some(card) = session.card() {
      self.observer.on_start(card).await;
    }

    let mut ticker = tokio::time::interval(Duration::from_millis(config.tick_ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // First tick completes immediately.
    ticker.tick().await;
    let started = Instant::now();
    let mut ticks: u32 = 0;

    loop {
      if !fast_forward {
        fast_forward = tokio::select! {
          () = Self::shutdown_signal(&mut self.shutdown_rx) => true,
          _ = ticker.tick() => false,
        };
        if fast_forward {
          warn!(ticks, "Shutdown during race, fast-forwarding to timeout");
        }
      }

      let mut elapsed = started.elapsed().as_secs_f64();
      if fast_forward {
        elapsed = elapsed.max(config.timeout_secs());
      }

      let snapshot = session.advance_tick(elapsed, rng)?;
      ticks += 1;
      self.observer.on_tick(&snapshot).await;

      if snapshot.complete {
        break;
      }
    }

    // ── Finish & settle ─────────────────────────────────────
    let finish_order = session.finish_order().to_vec();
    debug!(ticks, order = ?finish_order, "Race complete");
    self.observer.on_finish(&finish_order).await;

    let result = session.settle_race()?;
    self.observer.on_settled(&result).await;

    info!(
      ticks,
      net = %result.net_result,
      balance = %result.new_balance,
      fast_forward,
      "Race driven to settlement"
    );
    Ok(result)
  }

  /// Resolve when shutdown is signalled; never resolve without a signal.
  async fn shutdown_signal(rx: &mut Option<broadcast::Receiver<()>>) {
    if let Some(rx) = rx {
      match rx.recv().await {
        Ok(()) | Err(RecvError::Lagged(_)) => return,
        Err(RecvError::Closed) => {}
      }
    }
    std::future::pending::<()>().await;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Mutex;

  use async_trait::async_trait;
  use rand::SeedableRng;
  use rand::rngs::StdRng;
  use rust_decimal_macros::dec;

  use crate::config::{AppConfig, RaceConfig};
  use crate::domain::bet::{BetRequest, BetType};
  use crate::domain::horse::{HorseId, RaceCard};
  use crate::usecases::race_simulator::TickSnapshot;

  #[derive(Default)]
  struct Recorder {
    events: Mutex<Vec<String>>,
  }

  impl Recorder {
    fn push(&self, event: String) {
      self.events.lock().unwrap().push(event);
    }

    fn events(&self) -> Vec<String> {
      self.events.lock().unwrap().clone()
    }
  }

  #[async_trait]
  impl RaceObserver for Recorder {
    async fn on_countdown(&self, remaining: u8) {
      self.push(format!("countdown:{remaining}"));
    }

    async fn on_start(&self, card: &RaceCard) {
      self.push(format!("start:{}", card.number));
    }

    async fn on_tick(&self, snapshot: &TickSnapshot) {
      if snapshot.complete {
        self.push("tick:complete".to_string());
      }
    }

    async fn on_finish(&self, finish_order: &[HorseId]) {
      self.push(format!("finish:{}", finish_order.len()));
    }

    async fn on_settled(&self, _result: &SettlementResult) {
      self.push("settled".to_string());
    }
  }

  fn fast_config() -> AppConfig {
    AppConfig {
      race: RaceConfig {
        duration_secs: 0.05,
        grace_secs: 0.02,
        tick_ms: 1,
        countdown_step_ms: 1,
        ..RaceConfig::default()
      },
      ..AppConfig::default()
    }
  }

  fn session_with_bet(config: &AppConfig, rng: &mut StdRng) -> Session {
    let mut session = Session::new(config);
    session.new_race(rng).unwrap();
    let fav = session.field()[0].id;
    session
      .place_bet(&BetRequest::single(BetType::Win, fav, dec!(10)))
      .unwrap();
    session
  }

  #[tokio::test]
  async fn test_drives_full_lifecycle_in_order() {
    let config = fast_config();
    let mut rng = StdRng::seed_from_u64(5);
    let mut session = session_with_bet(&config, &mut rng);
    let recorder = Arc::new(Recorder::default());
    let mut driver = RaceDriver::new(Arc::clone(&recorder));

    let result = driver.run_race(&mut session, &mut rng).await.unwrap();

    assert_eq!(
      recorder.events(),
      vec![
        "countdown:3",
        "countdown:2",
        "countdown:1",
        "start:1",
        "tick:complete",
        "finish:6",
        "settled",
      ]
    );
    assert_eq!(result.new_balance, session.balance());
    assert!(!session.is_racing());
    assert_eq!(session.last_finish_order().len(), 6);
  }

  #[tokio::test]
  async fn test_rejects_race_without_bets() {
    let config = fast_config();
    let mut rng = StdRng::seed_from_u64(5);
    let mut session = Session::new(&config);
    session.new_race(&mut rng).unwrap();
    let recorder = Arc::new(Recorder::default());
    let mut driver = RaceDriver::new(Arc::clone(&recorder));

    let err = driver.run_race(&mut session, &mut rng).await.unwrap_err();

    assert_eq!(err, SessionError::NoBets);
    assert!(recorder.events().is_empty());
  }

  #[tokio::test]
  async fn test_shutdown_fast_forwards_and_settles() {
    // Default timing would take seconds; the signal makes it immediate.
    let config = AppConfig::default();
    let mut rng = StdRng::seed_from_u64(9);
    let mut session = session_with_bet(&config, &mut rng);
    let (tx, rx) = broadcast::channel(1);
    tx.send(()).unwrap();

    let recorder = Arc::new(Recorder::default());
    let mut driver = RaceDriver::new(Arc::clone(&recorder)).with_shutdown(rx);
    let started = std::time::Instant::now();

    let result = driver.run_race(&mut session, &mut rng).await.unwrap();

    assert!(started.elapsed() < Duration::from_millis(900));
    assert_eq!(result.outcomes.len(), 1);
    assert_eq!(session.last_finish_order().len(), 6);
    assert_eq!(
      recorder.events(),
      vec!["countdown:3", "start:1", "tick:complete", "finish:6", "settled"]
    );
  }

  #[tokio::test]
  async fn test_closed_shutdown_channel_is_ignored() {
    let config = fast_config();
    let mut rng = StdRng::seed_from_u64(11);
    let mut session = session_with_bet(&config, &mut rng);
    let (tx, rx) = broadcast::channel::<()>(1);
    drop(tx);

    let recorder = Arc::new(Recorder::default());
    let mut driver = RaceDriver::new(Arc::clone(&recorder)).with_shutdown(rx);
    driver.run_race(&mut session, &mut rng).await.unwrap();

    let countdowns = recorder
      .events()
      .iter()
      .filter(|e| e.starts_with("countdown"))
      .count();
    assert_eq!(countdowns, 3);
  }
}
