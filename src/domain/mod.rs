//! Domain layer - Core betting and racing models.
//!
//! Pure types and formulas for horses, odds, wagers and the bankroll.
//! Nothing in here touches randomness, timers or I/O; the usecases layer
//! drives these types. All types are serializable and testable in isolation.

pub mod bankroll;
pub mod bet;
pub mod error;
pub mod horse;
pub mod odds;

// Re-export core types for convenience
pub use bankroll::{Bankroll, is_game_over};
pub use bet::{Bet, BetId, BetRequest, BetType};
pub use error::{BetRejection, FieldError, RaceError, SessionError};
pub use horse::{Horse, HorseId, RaceCard, RaceProgress, Rank};
pub use odds::OddsEngine;
