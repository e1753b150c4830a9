//! Domain error kinds.
//!
//! Every failure in the engine is a local validation rejection. The
//! rejected operation leaves all state untouched.

use thiserror::Error;

use super::horse::HorseId;

/// Why a bet slip was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BetRejection {
    /// Stake is zero or negative.
    #[error("Enter a bet amount!")]
    InvalidAmount,
    /// No horse on the slip.
    #[error("Select a horse!")]
    NoHorseSelected,
    /// Referenced horse is not in the current field.
    #[error("Horse #{0} is not running in this race")]
    UnknownHorse(HorseId),
    /// Exacta slip without a second leg.
    #[error("Select 2nd place horse!")]
    MissingSecondHorse,
    /// Exacta slip naming the same horse twice.
    #[error("Exacta legs must be different horses")]
    SameHorse,
    /// Existing stakes plus this one would exceed the balance.
    #[error("Insufficient balance!")]
    InsufficientBalance,
    /// The race is running or already run; the book is closed until the
    /// next card is drawn.
    #[error("Betting is closed for this race")]
    BettingClosed,
    /// Balance is below the minimum stake; only a restart reopens the book.
    #[error("Game over! Restart to keep playing")]
    GameOver,
}

impl BetRejection {
    /// Stable machine-readable code for the presentation layer.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidAmount => "invalid_amount",
            Self::NoHorseSelected => "no_horse_selected",
            Self::UnknownHorse(_) => "unknown_horse",
            Self::MissingSecondHorse => "missing_second_horse",
            Self::SameHorse => "same_horse",
            Self::InsufficientBalance => "insufficient_balance",
            Self::BettingClosed => "betting_closed",
            Self::GameOver => "game_over",
        }
    }
}

/// Field generation failures (exhausted draw pools).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("horse name pool exhausted after {attempts} draws ({needed} names needed)")]
    NamePoolExhausted { needed: usize, attempts: u32 },
    #[error("jockey pool exhausted after {attempts} draws ({needed} jockeys needed)")]
    JockeyPoolExhausted { needed: usize, attempts: u32 },
    #[error("ability range [{min}, {max}) is empty or non-positive")]
    InvalidAbilityRange { min: f64, max: f64 },
}

/// Race simulator state-machine violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RaceError {
    #[error("race is not running (phase: {0})")]
    NotRunning(String),
    #[error("race is not finished (phase: {0})")]
    NotFinished(String),
    #[error("race already started (phase: {0})")]
    AlreadyStarted(String),
}

/// Session-level flow errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("Place at least one bet!")]
    NoBets,
    #[error("a race is already in progress")]
    RaceInProgress,
    #[error("no race is in progress")]
    NoRaceInProgress,
    #[error("no race card has been drawn")]
    NoRaceCard,
    #[error("game over: balance {balance} is below the minimum stake")]
    GameOver { balance: rust_decimal::Decimal },
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error(transparent)]
    Race(#[from] RaceError),
}
