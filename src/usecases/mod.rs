//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement
//! the game's workflows. Each use case is a self-contained
//! business operation.
//!
//! Use cases:
//! - `FieldGenerator`: Draw unique runners and price them
//! - `BetLedger`: Validate and hold pending wagers
//! - `RaceSimulator`: Tick-driven race state machine
//! - `SettlementEngine`: Resolve bets against the finish order
//! - `Session`: Bankroll, race number and game loop ownership
//! - `RaceDriver`: Real-time countdown and tick loop

pub mod bet_ledger;
pub mod field_generator;
pub mod race_driver;
pub mod race_simulator;
pub mod session;
pub mod settlement;
