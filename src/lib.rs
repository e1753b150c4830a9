//! Derby Engine - Library Root
//!
//! Horse-race betting simulator: field generation, odds, wagering,
//! tick-driven race simulation and settlement. Re-exports all modules
//! for the headless binary, integration tests and benchmarks.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;
