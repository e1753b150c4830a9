//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) the usecases layer requires from the
//! outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `RaceObserver`: Presentation of countdown, ticks, finish and payouts

pub mod race_observer;
