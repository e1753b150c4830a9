//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! presentation backends.
//!
//! Adapter categories:
//! - `console`: Race commentary through the tracing subscriber

pub mod console;

pub use console::ConsoleObserver;
