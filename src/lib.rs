//! FlipClock firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod fsm;
pub mod gesture;
pub mod layout;
pub mod weather;

pub mod pins;

// Hardware-facing code; each module carries a host simulation next to the
// ESP-IDF implementation.
pub mod adapters;
pub mod drivers;
