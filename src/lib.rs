//! # Daytime Library
//!
//! Internal library for the daytime binary, which publishes whether it is
//! currently day or night over MQTT. Sunrise is pushed later and sunset
//! pulled earlier by a configurable offset before either counts.
//!
//! This library exists to enable testing of the internals and provide clean
//! separation between CLI dispatch (main.rs) and application logic.
//!
//! ## Architecture
//!
//! - **Entry Point**: `Daytime` builder wires configuration, transport, signals and scheduler
//! - **Calculation**: `geo` turns sunrise/sunset into the next transition
//! - **Scheduling**: `scheduler` owns the single timer and the publish sequence
//! - **Transport**: `transport` with the MQTT publisher and a logging stand-in
//! - **Clock**: `time_source` for real and simulated time
//! - **Configuration**: `config` for the TOML settings
//! - **Infrastructure**: signal handling, logging and shared constants

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

// Public API modules
pub mod args;
pub mod commands;
pub mod common;
pub mod config;
pub mod error;
pub mod geo;
pub mod io;
pub mod scheduler;
pub mod time_source;
pub mod transport;

#[cfg(any(test, feature = "testing-support"))]
pub mod testing;

mod daytime;

pub use daytime::Daytime;
pub use error::{CalculationError, DaytimeError, PublishError};
