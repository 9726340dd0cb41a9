//! Provides types and functions common to the fixtures, the runner and the suites.
#![deny(missing_docs)]
pub mod config;
pub mod params;
#[cfg(feature = "telemetry")]
pub mod telemetry;

pub use config::{config, Config, RunMode};
pub use params::TestCaseState;
