//! Kubernetes fixtures for the certsuite QE suites.
//!
//! [`define`] and [`olm`] build object literals, [`cluster`] creates, waits on and removes them
//! through a [`utils::Context`].
#![warn(missing_docs)]

use std::time::Duration;

/// Cluster helpers: create, wait until ready, delete.
pub mod cluster;
/// Object builders.
pub mod define;
/// Labels module for managing resource labels.
pub mod labels;
/// OLM custom resources.
pub mod olm;
/// Utils is shared functions and types for the cluster helpers.
pub mod utils;

pub use utils::{Context, PollConfig};

/// Field manager reported to the API server.
pub const FIELD_MANAGER: &str = "certsuite-qe";

/// Errors produced by the cluster helpers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The API server rejected a request.
    #[error("Kube error: {source}")]
    Kube {
        /// Underlying client error.
        #[from]
        source: kube::Error,
    },
    /// A condition did not hold before the timeout.
    #[error("timed out after {timeout:?} waiting for {what}")]
    Timeout {
        /// Description of the awaited condition.
        what: String,
        /// Budget that elapsed.
        timeout: Duration,
    },
    /// Any other failure.
    #[error("App error: {source}")]
    App {
        /// Underlying error.
        #[from]
        source: anyhow::Error,
    },
}

/// Result type of the cluster helpers.
pub type Result<T, E = Error> = std::result::Result<T, E>;
