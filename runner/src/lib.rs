//! Launches certsuite checks and validates the claim and JUnit reports they produce.
#![deny(missing_docs)]

use std::path::PathBuf;

use certqe_common::params::InvalidState;

pub mod certsuite_config;
pub mod launch;
pub mod report;

/// Errors produced while launching certsuite or reading its reports.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A file or directory could not be accessed.
    #[error("io error on {path}: {source}")]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying io error.
        #[source]
        source: std::io::Error,
    },
    /// The certsuite process could not be started.
    #[error("failed to start {program}: {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying io error.
        #[source]
        source: std::io::Error,
    },
    /// Certsuite exited with a non zero code, or was killed when `code` is `None`.
    #[error("certsuite exited with code {code:?}")]
    Failed {
        /// Exit code of the process.
        code: Option<i32>,
    },
    /// The certsuite config could not be serialized.
    #[error("failed to write certsuite config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// A JSON report could not be parsed.
    #[error("failed to parse {path}: {source}")]
    Json {
        /// Path of the report.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
    /// The JUnit report could not be parsed.
    #[error("failed to parse {path}: {source}")]
    Xml {
        /// Path of the report.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: quick_xml::de::DeError,
    },
    /// The check details of a test case are not valid JSON.
    #[error("invalid check details for {tc}: {source}")]
    CheckDetails {
        /// Test case name.
        tc: String,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
    /// The expected state is not a known state.
    #[error(transparent)]
    InvalidState(#[from] InvalidState),
    /// The test case is missing from a report.
    #[error("test case {tc} not found in {report}")]
    TestCaseNotFound {
        /// Test case name.
        tc: String,
        /// Report that was searched.
        report: &'static str,
    },
    /// The test case is in a different state than expected.
    #[error("test case {tc} is {actual} in {report}, expected {expected}")]
    UnexpectedState {
        /// Test case name.
        tc: String,
        /// Expected state.
        expected: String,
        /// State found in the report.
        actual: String,
        /// Report that was searched.
        report: &'static str,
    },
}

/// Result type of the runner.
pub type Result<T, E = Error> = std::result::Result<T, E>;
