//! End to end suites: each test prepares fixtures in a fresh namespace, runs a single certsuite
//! check against them and verifies the state recorded in the reports.
//!
//! The tests live under `tests/` and only build with the `e2e` feature.
#![warn(missing_docs)]

/// Affiliated certification suite parameters.
pub mod affiliated;
pub mod harness;
/// Lifecycle suite parameters.
pub mod lifecycle;
/// Operator suite parameters.
pub mod operator;

pub use harness::{
    before_each_setup_with_random_namespace, skip_if_non_intrusive, OperatorUnderTest, TestEnv,
};
