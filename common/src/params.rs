//! Parameters shared by every suite: expected test states, polling budgets,
//! well-known labels and report file names.
use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

/// State of a single certsuite check as recorded in the reports.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TestCaseState {
    /// The check passed.
    Passed,
    /// The check failed.
    Failed,
    /// The check was skipped.
    Skipped,
}

impl TestCaseState {
    /// Report the name certsuite uses for the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            TestCaseState::Passed => "passed",
            TestCaseState::Failed => "failed",
            TestCaseState::Skipped => "skipped",
        }
    }
}

impl fmt::Display for TestCaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a state string is not one of the allowed values.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid test case state {0:?}, expected one of passed, failed, skipped")]
pub struct InvalidState(pub String);

impl FromStr for TestCaseState {
    type Err = InvalidState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "passed" => Ok(TestCaseState::Passed),
            "failed" => Ok(TestCaseState::Failed),
            "skipped" => Ok(TestCaseState::Skipped),
            other => Err(InvalidState(other.to_owned())),
        }
    }
}

/// Default budget for a resource to become ready.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5 * 60);
/// Default interval between two readiness checks.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);
/// Budget for an operator to be installed through OLM.
pub const OPERATOR_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Label key certsuite uses to discover pods under test.
pub const TEST_POD_LABEL_KEY: &str = "test-network-function.com/generic";
/// Label key certsuite uses to discover operators under test.
pub const TEST_OPERATOR_LABEL_KEY: &str = "test-network-function.com/operator";
/// Value shared by both discovery labels.
pub const TEST_LABEL_VALUE: &str = "target";

/// Name of the JSON claim file produced by certsuite.
pub const CLAIM_FILE_NAME: &str = "claim.json";
/// Name of the JUnit file produced by certsuite.
pub const JUNIT_FILE_NAME: &str = "cnf-certification-tests_junit.xml";
/// Name of the certsuite configuration file.
pub const CERTSUITE_CONFIG_FILE_NAME: &str = "tnf_config.yml";

/// Format a label pair the way certsuite expects it in its config file.
pub fn label_selector(key: &str, value: &str) -> String {
    format!("{key}: {value}")
}
