//! The claim report, certsuite's JSON record of a run.
use std::{collections::BTreeMap, path::Path};

use certqe_common::params::CLAIM_FILE_NAME;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Top level of `claim.json`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ClaimRoot {
    /// The claim itself.
    pub claim: Claim,
}

/// Results and context of a certsuite run.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Claim {
    /// Results keyed by test case id.
    pub results: BTreeMap<String, TestCaseResult>,
    /// Versions of the tools involved.
    pub versions: Versions,
    /// Timing of the run.
    pub metadata: Metadata,
    /// Configuration certsuite ran with, kept opaque.
    pub configurations: serde_json::Value,
}

/// Versions recorded in the claim.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Versions {
    /// Claim format version.
    #[serde(rename = "claimFormat")]
    pub claim_format: String,
    /// Kubernetes server version.
    pub k8s: String,
    /// Certsuite version.
    pub tnf: String,
    /// Certsuite git commit.
    #[serde(rename = "tnfGitCommit")]
    pub tnf_git_commit: String,
    /// OpenShift version, empty on plain Kubernetes.
    pub ocp: String,
}

/// Start and end of the run.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Metadata {
    /// Start time as written by certsuite.
    pub start_time: String,
    /// End time as written by certsuite.
    pub end_time: String,
}

/// Identifier of a test case.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct TestCaseId {
    /// Test case name, e.g. `lifecycle-container-shutdown`.
    pub id: String,
    /// Suite the test case belongs to.
    pub suite: String,
    /// Comma separated tags.
    pub tags: String,
}

/// Outcome of a single test case.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TestCaseResult {
    /// `passed`, `failed` or `skipped`.
    pub state: String,
    /// JSON encoded compliant and non compliant objects.
    pub check_details: String,
    /// Why the test case was skipped.
    pub skip_reason: String,
    /// Why the test case failed.
    pub failure_reason: String,
    /// Identifier of the test case.
    #[serde(rename = "testID")]
    pub test_id: TestCaseId,
    /// Log output of the check.
    pub captured_test_output: String,
}

impl Claim {
    /// Find the result of `tc`, ignoring spaces and dashes in the name.
    pub fn result(&self, tc: &str) -> Option<(&str, &TestCaseResult)> {
        let wanted = super::format_test_case_name(tc);
        self.results
            .iter()
            .find(|(name, result)| {
                super::format_test_case_name(name) == wanted
                    || (!result.test_id.id.is_empty()
                        && super::format_test_case_name(&result.test_id.id) == wanted)
            })
            .map(|(name, result)| (name.as_str(), result))
    }
}

/// Read and parse `claim.json` from `report_dir`.
pub fn open_claim_report(report_dir: &Path) -> Result<ClaimRoot> {
    let path = report_dir.join(CLAIM_FILE_NAME);
    let data = std::fs::read_to_string(&path).map_err(|source| Error::Io {
        path: path.clone(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| Error::Json { path, source })
}
