//! Validation of the claim and JUnit reports.
use std::{io::ErrorKind, path::Path};

use certqe_common::{
    params::{CLAIM_FILE_NAME, JUNIT_FILE_NAME},
    TestCaseState,
};
use tracing::{debug, info};

use crate::{Error, Result};

pub mod check_details;
pub mod claim;
pub mod junit;

pub use check_details::{get_check_details, CheckDetails, ReportObject};
pub use claim::{open_claim_report, ClaimRoot, TestCaseResult};
pub use junit::{open_junit_report, TestSuites};

/// Normalize a test case name for comparison by removing spaces and dashes.
pub fn format_test_case_name(tc: &str) -> String {
    tc.chars().filter(|c| *c != ' ' && *c != '-').collect()
}

/// Check that `tc` is recorded in the claim with the `expected` state.
///
/// Returns [`Error::UnexpectedState`] with both states on mismatch and
/// [`Error::TestCaseNotFound`] when the claim has no such test case.
pub fn is_test_case_in_expected_status_in_claim_report(
    claim: &ClaimRoot,
    tc: &str,
    expected: TestCaseState,
) -> Result<bool> {
    let (_, result) = claim
        .claim
        .result(tc)
        .ok_or_else(|| Error::TestCaseNotFound {
            tc: tc.to_owned(),
            report: "claim",
        })?;
    if result.state != expected.as_str() {
        return Err(Error::UnexpectedState {
            tc: tc.to_owned(),
            expected: expected.to_string(),
            actual: result.state.clone(),
            report: "claim",
        });
    }
    Ok(true)
}

fn is_test_case_in_expected_status_in_junit_report(
    junit: &TestSuites,
    tc: &str,
    expected: TestCaseState,
) -> Result<()> {
    let actual = junit.state_of(tc).ok_or_else(|| Error::TestCaseNotFound {
        tc: tc.to_owned(),
        report: "junit",
    })?;
    if actual != expected {
        return Err(Error::UnexpectedState {
            tc: tc.to_owned(),
            expected: expected.to_string(),
            actual: actual.to_string(),
            report: "junit",
        });
    }
    Ok(())
}

/// Validate that `tc` ended in the `expected` state.
///
/// The claim report is mandatory. The JUnit report is only checked when certsuite wrote one.
#[tracing::instrument]
pub fn validate_if_reports_are_valid(tc: &str, expected: &str, report_dir: &Path) -> Result<()> {
    let expected: TestCaseState = expected.parse()?;

    let claim = open_claim_report(report_dir)?;
    is_test_case_in_expected_status_in_claim_report(&claim, tc, expected)?;

    if report_dir.join(JUNIT_FILE_NAME).exists() {
        let junit = open_junit_report(report_dir)?;
        is_test_case_in_expected_status_in_junit_report(&junit, tc, expected)?;
    } else {
        debug!("no junit report, only the claim was checked");
    }
    info!(tc, %expected, "reports are valid");
    Ok(())
}

/// Delete the claim and JUnit reports from `report_dir` if present.
pub fn remove_reports(report_dir: &Path) -> Result<()> {
    for name in [CLAIM_FILE_NAME, JUNIT_FILE_NAME] {
        let path = report_dir.join(name);
        match std::fs::remove_file(&path) {
            Ok(()) => debug!(path = %path.display(), "removed stale report"),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(source) => return Err(Error::Io { path, source }),
        }
    }
    Ok(())
}
