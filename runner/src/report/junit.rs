//! The JUnit report certsuite writes next to the claim.
use std::path::Path;

use certqe_common::{params::JUNIT_FILE_NAME, TestCaseState};
use serde::Deserialize;

use crate::{Error, Result};

/// `<testsuites>` root element.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TestSuites {
    /// Suites of the report.
    #[serde(rename = "testsuite", default)]
    pub suites: Vec<TestSuite>,
}

/// A `<testsuite>` element.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TestSuite {
    /// Suite name.
    #[serde(rename = "@name", default)]
    pub name: String,
    /// Number of test cases.
    #[serde(rename = "@tests", default)]
    pub tests: u32,
    /// Number of failed test cases.
    #[serde(rename = "@failures", default)]
    pub failures: u32,
    /// Number of skipped test cases.
    #[serde(rename = "@skipped", default)]
    pub skipped: u32,
    /// Test cases of the suite.
    #[serde(rename = "testcase", default)]
    pub test_cases: Vec<TestCase>,
}

/// A `<testcase>` element.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TestCase {
    /// Test case name as reported by the test framework.
    #[serde(rename = "@name")]
    pub name: String,
    /// Class name, usually the suite.
    #[serde(rename = "@classname", default)]
    pub class_name: String,
    /// Present when the test case failed.
    #[serde(default)]
    pub failure: Option<Message>,
    /// Present when the test case was skipped.
    #[serde(default)]
    pub skipped: Option<Message>,
}

/// Content of a `<failure>` or `<skipped>` element.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Message {
    /// Short description.
    #[serde(rename = "@message", default)]
    pub message: String,
    /// Element text.
    #[serde(rename = "$text", default)]
    pub text: String,
}

impl TestCase {
    /// State of the test case.
    pub fn state(&self) -> TestCaseState {
        if self.failure.is_some() {
            TestCaseState::Failed
        } else if self.skipped.is_some() {
            TestCaseState::Skipped
        } else {
            TestCaseState::Passed
        }
    }
}

impl TestSuites {
    /// Parse a report whose root is either `<testsuites>` or a single `<testsuite>`.
    pub fn parse(xml: &str) -> std::result::Result<Self, quick_xml::de::DeError> {
        let suites: TestSuites = quick_xml::de::from_str(xml)?;
        if !suites.suites.is_empty() {
            return Ok(suites);
        }
        let suite: TestSuite = quick_xml::de::from_str(xml)?;
        Ok(TestSuites {
            suites: vec![suite],
        })
    }

    /// State of the first test case named `tc`, ignoring spaces and dashes.
    ///
    /// The test framework decorates names, e.g. `[It] lifecycle lifecycle-startup-probe [common]`,
    /// so a single word of the name may match as well.
    pub fn state_of(&self, tc: &str) -> Option<TestCaseState> {
        let wanted = super::format_test_case_name(tc);
        self.suites
            .iter()
            .flat_map(|suite| suite.test_cases.iter())
            .find(|case| names_test_case(&case.name, &wanted))
            .map(TestCase::state)
    }
}

fn names_test_case(name: &str, wanted: &str) -> bool {
    super::format_test_case_name(name) == wanted
        || name
            .split_whitespace()
            .map(|word| word.trim_matches(|c| matches!(c, '[' | ']' | ',')))
            .any(|word| super::format_test_case_name(word) == wanted)
}

/// Read and parse the JUnit report from `report_dir`.
pub fn open_junit_report(report_dir: &Path) -> Result<TestSuites> {
    let path = report_dir.join(JUNIT_FILE_NAME);
    let data = std::fs::read_to_string(&path).map_err(|source| Error::Io {
        path: path.clone(),
        source,
    })?;
    TestSuites::parse(&data).map_err(|source| Error::Xml { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuites tests="3" disabled="0" errors="0" failures="1" time="42.1">
  <testsuite name="CNF Certification Test Suite" package="certsuite" tests="3" failures="1" skipped="1" time="42.1">
    <properties>
      <property name="SuiteSucceeded" value="false"></property>
    </properties>
    <testcase name="[It] lifecycle lifecycle-container-shutdown [common, lifecycle]" classname="CNF Certification Test Suite" status="passed" time="10.0"></testcase>
    <testcase name="[It] lifecycle lifecycle-startup-probe [common]" classname="CNF Certification Test Suite" status="failed" time="12.0">
      <failure message="Failed" type="failed">pod has no startup probe</failure>
      <system-err>details</system-err>
    </testcase>
    <testcase name="[It] affiliated-certification affiliated-certification-helmchart-is-certified [common]" classname="CNF Certification Test Suite" status="skipped" time="0">
      <skipped message="no helm charts found"></skipped>
    </testcase>
  </testsuite>
</testsuites>"#;

    #[test]
    fn states_are_read_from_children() {
        let report = TestSuites::parse(REPORT).unwrap();
        assert_eq!(report.suites[0].tests, 3);
        assert_eq!(
            report.state_of("lifecycle-container-shutdown"),
            Some(TestCaseState::Passed)
        );
        assert_eq!(
            report.state_of("lifecycle startup probe"),
            Some(TestCaseState::Failed)
        );
        assert_eq!(
            report.state_of("affiliated-certification-helmchart-is-certified"),
            Some(TestCaseState::Skipped)
        );
        assert_eq!(report.state_of("lifecycle-pod-owner-type"), None);
        let failure = report.suites[0].test_cases[1].failure.as_ref().unwrap();
        assert_eq!(failure.text, "pod has no startup probe");
    }

    #[test]
    fn single_suite_root() {
        let report = TestSuites::parse(
            r#"<testsuite name="s" tests="1"><testcase name="operator-install-source"/></testsuite>"#,
        )
        .unwrap();
        assert_eq!(
            report.state_of("operator-install-source"),
            Some(TestCaseState::Passed)
        );
    }

    #[test]
    fn prefix_of_another_check_is_not_a_match() {
        let report = TestSuites::parse(
            r#"<testsuites><testsuite name="s">
              <testcase name="[It] affiliated-certification affiliated-certification-container-is-certified-digest [common]"><failure message="not certified"/></testcase>
              <testcase name="[It] affiliated-certification affiliated-certification-container-is-certified [common]"><skipped message="no images"/></testcase>
            </testsuite></testsuites>"#,
        )
        .unwrap();
        assert_eq!(
            report.state_of("affiliated-certification-container-is-certified"),
            Some(TestCaseState::Skipped)
        );
        assert_eq!(
            report.state_of("affiliated-certification-container-is-certified-digest"),
            Some(TestCaseState::Failed)
        );
        assert_eq!(report.state_of("container-is-certified"), None);
    }
}
