//! Compliant and non compliant objects recorded for a check.
use serde::{Deserialize, Serialize};

use super::claim::ClaimRoot;
use crate::{Error, Result};

/// An object certsuite inspected, described by parallel key and value lists.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportObject {
    /// Kind of object, e.g. `Container` or `Deployment`.
    #[serde(rename = "ObjectType")]
    pub object_type: String,
    /// Field names.
    #[serde(rename = "ObjectFieldsKeys", default)]
    pub keys: Vec<String>,
    /// Field values, in the order of `keys`.
    #[serde(rename = "ObjectFieldsValues", default)]
    pub values: Vec<String>,
}

impl ReportObject {
    /// Value of the field named `key`.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.keys
            .iter()
            .position(|k| k == key)
            .and_then(|idx| self.values.get(idx))
            .map(String::as_str)
    }
}

/// Decoded `checkDetails` of a test case.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckDetails {
    /// Objects that passed the check.
    #[serde(rename = "CompliantObjectsOut", default)]
    compliant: Option<Vec<ReportObject>>,
    /// Objects that failed the check.
    #[serde(rename = "NonCompliantObjectsOut", default)]
    non_compliant: Option<Vec<ReportObject>>,
}

impl CheckDetails {
    /// Decode a `checkDetails` string, an empty string has no objects.
    pub fn parse(details: &str) -> serde_json::Result<Self> {
        if details.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(details)
    }

    /// Objects that passed the check.
    pub fn compliant(&self) -> &[ReportObject] {
        self.compliant.as_deref().unwrap_or_default()
    }

    /// Objects that failed the check.
    pub fn non_compliant(&self) -> &[ReportObject] {
        self.non_compliant.as_deref().unwrap_or_default()
    }

    /// Number of compliant objects.
    pub fn compliant_count(&self) -> usize {
        self.compliant().len()
    }

    /// Number of non compliant objects.
    pub fn non_compliant_count(&self) -> usize {
        self.non_compliant().len()
    }

    /// Find a non compliant object of `object_type` whose `field` equals `value`.
    pub fn find_non_compliant(
        &self,
        object_type: &str,
        field: &str,
        value: &str,
    ) -> Option<&ReportObject> {
        self.non_compliant()
            .iter()
            .find(|obj| obj.object_type == object_type && obj.field(field) == Some(value))
    }
}

/// Decode the check details of `tc` from a claim.
pub fn get_check_details(claim: &ClaimRoot, tc: &str) -> Result<CheckDetails> {
    let (_, result) = claim
        .claim
        .result(tc)
        .ok_or_else(|| Error::TestCaseNotFound {
            tc: tc.to_owned(),
            report: "claim",
        })?;
    CheckDetails::parse(&result.check_details).map_err(|source| Error::CheckDetails {
        tc: tc.to_owned(),
        source,
    })
}
