use certqe_fixtures::olm::COMMUNITY_OPERATORS_CATALOG;

use crate::OperatorUnderTest;

/// Base name of the operator test namespaces.
pub const NAMESPACE_BASE: &str = "operator-tests";

/// Operator group created in every operator test namespace.
pub const OPERATOR_GROUP: &str = "operator-tests-og";

/// Community operator installed by the suite.
pub const COMMUNITY_OPERATOR: &str = "cockroachdb";
/// Channel of [`COMMUNITY_OPERATOR`].
pub const COMMUNITY_OPERATOR_CHANNEL: &str = "stable-v6.x";
/// Prefix of the CSV installed for [`COMMUNITY_OPERATOR`].
pub const COMMUNITY_OPERATOR_CSV_PREFIX: &str = "cockroach-operator";

/// Group of the CRD created by the CRD checks.
pub const CRD_GROUP: &str = "operator-tests.certsuite-qe.io";
/// Kind of the CRD created by the CRD checks.
pub const CRD_KIND: &str = "QeTest";
/// Plural of the CRD created by the CRD checks.
pub const CRD_PLURAL: &str = "qetests";

/// Test case names.
pub mod tc {
    /// CSVs reached the Succeeded phase.
    pub const INSTALL_STATUS_SUCCEEDED: &str = "operator-install-status-succeeded";
    /// Operators were installed through OLM.
    pub const INSTALL_SOURCE: &str = "operator-install-source";
    /// Operator versions follow semantic versioning.
    pub const SEMANTIC_VERSIONING: &str = "operator-semantic-versioning";
    /// CRDs carry an OpenAPI schema.
    pub const CRD_OPENAPI_SCHEMA: &str = "operator-crd-openapi-schema";
    /// CRD versions follow the Kubernetes version naming.
    pub const CRD_VERSIONING: &str = "operator-crd-versioning";
    /// Operator pods request no hugepages.
    pub const PODS_NO_HUGEPAGES: &str = "operator-pods-no-hugepages";
}

/// The community operator as installed by the suite.
pub const COMMUNITY: OperatorUnderTest<'static> = OperatorUnderTest {
    package: COMMUNITY_OPERATOR,
    channel: COMMUNITY_OPERATOR_CHANNEL,
    catalog: COMMUNITY_OPERATORS_CATALOG,
    csv_prefix: COMMUNITY_OPERATOR_CSV_PREFIX,
};
