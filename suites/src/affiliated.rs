use certqe_fixtures::olm::CERTIFIED_OPERATORS_CATALOG;

use crate::OperatorUnderTest;

/// Base name of the affiliated certification test namespaces.
pub const NAMESPACE_BASE: &str = "affiliated-tests";

/// Name of the deployment fixtures.
pub const DEPLOYMENT_NAME: &str = "affiliated-dp";

/// Registry of [`CERTIFIED_REPOSITORY`].
pub const CERTIFIED_REGISTRY: &str = "registry.access.redhat.com";
/// Repository listed in the certified container catalog.
pub const CERTIFIED_REPOSITORY: &str = "ubi8/ubi-minimal";
/// Digest of a certified [`CERTIFIED_REPOSITORY`] build.
pub const CERTIFIED_DIGEST: &str =
    "sha256:7583ca0ea52001562bd81a961da3f75222209e6192e4e413ee226cff97dbd48c";
/// Image that is not in the certified container catalog.
pub const UNCERTIFIED_IMAGE: &str = "quay.io/testnetworkfunction/cnf-test-partner:latest";

/// Certified operator installed by the suite.
pub const CERTIFIED_OPERATOR: &str = "cockroachdb-certified";
/// Channel of [`CERTIFIED_OPERATOR`].
pub const CERTIFIED_OPERATOR_CHANNEL: &str = "stable";
/// Prefix of the CSV installed for [`CERTIFIED_OPERATOR`].
pub const CERTIFIED_OPERATOR_CSV_PREFIX: &str = "cockroach-operator";
/// Operator group created in every affiliated test namespace.
pub const OPERATOR_GROUP: &str = "affiliated-tests-og";

/// The certified operator as installed by the suite.
pub const CERTIFIED: OperatorUnderTest<'static> = OperatorUnderTest {
    package: CERTIFIED_OPERATOR,
    channel: CERTIFIED_OPERATOR_CHANNEL,
    catalog: CERTIFIED_OPERATORS_CATALOG,
    csv_prefix: CERTIFIED_OPERATOR_CSV_PREFIX,
};

/// Test case names.
pub mod tc {
    /// Container images are certified, referenced by digest.
    pub const CONTAINER_IS_CERTIFIED_DIGEST: &str =
        "affiliated-certification-container-is-certified-digest";
    /// Operators are certified.
    pub const OPERATOR_IS_CERTIFIED: &str = "affiliated-certification-operator-is-certified";
    /// Helm charts are certified.
    pub const HELMCHART_IS_CERTIFIED: &str = "affiliated-certification-helmchart-is-certified";
}

/// Image reference of the certified build, pinned by digest.
pub fn certified_image_by_digest() -> String {
    format!("{CERTIFIED_REGISTRY}/{CERTIFIED_REPOSITORY}@{CERTIFIED_DIGEST}")
}
