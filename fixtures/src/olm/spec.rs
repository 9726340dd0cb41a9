//! OLM resource types, restricted to the fields the suites read or write.
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Catalog of operator bundles served from an index image.
#[derive(CustomResource, Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[kube(
    group = "operators.coreos.com",
    version = "v1alpha1",
    kind = "CatalogSource",
    plural = "catalogsources",
    namespaced,
    status = "CatalogSourceStatus",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSourceSpec {
    /// Only `grpc` sources are used by the suites.
    pub source_type: String,
    /// Index image.
    pub image: Option<String>,
    /// Human readable name.
    pub display_name: Option<String>,
    /// Publisher shown in the console.
    pub publisher: Option<String>,
}

/// Observed state of a catalog source.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSourceStatus {
    /// Connection to the registry pod.
    pub connection_state: Option<ConnectionState>,
}

/// Connection state of a catalog source registry.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionState {
    /// gRPC connectivity state, `READY` once the catalog can be queried.
    pub last_observed_state: String,
    /// Address of the registry service.
    pub address: Option<String>,
}

/// Selects the namespaces an operator watches.
#[derive(CustomResource, Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[kube(
    group = "operators.coreos.com",
    version = "v1",
    kind = "OperatorGroup",
    plural = "operatorgroups",
    namespaced,
    status = "OperatorGroupStatus",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct OperatorGroupSpec {
    /// Namespaces to watch. Empty means all namespaces.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_namespaces: Option<Vec<String>>,
}

/// Observed state of an operator group.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OperatorGroupStatus {
    /// Resolved namespaces.
    pub namespaces: Option<Vec<String>>,
}

/// Requests installation of a package from a catalog.
#[derive(CustomResource, Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[kube(
    group = "operators.coreos.com",
    version = "v1alpha1",
    kind = "Subscription",
    plural = "subscriptions",
    namespaced,
    status = "SubscriptionStatus",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSpec {
    /// Package name in the catalog.
    pub name: String,
    /// Channel to follow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Catalog source name.
    pub source: String,
    /// Namespace of the catalog source.
    pub source_namespace: String,
    /// `Automatic` or `Manual`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_plan_approval: Option<String>,
    /// CSV to install first.
    #[serde(rename = "startingCSV", skip_serializing_if = "Option::is_none")]
    pub starting_csv: Option<String>,
}

/// Observed state of a subscription.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    /// Latest CSV the subscription resolved.
    #[serde(rename = "currentCSV")]
    pub current_csv: Option<String>,
    /// CSV currently installed.
    #[serde(rename = "installedCSV")]
    pub installed_csv: Option<String>,
    /// Subscription state, e.g. `AtLatestKnown`.
    pub state: Option<String>,
    /// Install plan waiting for approval, if any.
    pub install_plan_ref: Option<InstallPlanRef>,
}

/// Reference to an install plan.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
pub struct InstallPlanRef {
    /// Install plan name.
    pub name: String,
    /// Install plan namespace.
    pub namespace: Option<String>,
}

/// Installed operator version.
#[derive(CustomResource, Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[kube(
    group = "operators.coreos.com",
    version = "v1alpha1",
    kind = "ClusterServiceVersion",
    plural = "clusterserviceversions",
    shortname = "csv",
    namespaced,
    status = "ClusterServiceVersionStatus",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterServiceVersionSpec {
    /// Human readable name.
    pub display_name: Option<String>,
    /// Semantic version of the operator.
    pub version: Option<String>,
    /// CSV this one replaces.
    pub replaces: Option<String>,
    /// Install modes supported by the operator.
    pub install_modes: Option<Vec<InstallMode>>,
}

/// Install mode advertised by a CSV.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
pub struct InstallMode {
    /// `OwnNamespace`, `SingleNamespace`, `MultiNamespace` or `AllNamespaces`.
    #[serde(rename = "type")]
    pub type_: String,
    /// Whether the mode is supported.
    pub supported: bool,
}

/// Observed state of a CSV.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterServiceVersionStatus {
    /// Install phase, `Succeeded` once the operator is running.
    pub phase: Option<String>,
    /// Reason for the current phase.
    pub reason: Option<String>,
    /// Detail for the current phase.
    pub message: Option<String>,
}

/// Set of resources OLM installs for a subscription.
#[derive(CustomResource, Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[kube(
    group = "operators.coreos.com",
    version = "v1alpha1",
    kind = "InstallPlan",
    plural = "installplans",
    namespaced,
    status = "InstallPlanStatus",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct InstallPlanSpec {
    /// `Automatic` or `Manual`.
    pub approval: String,
    /// Set to true to start a manual install.
    pub approved: bool,
    /// CSVs installed by the plan.
    pub cluster_service_version_names: Vec<String>,
}

/// Observed state of an install plan.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstallPlanStatus {
    /// Plan phase, `Complete` once every step ran.
    pub phase: Option<String>,
}
