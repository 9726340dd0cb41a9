//! OLM custom resources and their builders.

// Export all spec types
mod spec;
pub use spec::*;

/// Namespace holding the default catalog sources.
pub const MARKETPLACE_NAMESPACE: &str = "openshift-marketplace";
/// Catalog of Red Hat certified operators.
pub const CERTIFIED_OPERATORS_CATALOG: &str = "certified-operators";
/// Catalog of community operators.
pub const COMMUNITY_OPERATORS_CATALOG: &str = "community-operators";

/// Catalog source state reported once the registry is reachable.
pub const CATALOG_READY_STATE: &str = "READY";
/// CSV phase reported once the operator is running.
pub const CSV_SUCCEEDED_PHASE: &str = "Succeeded";

/// Define a gRPC catalog source serving `image`.
pub fn define_catalog_source(name: &str, ns: &str, image: &str) -> CatalogSource {
    let mut source = CatalogSource::new(
        name,
        CatalogSourceSpec {
            source_type: "grpc".to_owned(),
            image: Some(image.to_owned()),
            display_name: Some(name.to_owned()),
            publisher: Some("certsuite-qe".to_owned()),
        },
    );
    source.metadata.namespace = Some(ns.to_owned());
    source
}

/// Define an operator group. With no target namespaces the operator watches all namespaces.
pub fn define_operator_group(name: &str, ns: &str, target_namespaces: &[&str]) -> OperatorGroup {
    let targets = (!target_namespaces.is_empty())
        .then(|| target_namespaces.iter().map(|ns| ns.to_string()).collect());
    let mut group = OperatorGroup::new(
        name,
        OperatorGroupSpec {
            target_namespaces: targets,
        },
    );
    group.metadata.namespace = Some(ns.to_owned());
    group
}

/// Parameters of a subscription.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionConfig {
    /// Package name.
    pub package: String,
    /// Channel, the catalog default when unset.
    pub channel: Option<String>,
    /// Catalog source name.
    pub source: String,
    /// Catalog source namespace.
    pub source_namespace: String,
    /// Require manual approval of install plans.
    pub manual_approval: bool,
    /// CSV to start from.
    pub starting_csv: Option<String>,
}

/// Define a subscription named after its package.
pub fn define_subscription(ns: &str, config: SubscriptionConfig) -> Subscription {
    let approval = if config.manual_approval {
        "Manual"
    } else {
        "Automatic"
    };
    let mut subscription = Subscription::new(
        &format!("{}-subscription", config.package),
        SubscriptionSpec {
            name: config.package,
            channel: config.channel,
            source: config.source,
            source_namespace: config.source_namespace,
            install_plan_approval: Some(approval.to_owned()),
            starting_csv: config.starting_csv,
        },
    );
    subscription.metadata.namespace = Some(ns.to_owned());
    subscription
}

impl CatalogSource {
    /// Report whether the registry can be queried.
    pub fn is_ready(&self) -> bool {
        self.status
            .as_ref()
            .and_then(|status| status.connection_state.as_ref())
            .map(|state| state.last_observed_state == CATALOG_READY_STATE)
            .unwrap_or_default()
    }
}

impl ClusterServiceVersion {
    /// Report whether the operator finished installing.
    pub fn is_succeeded(&self) -> bool {
        self.status
            .as_ref()
            .and_then(|status| status.phase.as_deref())
            == Some(CSV_SUCCEEDED_PHASE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_defaults_to_automatic() {
        let sub = define_subscription(
            "operators",
            SubscriptionConfig {
                package: "cloud-native-postgresql".to_owned(),
                channel: Some("stable".to_owned()),
                source: CERTIFIED_OPERATORS_CATALOG.to_owned(),
                source_namespace: MARKETPLACE_NAMESPACE.to_owned(),
                ..Default::default()
            },
        );
        assert_eq!(
            sub.metadata.name.as_deref(),
            Some("cloud-native-postgresql-subscription")
        );
        assert_eq!(sub.metadata.namespace.as_deref(), Some("operators"));
        assert_eq!(sub.spec.install_plan_approval.as_deref(), Some("Automatic"));
    }

    #[test]
    fn subscription_serializes_starting_csv() {
        let sub = define_subscription(
            "ns",
            SubscriptionConfig {
                package: "pkg".to_owned(),
                source: "src".to_owned(),
                source_namespace: "src-ns".to_owned(),
                manual_approval: true,
                starting_csv: Some("pkg.v1.0.0".to_owned()),
                ..Default::default()
            },
        );
        let json = serde_json::to_value(&sub).unwrap();
        assert_eq!(json["spec"]["startingCSV"], "pkg.v1.0.0");
        assert_eq!(json["spec"]["installPlanApproval"], "Manual");
        assert!(json["spec"].get("channel").is_none());
    }

    #[test]
    fn operator_group_without_targets_watches_all() {
        let group = define_operator_group("og", "ns", &[]);
        assert_eq!(group.spec.target_namespaces, None);
        let group = define_operator_group("og", "ns", &["ns"]);
        assert_eq!(group.spec.target_namespaces, Some(vec!["ns".to_owned()]));
    }

    #[test]
    fn readiness_follows_status() {
        let mut source = define_catalog_source("cs", "ns", "index:latest");
        assert!(!source.is_ready());
        source.status = Some(CatalogSourceStatus {
            connection_state: Some(ConnectionState {
                last_observed_state: "READY".to_owned(),
                address: None,
            }),
        });
        assert!(source.is_ready());

        let csv: ClusterServiceVersion = serde_json::from_value(serde_json::json!({
            "apiVersion": "operators.coreos.com/v1alpha1",
            "kind": "ClusterServiceVersion",
            "metadata": {"name": "op.v1.0.0", "namespace": "ns"},
            "spec": {"displayName": "op", "version": "1.0.0"},
            "status": {"phase": "Succeeded", "reason": "InstallSucceeded"}
        }))
        .unwrap();
        assert!(csv.is_succeeded());
    }
}
