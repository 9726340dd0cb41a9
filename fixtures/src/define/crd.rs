use std::collections::BTreeMap;

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
    CustomResourceDefinition, CustomResourceDefinitionNames, CustomResourceDefinitionSpec,
    CustomResourceDefinitionVersion, CustomResourceSubresourceScale,
    CustomResourceSubresourceStatus, CustomResourceSubresources, CustomResourceValidation,
    JSONSchemaProps,
};
use kube::core::ObjectMeta;

/// Scope of a custom resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrdScope {
    /// Objects live in a namespace.
    Namespaced,
    /// Objects are cluster wide.
    Cluster,
}

impl CrdScope {
    fn as_str(&self) -> &'static str {
        match self {
            CrdScope::Namespaced => "Namespaced",
            CrdScope::Cluster => "Cluster",
        }
    }
}

/// Name Kubernetes requires for a CRD: `<plural>.<group>`.
pub fn crd_name(group: &str, plural: &str) -> String {
    format!("{plural}.{group}")
}

/// Define a CRD with a single served and stored `v1` version.
///
/// The schema accepts any object. When `scalable` is set the CRD exposes the scale and status
/// subresources on `.spec.replicas` / `.status.replicas`.
pub fn define_crd(
    group: &str,
    kind: &str,
    plural: &str,
    scope: CrdScope,
    scalable: bool,
) -> CustomResourceDefinition {
    let subresources = scalable.then(|| CustomResourceSubresources {
        scale: Some(CustomResourceSubresourceScale {
            spec_replicas_path: ".spec.replicas".to_owned(),
            status_replicas_path: ".status.replicas".to_owned(),
            label_selector_path: Some(".status.selector".to_owned()),
        }),
        status: Some(CustomResourceSubresourceStatus(serde_json::json!({}))),
    });

    CustomResourceDefinition {
        metadata: ObjectMeta {
            name: Some(crd_name(group, plural)),
            ..ObjectMeta::default()
        },
        spec: CustomResourceDefinitionSpec {
            group: group.to_owned(),
            names: CustomResourceDefinitionNames {
                kind: kind.to_owned(),
                plural: plural.to_owned(),
                singular: Some(kind.to_lowercase()),
                list_kind: Some(format!("{kind}List")),
                ..Default::default()
            },
            scope: scope.as_str().to_owned(),
            versions: vec![CustomResourceDefinitionVersion {
                name: "v1".to_owned(),
                served: true,
                storage: true,
                schema: Some(CustomResourceValidation {
                    open_api_v3_schema: Some(permissive_schema()),
                }),
                subresources,
                ..Default::default()
            }],
            ..Default::default()
        },
        ..Default::default()
    }
}

fn permissive_schema() -> JSONSchemaProps {
    let preserve = || JSONSchemaProps {
        type_: Some("object".to_owned()),
        x_kubernetes_preserve_unknown_fields: Some(true),
        ..Default::default()
    };
    JSONSchemaProps {
        type_: Some("object".to_owned()),
        properties: Some(BTreeMap::from_iter([
            ("spec".to_owned(), preserve()),
            ("status".to_owned(), preserve()),
        ])),
        ..Default::default()
    }
}
