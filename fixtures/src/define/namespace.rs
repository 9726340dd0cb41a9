use k8s_openapi::api::core::v1::Namespace;
use kube::core::ObjectMeta;

use crate::labels::managed_labels;

/// Define a namespace labelled as managed by the suites.
pub fn define_namespace(name: &str) -> Namespace {
    Namespace {
        metadata: ObjectMeta {
            name: Some(name.to_owned()),
            labels: Some(managed_labels()),
            ..ObjectMeta::default()
        },
        ..Default::default()
    }
}
