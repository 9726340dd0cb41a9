use std::collections::BTreeMap;

use k8s_openapi::{
    api::apps::v1::{ReplicaSet, ReplicaSetSpec},
    apimachinery::pkg::apis::meta::v1::LabelSelector,
};

use super::{object_meta, pod_template};

/// Define a single replica replicaset running the test image.
pub fn define_replicaset(
    name: &str,
    ns: &str,
    image: &str,
    labels: &BTreeMap<String, String>,
) -> ReplicaSet {
    ReplicaSet {
        metadata: object_meta(name, ns, labels),
        spec: Some(ReplicaSetSpec {
            replicas: Some(1),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            template: Some(pod_template(image, labels)),
            ..Default::default()
        }),
        ..Default::default()
    }
}
