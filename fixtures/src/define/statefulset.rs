use std::collections::BTreeMap;

use k8s_openapi::{
    api::apps::v1::{StatefulSet, StatefulSetSpec},
    apimachinery::pkg::apis::meta::v1::LabelSelector,
};

use super::{object_meta, pod_template};

/// Define a single replica statefulset running the test image.
pub fn define_statefulset(
    name: &str,
    ns: &str,
    image: &str,
    labels: &BTreeMap<String, String>,
) -> StatefulSet {
    StatefulSet {
        metadata: object_meta(name, ns, labels),
        spec: Some(StatefulSetSpec {
            replicas: Some(1),
            service_name: name.to_owned(),
            pod_management_policy: Some("Parallel".to_owned()),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            template: pod_template(image, labels),
            ..Default::default()
        }),
        ..Default::default()
    }
}
