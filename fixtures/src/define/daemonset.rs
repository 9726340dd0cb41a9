use std::collections::BTreeMap;

use k8s_openapi::{
    api::apps::v1::{DaemonSet, DaemonSetSpec},
    apimachinery::pkg::apis::meta::v1::LabelSelector,
};

use super::{object_meta, pod_template};

/// Define a daemonset running the test image on every schedulable node.
pub fn define_daemonset(
    name: &str,
    ns: &str,
    image: &str,
    labels: &BTreeMap<String, String>,
) -> DaemonSet {
    DaemonSet {
        metadata: object_meta(name, ns, labels),
        spec: Some(DaemonSetSpec {
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
