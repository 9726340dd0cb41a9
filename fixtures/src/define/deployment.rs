use std::collections::BTreeMap;

use k8s_openapi::{
    api::apps::v1::{Deployment, DeploymentSpec},
    apimachinery::pkg::apis::meta::v1::LabelSelector,
};

use super::{object_meta, pod_template};

/// Define a single replica deployment running the test image.
pub fn define_deployment(
    name: &str,
    ns: &str,
    image: &str,
    labels: &BTreeMap<String, String>,
) -> Deployment {
    Deployment {
        metadata: object_meta(name, ns, labels),
        spec: Some(DeploymentSpec {
            replicas: Some(1),
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
