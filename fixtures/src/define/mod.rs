//! Builders for the Kubernetes objects deployed as fixtures.
//!
//! Builders never talk to the cluster. They return object literals with the
//! requested name, namespace, image and labels; the `with_*` mutations from
//! [`template::WorkloadTemplate`] adjust them for a given check.
use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Container, PodSpec, PodTemplateSpec};
use kube::core::ObjectMeta;

pub mod crd;
pub mod daemonset;
pub mod deployment;
pub mod namespace;
pub mod pod;
pub mod rbac;
pub mod replicaset;
pub mod service;
pub mod statefulset;
pub mod storage;
pub mod template;

pub use template::{Replicated, WorkloadTemplate};

/// Name given to the single container of every test workload.
pub const TEST_CONTAINER_NAME: &str = "test";

/// Keep the container alive without doing any work.
pub fn sleep_command() -> Vec<String> {
    vec![
        "/bin/bash".to_owned(),
        "-c".to_owned(),
        "sleep INF".to_owned(),
    ]
}

/// A single long running container.
pub fn test_container(image: &str) -> Container {
    Container {
        name: TEST_CONTAINER_NAME.to_owned(),
        image: Some(image.to_owned()),
        command: Some(sleep_command()),
        ..Default::default()
    }
}

pub(crate) fn object_meta(name: &str, ns: &str, labels: &BTreeMap<String, String>) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_owned()),
        namespace: Some(ns.to_owned()),
        labels: Some(labels.clone()),
        ..ObjectMeta::default()
    }
}

pub(crate) fn pod_template(image: &str, labels: &BTreeMap<String, String>) -> PodTemplateSpec {
    PodTemplateSpec {
        metadata: Some(ObjectMeta {
            labels: Some(labels.clone()),
            ..ObjectMeta::default()
        }),
        spec: Some(PodSpec {
            containers: vec![test_container(image)],
            termination_grace_period_seconds: Some(0),
            ..Default::default()
        }),
    }
}
