use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Pod;

use super::{object_meta, pod_template};

/// Define a naked pod running the test image.
pub fn define_pod(name: &str, ns: &str, image: &str, labels: &BTreeMap<String, String>) -> Pod {
    Pod {
        metadata: object_meta(name, ns, labels),
        spec: pod_template(image, labels).spec,
        ..Default::default()
    }
}

/// Strip owner references so the pod is reported as a naked pod.
pub fn without_owner_references(mut pod: Pod) -> Pod {
    pod.metadata.owner_references = None;
    pod
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{define::WorkloadTemplate, labels::test_pod_labels};

    #[test]
    fn pod_has_requested_identity() {
        let pod = define_pod("test-pod", "ns1", "busybox", &test_pod_labels("test-pod"));
        assert_eq!(pod.metadata.name.as_deref(), Some("test-pod"));
        assert_eq!(pod.metadata.namespace.as_deref(), Some("ns1"));
        let spec = pod.spec.expect("pod spec");
        assert_eq!(spec.containers.len(), 1);
        assert_eq!(spec.containers[0].image.as_deref(), Some("busybox"));
        assert_eq!(
            pod.metadata.labels.unwrap().get("app").map(String::as_str),
            Some("test-pod")
        );
    }

    #[test]
    fn owner_references_are_removed() {
        let mut pod = define_pod("p", "ns", "busybox", &BTreeMap::new());
        pod.metadata.owner_references = Some(vec![Default::default()]);
        let pod = without_owner_references(pod);
        assert_eq!(pod.metadata.owner_references, None);
    }

    #[test]
    fn mutations_touch_only_the_pod_spec() {
        let pod = define_pod("p", "ns", "busybox", &BTreeMap::new())
            .with_host_network()
            .with_run_as_non_root(true);
        let spec = pod.pod_spec().unwrap();
        assert_eq!(spec.host_network, Some(true));
        assert_eq!(spec.host_pid, None);
        let sc = spec.containers[0].security_context.as_ref().unwrap();
        assert_eq!(sc.run_as_non_root, Some(true));
        assert_eq!(sc.run_as_user, Some(1000));
        assert_eq!(sc.privileged, None);
    }
}
