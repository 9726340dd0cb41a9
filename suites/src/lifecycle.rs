use certqe_fixtures::define::storage::{define_persistent_volume, define_pvc};
use k8s_openapi::api::core::v1::{PersistentVolume, PersistentVolumeClaim};

/// Base name of the lifecycle test namespaces.
pub const NAMESPACE_BASE: &str = "lifecycle-tests";

/// Name of the deployment fixtures.
pub const DEPLOYMENT_NAME: &str = "lifecycle-dp";
/// Name of the statefulset fixtures.
pub const STATEFULSET_NAME: &str = "lifecycle-sf";
/// Name of the naked pod fixtures.
pub const POD_NAME: &str = "lifecycle-pod";
/// Name of the claim mounted by the storage fixtures.
pub const PVC_NAME: &str = "lifecycle-pvc";
/// Path the claim is mounted at.
pub const PVC_MOUNT_PATH: &str = "/data";
/// Size of the storage fixtures.
pub const STORAGE_SIZE: &str = "1Gi";

/// Taint key tolerated by the toleration bypass fixtures.
pub const CUSTOM_TOLERATION_KEY: &str = "certsuite-qe/custom";

/// Test case names.
pub mod tc {
    /// Containers define a preStop hook.
    pub const CONTAINER_SHUTDOWN: &str = "lifecycle-container-shutdown";
    /// Containers define a postStart hook.
    pub const CONTAINER_STARTUP: &str = "lifecycle-container-startup";
    /// Containers define a readiness probe.
    pub const READINESS_PROBE: &str = "lifecycle-readiness-probe";
    /// Containers define a liveness probe.
    pub const LIVENESS_PROBE: &str = "lifecycle-liveness-probe";
    /// Containers define a startup probe.
    pub const STARTUP_PROBE: &str = "lifecycle-startup-probe";
    /// Pods are owned by a controller.
    pub const POD_OWNER_TYPE: &str = "lifecycle-pod-owner-type";
    /// Replicated pods are spread over nodes.
    pub const POD_HIGH_AVAILABILITY: &str = "lifecycle-pod-high-availability";
    /// Pods do not pin themselves to nodes.
    pub const POD_SCHEDULING: &str = "lifecycle-pod-scheduling";
    /// Containers pull with IfNotPresent.
    pub const IMAGE_PULL_POLICY: &str = "lifecycle-image-pull-policy";
    /// Deployments survive a scale out and back.
    pub const DEPLOYMENT_SCALING: &str = "lifecycle-deployment-scaling";
    /// Statefulsets survive a scale out and back.
    pub const STATEFULSET_SCALING: &str = "lifecycle-statefulset-scaling";
    /// Volumes bound to pods are reclaimed with Delete.
    pub const PERSISTENT_VOLUME_RECLAIM_POLICY: &str = "lifecycle-persistent-volume-reclaim-policy";
    /// Pods keep the default tolerations.
    pub const POD_TOLERATION_BYPASS: &str = "lifecycle-pod-toleration-bypass";
}

/// Persistent volume name unique to a namespace, volumes being cluster scoped.
pub fn pv_name(namespace: &str) -> String {
    format!("{namespace}-pv")
}

/// Storage class name unique to a namespace so claims of concurrent tests never match each
/// other's volumes.
pub fn storage_class_name(namespace: &str) -> String {
    format!("{namespace}-manual")
}

/// Volume with `reclaim_policy` and a claim in `namespace` bound to exactly that volume.
pub fn reclaim_policy_fixtures(
    namespace: &str,
    reclaim_policy: &str,
) -> (PersistentVolume, PersistentVolumeClaim) {
    let class = storage_class_name(namespace);
    let pv_name = pv_name(namespace);
    let pv = define_persistent_volume(&pv_name, reclaim_policy, STORAGE_SIZE, Some(&class));
    let mut pvc = define_pvc(PVC_NAME, namespace, Some(&class), STORAGE_SIZE);
    if let Some(spec) = pvc.spec.as_mut() {
        spec.volume_name = Some(pv_name);
    }
    (pv, pvc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_suite_prefixed() {
        for tc in [
            tc::CONTAINER_SHUTDOWN,
            tc::CONTAINER_STARTUP,
            tc::READINESS_PROBE,
            tc::LIVENESS_PROBE,
            tc::STARTUP_PROBE,
            tc::POD_OWNER_TYPE,
            tc::POD_HIGH_AVAILABILITY,
            tc::POD_SCHEDULING,
            tc::IMAGE_PULL_POLICY,
            tc::DEPLOYMENT_SCALING,
            tc::STATEFULSET_SCALING,
            tc::PERSISTENT_VOLUME_RECLAIM_POLICY,
            tc::POD_TOLERATION_BYPASS,
        ] {
            assert!(tc.starts_with("lifecycle-"), "{tc}");
        }
        assert_eq!(pv_name("lifecycle-tests-abc"), "lifecycle-tests-abc-pv");
    }

    #[test]
    fn claim_is_pinned_to_its_own_volume() {
        let (pv_a, pvc_a) = reclaim_policy_fixtures("lifecycle-tests-aaa", "Delete");
        let (pv_b, pvc_b) = reclaim_policy_fixtures("lifecycle-tests-bbb", "Retain");

        let spec_a = pvc_a.spec.unwrap();
        assert_eq!(spec_a.volume_name, pv_a.metadata.name);
        assert_eq!(
            spec_a.storage_class_name,
            pv_a.spec.as_ref().unwrap().storage_class_name
        );
        assert_eq!(pvc_b.spec.unwrap().volume_name, pv_b.metadata.name);

        let spec_b = pv_b.spec.unwrap();
        assert_ne!(
            spec_a.storage_class_name, spec_b.storage_class_name,
            "concurrent tests must not share a storage class"
        );
        assert_eq!(spec_b.persistent_volume_reclaim_policy.as_deref(), Some("Retain"));
    }
}
