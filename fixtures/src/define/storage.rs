use std::collections::BTreeMap;

use k8s_openapi::{
    api::{
        core::v1::{
            HostPathVolumeSource, PersistentVolume, PersistentVolumeClaim,
            PersistentVolumeClaimSpec, PersistentVolumeSpec, ResourceRequirements,
        },
        storage::v1::StorageClass,
    },
    apimachinery::pkg::api::resource::Quantity,
};
use kube::core::ObjectMeta;

/// Reclaim policy that removes the volume with its claim.
pub const RECLAIM_DELETE: &str = "Delete";
/// Reclaim policy that keeps the volume after the claim is gone.
pub const RECLAIM_RETAIN: &str = "Retain";

/// Define a host path persistent volume.
pub fn define_persistent_volume(
    name: &str,
    reclaim_policy: &str,
    capacity: &str,
    storage_class: Option<&str>,
) -> PersistentVolume {
    PersistentVolume {
        metadata: ObjectMeta {
            name: Some(name.to_owned()),
            ..ObjectMeta::default()
        },
        spec: Some(PersistentVolumeSpec {
            access_modes: Some(vec!["ReadWriteOnce".to_owned()]),
            capacity: Some(BTreeMap::from_iter([(
                "storage".to_owned(),
                Quantity(capacity.to_owned()),
            )])),
            persistent_volume_reclaim_policy: Some(reclaim_policy.to_owned()),
            storage_class_name: storage_class.map(str::to_owned),
            host_path: Some(HostPathVolumeSource {
                path: format!("/tmp/{name}"),
                type_: Some("DirectoryOrCreate".to_owned()),
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Define a claim requesting `size` from the given storage class.
pub fn define_pvc(
    name: &str,
    ns: &str,
    storage_class: Option<&str>,
    size: &str,
) -> PersistentVolumeClaim {
    PersistentVolumeClaim {
        metadata: ObjectMeta {
            name: Some(name.to_owned()),
            namespace: Some(ns.to_owned()),
            ..ObjectMeta::default()
        },
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec!["ReadWriteOnce".to_owned()]),
            resources: Some(ResourceRequirements {
                requests: Some(BTreeMap::from_iter([(
                    "storage".to_owned(),
                    Quantity(size.to_owned()),
                )])),
                ..Default::default()
            }),
            storage_class_name: storage_class.map(str::to_owned),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Define a storage class.
pub fn define_storage_class(name: &str, provisioner: &str, reclaim_policy: &str) -> StorageClass {
    StorageClass {
        metadata: ObjectMeta {
            name: Some(name.to_owned()),
            ..ObjectMeta::default()
        },
        provisioner: provisioner.to_owned(),
        reclaim_policy: Some(reclaim_policy.to_owned()),
        volume_binding_mode: Some("WaitForFirstConsumer".to_owned()),
        ..Default::default()
    }
}
