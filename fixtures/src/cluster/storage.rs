use k8s_openapi::api::{
    core::v1::{PersistentVolume, PersistentVolumeClaim},
    storage::v1::StorageClass,
};
use kube::Api;

use super::{create_cluster_scoped, create_namespaced};
use crate::{
    utils::{delete, delete_and_wait, Context},
    Result,
};

/// Create a persistent volume.
pub async fn create_pv(cx: &Context, pv: &PersistentVolume) -> Result<PersistentVolume> {
    create_cluster_scoped(cx, pv).await
}

/// Delete a persistent volume and wait until it is released.
#[tracing::instrument(skip(cx))]
pub async fn delete_pv_and_wait(cx: &Context, name: &str) -> Result<()> {
    let api: Api<PersistentVolume> = Api::all(cx.k_client.clone());
    delete_and_wait(&api, name, cx.poll).await
}

/// Create a persistent volume claim.
pub async fn create_pvc(
    cx: &Context,
    pvc: &PersistentVolumeClaim,
) -> Result<PersistentVolumeClaim> {
    create_namespaced(cx, pvc).await
}

/// Delete a persistent volume claim and wait until it is gone.
pub async fn delete_pvc_and_wait(cx: &Context, ns: &str, name: &str) -> Result<()> {
    let api: Api<PersistentVolumeClaim> = Api::namespaced(cx.k_client.clone(), ns);
    delete_and_wait(&api, name, cx.poll).await
}

/// Create a storage class.
pub async fn create_storage_class(cx: &Context, class: &StorageClass) -> Result<StorageClass> {
    create_cluster_scoped(cx, class).await
}

/// Delete a storage class.
pub async fn delete_storage_class(cx: &Context, name: &str) -> Result<()> {
    let api: Api<StorageClass> = Api::all(cx.k_client.clone());
    delete(&api, name).await
}
