//! Helpers that create, wait for and delete fixtures on a live cluster.
use std::fmt::Debug;

use kube::{
    core::{ClusterResourceScope, NamespaceResourceScope},
    Api, Resource, ResourceExt,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    utils::{create, Context},
    Result,
};

pub mod crd;
pub mod namespace;
pub mod node;
pub mod olm;
pub mod rbac;
pub mod storage;
pub mod workload;

pub use crd::*;
pub use namespace::*;
pub use node::*;
pub use olm::*;
pub use rbac::*;
pub use storage::*;
pub use workload::*;

/// Create a namespaced object in the namespace set on its metadata.
pub async fn create_namespaced<K>(cx: &Context, obj: &K) -> Result<K>
where
    K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Serialize + Debug,
    <K as Resource>::DynamicType: Default,
{
    let ns = obj.namespace().unwrap_or_else(|| "default".to_owned());
    let api: Api<K> = Api::namespaced(cx.k_client.clone(), &ns);
    create(&api, obj).await
}

/// Create a cluster scoped object.
pub async fn create_cluster_scoped<K>(cx: &Context, obj: &K) -> Result<K>
where
    K: Resource<Scope = ClusterResourceScope> + Clone + DeserializeOwned + Serialize + Debug,
    <K as Resource>::DynamicType: Default,
{
    let api: Api<K> = Api::all(cx.k_client.clone());
    create(&api, obj).await
}
