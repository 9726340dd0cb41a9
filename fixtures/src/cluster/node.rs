use k8s_openapi::api::core::v1::Node;
use kube::{api::ListParams, Api};

use crate::{utils::Context, Result};

/// List the nodes carrying `worker_label`, whatever its value.
pub async fn worker_nodes(cx: &Context, worker_label: &str) -> Result<Vec<Node>> {
    let nodes: Api<Node> = Api::all(cx.k_client.clone());
    Ok(nodes
        .list(&ListParams::default().labels(worker_label))
        .await?
        .items)
}

/// Report whether the cluster has a single node.
///
/// Several checks, high availability in particular, are skipped on such clusters.
pub async fn is_single_node_cluster(cx: &Context) -> Result<bool> {
    let nodes: Api<Node> = Api::all(cx.k_client.clone());
    Ok(nodes.list(&ListParams::default()).await?.items.len() == 1)
}
