use std::collections::BTreeMap;

use kube::{
    api::{Patch, PatchParams},
    Api, ResourceExt,
};
use serde_json::json;
use tracing::{debug, info};

use super::create_namespaced;
use crate::{
    olm::{CatalogSource, ClusterServiceVersion, InstallPlan, OperatorGroup, Subscription},
    utils::{delete, delete_and_wait, poll_until, Context},
    Error, Result,
};

/// Create a catalog source and wait until its registry is reachable.
#[tracing::instrument(skip_all, fields(name = %source.name_any()))]
pub async fn create_catalog_source_and_wait_until_ready(
    cx: &Context,
    source: &CatalogSource,
) -> Result<CatalogSource> {
    create_namespaced(cx, source).await?;
    let name = source.name_any();
    let ns = source.namespace().unwrap_or_default();
    let sources = &Api::<CatalogSource>::namespaced(cx.k_client.clone(), &ns);
    let name_ref = name.as_str();
    poll_until(
        cx.operator_poll,
        &format!("catalog source {ns}/{name} to be ready"),
        || async move { Ok(sources.get(name_ref).await?.is_ready()) },
    )
    .await?;
    info!(%ns, %name, "catalog source ready");
    Ok(sources.get(&name).await?)
}

/// Create an operator group.
pub async fn create_operator_group(cx: &Context, group: &OperatorGroup) -> Result<OperatorGroup> {
    create_namespaced(cx, group).await
}

/// Create a subscription.
#[tracing::instrument(skip_all, fields(name = %subscription.name_any()))]
pub async fn create_subscription(cx: &Context, subscription: &Subscription) -> Result<Subscription> {
    create_namespaced(cx, subscription).await
}

/// Find the CSV whose name starts with `csv_prefix`.
pub async fn find_csv(
    cx: &Context,
    ns: &str,
    csv_prefix: &str,
) -> Result<Option<ClusterServiceVersion>> {
    let csvs: Api<ClusterServiceVersion> = Api::namespaced(cx.k_client.clone(), ns);
    Ok(csvs
        .list(&Default::default())
        .await?
        .into_iter()
        .find(|csv| csv.name_any().starts_with(csv_prefix)))
}

async fn find_install_plan(plans: &Api<InstallPlan>, csv: &str) -> Result<Option<String>> {
    Ok(plans
        .list(&Default::default())
        .await?
        .into_iter()
        .find(|plan| {
            plan.spec
                .cluster_service_version_names
                .iter()
                .any(|name| name == csv)
        })
        .map(|plan| plan.name_any()))
}

/// Approve the install plan that installs `csv`.
///
/// Waits for OLM to create the plan first.
#[tracing::instrument(skip(cx))]
pub async fn approve_install_plan(cx: &Context, ns: &str, csv: &str) -> Result<()> {
    let plans = &Api::<InstallPlan>::namespaced(cx.k_client.clone(), ns);
    poll_until(
        cx.operator_poll,
        &format!("install plan for {csv} in {ns}"),
        || async move { Ok(find_install_plan(plans, csv).await?.is_some()) },
    )
    .await?;

    let Some(plan) = find_install_plan(plans, csv).await? else {
        return Err(Error::App {
            source: anyhow::anyhow!("install plan for {csv} disappeared from {ns}"),
        });
    };
    plans
        .patch(
            &plan,
            &PatchParams::default(),
            &Patch::Merge(json!({ "spec": { "approved": true } })),
        )
        .await?;
    info!(%plan, csv, "install plan approved");
    Ok(())
}

/// Wait until the CSV named with `csv_prefix` reports the `Succeeded` phase.
#[tracing::instrument(skip(cx))]
pub async fn wait_until_operator_is_ready(
    cx: &Context,
    ns: &str,
    csv_prefix: &str,
) -> Result<ClusterServiceVersion> {
    poll_until(
        cx.operator_poll,
        &format!("operator {csv_prefix} in {ns} to succeed"),
        || async move {
            let Some(csv) = find_csv(cx, ns, csv_prefix).await? else {
                return Ok(false);
            };
            let phase = csv.status.as_ref().and_then(|status| status.phase.clone());
            debug!(name = %csv.name_any(), ?phase, "csv phase");
            Ok(csv.is_succeeded())
        },
    )
    .await?;
    let csv = find_csv(cx, ns, csv_prefix).await?;
    csv.ok_or_else(|| Error::App {
        source: anyhow::anyhow!("csv {csv_prefix} disappeared from {ns}"),
    })
}

/// Merge labels into a CSV, used to mark an operator as under test.
#[tracing::instrument(skip(cx))]
pub async fn label_csv(
    cx: &Context,
    ns: &str,
    csv: &str,
    labels: &BTreeMap<String, String>,
) -> Result<ClusterServiceVersion> {
    let csvs: Api<ClusterServiceVersion> = Api::namespaced(cx.k_client.clone(), ns);
    let patch = json!({ "metadata": { "labels": labels } });
    Ok(csvs
        .patch(csv, &PatchParams::default(), &Patch::Merge(&patch))
        .await?)
}

/// Remove an operator: its subscription first so OLM does not reinstall it, then its CSV.
#[tracing::instrument(skip(cx))]
pub async fn delete_operator(cx: &Context, ns: &str, csv: &str, subscription: &str) -> Result<()> {
    let subscriptions: Api<Subscription> = Api::namespaced(cx.k_client.clone(), ns);
    delete(&subscriptions, subscription).await?;
    let csvs: Api<ClusterServiceVersion> = Api::namespaced(cx.k_client.clone(), ns);
    delete_and_wait(&csvs, csv, cx.operator_poll).await
}
