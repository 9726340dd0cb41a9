use std::fmt::Debug;

use k8s_openapi::api::{
    apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet},
    core::v1::Pod,
};
use kube::{
    api::{Patch, PatchParams},
    core::NamespaceResourceScope,
    Api, Resource, ResourceExt,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use tracing::info;

use crate::{
    utils::{create, delete_and_wait, poll_until, Context},
    Error, Result, FIELD_MANAGER,
};

fn generation_observed(generation: Option<i64>, observed: Option<i64>) -> bool {
    match (generation, observed) {
        (Some(generation), Some(observed)) => observed >= generation,
        (None, _) => true,
        (Some(_), None) => false,
    }
}

/// Report whether every replica of a deployment is updated, ready and available.
pub fn is_deployment_ready(deployment: &Deployment) -> bool {
    let desired = deployment
        .spec
        .as_ref()
        .and_then(|spec| spec.replicas)
        .unwrap_or(1);
    let Some(status) = deployment.status.as_ref() else {
        return false;
    };
    generation_observed(deployment.metadata.generation, status.observed_generation)
        && status.ready_replicas.unwrap_or_default() == desired
        && status.available_replicas.unwrap_or_default() == desired
        && status.updated_replicas.unwrap_or_default() == desired
}

/// Report whether every replica of a statefulset is ready.
pub fn is_statefulset_ready(statefulset: &StatefulSet) -> bool {
    let desired = statefulset
        .spec
        .as_ref()
        .and_then(|spec| spec.replicas)
        .unwrap_or(1);
    let Some(status) = statefulset.status.as_ref() else {
        return false;
    };
    generation_observed(statefulset.metadata.generation, status.observed_generation)
        && status.ready_replicas.unwrap_or_default() == desired
        && status.replicas == desired
}

/// Report whether a daemonset runs a ready pod on every node it targets.
pub fn is_daemonset_ready(daemonset: &DaemonSet) -> bool {
    let Some(status) = daemonset.status.as_ref() else {
        return false;
    };
    generation_observed(daemonset.metadata.generation, status.observed_generation)
        && status.desired_number_scheduled > 0
        && status.number_ready == status.desired_number_scheduled
        && status.number_available.unwrap_or_default() == status.desired_number_scheduled
}

/// Report whether every replica of a replicaset is ready.
pub fn is_replicaset_ready(replicaset: &ReplicaSet) -> bool {
    let desired = replicaset
        .spec
        .as_ref()
        .and_then(|spec| spec.replicas)
        .unwrap_or(1);
    replicaset
        .status
        .as_ref()
        .map(|status| status.ready_replicas.unwrap_or_default() == desired)
        .unwrap_or_default()
}

/// Report whether the pod has the `Ready` condition set.
pub fn is_pod_ready(pod: &Pod) -> bool {
    pod.status
        .as_ref()
        .and_then(|status| status.conditions.as_ref())
        .map(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == "Ready" && c.status == "True")
        })
        .unwrap_or_default()
}

async fn create_and_wait<K>(cx: &Context, obj: &K, is_ready: fn(&K) -> bool) -> Result<K>
where
    K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Serialize + Debug,
    <K as Resource>::DynamicType: Default,
{
    let name = obj.name_any();
    let ns = obj.namespace().unwrap_or_default();
    let kind = K::kind(&Default::default()).to_string();
    let api = &Api::<K>::namespaced(cx.k_client.clone(), &ns);
    create(api, obj).await?;

    let name_ref = name.as_str();
    poll_until(cx.poll, &format!("{kind} {ns}/{name} to be ready"), || async move {
        Ok(is_ready(&api.get(name_ref).await?))
    })
    .await?;
    info!(%kind, %ns, %name, "ready");
    Ok(api.get(&name).await?)
}

/// Create a deployment and wait until it is ready.
#[tracing::instrument(skip_all, fields(name = %deployment.name_any()))]
pub async fn create_and_wait_until_deployment_is_ready(
    cx: &Context,
    deployment: &Deployment,
) -> Result<Deployment> {
    create_and_wait(cx, deployment, is_deployment_ready).await
}

/// Create a statefulset and wait until it is ready.
#[tracing::instrument(skip_all, fields(name = %statefulset.name_any()))]
pub async fn create_and_wait_until_statefulset_is_ready(
    cx: &Context,
    statefulset: &StatefulSet,
) -> Result<StatefulSet> {
    create_and_wait(cx, statefulset, is_statefulset_ready).await
}

/// Create a daemonset and wait until it is ready.
#[tracing::instrument(skip_all, fields(name = %daemonset.name_any()))]
pub async fn create_and_wait_until_daemonset_is_ready(
    cx: &Context,
    daemonset: &DaemonSet,
) -> Result<DaemonSet> {
    create_and_wait(cx, daemonset, is_daemonset_ready).await
}

/// Create a replicaset and wait until it is ready.
#[tracing::instrument(skip_all, fields(name = %replicaset.name_any()))]
pub async fn create_and_wait_until_replicaset_is_ready(
    cx: &Context,
    replicaset: &ReplicaSet,
) -> Result<ReplicaSet> {
    create_and_wait(cx, replicaset, is_replicaset_ready).await
}

/// Create a pod and wait until it is ready.
#[tracing::instrument(skip_all, fields(name = %pod.name_any()))]
pub async fn create_and_wait_until_pod_is_ready(cx: &Context, pod: &Pod) -> Result<Pod> {
    create_and_wait(cx, pod, is_pod_ready).await
}

/// Change the replica count of a deployment and wait until it settles.
#[tracing::instrument(skip(cx))]
pub async fn scale_deployment(cx: &Context, ns: &str, name: &str, replicas: i32) -> Result<()> {
    if replicas < 0 {
        return Err(Error::App {
            source: anyhow::anyhow!("cannot scale {name} to {replicas} replicas"),
        });
    }
    let deployments = &Api::<Deployment>::namespaced(cx.k_client.clone(), ns);
    let patch = json!({ "spec": { "replicas": replicas } });
    deployments
        .patch(name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
        .await?;
    poll_until(
        cx.poll,
        &format!("deployment {ns}/{name} to reach {replicas} replicas"),
        || async move { Ok(is_deployment_ready(&deployments.get(name).await?)) },
    )
    .await
}

/// Delete a deployment and wait until it is gone.
pub async fn delete_deployment(cx: &Context, ns: &str, name: &str) -> Result<()> {
    let api: Api<Deployment> = Api::namespaced(cx.k_client.clone(), ns);
    delete_and_wait(&api, name, cx.poll).await
}

/// Delete a statefulset and wait until it is gone.
pub async fn delete_statefulset(cx: &Context, ns: &str, name: &str) -> Result<()> {
    let api: Api<StatefulSet> = Api::namespaced(cx.k_client.clone(), ns);
    delete_and_wait(&api, name, cx.poll).await
}

/// Delete a daemonset and wait until it is gone.
pub async fn delete_daemonset(cx: &Context, ns: &str, name: &str) -> Result<()> {
    let api: Api<DaemonSet> = Api::namespaced(cx.k_client.clone(), ns);
    delete_and_wait(&api, name, cx.poll).await
}

/// Delete a replicaset and wait until it is gone.
pub async fn delete_replicaset(cx: &Context, ns: &str, name: &str) -> Result<()> {
    let api: Api<ReplicaSet> = Api::namespaced(cx.k_client.clone(), ns);
    delete_and_wait(&api, name, cx.poll).await
}

/// Delete a pod and wait until it is gone.
pub async fn delete_pod(cx: &Context, ns: &str, name: &str) -> Result<()> {
    let api: Api<Pod> = Api::namespaced(cx.k_client.clone(), ns);
    delete_and_wait(&api, name, cx.poll).await
}

#[cfg(test)]
mod tests {
    use k8s_openapi::api::{
        apps::v1::{DaemonSetStatus, DeploymentStatus, StatefulSetStatus},
        core::v1::{PodCondition, PodStatus},
    };

    use super::*;
    use crate::{
        define::{
            daemonset::define_daemonset, deployment::define_deployment, pod::define_pod,
            statefulset::define_statefulset, Replicated,
        },
        labels::selector_labels,
        utils::test::timeout_after_1s,
    };

    fn ready_deployment(replicas: i32) -> Deployment {
        let mut deployment =
            define_deployment("web", "ns", "busybox", &selector_labels("web")).with_replicas(replicas);
        deployment.metadata.generation = Some(2);
        deployment.status = Some(DeploymentStatus {
            observed_generation: Some(2),
            replicas: Some(replicas),
            ready_replicas: Some(replicas),
            available_replicas: Some(replicas),
            updated_replicas: Some(replicas),
            ..Default::default()
        });
        deployment
    }

    #[test]
    fn deployment_readiness() {
        assert!(is_deployment_ready(&ready_deployment(3)));

        let mut stale = ready_deployment(3);
        stale.metadata.generation = Some(3);
        assert!(!is_deployment_ready(&stale));

        let mut partial = ready_deployment(3);
        partial.status.as_mut().unwrap().ready_replicas = Some(2);
        assert!(!is_deployment_ready(&partial));

        let fresh = define_deployment("web", "ns", "busybox", &selector_labels("web"));
        assert!(!is_deployment_ready(&fresh));
    }

    #[test]
    fn statefulset_and_daemonset_readiness() {
        let mut sts = define_statefulset("db", "ns", "busybox", &selector_labels("db"));
        assert!(!is_statefulset_ready(&sts));
        sts.status = Some(StatefulSetStatus {
            replicas: 1,
            ready_replicas: Some(1),
            ..Default::default()
        });
        assert!(is_statefulset_ready(&sts));

        let mut ds = define_daemonset("agent", "ns", "busybox", &selector_labels("agent"));
        ds.status = Some(DaemonSetStatus {
            desired_number_scheduled: 0,
            ..Default::default()
        });
        assert!(!is_daemonset_ready(&ds));
        ds.status = Some(DaemonSetStatus {
            desired_number_scheduled: 2,
            number_ready: 2,
            number_available: Some(2),
            ..Default::default()
        });
        assert!(is_daemonset_ready(&ds));
    }

    #[test]
    fn pod_readiness_follows_ready_condition() {
        let mut pod = define_pod("p", "ns", "busybox", &selector_labels("p"));
        assert!(!is_pod_ready(&pod));
        pod.status = Some(PodStatus {
            conditions: Some(vec![
                PodCondition {
                    type_: "PodScheduled".to_owned(),
                    status: "True".to_owned(),
                    ..Default::default()
                },
                PodCondition {
                    type_: "Ready".to_owned(),
                    status: "False".to_owned(),
                    ..Default::default()
                },
            ]),
            ..Default::default()
        });
        assert!(!is_pod_ready(&pod));
        pod.status.as_mut().unwrap().conditions.as_mut().unwrap()[1].status = "True".to_owned();
        assert!(is_pod_ready(&pod));
    }

    #[tokio::test]
    async fn create_and_wait_polls_until_ready() {
        let (testctx, mut server) = Context::test();
        let mocksrv = tokio::spawn(async move {
            let (request, send) = server.next().await;
            assert_eq!(request.method, "POST");
            assert_eq!(request.path, "/apis/apps/v1/namespaces/ns/deployments");
            assert_eq!(request.body["spec"]["replicas"], 2);
            send.echo(&request);

            let (request, send) = server.next().await;
            assert_eq!(request.path, "/apis/apps/v1/namespaces/ns/deployments/web");
            let mut partial = ready_deployment(2);
            partial.status.as_mut().unwrap().ready_replicas = Some(1);
            send.json(&partial);

            let (_, send) = server.next().await;
            send.json(&ready_deployment(2));
            let (_, send) = server.next().await;
            send.json(&ready_deployment(2));
        });
        let deployment =
            define_deployment("web", "ns", "busybox", &selector_labels("web")).with_replicas(2);
        let created = create_and_wait_until_deployment_is_ready(&testctx, &deployment)
            .await
            .expect("deployment ready");
        assert!(is_deployment_ready(&created));
        timeout_after_1s(mocksrv).await;
    }

    #[tokio::test]
    async fn create_and_wait_times_out() {
        let (testctx, mut server) = Context::test();
        let mocksrv = tokio::spawn(async move {
            let (request, send) = server.next().await;
            send.echo(&request);
            loop {
                let (_, send) = server.next().await;
                send.json(&define_pod("p", "ns", "busybox", &selector_labels("p")));
            }
        });
        let pod = define_pod("p", "ns", "busybox", &selector_labels("p"));
        let err = create_and_wait_until_pod_is_ready(&testctx, &pod)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }), "{err:?}");
        mocksrv.abort();
    }

    #[tokio::test]
    async fn scale_deployment_patches_replicas() {
        let (testctx, mut server) = Context::test();
        let mocksrv = tokio::spawn(async move {
            let (request, send) = server.next().await;
            assert_eq!(request.method, "PATCH");
            assert_eq!(request.path, "/apis/apps/v1/namespaces/ns/deployments/web");
            assert_eq!(request.body, json!({"spec": {"replicas": 3}}));
            send.json(&ready_deployment(3));

            let (_, send) = server.next().await;
            send.json(&ready_deployment(3));
        });
        scale_deployment(&testctx, "ns", "web", 3)
            .await
            .expect("scale");
        timeout_after_1s(mocksrv).await;
    }
}
