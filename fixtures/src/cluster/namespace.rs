use std::fmt::Debug;

use k8s_openapi::api::{
    apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet},
    core::v1::{Namespace, PersistentVolumeClaim, Pod, ResourceQuota, Service, ServiceAccount},
    networking::v1::NetworkPolicy,
    rbac::v1::{Role, RoleBinding},
};
use kube::{api::ListParams, core::NamespaceResourceScope, Api, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::{
    define::namespace::define_namespace,
    labels::MANAGED_BY_LABEL_SELECTOR,
    olm::{CatalogSource, ClusterServiceVersion, InstallPlan, OperatorGroup, Subscription},
    utils::{create, delete_all, delete_and_wait, is_not_found, poll_until, Context},
    Error, Result,
};

const ACTIVE_PHASE: &str = "Active";
const TERMINATING_PHASE: &str = "Terminating";

fn phase(ns: &Namespace) -> Option<&str> {
    ns.status.as_ref().and_then(|status| status.phase.as_deref())
}

/// Report whether the namespace exists.
pub async fn namespace_exists(cx: &Context, name: &str) -> Result<bool> {
    let namespaces: Api<Namespace> = Api::all(cx.k_client.clone());
    Ok(namespaces.get_opt(name).await?.is_some())
}

/// Create a namespace and wait until it is `Active`.
///
/// A namespace of the same name that is still terminating is waited out first.
#[tracing::instrument(skip(cx))]
pub async fn create_namespace(cx: &Context, name: &str) -> Result<Namespace> {
    let namespaces = &Api::<Namespace>::all(cx.k_client.clone());

    if let Some(existing) = namespaces.get_opt(name).await? {
        if phase(&existing) == Some(TERMINATING_PHASE) {
            debug!(name, "waiting for terminating namespace to go away");
            poll_until(cx.poll, &format!("namespace {name} to terminate"), || async move {
                Ok(namespaces.get_opt(name).await?.is_none())
            })
            .await?;
        }
    }

    create(namespaces, &define_namespace(name)).await?;

    poll_until(cx.poll, &format!("namespace {name} to be active"), || async move {
        let ns = namespaces.get(name).await?;
        Ok(phase(&ns) == Some(ACTIVE_PHASE))
    })
    .await?;
    info!(name, "namespace active");
    Ok(namespaces.get(name).await?)
}

/// Delete a namespace and wait until it is fully removed.
#[tracing::instrument(skip(cx))]
pub async fn delete_namespace_and_wait(cx: &Context, name: &str) -> Result<()> {
    let namespaces: Api<Namespace> = Api::all(cx.k_client.clone());
    delete_and_wait(&namespaces, name, cx.poll).await
}

async fn clean<K>(cx: &Context, ns: &str, skip: impl Fn(&str) -> bool) -> Result<()>
where
    K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
    <K as Resource>::DynamicType: Default,
{
    let kind = K::kind(&Default::default()).to_string();
    let api: Api<K> = Api::namespaced(cx.k_client.clone(), ns);
    // Deletes already tolerate NotFound, so a NotFound here comes from the list: the kind is
    // not served, e.g. OLM is not installed.
    match delete_all(&api, skip).await {
        Ok(0) => Ok(()),
        Ok(deleted) => {
            debug!(%kind, deleted, "cleaned");
            Ok(())
        }
        Err(Error::Kube { source }) if is_not_found(&source) => {
            debug!(%kind, "kind not served, nothing to clean");
            Ok(())
        }
        Err(err) => Err(err),
    }
}

/// Remove every object the suites create from a namespace, keeping the namespace.
///
/// Controllers go first so their pods are not recreated, OLM objects go last.
#[tracing::instrument(skip(cx))]
pub async fn clean_namespace(cx: &Context, ns: &str) -> Result<()> {
    let keep_none = |_: &str| false;
    clean::<Deployment>(cx, ns, keep_none).await?;
    clean::<StatefulSet>(cx, ns, keep_none).await?;
    clean::<DaemonSet>(cx, ns, keep_none).await?;
    clean::<ReplicaSet>(cx, ns, keep_none).await?;
    clean::<Pod>(cx, ns, keep_none).await?;
    clean::<Service>(cx, ns, keep_none).await?;
    clean::<PersistentVolumeClaim>(cx, ns, keep_none).await?;
    clean::<ServiceAccount>(cx, ns, |name| name == "default").await?;
    clean::<Role>(cx, ns, keep_none).await?;
    clean::<RoleBinding>(cx, ns, keep_none).await?;
    clean::<NetworkPolicy>(cx, ns, keep_none).await?;
    clean::<ResourceQuota>(cx, ns, keep_none).await?;
    clean::<Subscription>(cx, ns, keep_none).await?;
    clean::<ClusterServiceVersion>(cx, ns, keep_none).await?;
    clean::<OperatorGroup>(cx, ns, keep_none).await?;
    clean::<InstallPlan>(cx, ns, keep_none).await?;
    clean::<CatalogSource>(cx, ns, keep_none).await?;

    let pods = &Api::<Pod>::namespaced(cx.k_client.clone(), ns);
    let pvcs = &Api::<PersistentVolumeClaim>::namespaced(cx.k_client.clone(), ns);
    poll_until(cx.poll, &format!("namespace {ns} to be empty"), || async move {
        let pods_left = pods.list(&Default::default()).await?.items.len();
        let pvcs_left = pvcs.list(&Default::default()).await?.items.len();
        Ok(pods_left == 0 && pvcs_left == 0)
    })
    .await?;
    info!(ns, "namespace cleaned");
    Ok(())
}

/// Delete every namespace labelled as created by the suites, e.g. left over by aborted runs.
///
/// Returns the names of the deleted namespaces.
#[tracing::instrument(skip(cx))]
pub async fn delete_managed_namespaces(cx: &Context) -> Result<Vec<String>> {
    let namespaces: Api<Namespace> = Api::all(cx.k_client.clone());
    let managed = namespaces
        .list(&ListParams::default().labels(MANAGED_BY_LABEL_SELECTOR))
        .await?;
    let mut deleted = Vec::new();
    for ns in managed {
        let name = ns.name_any();
        delete_and_wait(&namespaces, &name, cx.poll).await?;
        deleted.push(name);
    }
    info!(count = deleted.len(), "managed namespaces deleted");
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use k8s_openapi::api::core::v1::NamespaceStatus;
    use kube::core::ObjectMeta;
    use serde_json::json;

    use super::*;
    use crate::utils::test::{timeout_after_1s, ApiServerVerifier};

    fn named<K: Resource + Default>(name: &str) -> K {
        let mut obj = K::default();
        *obj.meta_mut() = ObjectMeta {
            name: Some(name.to_owned()),
            namespace: Some("qe".to_owned()),
            ..ObjectMeta::default()
        };
        obj
    }

    async fn expect_empty_list(server: &mut ApiServerVerifier, path: &str) {
        let (request, send) = server.next().await;
        assert_eq!(request.method, "GET");
        assert_eq!(request.path, path);
        send.list::<Pod>("Any", "v1", &[]);
    }

    fn namespace(name: &str, phase: &str) -> Namespace {
        let mut ns = define_namespace(name);
        ns.status = Some(NamespaceStatus {
            phase: Some(phase.to_owned()),
            ..Default::default()
        });
        ns
    }

    #[tokio::test]
    async fn create_namespace_waits_until_active() {
        let (testctx, mut server) = Context::test();
        let mocksrv = tokio::spawn(async move {
            let (request, send) = server.next().await;
            assert_eq!(request.method, "GET");
            assert_eq!(request.path, "/api/v1/namespaces/qe-ns");
            send.not_found();

            let (request, send) = server.next().await;
            assert_eq!(request.method, "POST");
            assert_eq!(request.path, "/api/v1/namespaces");
            assert_eq!(request.body["metadata"]["name"], "qe-ns");
            assert_eq!(
                request.body["metadata"]["labels"],
                json!({"managed-by": "certsuite-qe"})
            );
            send.echo(&request);

            let (_, send) = server.next().await;
            send.json(&namespace("qe-ns", "Pending"));
            let (_, send) = server.next().await;
            send.json(&namespace("qe-ns", "Active"));
            let (_, send) = server.next().await;
            send.json(&namespace("qe-ns", "Active"));
        });
        let ns = create_namespace(&testctx, "qe-ns").await.expect("create");
        assert_eq!(phase(&ns), Some("Active"));
        timeout_after_1s(mocksrv).await;
    }

    #[tokio::test]
    async fn create_namespace_waits_out_terminating() {
        let (testctx, mut server) = Context::test();
        let mocksrv = tokio::spawn(async move {
            let (_, send) = server.next().await;
            send.json(&namespace("qe-ns", "Terminating"));
            let (_, send) = server.next().await;
            send.json(&namespace("qe-ns", "Terminating"));
            let (_, send) = server.next().await;
            send.not_found();

            let (request, send) = server.next().await;
            assert_eq!(request.method, "POST");
            send.echo(&request);
            let (_, send) = server.next().await;
            send.json(&namespace("qe-ns", "Active"));
            let (_, send) = server.next().await;
            send.json(&namespace("qe-ns", "Active"));
        });
        create_namespace(&testctx, "qe-ns").await.expect("create");
        timeout_after_1s(mocksrv).await;
    }

    #[tokio::test]
    async fn namespace_exists_maps_not_found() {
        let (testctx, mut server) = Context::test();
        let mocksrv = tokio::spawn(async move {
            let (_, send) = server.next().await;
            send.not_found();
            let (_, send) = server.next().await;
            send.json(&namespace("present", "Active"));
        });
        assert!(!namespace_exists(&testctx, "missing").await.unwrap());
        assert!(namespace_exists(&testctx, "present").await.unwrap());
        timeout_after_1s(mocksrv).await;
    }

    #[tokio::test]
    async fn clean_namespace_deletes_in_order_and_waits() {
        let (testctx, mut server) = Context::test();
        let mocksrv = tokio::spawn(async move {
            let (request, send) = server.next().await;
            assert_eq!(request.method, "GET");
            assert_eq!(request.path, "/apis/apps/v1/namespaces/qe/deployments");
            send.list("Deployment", "apps/v1", &[named::<Deployment>("web")]);
            let (request, send) = server.next().await;
            assert_eq!(request.method, "DELETE");
            assert_eq!(request.path, "/apis/apps/v1/namespaces/qe/deployments/web");
            assert_eq!(request.body["propagationPolicy"], "Foreground");
            send.json(&named::<Deployment>("web"));

            for path in [
                "/apis/apps/v1/namespaces/qe/statefulsets",
                "/apis/apps/v1/namespaces/qe/daemonsets",
                "/apis/apps/v1/namespaces/qe/replicasets",
                "/api/v1/namespaces/qe/pods",
                "/api/v1/namespaces/qe/services",
                "/api/v1/namespaces/qe/persistentvolumeclaims",
            ] {
                expect_empty_list(&mut server, path).await;
            }

            let (request, send) = server.next().await;
            assert_eq!(request.path, "/api/v1/namespaces/qe/serviceaccounts");
            send.list(
                "ServiceAccount",
                "v1",
                &[
                    named::<ServiceAccount>("default"),
                    named::<ServiceAccount>("builder"),
                ],
            );
            let (request, send) = server.next().await;
            assert_eq!(request.method, "DELETE");
            assert_eq!(request.path, "/api/v1/namespaces/qe/serviceaccounts/builder");
            send.json(&named::<ServiceAccount>("builder"));

            for path in [
                "/apis/rbac.authorization.k8s.io/v1/namespaces/qe/roles",
                "/apis/rbac.authorization.k8s.io/v1/namespaces/qe/rolebindings",
                "/apis/networking.k8s.io/v1/namespaces/qe/networkpolicies",
                "/api/v1/namespaces/qe/resourcequotas",
                "/apis/operators.coreos.com/v1alpha1/namespaces/qe/subscriptions",
                "/apis/operators.coreos.com/v1alpha1/namespaces/qe/clusterserviceversions",
                "/apis/operators.coreos.com/v1/namespaces/qe/operatorgroups",
                "/apis/operators.coreos.com/v1alpha1/namespaces/qe/installplans",
                "/apis/operators.coreos.com/v1alpha1/namespaces/qe/catalogsources",
            ] {
                expect_empty_list(&mut server, path).await;
            }

            // A pod is still terminating on the first check.
            let (request, send) = server.next().await;
            assert_eq!(request.path, "/api/v1/namespaces/qe/pods");
            send.list("Pod", "v1", &[named::<Pod>("web-1")]);
            expect_empty_list(&mut server, "/api/v1/namespaces/qe/persistentvolumeclaims").await;
            expect_empty_list(&mut server, "/api/v1/namespaces/qe/pods").await;
            expect_empty_list(&mut server, "/api/v1/namespaces/qe/persistentvolumeclaims").await;
        });
        clean_namespace(&testctx, "qe").await.expect("clean");
        timeout_after_1s(mocksrv).await;
    }

    #[tokio::test]
    async fn clean_namespace_skips_kinds_not_served() {
        let (testctx, mut server) = Context::test();
        let mocksrv = tokio::spawn(async move {
            // Every OLM kind answers 404 as on a cluster without OLM.
            for _ in 0..17 {
                let (request, send) = server.next().await;
                assert_eq!(request.method, "GET");
                if request.path.starts_with("/apis/operators.coreos.com/") {
                    send.not_found();
                } else {
                    send.list::<Pod>("Any", "v1", &[]);
                }
            }
            expect_empty_list(&mut server, "/api/v1/namespaces/qe/pods").await;
            expect_empty_list(&mut server, "/api/v1/namespaces/qe/persistentvolumeclaims").await;
        });
        clean_namespace(&testctx, "qe").await.expect("clean");
        timeout_after_1s(mocksrv).await;
    }

    #[tokio::test]
    async fn clean_namespace_propagates_other_list_errors() {
        let (testctx, mut server) = Context::test();
        let mocksrv = tokio::spawn(async move {
            let (_, send) = server.next().await;
            send.error(403, "Forbidden");
        });
        let err = clean_namespace(&testctx, "qe").await.unwrap_err();
        assert!(matches!(err, Error::Kube { .. }), "{err:?}");
        timeout_after_1s(mocksrv).await;
    }

    #[tokio::test]
    async fn delete_managed_namespaces_uses_label_selector() {
        let (testctx, mut server) = Context::test();
        let mocksrv = tokio::spawn(async move {
            let (request, send) = server.next().await;
            assert_eq!(request.path, "/api/v1/namespaces");
            assert!(
                request.query.contains("labelSelector=managed-by%3Dcertsuite-qe"),
                "{}",
                request.query
            );
            send.list("Namespace", "v1", &[namespace("lifecycle-tests-abc", "Active")]);

            let (request, send) = server.next().await;
            assert_eq!(request.method, "DELETE");
            assert_eq!(request.path, "/api/v1/namespaces/lifecycle-tests-abc");
            send.json(&namespace("lifecycle-tests-abc", "Terminating"));
            let (_, send) = server.next().await;
            send.not_found();
        });
        let deleted = delete_managed_namespaces(&testctx).await.expect("delete");
        assert_eq!(deleted, vec!["lifecycle-tests-abc".to_owned()]);
        timeout_after_1s(mocksrv).await;
    }
}
