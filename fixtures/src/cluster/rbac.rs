use k8s_openapi::api::{
    core::v1::ServiceAccount,
    rbac::v1::{ClusterRole, ClusterRoleBinding, Role, RoleBinding},
};
use kube::Api;

use super::{create_cluster_scoped, create_namespaced};
use crate::{
    utils::{delete, Context},
    Result,
};

/// Create a service account.
pub async fn create_service_account(cx: &Context, sa: &ServiceAccount) -> Result<ServiceAccount> {
    create_namespaced(cx, sa).await
}

/// Delete a service account.
pub async fn delete_service_account(cx: &Context, ns: &str, name: &str) -> Result<()> {
    let api: Api<ServiceAccount> = Api::namespaced(cx.k_client.clone(), ns);
    delete(&api, name).await
}

/// Create a role.
pub async fn create_role(cx: &Context, role: &Role) -> Result<Role> {
    create_namespaced(cx, role).await
}

/// Delete a role.
pub async fn delete_role(cx: &Context, ns: &str, name: &str) -> Result<()> {
    let api: Api<Role> = Api::namespaced(cx.k_client.clone(), ns);
    delete(&api, name).await
}

/// Create a role binding.
pub async fn create_role_binding(cx: &Context, binding: &RoleBinding) -> Result<RoleBinding> {
    create_namespaced(cx, binding).await
}

/// Delete a role binding.
pub async fn delete_role_binding(cx: &Context, ns: &str, name: &str) -> Result<()> {
    let api: Api<RoleBinding> = Api::namespaced(cx.k_client.clone(), ns);
    delete(&api, name).await
}

/// Create a cluster role.
pub async fn create_cluster_role(cx: &Context, role: &ClusterRole) -> Result<ClusterRole> {
    create_cluster_scoped(cx, role).await
}

/// Delete a cluster role.
pub async fn delete_cluster_role(cx: &Context, name: &str) -> Result<()> {
    let api: Api<ClusterRole> = Api::all(cx.k_client.clone());
    delete(&api, name).await
}

/// Create a cluster role binding.
pub async fn create_cluster_role_binding(
    cx: &Context,
    binding: &ClusterRoleBinding,
) -> Result<ClusterRoleBinding> {
    create_cluster_scoped(cx, binding).await
}

/// Delete a cluster role binding.
pub async fn delete_cluster_role_binding(cx: &Context, name: &str) -> Result<()> {
    let api: Api<ClusterRoleBinding> = Api::all(cx.k_client.clone());
    delete(&api, name).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        define::rbac::{define_cluster_role, define_role_binding, define_service_account, policy_rule},
        utils::test::timeout_after_1s,
    };

    #[tokio::test]
    async fn namespaced_and_cluster_paths() {
        let (testctx, mut server) = Context::test();
        let mocksrv = tokio::spawn(async move {
            let (request, send) = server.next().await;
            assert_eq!(request.path, "/api/v1/namespaces/qe/serviceaccounts");
            send.echo(&request);

            let (request, send) = server.next().await;
            assert_eq!(
                request.path,
                "/apis/rbac.authorization.k8s.io/v1/namespaces/qe/rolebindings"
            );
            assert_eq!(request.body["roleRef"]["kind"], "Role");
            assert_eq!(request.body["subjects"][0]["name"], "qe-sa");
            send.echo(&request);

            let (request, send) = server.next().await;
            assert_eq!(request.path, "/apis/rbac.authorization.k8s.io/v1/clusterroles");
            send.already_exists();
            let (request, send) = server.next().await;
            assert_eq!(
                request.path,
                "/apis/rbac.authorization.k8s.io/v1/clusterroles/qe-reader"
            );
            send.json(&define_cluster_role("qe-reader", policy_rule("", &["pods"], &["get"])));

            let (request, send) = server.next().await;
            assert_eq!(request.method, "DELETE");
            assert_eq!(
                request.path,
                "/apis/rbac.authorization.k8s.io/v1/clusterroles/qe-reader"
            );
            send.not_found();
        });

        create_service_account(&testctx, &define_service_account("qe-sa", "qe"))
            .await
            .unwrap();
        create_role_binding(&testctx, &define_role_binding("qe-rb", "qe", "qe-role", "qe-sa"))
            .await
            .unwrap();
        create_cluster_role(
            &testctx,
            &define_cluster_role("qe-reader", policy_rule("", &["pods"], &["get"])),
        )
        .await
        .unwrap();
        delete_cluster_role(&testctx, "qe-reader").await.unwrap();
        timeout_after_1s(mocksrv).await;
    }
}
