use k8s_openapi::api::{
    core::v1::ServiceAccount,
    rbac::v1::{ClusterRole, ClusterRoleBinding, PolicyRule, Role, RoleBinding, RoleRef, Subject},
};
use kube::core::ObjectMeta;

const RBAC_API_GROUP: &str = "rbac.authorization.k8s.io";

/// Define a service account.
pub fn define_service_account(name: &str, ns: &str) -> ServiceAccount {
    ServiceAccount {
        metadata: ObjectMeta {
            name: Some(name.to_owned()),
            namespace: Some(ns.to_owned()),
            ..ObjectMeta::default()
        },
        ..Default::default()
    }
}

/// Define a namespaced role with a single rule.
pub fn define_role(name: &str, ns: &str, rule: PolicyRule) -> Role {
    Role {
        metadata: ObjectMeta {
            name: Some(name.to_owned()),
            namespace: Some(ns.to_owned()),
            ..ObjectMeta::default()
        },
        rules: Some(vec![rule]),
    }
}

/// Bind a role to a service account of the same namespace.
pub fn define_role_binding(name: &str, ns: &str, role: &str, service_account: &str) -> RoleBinding {
    RoleBinding {
        metadata: ObjectMeta {
            name: Some(name.to_owned()),
            namespace: Some(ns.to_owned()),
            ..ObjectMeta::default()
        },
        role_ref: role_ref("Role", role),
        subjects: Some(vec![service_account_subject(ns, service_account)]),
    }
}

/// Define a cluster role with a single rule.
pub fn define_cluster_role(name: &str, rule: PolicyRule) -> ClusterRole {
    ClusterRole {
        metadata: ObjectMeta {
            name: Some(name.to_owned()),
            ..ObjectMeta::default()
        },
        rules: Some(vec![rule]),
        ..Default::default()
    }
}

/// Bind a cluster role to a service account.
pub fn define_cluster_role_binding(
    name: &str,
    cluster_role: &str,
    ns: &str,
    service_account: &str,
) -> ClusterRoleBinding {
    ClusterRoleBinding {
        metadata: ObjectMeta {
            name: Some(name.to_owned()),
            ..ObjectMeta::default()
        },
        role_ref: role_ref("ClusterRole", cluster_role),
        subjects: Some(vec![service_account_subject(ns, service_account)]),
    }
}

/// A rule granting `verbs` on `resources` of the given API group.
pub fn policy_rule(api_group: &str, resources: &[&str], verbs: &[&str]) -> PolicyRule {
    PolicyRule {
        api_groups: Some(vec![api_group.to_owned()]),
        resources: Some(resources.iter().map(|r| r.to_string()).collect()),
        verbs: verbs.iter().map(|v| v.to_string()).collect(),
        ..Default::default()
    }
}

fn role_ref(kind: &str, name: &str) -> RoleRef {
    RoleRef {
        api_group: RBAC_API_GROUP.to_owned(),
        kind: kind.to_owned(),
        name: name.to_owned(),
    }
}

fn service_account_subject(ns: &str, name: &str) -> Subject {
    Subject {
        kind: "ServiceAccount".to_owned(),
        name: name.to_owned(),
        namespace: Some(ns.to_owned()),
        ..Default::default()
    }
}
