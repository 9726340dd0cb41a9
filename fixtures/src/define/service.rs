use std::collections::BTreeMap;

use k8s_openapi::{
    api::core::v1::{Service, ServicePort, ServiceSpec},
    apimachinery::pkg::util::intstr::IntOrString,
};
use kube::core::ObjectMeta;

/// Define a ClusterIP service forwarding `port` to pods matching `selector`.
///
/// `ip_family_policy` is one of `SingleStack`, `PreferDualStack` or `RequireDualStack`.
pub fn define_service(
    name: &str,
    ns: &str,
    port: i32,
    selector: &BTreeMap<String, String>,
    ip_family_policy: Option<&str>,
) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(name.to_owned()),
            namespace: Some(ns.to_owned()),
            ..ObjectMeta::default()
        },
        spec: Some(ServiceSpec {
            selector: Some(selector.clone()),
            ports: Some(vec![ServicePort {
                name: Some("http".to_owned()),
                port,
                protocol: Some("TCP".to_owned()),
                target_port: Some(IntOrString::Int(port)),
                ..Default::default()
            }]),
            ip_family_policy: ip_family_policy.map(str::to_owned),
            ..Default::default()
        }),
        ..Default::default()
    }
}
