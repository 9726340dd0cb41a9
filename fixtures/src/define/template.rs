//! Mutations shared by every object that carries a pod template.
use std::collections::BTreeMap;

use k8s_openapi::{
    api::{
        apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet},
        core::v1::{
            Affinity, Container, ContainerPort, ExecAction, Lifecycle, LifecycleHandler,
            NodeAffinity, NodeSelector, NodeSelectorRequirement, NodeSelectorTerm,
            PersistentVolumeClaimVolumeSource, Pod, PodAffinity, PodAffinityTerm,
            PodAntiAffinity, PodSpec, Probe, ResourceRequirements, SecurityContext, Toleration,
            Volume, VolumeMount,
        },
    },
    apimachinery::pkg::{api::resource::Quantity, apis::meta::v1::LabelSelector},
};

/// Topology key used by the affinity helpers.
pub const HOSTNAME_TOPOLOGY_KEY: &str = "kubernetes.io/hostname";

/// Gives uniform access to the pod spec and pod labels of a workload.
///
/// Implemented for [`Pod`] and the workload controllers so a single set of
/// `with_*` mutations serves all of them.
pub trait WorkloadTemplate: Sized {
    /// Mutable access to the pod spec, created when missing.
    fn pod_spec_mut(&mut self) -> &mut PodSpec;
    /// Mutable access to the pod labels, created when missing.
    fn pod_labels_mut(&mut self) -> &mut BTreeMap<String, String>;
    /// Read access to the pod spec.
    fn pod_spec(&self) -> Option<&PodSpec>;

    /// Apply a function to every container.
    fn with_containers(mut self, f: impl Fn(&mut Container)) -> Self {
        self.pod_spec_mut().containers.iter_mut().for_each(f);
        self
    }

    /// Add an extra label to the pod template.
    fn with_label(mut self, key: &str, value: &str) -> Self {
        self.pod_labels_mut()
            .insert(key.to_owned(), value.to_owned());
        self
    }

    /// Exec readiness probe on every container.
    fn with_readiness_probe(self) -> Self {
        self.with_containers(|c| c.readiness_probe = Some(exec_probe()))
    }

    /// Exec liveness probe on every container.
    fn with_liveness_probe(self) -> Self {
        self.with_containers(|c| c.liveness_probe = Some(exec_probe()))
    }

    /// Exec startup probe on every container.
    fn with_startup_probe(self) -> Self {
        self.with_containers(|c| c.startup_probe = Some(exec_probe()))
    }

    /// preStop hook on every container.
    fn with_pre_stop(self) -> Self {
        self.with_containers(|c| {
            c.lifecycle.get_or_insert_with(Lifecycle::default).pre_stop =
                Some(exec_handler("killall -0 tail"))
        })
    }

    /// postStart hook on every container.
    fn with_post_start(self) -> Self {
        self.with_containers(|c| {
            c.lifecycle.get_or_insert_with(Lifecycle::default).post_start =
                Some(exec_handler("echo started"))
        })
    }

    /// Set the image pull policy on every container.
    fn with_image_pull_policy(self, policy: &str) -> Self {
        self.with_containers(|c| c.image_pull_policy = Some(policy.to_owned()))
    }

    /// Replace the image of every container.
    fn with_image(self, image: &str) -> Self {
        self.with_containers(|c| c.image = Some(image.to_owned()))
    }

    /// Set requests and limits on every container.
    fn with_resources(
        self,
        cpu_request: &str,
        memory_request: &str,
        cpu_limit: &str,
        memory_limit: &str,
    ) -> Self {
        let quantities = |cpu: &str, memory: &str| {
            BTreeMap::from_iter([
                ("cpu".to_owned(), Quantity(cpu.to_owned())),
                ("memory".to_owned(), Quantity(memory.to_owned())),
            ])
        };
        let resources = ResourceRequirements {
            requests: Some(quantities(cpu_request, memory_request)),
            limits: Some(quantities(cpu_limit, memory_limit)),
            ..Default::default()
        };
        self.with_containers(|c| c.resources = Some(resources.clone()))
    }

    /// Expose a TCP port on every container.
    fn with_container_port(self, port: i32) -> Self {
        self.with_containers(|c| {
            c.ports.get_or_insert_with(Vec::new).push(ContainerPort {
                container_port: port,
                protocol: Some("TCP".to_owned()),
                ..Default::default()
            })
        })
    }

    /// Run every container privileged.
    fn with_privileged(self) -> Self {
        self.with_containers(|c| {
            c.security_context
                .get_or_insert_with(SecurityContext::default)
                .privileged = Some(true)
        })
    }

    /// Set runAsNonRoot (and a matching runAsUser) on every container.
    fn with_run_as_non_root(self, non_root: bool) -> Self {
        self.with_containers(|c| {
            let sc = c.security_context.get_or_insert_with(SecurityContext::default);
            sc.run_as_non_root = Some(non_root);
            sc.run_as_user = Some(if non_root { 1000 } else { 0 });
        })
    }

    /// Set readOnlyRootFilesystem on every container.
    fn with_read_only_root_filesystem(self, read_only: bool) -> Self {
        self.with_containers(|c| {
            c.security_context
                .get_or_insert_with(SecurityContext::default)
                .read_only_root_filesystem = Some(read_only)
        })
    }

    /// Add tolerations to the pod.
    fn with_tolerations(mut self, tolerations: Vec<Toleration>) -> Self {
        self.pod_spec_mut()
            .tolerations
            .get_or_insert_with(Vec::new)
            .extend(tolerations);
        self
    }

    /// Schedule onto nodes with the given labels.
    fn with_node_selector(mut self, selector: BTreeMap<String, String>) -> Self {
        self.pod_spec_mut().node_selector = Some(selector);
        self
    }

    /// Require that the node has `key` set to one of `values`.
    fn with_node_affinity(mut self, key: &str, values: Vec<String>) -> Self {
        let affinity = self.pod_spec_mut().affinity.get_or_insert_with(Affinity::default);
        affinity.node_affinity = Some(NodeAffinity {
            required_during_scheduling_ignored_during_execution: Some(NodeSelector {
                node_selector_terms: vec![NodeSelectorTerm {
                    match_expressions: Some(vec![NodeSelectorRequirement {
                        key: key.to_owned(),
                        operator: "In".to_owned(),
                        values: Some(values),
                    }]),
                    ..Default::default()
                }],
            }),
            ..Default::default()
        });
        self
    }

    /// Forbid two pods matching `labels` on the same node.
    fn with_pod_anti_affinity(mut self, labels: BTreeMap<String, String>) -> Self {
        let affinity = self.pod_spec_mut().affinity.get_or_insert_with(Affinity::default);
        affinity.pod_anti_affinity = Some(PodAntiAffinity {
            required_during_scheduling_ignored_during_execution: Some(vec![affinity_term(labels)]),
            ..Default::default()
        });
        self
    }

    /// Require pods matching `labels` on the same node.
    fn with_pod_affinity(mut self, labels: BTreeMap<String, String>) -> Self {
        let affinity = self.pod_spec_mut().affinity.get_or_insert_with(Affinity::default);
        affinity.pod_affinity = Some(PodAffinity {
            required_during_scheduling_ignored_during_execution: Some(vec![affinity_term(labels)]),
            ..Default::default()
        });
        self
    }

    /// Run the pod as the given service account.
    fn with_service_account(mut self, name: &str) -> Self {
        self.pod_spec_mut().service_account_name = Some(name.to_owned());
        self
    }

    /// Control automounting of the service account token.
    fn with_automount_token(mut self, automount: bool) -> Self {
        self.pod_spec_mut().automount_service_account_token = Some(automount);
        self
    }

    /// Share the node network namespace.
    fn with_host_network(mut self) -> Self {
        self.pod_spec_mut().host_network = Some(true);
        self
    }

    /// Share the node PID namespace.
    fn with_host_pid(mut self) -> Self {
        self.pod_spec_mut().host_pid = Some(true);
        self
    }

    /// Share the node IPC namespace.
    fn with_host_ipc(mut self) -> Self {
        self.pod_spec_mut().host_ipc = Some(true);
        self
    }

    /// Set the termination grace period.
    fn with_termination_grace_period(mut self, seconds: i64) -> Self {
        self.pod_spec_mut().termination_grace_period_seconds = Some(seconds);
        self
    }

    /// Mount a PVC at `mount_path` in every container.
    fn with_pvc(mut self, claim_name: &str, mount_path: &str) -> Self {
        let volume_name = format!("{claim_name}-volume");
        self.pod_spec_mut()
            .volumes
            .get_or_insert_with(Vec::new)
            .push(Volume {
                name: volume_name.clone(),
                persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                    claim_name: claim_name.to_owned(),
                    ..Default::default()
                }),
                ..Default::default()
            });
        self.with_containers(|c| {
            c.volume_mounts.get_or_insert_with(Vec::new).push(VolumeMount {
                name: volume_name.clone(),
                mount_path: mount_path.to_owned(),
                ..Default::default()
            })
        })
    }
}

/// Workloads with a replica count.
pub trait Replicated: WorkloadTemplate {
    /// Set the desired replicas.
    fn with_replicas(self, replicas: i32) -> Self;
}

fn exec_probe() -> Probe {
    Probe {
        exec: Some(ExecAction {
            command: Some(vec!["ls".to_owned()]),
        }),
        initial_delay_seconds: Some(5),
        period_seconds: Some(5),
        ..Default::default()
    }
}

fn exec_handler(script: &str) -> LifecycleHandler {
    LifecycleHandler {
        exec: Some(ExecAction {
            command: Some(vec![
                "/bin/sh".to_owned(),
                "-c".to_owned(),
                script.to_owned(),
            ]),
        }),
        ..Default::default()
    }
}

fn affinity_term(labels: BTreeMap<String, String>) -> PodAffinityTerm {
    PodAffinityTerm {
        label_selector: Some(LabelSelector {
            match_labels: Some(labels),
            ..Default::default()
        }),
        topology_key: HOSTNAME_TOPOLOGY_KEY.to_owned(),
        ..Default::default()
    }
}

impl WorkloadTemplate for Pod {
    fn pod_spec_mut(&mut self) -> &mut PodSpec {
        self.spec.get_or_insert_with(PodSpec::default)
    }
    fn pod_labels_mut(&mut self) -> &mut BTreeMap<String, String> {
        self.metadata.labels.get_or_insert_with(BTreeMap::new)
    }
    fn pod_spec(&self) -> Option<&PodSpec> {
        self.spec.as_ref()
    }
}

// The controllers all share the same `spec.template` layout.
macro_rules! impl_workload_template {
    ($($kind:ty),*) => {
        $(
            impl WorkloadTemplate for $kind {
                fn pod_spec_mut(&mut self) -> &mut PodSpec {
                    self.spec
                        .get_or_insert_with(Default::default)
                        .template
                        .spec
                        .get_or_insert_with(PodSpec::default)
                }
                fn pod_labels_mut(&mut self) -> &mut BTreeMap<String, String> {
                    self.spec
                        .get_or_insert_with(Default::default)
                        .template
                        .metadata
                        .get_or_insert_with(Default::default)
                        .labels
                        .get_or_insert_with(BTreeMap::new)
                }
                fn pod_spec(&self) -> Option<&PodSpec> {
                    self.spec.as_ref().and_then(|spec| spec.template.spec.as_ref())
                }
            }
        )*
    };
}

impl_workload_template!(Deployment, StatefulSet, DaemonSet);

// ReplicaSet is the odd one out, its template is optional.
impl WorkloadTemplate for ReplicaSet {
    fn pod_spec_mut(&mut self) -> &mut PodSpec {
        self.spec
            .get_or_insert_with(Default::default)
            .template
            .get_or_insert_with(Default::default)
            .spec
            .get_or_insert_with(PodSpec::default)
    }
    fn pod_labels_mut(&mut self) -> &mut BTreeMap<String, String> {
        self.spec
            .get_or_insert_with(Default::default)
            .template
            .get_or_insert_with(Default::default)
            .metadata
            .get_or_insert_with(Default::default)
            .labels
            .get_or_insert_with(BTreeMap::new)
    }
    fn pod_spec(&self) -> Option<&PodSpec> {
        self.spec
            .as_ref()
            .and_then(|spec| spec.template.as_ref())
            .and_then(|template| template.spec.as_ref())
    }
}

macro_rules! impl_replicated {
    ($($kind:ty),*) => {
        $(
            impl Replicated for $kind {
                fn with_replicas(mut self, replicas: i32) -> Self {
                    self.spec.get_or_insert_with(Default::default).replicas = Some(replicas);
                    self
                }
            }
        )*
    };
}

impl_replicated!(Deployment, StatefulSet, ReplicaSet);
