//! The `tnf_config.yml` file telling certsuite what to inspect.
use std::path::{Path, PathBuf};

use certqe_common::params::CERTSUITE_CONFIG_FILE_NAME;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// Namespace certsuite inspects.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetNamespace {
    /// Namespace name.
    pub name: String,
}

/// Selects the CRDs under test by name suffix.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CrdFilter {
    /// CRDs whose name ends with this suffix are under test.
    pub name_suffix: String,
    /// Whether the custom resources are expected to be scalable.
    pub scalable: bool,
}

/// Identifies a container image for the certification checks.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerImageIdentifier {
    /// Image repository, e.g. `rhel8/nginx-116`.
    pub repository: String,
    /// Image registry, e.g. `registry.access.redhat.com`.
    pub registry: String,
    /// Image tag.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag: String,
    /// Image digest, takes precedence over the tag.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub digest: String,
}

/// Kernel module allowed to taint the kernel.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceptedKernelTaint {
    /// Module name.
    pub module: String,
}

/// Helm chart excluded from the checks.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipHelmChart {
    /// Chart name.
    pub name: String,
}

/// Content of the certsuite config file.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct CertsuiteConfig {
    /// Namespaces under test.
    #[serde(rename = "targetNameSpaces")]
    pub target_namespaces: Vec<TargetNamespace>,
    /// Labels of the pods under test, formatted as `key: value`.
    pub pods_under_test_labels: Vec<String>,
    /// Labels of the operators under test, formatted as `key: value`.
    pub operators_under_test_labels: Vec<String>,
    /// CRDs under test.
    pub target_crd_filters: Vec<CrdFilter>,
    /// Images checked against the certified container catalog.
    #[serde(rename = "certifiedcontainerinfo")]
    pub certified_container_info: Vec<ContainerImageIdentifier>,
    /// Kernel taints that do not fail the platform checks.
    pub accepted_kernel_taints: Vec<AcceptedKernelTaint>,
    /// Helm charts excluded from the checks.
    pub skip_helm_chart_list: Vec<SkipHelmChart>,
    /// Services excluded from the networking checks.
    #[serde(rename = "servicesignorelist")]
    pub services_ignore_list: Vec<String>,
}

impl CertsuiteConfig {
    /// Config targeting the given namespaces and labels.
    pub fn new(namespaces: &[&str], pod_labels: &[String], operator_labels: &[String]) -> Self {
        Self {
            target_namespaces: namespaces
                .iter()
                .map(|name| TargetNamespace {
                    name: name.to_string(),
                })
                .collect(),
            pods_under_test_labels: pod_labels.to_vec(),
            operators_under_test_labels: operator_labels.to_vec(),
            ..Default::default()
        }
    }

    /// Add a namespace under test.
    pub fn with_namespace(mut self, name: &str) -> Self {
        self.target_namespaces.push(TargetNamespace {
            name: name.to_owned(),
        });
        self
    }

    /// Add a CRD filter.
    pub fn with_crd_filter(mut self, name_suffix: &str, scalable: bool) -> Self {
        self.target_crd_filters.push(CrdFilter {
            name_suffix: name_suffix.to_owned(),
            scalable,
        });
        self
    }

    /// Add an image to check against the certified container catalog.
    pub fn with_certified_container(
        mut self,
        repository: &str,
        registry: &str,
        tag: &str,
        digest: &str,
    ) -> Self {
        self.certified_container_info.push(ContainerImageIdentifier {
            repository: repository.to_owned(),
            registry: registry.to_owned(),
            tag: tag.to_owned(),
            digest: digest.to_owned(),
        });
        self
    }

    /// Accept a kernel taint caused by `module`.
    pub fn with_accepted_kernel_taint(mut self, module: &str) -> Self {
        self.accepted_kernel_taints.push(AcceptedKernelTaint {
            module: module.to_owned(),
        });
        self
    }

    /// Exclude a helm chart from the checks.
    pub fn with_skipped_helm_chart(mut self, name: &str) -> Self {
        self.skip_helm_chart_list.push(SkipHelmChart {
            name: name.to_owned(),
        });
        self
    }

    /// Exclude a service from the networking checks.
    pub fn with_ignored_service(mut self, name: &str) -> Self {
        self.services_ignore_list.push(name.to_owned());
        self
    }
}

/// Write `config` as `tnf_config.yml` in `dir`, creating the directory when needed.
#[tracing::instrument(skip(config))]
pub fn define_certsuite_config(dir: &Path, config: &CertsuiteConfig) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|source| Error::Io {
        path: dir.to_owned(),
        source,
    })?;
    let path = dir.join(CERTSUITE_CONFIG_FILE_NAME);
    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(&path, yaml).map_err(|source| Error::Io {
        path: path.clone(),
        source,
    })?;
    debug!(path = %path.display(), "certsuite config written");
    Ok(path)
}
