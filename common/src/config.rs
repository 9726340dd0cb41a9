//! Suite configuration.
//!
//! Values come from three layers, later layers win:
//! compiled defaults, an optional YAML file named by `CERTQE_CONFIG_FILE`,
//! and environment variables.
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

/// Environment variable naming an optional YAML config file.
pub const CONFIG_FILE_ENV: &str = "CERTQE_CONFIG_FILE";

/// Errors produced while loading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path of the file.
        path: PathBuf,
        /// Underlying io error.
        #[source]
        source: std::io::Error,
    },
    /// The config file is not valid YAML or has unknown keys.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// Path of the file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_yaml::Error,
    },
    /// A boolean environment variable has an unexpected value.
    #[error("invalid value {value:?} for {name}, expected a boolean")]
    InvalidBool {
        /// Name of the variable.
        name: &'static str,
        /// Value found in the environment.
        value: String,
    },
}

/// How certsuite is started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Run the published certsuite container image.
    Container,
    /// Run the scripts from a local checkout.
    Binary(PathBuf),
}

/// Resolved configuration used by every suite.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Kubeconfig handed to certsuite and used for the fixture client.
    pub kubeconfig: PathBuf,
    /// Directory where the certsuite config file is written.
    pub config_dir: PathBuf,
    /// Directory where certsuite writes its claim and JUnit reports.
    pub report_dir: PathBuf,
    /// Skip checks that disrupt workloads.
    pub non_intrusive_only: bool,
    /// Set when running unit tests, no cluster is contacted.
    pub unit_test: bool,
    /// Path to a certsuite checkout. When unset certsuite runs in a container.
    pub repo_path: Option<PathBuf>,
    /// Certsuite container image without tag.
    pub image: String,
    /// Certsuite container image tag.
    pub image_tag: String,
    /// Container engine used in container mode.
    pub container_engine: String,
    /// Image used for workloads deployed as fixtures.
    pub test_image: String,
    /// Label identifying worker nodes.
    pub worker_label: String,
    /// Keep report directories after a test finishes.
    pub keep_reports: bool,
}

impl Default for Config {
    fn default() -> Self {
        let home = std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/root"));
        Self {
            kubeconfig: home.join(".kube").join("config"),
            config_dir: PathBuf::from("/tmp/tnf/config"),
            report_dir: PathBuf::from("/tmp/tnf/report"),
            non_intrusive_only: false,
            unit_test: false,
            repo_path: None,
            image: "quay.io/testnetworkfunction/cnf-certification-test".to_owned(),
            image_tag: "unstable".to_owned(),
            container_engine: "docker".to_owned(),
            test_image: "quay.io/testnetworkfunction/cnf-test-partner:latest".to_owned(),
            worker_label: "node-role.kubernetes.io/worker".to_owned(),
            keep_reports: false,
        }
    }
}

/// Partial config as found in a YAML file, every field is optional.
#[derive(Deserialize, Debug, Default)]
#[serde(default, rename_all = "snake_case", deny_unknown_fields)]
struct FileConfig {
    kubeconfig: Option<PathBuf>,
    config_dir: Option<PathBuf>,
    report_dir: Option<PathBuf>,
    non_intrusive_only: Option<bool>,
    repo_path: Option<PathBuf>,
    image: Option<String>,
    image_tag: Option<String>,
    container_engine: Option<String>,
    test_image: Option<String>,
    worker_label: Option<String>,
    keep_reports: Option<bool>,
}

impl Config {
    /// Load the configuration from defaults, the optional file and the process environment.
    pub fn load() -> Result<Self, Error> {
        let mut config = Self::default();
        if let Some(path) = std::env::var_os(CONFIG_FILE_ENV) {
            config = config.merge_file(Path::new(&path))?;
        }
        config.with_env(|name| std::env::var(name).ok())
    }

    /// Overlay the values of a YAML file.
    pub fn merge_file(self, path: &Path) -> Result<Self, Error> {
        let data = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_owned(),
            source,
        })?;
        let file: FileConfig = serde_yaml::from_str(&data).map_err(|source| Error::Parse {
            path: path.to_owned(),
            source,
        })?;
        Ok(Self {
            kubeconfig: file.kubeconfig.unwrap_or(self.kubeconfig),
            config_dir: file.config_dir.unwrap_or(self.config_dir),
            report_dir: file.report_dir.unwrap_or(self.report_dir),
            non_intrusive_only: file.non_intrusive_only.unwrap_or(self.non_intrusive_only),
            unit_test: self.unit_test,
            repo_path: file.repo_path.or(self.repo_path),
            image: file.image.unwrap_or(self.image),
            image_tag: file.image_tag.unwrap_or(self.image_tag),
            container_engine: file.container_engine.unwrap_or(self.container_engine),
            test_image: file.test_image.unwrap_or(self.test_image),
            worker_label: file.worker_label.unwrap_or(self.worker_label),
            keep_reports: file.keep_reports.unwrap_or(self.keep_reports),
        })
    }

    /// Overlay environment values using the given lookup function.
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.is_empty());

        if let Some(value) = non_empty("KUBECONFIG") {
            self.kubeconfig = value.into();
        }
        if let Some(value) = non_empty("TNF_CONFIG_DIR") {
            self.config_dir = value.into();
        }
        if let Some(value) = non_empty("TNF_REPORT_DIR") {
            self.report_dir = value.into();
        }
        if let Some(value) = non_empty("TNF_REPO_PATH") {
            self.repo_path = Some(value.into());
        }
        if let Some(value) = non_empty("TNF_IMAGE") {
            self.image = value;
        }
        if let Some(value) = non_empty("TNF_IMAGE_TAG") {
            self.image_tag = value;
        }
        if let Some(value) = non_empty("TNF_CONTAINER_CLIENT") {
            self.container_engine = value;
        }
        if let Some(value) = non_empty("TEST_IMAGE") {
            self.test_image = value;
        }
        if let Some(value) = non_empty("ROLE_WORKER") {
            self.worker_label = value;
        }
        if let Some(value) = non_empty("TNF_NON_INTRUSIVE_ONLY") {
            self.non_intrusive_only = parse_bool("TNF_NON_INTRUSIVE_ONLY", &value)?;
        }
        if let Some(value) = non_empty("UNIT_TEST") {
            self.unit_test = parse_bool("UNIT_TEST", &value)?;
        }
        if let Some(value) = non_empty("TNF_KEEP_REPORTS") {
            self.keep_reports = parse_bool("TNF_KEEP_REPORTS", &value)?;
        }
        Ok(self)
    }

    /// Full certsuite image reference.
    pub fn image_ref(&self) -> String {
        format!("{}:{}", self.image, self.image_tag)
    }

    /// Report how certsuite should be started.
    pub fn run_mode(&self) -> RunMode {
        match &self.repo_path {
            Some(path) => RunMode::Binary(path.clone()),
            None => RunMode::Container,
        }
    }
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, Error> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(Error::InvalidBool {
            name,
            value: value.to_owned(),
        }),
    }
}

static CONFIG: OnceCell<Config> = OnceCell::new();

/// Process wide configuration, loaded on first use.
pub fn config() -> Result<&'static Config, Error> {
    CONFIG.get_or_try_init(Config::load)
}
