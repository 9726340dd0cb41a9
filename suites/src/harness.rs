//! Per test setup and teardown shared by every suite.
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context as _, Result};
use certqe_common::{
    params::{label_selector, TEST_LABEL_VALUE, TEST_OPERATOR_LABEL_KEY, TEST_POD_LABEL_KEY},
    telemetry, Config, TestCaseState,
};
use certqe_fixtures::{
    cluster::{
        create_namespace, create_operator_group, create_subscription, delete_namespace_and_wait,
        label_csv, wait_until_operator_is_ready,
    },
    labels::test_operator_labels,
    olm::{
        define_operator_group, define_subscription, ClusterServiceVersion, SubscriptionConfig,
        MARKETPLACE_NAMESPACE,
    },
    utils::load_kube_config,
    Context,
};
use certqe_runner::{
    certsuite_config::{define_certsuite_config, CertsuiteConfig},
    launch::{launch_tests, LaunchOptions, TokioProcessRunner},
    report::validate_if_reports_are_valid,
    Error as RunnerError,
};
use kube::ResourceExt;
use rand::{distributions::Uniform, Rng};
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// Length of the random part of namespace names.
pub const SUFFIX_LEN: usize = 10;

// Each #[tokio::test] runs on its own runtime and a kube client is bound to the runtime that
// built it, so only the loaded config is shared.
static KUBE_CONFIG: OnceCell<kube::Config> = OnceCell::const_new();

async fn kube_config(config: &Config) -> Result<kube::Config> {
    let loaded = KUBE_CONFIG
        .get_or_try_init(|| async {
            load_kube_config(&config.kubeconfig)
                .await
                .with_context(|| format!("loading {}", config.kubeconfig.display()))
        })
        .await?;
    Ok(loaded.clone())
}

/// Random lowercase suffix making namespace names unique per test.
pub fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(Uniform::new_inclusive(b'a', b'z'))
        .take(SUFFIX_LEN)
        .map(char::from)
        .collect()
}

/// Report whether intrusive checks must be skipped, logging the skip.
pub fn skip_if_non_intrusive(tc: &str) -> Result<bool> {
    let skip = certqe_common::config()?.non_intrusive_only;
    if skip {
        info!(tc, "skipping intrusive check");
    }
    Ok(skip)
}

/// Operator installed through OLM for a test.
#[derive(Debug, Clone, Copy)]
pub struct OperatorUnderTest<'a> {
    /// Package name in the catalog.
    pub package: &'a str,
    /// Subscription channel.
    pub channel: &'a str,
    /// Catalog source in the marketplace namespace.
    pub catalog: &'a str,
    /// Prefix of the CSV the subscription installs.
    pub csv_prefix: &'a str,
}

/// Resources of a single test: its namespace and its own report and config directories.
pub struct TestEnv {
    /// Namespace holding the fixtures.
    pub namespace: String,
    /// Directory receiving the certsuite reports.
    pub report_dir: PathBuf,
    /// Directory holding the certsuite config.
    pub config_dir: PathBuf,
    /// Suite configuration.
    pub config: &'static Config,
    cx: Context,
}

/// Create a namespace named `<base>-<random suffix>` plus report and config directories for it.
#[tracing::instrument]
pub async fn before_each_setup_with_random_namespace(base: &str) -> Result<TestEnv> {
    telemetry::init()?;
    let config = certqe_common::config()?;
    if config.unit_test {
        anyhow::bail!("UNIT_TEST is set, refusing to connect to a cluster");
    }
    let cx = Context::from_kube_config(kube_config(config).await?)?;

    let namespace = format!("{base}-{}", random_suffix());
    let report_dir = config.report_dir.join(&namespace);
    let config_dir = config.config_dir.join(&namespace);
    for dir in [&report_dir, &config_dir] {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    create_namespace(&cx, &namespace).await?;
    info!(%namespace, "test environment ready");
    Ok(TestEnv {
        namespace,
        report_dir,
        config_dir,
        config,
        cx,
    })
}

impl TestEnv {
    /// Context for the fixture helpers.
    pub fn context(&self) -> &Context {
        &self.cx
    }

    /// Image the fixtures run.
    pub fn image(&self) -> &str {
        &self.config.test_image
    }

    /// Certsuite config targeting this namespace with the default discovery labels.
    pub fn default_certsuite_config(&self) -> CertsuiteConfig {
        CertsuiteConfig::new(
            &[self.namespace.as_str()],
            &[label_selector(TEST_POD_LABEL_KEY, TEST_LABEL_VALUE)],
            &[label_selector(TEST_OPERATOR_LABEL_KEY, TEST_LABEL_VALUE)],
        )
    }

    /// Write the certsuite config of this test.
    pub fn write_certsuite_config(&self, certsuite_config: &CertsuiteConfig) -> Result<PathBuf> {
        Ok(define_certsuite_config(&self.config_dir, certsuite_config)?)
    }

    /// Run `tc` and check that both reports record it as `expected`.
    ///
    /// Certsuite exits non zero when the check fails, which is what a `failed` expectation asks
    /// for, so that exit is not an error there.
    #[tracing::instrument(skip(self), fields(namespace = %self.namespace))]
    pub async fn run_and_verify(&self, tc: &str, expected: TestCaseState) -> Result<()> {
        let opts = LaunchOptions::new(tc, self.config)
            .with_dirs(self.report_dir.clone(), self.config_dir.clone());
        match launch_tests(&TokioProcessRunner, self.config, &opts).await {
            Ok(()) => {}
            Err(RunnerError::Failed { code }) if expected == TestCaseState::Failed => {
                info!(?code, "certsuite reported the expected failure");
            }
            Err(err) => return Err(err.into()),
        }
        validate_if_reports_are_valid(tc, expected.as_str(), &self.report_dir)?;
        Ok(())
    }

    /// Install an operator from a marketplace catalog into this namespace and label its CSV
    /// for discovery.
    #[tracing::instrument(skip(self, operator), fields(namespace = %self.namespace, package = %operator.package))]
    pub async fn install_operator(
        &self,
        group: &str,
        operator: &OperatorUnderTest<'_>,
    ) -> Result<ClusterServiceVersion> {
        let cx = self.context();
        let ns = self.namespace.as_str();
        create_operator_group(cx, &define_operator_group(group, ns, &[ns])).await?;
        let subscription = define_subscription(
            ns,
            SubscriptionConfig {
                package: operator.package.to_owned(),
                channel: Some(operator.channel.to_owned()),
                source: operator.catalog.to_owned(),
                source_namespace: MARKETPLACE_NAMESPACE.to_owned(),
                ..Default::default()
            },
        );
        create_subscription(cx, &subscription).await?;
        let csv = wait_until_operator_is_ready(cx, ns, operator.csv_prefix).await?;
        let csv = label_csv(cx, ns, &csv.name_any(), &test_operator_labels()).await?;
        info!(csv = %csv.name_any(), "operator installed");
        Ok(csv)
    }

    /// Tear down, then return the outcome of the test body.
    ///
    /// Teardown runs whether or not the body failed. Its own error is returned only when the
    /// body succeeded.
    pub async fn finish(&self, result: Result<()>) -> Result<()> {
        let teardown = self.teardown().await;
        test_outcome(&self.namespace, result, teardown)
    }

    /// Delete the namespace, and the directories unless reports are kept.
    #[tracing::instrument(skip(self), fields(namespace = %self.namespace))]
    pub async fn teardown(&self) -> Result<()> {
        delete_namespace_and_wait(&self.cx, &self.namespace).await?;
        if self.config.keep_reports {
            info!(report_dir = %self.report_dir.display(), "keeping reports");
            return Ok(());
        }
        remove_dir(&self.report_dir)?;
        remove_dir(&self.config_dir)
    }
}

fn test_outcome(namespace: &str, body: Result<()>, teardown: Result<()>) -> Result<()> {
    match (body, teardown) {
        (Ok(()), teardown) => teardown,
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(teardown_err)) => {
            warn!(%namespace, %teardown_err, "teardown failed");
            Err(err)
        }
    }
}

fn remove_dir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            warn!(dir = %dir.display(), "directory already removed");
            Ok(())
        }
        Err(err) => Err(err).with_context(|| format!("removing {}", dir.display())),
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use tracing_test::traced_test;

    use super::*;

    #[test]
    fn suffix_is_lowercase_and_sized() {
        let suffix = random_suffix();
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_lowercase()));
        assert_ne!(random_suffix(), random_suffix());
    }

    #[test]
    #[traced_test]
    fn remove_dir_tolerates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("reports");
        std::fs::create_dir_all(nested.join("inner")).unwrap();
        remove_dir(&nested).unwrap();
        assert!(!nested.exists());
        assert!(!logs_contain("directory already removed"));
        remove_dir(&nested).unwrap();
        assert!(logs_contain("directory already removed"));
    }

    #[test]
    fn teardown_error_fails_a_passing_test() {
        let err = test_outcome("qe-abc", Ok(()), Err(anyhow!("namespace stuck"))).unwrap_err();
        assert_eq!(err.to_string(), "namespace stuck");
        assert!(test_outcome("qe-abc", Ok(()), Ok(())).is_ok());
    }

    #[test]
    #[traced_test]
    fn body_error_wins_over_teardown_error() {
        let err = test_outcome(
            "qe-abc",
            Err(anyhow!("check failed")),
            Err(anyhow!("namespace stuck")),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "check failed");
        assert!(logs_contain("teardown failed"));
        assert!(logs_contain("namespace stuck"));
    }

    #[test]
    #[traced_test]
    fn body_error_is_returned_after_clean_teardown() {
        let err = test_outcome("qe-abc", Err(anyhow!("check failed")), Ok(())).unwrap_err();
        assert_eq!(err.to_string(), "check failed");
        assert!(!logs_contain("teardown failed"));
    }
}
