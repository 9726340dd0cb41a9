//! certqe runs single certsuite checks and validates their reports
#![deny(warnings)]
#![deny(missing_docs)]

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use certqe_common::{
    params::{label_selector, TEST_LABEL_VALUE, TEST_OPERATOR_LABEL_KEY, TEST_POD_LABEL_KEY},
    telemetry, TestCaseState,
};
use certqe_fixtures::{
    cluster::{clean_namespace, delete_managed_namespaces},
    Context,
};
use certqe_runner::{
    certsuite_config::{define_certsuite_config, CertsuiteConfig},
    launch::{launch_tests, LaunchOptions, TokioProcessRunner},
    report::validate_if_reports_are_valid,
};
use clap::{Args, Parser, Subcommand};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Available Subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a single certsuite check
    Run(RunOpts),
    /// Validate the reports of a previous run
    Verify(VerifyOpts),
    /// Remove the fixtures from a namespace
    Cleanup(CleanupOpts),
    /// Write the certsuite config file
    Config(ConfigOpts),
}

/// Options to Run command
#[derive(Args, Debug)]
pub struct RunOpts {
    /// Label of the checks to run.
    #[arg(long)]
    label: String,

    /// Regex of checks to skip.
    #[arg(long)]
    skip: Option<String>,

    /// Directory receiving the reports.
    #[arg(long, env = "TNF_REPORT_DIR")]
    report_dir: Option<PathBuf>,

    /// Directory holding the certsuite config.
    #[arg(long, env = "TNF_CONFIG_DIR")]
    config_dir: Option<PathBuf>,
}

/// Options to Verify command
#[derive(Args, Debug)]
pub struct VerifyOpts {
    /// Test case to look up.
    #[arg(long)]
    label: String,

    /// Expected state of the test case.
    #[arg(long, value_parser = parse_state)]
    expected: TestCaseState,

    /// Directory holding the reports.
    #[arg(long, env = "TNF_REPORT_DIR")]
    report_dir: Option<PathBuf>,
}

/// Options to Cleanup command
#[derive(Args, Debug)]
pub struct CleanupOpts {
    /// Namespace to clean.
    #[arg(long, required_unless_present = "managed", conflicts_with = "managed")]
    namespace: Option<String>,
    /// Delete every namespace labelled as managed by the suites instead.
    #[arg(long)]
    managed: bool,
}

/// Options to Config command
#[derive(Args, Debug)]
pub struct ConfigOpts {
    /// Namespaces under test.
    #[arg(long = "namespace", required = true)]
    namespaces: Vec<String>,

    /// Labels of the pods under test, `key: value`.
    #[arg(long = "pod-label")]
    pod_labels: Vec<String>,

    /// Labels of the operators under test, `key: value`.
    #[arg(long = "operator-label")]
    operator_labels: Vec<String>,

    /// Directory receiving the config file.
    #[arg(long, env = "TNF_CONFIG_DIR")]
    config_dir: Option<PathBuf>,
}

fn parse_state(value: &str) -> Result<TestCaseState, String> {
    value.parse().map_err(|err: certqe_common::params::InvalidState| err.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    telemetry::init()?;
    let config = certqe_common::config()?;

    info!(?args.command, "starting certqe");
    match args.command {
        Command::Run(opts) => {
            let mut launch = LaunchOptions::new(&opts.label, config).with_dirs(
                opts.report_dir.unwrap_or_else(|| config.report_dir.clone()),
                opts.config_dir.unwrap_or_else(|| config.config_dir.clone()),
            );
            if let Some(skip) = &opts.skip {
                launch = launch.with_skip(skip);
            }
            launch_tests(&TokioProcessRunner, config, &launch).await?;
        }
        Command::Verify(opts) => {
            let report_dir = opts.report_dir.unwrap_or_else(|| config.report_dir.clone());
            validate_if_reports_are_valid(&opts.label, opts.expected.as_str(), &report_dir)?;
        }
        Command::Cleanup(opts) => {
            let cx = Context::from_kubeconfig(&config.kubeconfig).await?;
            if opts.managed {
                let deleted = delete_managed_namespaces(&cx).await?;
                info!(?deleted, "managed namespaces deleted");
            } else {
                let namespace = opts.namespace.context("--namespace is required")?;
                clean_namespace(&cx, &namespace).await?;
            }
        }
        Command::Config(opts) => {
            let default_pods = [label_selector(TEST_POD_LABEL_KEY, TEST_LABEL_VALUE)];
            let default_operators = [label_selector(TEST_OPERATOR_LABEL_KEY, TEST_LABEL_VALUE)];
            let pod_labels: &[String] = if opts.pod_labels.is_empty() {
                &default_pods
            } else {
                &opts.pod_labels
            };
            let operator_labels: &[String] = if opts.operator_labels.is_empty() {
                &default_operators
            } else {
                &opts.operator_labels
            };
            let namespaces: Vec<&str> = opts.namespaces.iter().map(String::as_str).collect();
            let certsuite_config = CertsuiteConfig::new(&namespaces, pod_labels, operator_labels);
            let dir = opts.config_dir.unwrap_or_else(|| config.config_dir.clone());
            let path = define_certsuite_config(&dir, &certsuite_config)?;
            info!(path = %path.display(), "certsuite config written");
        }
    }
    Ok(())
}
