//! Assembles and runs the certsuite command for a single check.
use std::{path::PathBuf, process::Stdio};

use async_trait::async_trait;
use certqe_common::{Config, RunMode};
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    process::Command,
};
use tracing::{debug, info, warn};

use crate::{report::remove_reports, Error, Result};

/// Mount point of the kubeconfig inside the certsuite container.
pub const CONTAINER_KUBECONFIG: &str = "/usr/tnf/kubeconfig/config";
/// Mount point of the config directory inside the certsuite container.
pub const CONTAINER_CONFIG_DIR: &str = "/usr/tnf/config";
/// Mount point of the report directory inside the certsuite container.
pub const CONTAINER_REPORT_DIR: &str = "/usr/tnf/claim";
/// Script that runs the certsuite checks.
pub const RUN_SCRIPT: &str = "run-cnf-suites.sh";

/// Options of a single certsuite run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Label selecting the checks to run, usually a single test case name.
    pub tc_label: String,
    /// Directory receiving the claim and JUnit reports.
    pub report_dir: PathBuf,
    /// Directory holding the certsuite config file.
    pub config_dir: PathBuf,
    /// Regex of checks to skip.
    pub skip_regex: Option<String>,
}

impl LaunchOptions {
    /// Run `tc_label` with the directories of `config`.
    pub fn new(tc_label: &str, config: &Config) -> Self {
        Self {
            tc_label: tc_label.to_owned(),
            report_dir: config.report_dir.clone(),
            config_dir: config.config_dir.clone(),
            skip_regex: None,
        }
    }

    /// Use different report and config directories.
    pub fn with_dirs(self, report_dir: PathBuf, config_dir: PathBuf) -> Self {
        Self {
            report_dir,
            config_dir,
            ..self
        }
    }

    /// Skip the checks matching `regex`.
    pub fn with_skip(self, regex: &str) -> Self {
        Self {
            skip_regex: Some(regex.to_owned()),
            ..self
        }
    }
}

/// A fully resolved certsuite invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertsuiteCommand {
    /// Program to execute.
    pub program: String,
    /// Arguments, in order.
    pub args: Vec<String>,
    /// Extra environment variables.
    pub envs: Vec<(String, String)>,
    /// Working directory, inherited when unset.
    pub current_dir: Option<PathBuf>,
}

fn script_args(report_dir: &str, opts: &LaunchOptions) -> Vec<String> {
    let mut args = vec![
        "-o".to_owned(),
        report_dir.to_owned(),
        "-l".to_owned(),
        opts.tc_label.clone(),
    ];
    if let Some(skip) = opts.skip_regex.as_deref().filter(|skip| !skip.is_empty()) {
        args.push("-s".to_owned());
        args.push(skip.to_owned());
    }
    args
}

/// Build the command that runs `opts.tc_label` in the mode selected by `config`.
pub fn certsuite_command(config: &Config, opts: &LaunchOptions) -> CertsuiteCommand {
    match config.run_mode() {
        RunMode::Container => {
            let volume = |host: &PathBuf, target: &str| {
                ["-v".to_owned(), format!("{}:{target}:Z", host.display())]
            };
            let mut args = vec![
                "run".to_owned(),
                "--rm".to_owned(),
                "--network".to_owned(),
                "host".to_owned(),
            ];
            args.extend(volume(&config.kubeconfig, CONTAINER_KUBECONFIG));
            args.extend(volume(&opts.config_dir, CONTAINER_CONFIG_DIR));
            args.extend(volume(&opts.report_dir, CONTAINER_REPORT_DIR));
            args.extend([
                "-e".to_owned(),
                format!("KUBECONFIG={CONTAINER_KUBECONFIG}"),
                "-e".to_owned(),
                format!("TNF_NON_INTRUSIVE_ONLY={}", config.non_intrusive_only),
                config.image_ref(),
                format!("./{RUN_SCRIPT}"),
            ]);
            args.extend(script_args(CONTAINER_REPORT_DIR, opts));
            CertsuiteCommand {
                program: config.container_engine.clone(),
                args,
                envs: Vec::new(),
                current_dir: None,
            }
        }
        RunMode::Binary(repo) => CertsuiteCommand {
            program: repo.join(RUN_SCRIPT).display().to_string(),
            args: script_args(&opts.report_dir.display().to_string(), opts),
            envs: vec![
                (
                    "KUBECONFIG".to_owned(),
                    config.kubeconfig.display().to_string(),
                ),
                (
                    "TNF_CONFIG_DIR".to_owned(),
                    opts.config_dir.display().to_string(),
                ),
                (
                    "TNF_NON_INTRUSIVE_ONLY".to_owned(),
                    config.non_intrusive_only.to_string(),
                ),
            ],
            current_dir: Some(repo),
        },
    }
}

/// Runs a command to completion.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run the command and report its exit code, `None` when it was killed by a signal.
    async fn run(&self, command: &CertsuiteCommand) -> std::io::Result<Option<i32>>;
}

/// Runs commands with `tokio::process`, forwarding their output to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioProcessRunner;

async fn forward_lines(stream: impl AsyncRead + Unpin, stderr: bool) {
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if stderr {
            warn!(target: "certsuite", "{line}");
        } else {
            info!(target: "certsuite", "{line}");
        }
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, command: &CertsuiteCommand) -> std::io::Result<Option<i32>> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .envs(command.envs.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &command.current_dir {
            cmd.current_dir(dir);
        }
        let mut child = cmd.spawn()?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let forward_stdout = async {
            if let Some(stdout) = stdout {
                forward_lines(stdout, false).await
            }
        };
        let forward_stderr = async {
            if let Some(stderr) = stderr {
                forward_lines(stderr, true).await
            }
        };
        let (status, _, _) = tokio::join!(child.wait(), forward_stdout, forward_stderr);
        Ok(status?.code())
    }
}

/// Run the checks selected by `opts` and wait for certsuite to exit.
///
/// Stale reports are removed first so a crashed run cannot be validated against old results.
/// Certsuite exits non zero when a check fails, which is reported as [`Error::Failed`].
#[tracing::instrument(skip(runner, config))]
pub async fn launch_tests(
    runner: &impl ProcessRunner,
    config: &Config,
    opts: &LaunchOptions,
) -> Result<()> {
    remove_reports(&opts.report_dir)?;
    std::fs::create_dir_all(&opts.report_dir).map_err(|source| Error::Io {
        path: opts.report_dir.clone(),
        source,
    })?;

    let command = certsuite_command(config, opts);
    debug!(program = %command.program, args = ?command.args, "launching certsuite");
    let code = runner
        .run(&command)
        .await
        .map_err(|source| Error::Spawn {
            program: command.program.clone(),
            source,
        })?;
    match code {
        Some(0) => {
            info!(tc = %opts.tc_label, "certsuite finished");
            Ok(())
        }
        code => {
            warn!(tc = %opts.tc_label, ?code, "certsuite exited with failure");
            Err(Error::Failed { code })
        }
    }
}

#[cfg(test)]
mod tests {
    use expect_test::expect;
    use mockall::predicate;
    use tracing_test::traced_test;

    use super::*;

    fn config() -> Config {
        Config {
            kubeconfig: "/home/qe/.kube/config".into(),
            config_dir: "/tmp/tnf/config".into(),
            report_dir: "/tmp/tnf/report".into(),
            image_tag: "v5.0.0".to_owned(),
            container_engine: "podman".to_owned(),
            ..Config::default()
        }
    }

    #[test]
    fn container_command() {
        let opts = LaunchOptions::new("lifecycle-container-shutdown", &config())
            .with_skip("lifecycle-pod-recreation");
        let command = certsuite_command(&config(), &opts);
        assert_eq!(command.program, "podman");
        assert!(command.envs.is_empty());
        expect![[r#"
            [
                "run",
                "--rm",
                "--network",
                "host",
                "-v",
                "/home/qe/.kube/config:/usr/tnf/kubeconfig/config:Z",
                "-v",
                "/tmp/tnf/config:/usr/tnf/config:Z",
                "-v",
                "/tmp/tnf/report:/usr/tnf/claim:Z",
                "-e",
                "KUBECONFIG=/usr/tnf/kubeconfig/config",
                "-e",
                "TNF_NON_INTRUSIVE_ONLY=false",
                "quay.io/testnetworkfunction/cnf-certification-test:v5.0.0",
                "./run-cnf-suites.sh",
                "-o",
                "/usr/tnf/claim",
                "-l",
                "lifecycle-container-shutdown",
                "-s",
                "lifecycle-pod-recreation",
            ]
        "#]]
        .assert_debug_eq(&command.args);
    }

    #[test]
    fn binary_command() {
        let config = Config {
            repo_path: Some("/src/certsuite".into()),
            non_intrusive_only: true,
            ..config()
        };
        let opts = LaunchOptions::new("operator-install-source", &config)
            .with_dirs("/work/report".into(), "/work/config".into());
        let command = certsuite_command(&config, &opts);
        assert_eq!(command.program, "/src/certsuite/run-cnf-suites.sh");
        assert_eq!(command.current_dir, Some(PathBuf::from("/src/certsuite")));
        expect![[r#"
            [
                "-o",
                "/work/report",
                "-l",
                "operator-install-source",
            ]
        "#]]
        .assert_debug_eq(&command.args);
        expect![[r#"
            [
                (
                    "KUBECONFIG",
                    "/home/qe/.kube/config",
                ),
                (
                    "TNF_CONFIG_DIR",
                    "/work/config",
                ),
                (
                    "TNF_NON_INTRUSIVE_ONLY",
                    "true",
                ),
            ]
        "#]]
        .assert_debug_eq(&command.envs);
    }

    #[test]
    fn empty_skip_is_omitted() {
        let opts = LaunchOptions::new("tc", &config()).with_skip("");
        let command = certsuite_command(&config(), &opts);
        assert!(!command.args.contains(&"-s".to_owned()));
    }

    #[tokio::test]
    #[traced_test]
    async fn launch_maps_exit_codes() {
        let dir = tempfile::tempdir().unwrap();
        let report_dir = dir.path().join("report");
        std::fs::create_dir_all(&report_dir).unwrap();
        std::fs::write(report_dir.join("claim.json"), "{}").unwrap();
        let opts = LaunchOptions::new("tc", &config()).with_dirs(report_dir.clone(), dir.path().into());

        let mut runner = MockProcessRunner::new();
        runner
            .expect_run()
            .with(predicate::function(|cmd: &CertsuiteCommand| {
                cmd.args.contains(&"tc".to_owned())
            }))
            .times(1)
            .returning(|_| Ok(Some(0)));
        launch_tests(&runner, &config(), &opts).await.unwrap();
        assert!(!report_dir.join("claim.json").exists());

        let mut runner = MockProcessRunner::new();
        runner.expect_run().returning(|_| Ok(Some(1)));
        let err = launch_tests(&runner, &config(), &opts).await.unwrap_err();
        assert!(matches!(err, Error::Failed { code: Some(1) }));
        assert!(logs_contain("certsuite exited with failure"));

        let mut runner = MockProcessRunner::new();
        runner.expect_run().returning(|_| {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no podman"))
        });
        let err = launch_tests(&runner, &config(), &opts).await.unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
    }

    #[tokio::test]
    async fn tokio_runner_reports_exit_code() {
        let command = CertsuiteCommand {
            program: "sh".to_owned(),
            args: vec!["-c".to_owned(), "echo running; exit 3".to_owned()],
            envs: Vec::new(),
            current_dir: None,
        };
        let code = TokioProcessRunner.run(&command).await.unwrap();
        assert_eq!(code, Some(3));
    }
}
