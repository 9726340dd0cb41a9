//! Utils is shared functions and types for the cluster helpers
use std::{fmt::Debug, future::Future, path::Path, time::Duration};


use certqe_common::params::{DEFAULT_INTERVAL, DEFAULT_TIMEOUT, OPERATOR_TIMEOUT};
use kube::{
    api::{DeleteParams, PostParams},
    client::Client,
    config::{KubeConfigOptions, Kubeconfig},
    Api, Resource, ResourceExt,
};
use serde::{de::DeserializeOwned, Serialize};
use tokio::time::{sleep, Instant};
use tracing::{debug, trace};

use crate::{Error, Result};

/// Fixed interval polling budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Time between two checks.
    pub interval: Duration,
    /// Total budget.
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl PollConfig {
    /// Same interval with a different budget.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }
}

/// Shared state of the cluster helpers.
pub struct Context {
    /// Kube client
    pub k_client: Client,
    /// Polling budget used by the wait helpers.
    pub poll: PollConfig,
    /// Polling budget for operator installs, which take longer.
    pub operator_poll: PollConfig,
}

impl Context {
    /// Create a new context with the default polling budget.
    pub fn new(k_client: Client) -> Self {
        Self {
            k_client,
            poll: PollConfig::default(),
            operator_poll: PollConfig::default().with_timeout(OPERATOR_TIMEOUT),
        }
    }

    /// Replace both polling budgets.
    pub fn with_poll(self, poll: PollConfig) -> Self {
        Self {
            poll,
            operator_poll: poll,
            ..self
        }
    }

    /// Create a context with a fresh client built from a loaded kube config.
    pub fn from_kube_config(config: kube::Config) -> Result<Self> {
        Ok(Self::new(Client::try_from(config)?))
    }

    /// Create a context from a kubeconfig file.
    pub async fn from_kubeconfig(path: &Path) -> Result<Self> {
        Self::from_kube_config(load_kube_config(path).await?)
    }
}

/// Load the client configuration of the current context of a kubeconfig file.
pub async fn load_kube_config(path: &Path) -> Result<kube::Config> {
    let kubeconfig = Kubeconfig::read_from(path).map_err(anyhow::Error::from)?;
    let mut config =
        kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .map_err(anyhow::Error::from)?;
    config.connect_timeout = Some(Duration::from_secs(10));
    config.read_timeout = Some(Duration::from_secs(60));
    Ok(config)
}

/// Report whether the error is an `AlreadyExists` response.
pub fn is_already_exists(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(resp) if resp.reason == "AlreadyExists" || resp.code == 409)
}

/// Report whether the error is a `NotFound` response.
pub fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(resp) if resp.reason == "NotFound" || resp.code == 404)
}

/// Evaluate `check` every `poll.interval` until it reports true.
///
/// Errors from `check` are logged and retried. Fails with [`Error::Timeout`] once
/// `poll.timeout` elapsed.
#[tracing::instrument(skip(check))]
pub async fn poll_until<F, Fut>(poll: PollConfig, what: &str, mut check: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let deadline = Instant::now() + poll.timeout;
    loop {
        match check().await {
            Ok(true) => return Ok(()),
            Ok(false) => trace!(what, "condition not met yet"),
            Err(err) => debug!(what, %err, "condition check failed"),
        }
        if Instant::now() >= deadline {
            return Err(Error::Timeout {
                what: what.to_owned(),
                timeout: poll.timeout,
            });
        }
        sleep(poll.interval).await;
    }
}

/// Create an object, returning the existing one when it already exists.
#[tracing::instrument(skip_all, fields(name = %obj.name_any()))]
pub async fn create<K>(api: &Api<K>, obj: &K) -> Result<K>
where
    K: Resource + Clone + DeserializeOwned + Serialize + Debug,
    <K as Resource>::DynamicType: Default,
{
    let name = obj.name_any();
    let kind = K::kind(&Default::default()).to_string();
    match api.create(&PostParams::default(), obj).await {
        Ok(created) => {
            debug!(%kind, %name, "created");
            Ok(created)
        }
        Err(err) if is_already_exists(&err) => {
            debug!(%kind, %name, "already exists");
            Ok(api.get(&name).await?)
        }
        Err(err) => Err(err.into()),
    }
}

/// Delete an object in the foreground, ignoring objects that do not exist.
#[tracing::instrument(skip(api))]
pub async fn delete<K>(api: &Api<K>, name: &str) -> Result<()>
where
    K: Resource + Clone + DeserializeOwned + Debug,
{
    match api.delete(name, &DeleteParams::foreground()).await {
        Ok(_) => Ok(()),
        Err(err) if is_not_found(&err) => Ok(()),
        Err(err) => Err(err.into()),
    }
}

/// Delete an object and wait until the API server no longer returns it.
#[tracing::instrument(skip(api))]
pub async fn delete_and_wait<K>(api: &Api<K>, name: &str, poll: PollConfig) -> Result<()>
where
    K: Resource + Clone + DeserializeOwned + Debug,
{
    delete(api, name).await?;
    poll_until(poll, &format!("deletion of {name}"), || async move {
        Ok(api.get_opt(name).await?.is_none())
    })
    .await
}

/// Delete every object of a kind in a namespace.
#[tracing::instrument(skip_all)]
pub async fn delete_all<K>(api: &Api<K>, skip: impl Fn(&str) -> bool) -> Result<usize>
where
    K: Resource + Clone + DeserializeOwned + Debug,
{
    let mut deleted = 0;
    for obj in api.list(&Default::default()).await? {
        let name = obj.name_any();
        if skip(&name) {
            continue;
        }
        delete(api, &name).await?;
        deleted += 1;
    }
    Ok(deleted)
}
