//! Staging deploy gate runtime: configuration, repository parsing, and entrypoint.

use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use tracing::info;

mod github_api_client;
mod poll_loop;
mod rate_limit;
mod run_aggregator;

pub use github_api_client::GithubApiClient;
pub use poll_loop::{await_staging_deploys, PollCycle, PollReport, PollSettings};
pub use rate_limit::{CoalescedCycleError, RateLimit};
pub use run_aggregator::{
    fetch_active_candidates, plan_run_queries, WatchedWorkflow, WatchedWorkflows,
    WorkflowRunSource,
};

pub const DEFAULT_DEPLOY_WORKFLOW: &str = "platformDeploy.yml";
pub const DEFAULT_PRE_DEPLOY_WORKFLOW: &str = "preDeploy.yml";

#[derive(Debug, Clone)]
/// Runtime configuration for one staging deploy gate invocation.
pub struct StagingGateRuntimeConfig {
    pub repo_slug: String,
    pub api_base: String,
    pub token: String,
    pub tag: Option<String>,
    pub workflows: WatchedWorkflows,
    pub poll_rate_ms: u64,
    pub poll_rate_multiplier: u32,
    pub request_timeout_ms: u64,
    pub retry_max_attempts: usize,
    pub retry_base_delay_ms: u64,
}

impl StagingGateRuntimeConfig {
    /// Minimum spacing between the starts of two poll cycles.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(
            self.poll_rate_ms
                .saturating_mul(u64::from(self.poll_rate_multiplier)),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let (owner, name) = trimmed
            .split_once('/')
            .ok_or_else(|| anyhow!("invalid --github-repo '{raw}', expected owner/repo"))?;
        let owner = owner.trim();
        let name = name.trim();
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            bail!("invalid --github-repo '{raw}', expected owner/repo");
        }
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    pub fn as_slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Treat blank tag input as "no tag"; GitHub Actions passes unset inputs as "".
pub fn normalize_tag(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(ToOwned::to_owned)
}

/// Blocks until no watched staging workflow run is still active.
pub async fn run_staging_gate(config: StagingGateRuntimeConfig) -> Result<PollReport> {
    let repo = RepoRef::parse(&config.repo_slug)?;
    let github_client = GithubApiClient::new(
        config.api_base.clone(),
        config.token.clone(),
        repo.clone(),
        config.request_timeout_ms,
        config.retry_max_attempts,
        config.retry_base_delay_ms,
    )?;
    let settings = PollSettings {
        workflows: config.workflows.clone(),
        tag: normalize_tag(config.tag.as_deref()),
        interval: config.poll_interval(),
    };
    match settings.tag.as_deref() {
        Some(tag) => info!(
            repo = %repo.as_slug(),
            tag,
            workflow = %settings.workflows.deploy,
            "awaiting staging deploys for tag"
        ),
        None => info!(
            repo = %repo.as_slug(),
            deploy_workflow = %settings.workflows.deploy,
            pre_deploy_workflow = %settings.workflows.pre_deploy,
            "awaiting all staging deploy activity"
        ),
    }
    await_staging_deploys(&github_client, &settings).await
}
