use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use staging_gate_github::github_transport_helpers::{
    is_retryable_github_status, is_retryable_transport_error, parse_retry_after, retry_delay,
    truncate_for_error,
};
use staging_gate_github::workflow_runs::{WorkflowRun, WorkflowRunQuery, WorkflowRunsPage};
use tracing::{debug, warn};

use super::run_aggregator::WorkflowRunSource;
use super::RepoRef;

#[derive(Clone)]
/// GitHub REST client scoped to one repository.
pub struct GithubApiClient {
    http: reqwest::Client,
    api_base: String,
    repo: RepoRef,
    retry_max_attempts: usize,
    retry_base_delay_ms: u64,
}

impl GithubApiClient {
    pub fn new(
        api_base: String,
        token: String,
        repo: RepoRef,
        request_timeout_ms: u64,
        retry_max_attempts: usize,
        retry_base_delay_ms: u64,
    ) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("await-staging-deploys"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            reqwest::header::HeaderValue::from_static("2022-11-28"),
        );
        let auth_header = format!("Bearer {}", token.trim());
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_str(&auth_header)
                .context("invalid github authorization header")?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(request_timeout_ms.max(1)))
            .build()
            .context("failed to create github api client")?;
        Ok(Self {
            http: client,
            api_base: api_base.trim_end_matches('/').to_string(),
            repo,
            retry_max_attempts: retry_max_attempts.max(1),
            retry_base_delay_ms: retry_base_delay_ms.max(1),
        })
    }

    pub fn repo(&self) -> &RepoRef {
        &self.repo
    }

    /// Reads the first page of runs for one workflow.
    pub async fn fetch_workflow_runs_page(
        &self,
        query: &WorkflowRunQuery,
    ) -> Result<WorkflowRunsPage> {
        let url = format!(
            "{}/repos/{}/{}/actions/workflows/{}/runs",
            self.api_base, self.repo.owner, self.repo.name, query.workflow_id
        );
        let pairs = query.query_pairs();
        let operation = format!("list workflow runs for {}", query.workflow_id);
        let page: WorkflowRunsPage = self
            .request_json(&operation, || self.http.get(&url).query(&pairs))
            .await?;
        debug!(
            workflow = %query.workflow_id,
            total_count = page.total_count,
            returned = page.workflow_runs.len(),
            "listed workflow runs"
        );
        Ok(page)
    }

    async fn request_json<T, F>(&self, operation: &str, mut request_builder: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnMut() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0_usize;
        loop {
            attempt = attempt.saturating_add(1);
            let response = request_builder()
                .header(
                    "x-staging-gate-retry-attempt",
                    attempt.saturating_sub(1).to_string(),
                )
                .send()
                .await;
            match response {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let parsed = response
                            .json::<T>()
                            .await
                            .with_context(|| format!("failed to decode github {operation}"))?;
                        return Ok(parsed);
                    }

                    let retry_after = parse_retry_after(response.headers());
                    let body = response.text().await.unwrap_or_default();
                    if attempt < self.retry_max_attempts
                        && is_retryable_github_status(status.as_u16())
                    {
                        let delay = retry_delay(self.retry_base_delay_ms, attempt, retry_after);
                        warn!(
                            operation,
                            status = status.as_u16(),
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            "retrying github request"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    bail!(
                        "github api {operation} failed with status {}: {}",
                        status.as_u16(),
                        truncate_for_error(&body, 800)
                    );
                }
                Err(error) => {
                    if attempt < self.retry_max_attempts && is_retryable_transport_error(&error) {
                        tokio::time::sleep(retry_delay(self.retry_base_delay_ms, attempt, None))
                            .await;
                        continue;
                    }
                    return Err(error)
                        .with_context(|| format!("github api {operation} request failed"));
                }
            }
        }
    }
}

#[async_trait]
impl WorkflowRunSource for GithubApiClient {
    async fn list_workflow_runs(&self, query: &WorkflowRunQuery) -> Result<Vec<WorkflowRun>> {
        Ok(self.fetch_workflow_runs_page(query).await?.workflow_runs)
    }
}
