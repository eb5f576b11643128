use std::{collections::VecDeque, time::Duration};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use httpmock::prelude::*;
use serde_json::json;
use staging_gate_github::workflow_runs::{WorkflowRun, WorkflowRunQuery};
use staging_gate_runtime::{
    await_staging_deploys, run_staging_gate, PollSettings, StagingGateRuntimeConfig,
    WatchedWorkflows, WorkflowRunSource,
};
use tokio::sync::Mutex as AsyncMutex;

const DEPLOY_RUNS_PATH: &str = "/repos/owner/repo/actions/workflows/platformDeploy.yml/runs";
const PRE_DEPLOY_RUNS_PATH: &str = "/repos/owner/repo/actions/workflows/preDeploy.yml/runs";

/// Serves scripted responses keyed by workflow id, one per call.
struct ScriptedSource {
    deploy: AsyncMutex<VecDeque<Result<Vec<WorkflowRun>>>>,
    pre_deploy: AsyncMutex<VecDeque<Result<Vec<WorkflowRun>>>>,
    queries: AsyncMutex<Vec<WorkflowRunQuery>>,
}

impl ScriptedSource {
    fn new(
        deploy: Vec<Result<Vec<WorkflowRun>>>,
        pre_deploy: Vec<Result<Vec<WorkflowRun>>>,
    ) -> Self {
        Self {
            deploy: AsyncMutex::new(VecDeque::from(deploy)),
            pre_deploy: AsyncMutex::new(VecDeque::from(pre_deploy)),
            queries: AsyncMutex::new(Vec::new()),
        }
    }

    async fn query_count(&self) -> usize {
        self.queries.lock().await.len()
    }
}

#[async_trait]
impl WorkflowRunSource for ScriptedSource {
    async fn list_workflow_runs(&self, query: &WorkflowRunQuery) -> Result<Vec<WorkflowRun>> {
        self.queries.lock().await.push(query.clone());
        let queue = if query.workflow_id == "preDeploy.yml" {
            &self.pre_deploy
        } else {
            &self.deploy
        };
        queue
            .lock()
            .await
            .pop_front()
            .ok_or_else(|| anyhow!("scripted response queue exhausted"))?
    }
}

fn workflow_run(id: u64, workflow_id: u64, status: &str) -> WorkflowRun {
    serde_json::from_value(json!({
        "id": id,
        "workflow_id": workflow_id,
        "status": status,
    }))
    .expect("workflow run")
}

#[tokio::test(start_paused = true)]
async fn integration_gate_waits_for_deploy_and_pre_deploy_runs_to_finish() {
    let source = ScriptedSource::new(
        vec![
            Ok(vec![workflow_run(1, 10, "in_progress")]),
            Ok(vec![workflow_run(1, 10, "completed")]),
            Ok(vec![workflow_run(1, 10, "completed")]),
        ],
        vec![
            Ok(vec![workflow_run(2, 20, "queued")]),
            Ok(vec![workflow_run(2, 20, "in_progress")]),
            Ok(vec![workflow_run(2, 20, "completed")]),
        ],
    );
    let settings = PollSettings {
        workflows: WatchedWorkflows::default(),
        tag: None,
        interval: Duration::from_secs(60),
    };

    let started = tokio::time::Instant::now();
    let report = await_staging_deploys(&source, &settings)
        .await
        .expect("gate resolves");
    assert_eq!(report.cycles, 3);
    assert_eq!(report.last_summary, "No current staging deploys found");
    assert_eq!(source.query_count().await, 6);
    assert!(started.elapsed() >= Duration::from_secs(120));
}

#[tokio::test(start_paused = true)]
async fn integration_gate_surfaces_source_error_from_later_cycle() {
    let source = ScriptedSource::new(
        vec![
            Ok(vec![workflow_run(1, 10, "waiting")]),
            Err(anyhow!("github api list workflow runs failed with status 401")),
        ],
        Vec::new(),
    );
    let settings = PollSettings {
        workflows: WatchedWorkflows::default(),
        tag: Some("5.0.0-1".to_string()),
        interval: Duration::from_secs(60),
    };

    let error = await_staging_deploys(&source, &settings)
        .await
        .expect_err("gate fails");
    assert!(error.to_string().contains("status 401"));
    assert_eq!(source.query_count().await, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn integration_gate_resolves_after_github_reports_runs_completed() {
    let server = MockServer::start_async().await;
    let mut active_deploys = server
        .mock_async(|when, then| {
            when.method(GET).path(DEPLOY_RUNS_PATH);
            then.status(200).json_body(json!({
                "total_count": 1,
                "workflow_runs": [{"id": 7, "workflow_id": 10, "status": "in_progress"}]
            }));
        })
        .await;
    let pre_deploys = server
        .mock_async(|when, then| {
            when.method(GET).path(PRE_DEPLOY_RUNS_PATH);
            then.status(200)
                .json_body(json!({"total_count": 0, "workflow_runs": []}));
        })
        .await;

    let config = StagingGateRuntimeConfig {
        repo_slug: "owner/repo".to_string(),
        api_base: server.base_url(),
        token: "test-token".to_string(),
        tag: None,
        workflows: WatchedWorkflows::default(),
        poll_rate_ms: 250,
        poll_rate_multiplier: 4,
        request_timeout_ms: 3_000,
        retry_max_attempts: 1,
        retry_base_delay_ms: 1,
    };

    let finish_deploys = async {
        tokio::time::sleep(Duration::from_millis(400)).await;
        active_deploys.assert_calls_async(1).await;
        active_deploys.delete_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(DEPLOY_RUNS_PATH);
                then.status(200).json_body(json!({
                    "total_count": 1,
                    "workflow_runs": [{"id": 7, "workflow_id": 10, "status": "completed"}]
                }));
            })
            .await
    };

    let (report, completed_deploys) = tokio::join!(run_staging_gate(config), finish_deploys);
    let report = report.expect("gate resolves");
    assert_eq!(report.cycles, 2);
    completed_deploys.assert_calls_async(1).await;
    pre_deploys.assert_calls_async(2).await;
}
