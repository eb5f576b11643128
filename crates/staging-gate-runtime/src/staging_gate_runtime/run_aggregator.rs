use anyhow::Result;
use async_trait::async_trait;
use futures_util::future::try_join_all;
use staging_gate_github::workflow_runs::{WorkflowRun, WorkflowRunQuery};
use tracing::debug;

use super::{DEFAULT_DEPLOY_WORKFLOW, DEFAULT_PRE_DEPLOY_WORKFLOW};

/// Remote source of workflow runs.
#[async_trait]
pub trait WorkflowRunSource: Send + Sync {
    async fn list_workflow_runs(&self, query: &WorkflowRunQuery) -> Result<Vec<WorkflowRun>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Enumerates the workflows watched by the gate.
pub enum WatchedWorkflow {
    Deploy,
    PreDeploy,
}

impl WatchedWorkflow {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deploy => "deploy",
            Self::PreDeploy => "pre-deploy",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Workflow file names (or numeric ids) for the watched workflows.
pub struct WatchedWorkflows {
    pub deploy: String,
    pub pre_deploy: String,
}

impl Default for WatchedWorkflows {
    fn default() -> Self {
        Self {
            deploy: DEFAULT_DEPLOY_WORKFLOW.to_string(),
            pre_deploy: DEFAULT_PRE_DEPLOY_WORKFLOW.to_string(),
        }
    }
}

/// Build the queries for one poll cycle.
///
/// Deploy runs triggered by `push` are always watched, narrowed to the tag's
/// branch when one is given. Pre-deploy runs may still turn into deploys, so
/// they are watched too, unless a specific tag was requested.
pub fn plan_run_queries(
    workflows: &WatchedWorkflows,
    tag: Option<&str>,
) -> Vec<(WatchedWorkflow, WorkflowRunQuery)> {
    let mut planned = vec![(
        WatchedWorkflow::Deploy,
        WorkflowRunQuery::new(workflows.deploy.as_str())
            .with_event("push")
            .with_branch(tag),
    )];
    if tag.is_none() {
        planned.push((
            WatchedWorkflow::PreDeploy,
            WorkflowRunQuery::new(workflows.pre_deploy.as_str()),
        ));
    }
    planned
}

/// Query every planned workflow concurrently and merge the results.
///
/// Fails as a whole when any query fails. Deploy runs come first, then
/// pre-deploy runs, each in the order the source returned them. Run ids are
/// not deduplicated.
pub async fn fetch_active_candidates<S>(
    source: &S,
    workflows: &WatchedWorkflows,
    tag: Option<&str>,
) -> Result<Vec<WorkflowRun>>
where
    S: WorkflowRunSource + ?Sized,
{
    let planned = plan_run_queries(workflows, tag);
    let responses = try_join_all(planned.iter().map(|(kind, query)| async move {
        debug!(
            workflow = %query.workflow_id,
            kind = kind.as_str(),
            branch = query.branch.as_deref().unwrap_or("-"),
            "querying workflow runs"
        );
        let runs = source.list_workflow_runs(query).await?;
        Ok::<_, anyhow::Error>((*kind, runs))
    }))
    .await?;

    let mut deploy_runs = Vec::new();
    let mut pre_deploy_runs = Vec::new();
    for (kind, runs) in responses {
        match kind {
            WatchedWorkflow::Deploy => deploy_runs.extend(runs),
            WatchedWorkflow::PreDeploy => pre_deploy_runs.extend(runs),
        }
    }
    deploy_runs.extend(pre_deploy_runs);
    Ok(deploy_runs)
}
