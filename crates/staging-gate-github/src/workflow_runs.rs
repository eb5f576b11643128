use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Enumerates supported `WorkflowRunStatus` values.
pub enum WorkflowRunStatus {
    Queued,
    InProgress,
    Completed,
    Waiting,
    Requested,
    Pending,
    ActionRequired,
    #[serde(other)]
    Unknown,
}

impl WorkflowRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Waiting => "waiting",
            Self::Requested => "requested",
            Self::Pending => "pending",
            Self::ActionRequired => "action_required",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Snapshot of one GitHub Actions workflow run.
pub struct WorkflowRun {
    pub id: u64,
    pub workflow_id: u64,
    #[serde(default)]
    pub name: Option<String>,
    /// GitHub documents `status` as nullable; a missing status is not terminal.
    #[serde(default)]
    pub status: Option<WorkflowRunStatus>,
    #[serde(default)]
    pub conclusion: Option<String>,
    #[serde(default)]
    pub head_branch: Option<String>,
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub run_number: Option<u64>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl WorkflowRun {
    pub fn is_completed(&self) -> bool {
        self.status == Some(WorkflowRunStatus::Completed)
    }

    pub fn status_label(&self) -> &'static str {
        self.status
            .as_ref()
            .map(WorkflowRunStatus::as_str)
            .unwrap_or("unknown")
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
/// Response body of `GET /repos/{owner}/{repo}/actions/workflows/{id}/runs`.
pub struct WorkflowRunsPage {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub workflow_runs: Vec<WorkflowRun>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Filters for one list-workflow-runs request.
pub struct WorkflowRunQuery {
    pub workflow_id: String,
    pub event: Option<String>,
    pub branch: Option<String>,
}

impl WorkflowRunQuery {
    pub fn new(workflow_id: impl Into<String>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            event: None,
            branch: None,
        }
    }

    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    pub fn with_branch(mut self, branch: Option<&str>) -> Self {
        self.branch = branch.map(ToOwned::to_owned);
        self
    }

    /// Query-string pairs in request order; unset filters are omitted.
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = Vec::new();
        if let Some(event) = self.event.as_deref() {
            pairs.push(("event", event));
        }
        if let Some(branch) = self.branch.as_deref() {
            pairs.push(("branch", branch));
        }
        pairs
    }
}
