use std::time::Duration;

use anyhow::Result;
use staging_gate_github::active_runs::{filter_active_runs, render_active_runs_summary};
use staging_gate_github::workflow_runs::WorkflowRun;
use tracing::{debug, info};

use super::rate_limit::RateLimit;
use super::run_aggregator::{fetch_active_candidates, WatchedWorkflows, WorkflowRunSource};

#[derive(Debug, Clone)]
pub struct PollSettings {
    pub workflows: WatchedWorkflows,
    pub tag: Option<String>,
    pub interval: Duration,
}

#[derive(Debug, Clone)]
/// Outcome of one query -> merge -> filter pass.
pub struct PollCycle {
    pub active_runs: Vec<WorkflowRun>,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReport {
    pub cycles: u64,
    pub last_summary: String,
}

async fn run_poll_cycle<S>(
    source: &S,
    workflows: &WatchedWorkflows,
    tag: Option<&str>,
) -> Result<PollCycle>
where
    S: WorkflowRunSource + ?Sized,
{
    let runs = fetch_active_candidates(source, workflows, tag).await?;
    let candidate_count = runs.len();
    let active_runs = filter_active_runs(runs);
    let summary = render_active_runs_summary(active_runs.len());
    println!("{summary}");
    for run in &active_runs {
        debug!(
            run_id = run.id,
            workflow_id = run.workflow_id,
            status = run.status_label(),
            branch = run.head_branch.as_deref().unwrap_or("-"),
            url = run.html_url.as_deref().unwrap_or("-"),
            "staging run still active"
        );
    }
    debug!(
        candidates = candidate_count,
        active = active_runs.len(),
        "poll cycle finished"
    );
    Ok(PollCycle {
        active_runs,
        summary,
    })
}

/// Polls until no watched workflow run is still active.
///
/// Runs one cycle, then keeps running rate-limited cycles while the latest
/// cycle found active runs. The first failing cycle ends the loop with its
/// error.
pub async fn await_staging_deploys<S>(source: &S, settings: &PollSettings) -> Result<PollReport>
where
    S: WorkflowRunSource + ?Sized,
{
    let workflows = &settings.workflows;
    let tag = settings.tag.as_deref();
    let limiter = RateLimit::new(
        move || run_poll_cycle(source, workflows, tag),
        settings.interval,
    );

    let mut active_runs: Vec<WorkflowRun>;
    let mut last_summary: String;
    loop {
        let cycle = limiter.trigger().await?;
        active_runs = cycle.active_runs;
        last_summary = cycle.summary;
        if active_runs.is_empty() {
            break;
        }
        debug!(
            active = active_runs.len(),
            interval_ms = limiter.interval().as_millis() as u64,
            "staging deploys still running; polling again"
        );
    }

    let cycles = limiter.executions();
    info!(cycles, "no staging deploys running");
    Ok(PollReport {
        cycles,
        last_summary,
    })
}
