use crate::workflow_runs::WorkflowRun;

/// Keep runs that have not reached the `completed` status, preserving input order.
pub fn filter_active_runs(runs: impl IntoIterator<Item = WorkflowRun>) -> Vec<WorkflowRun> {
    runs.into_iter().filter(|run| !run.is_completed()).collect()
}

/// Render the status line printed after each poll cycle.
pub fn render_active_runs_summary(active_count: usize) -> String {
    match active_count {
        0 => "No current staging deploys found".to_string(),
        1 => "Found 1 staging deploy still running...".to_string(),
        count => format!("Found {count} staging deploys still running..."),
    }
}
