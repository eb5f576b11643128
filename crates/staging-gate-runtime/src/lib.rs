//! Polling runtime for the staging deploy gate.
//!
//! Queries GitHub Actions for deploy and pre-deploy workflow runs on a
//! rate-limited cadence and resolves once none of them is still active.

mod staging_gate_runtime;

pub use staging_gate_runtime::{
    await_staging_deploys, fetch_active_candidates, normalize_tag, plan_run_queries,
    run_staging_gate, CoalescedCycleError, GithubApiClient, PollCycle, PollReport, PollSettings,
    RateLimit, RepoRef, StagingGateRuntimeConfig, WatchedWorkflow, WatchedWorkflows,
    WorkflowRunSource,
};
