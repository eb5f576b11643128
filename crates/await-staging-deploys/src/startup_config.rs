use staging_gate_cli::Cli;
use staging_gate_runtime::{StagingGateRuntimeConfig, WatchedWorkflows};

pub(crate) fn build_runtime_config(cli: &Cli) -> StagingGateRuntimeConfig {
    StagingGateRuntimeConfig {
        repo_slug: cli.github_repo.clone(),
        api_base: cli.github_api_base.clone(),
        token: cli.github_token.clone(),
        tag: cli.tag.clone(),
        workflows: WatchedWorkflows {
            deploy: cli.deploy_workflow.clone(),
            pre_deploy: cli.pre_deploy_workflow.clone(),
        },
        poll_rate_ms: cli.poll_rate_ms,
        poll_rate_multiplier: cli.poll_rate_multiplier,
        request_timeout_ms: cli.github_request_timeout_ms,
        retry_max_attempts: cli.github_retry_max_attempts,
        retry_base_delay_ms: cli.github_retry_base_delay_ms,
    }
}
