use clap::Parser;

pub const DEFAULT_GITHUB_REPO: &str = "Expensify/App";
pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";
/// Base poll rate shared with the other deploy actions.
pub const DEFAULT_POLL_RATE_MS: u64 = 10_000;
pub const DEFAULT_POLL_RATE_MULTIPLIER: u32 = 6;

fn parse_positive_usize(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_positive_u32(value: &str) -> Result<u32, String> {
    let parsed = value
        .parse::<u32>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Parser)]
#[command(
    name = "await-staging-deploys",
    about = "Block until no staging deploy workflow run is still active",
    version
)]
/// Public struct `Cli` used by the staging gate binary.
pub struct Cli {
    #[arg(
        long,
        env = "INPUT_TAG",
        help = "Only wait for deploy runs of this tag. When unset or blank, deploy and pre-deploy runs on every branch are watched"
    )]
    pub tag: Option<String>,

    #[arg(
        long = "github-token",
        env = "GITHUB_TOKEN",
        hide_env_values = true,
        help = "GitHub token used to list workflow runs"
    )]
    pub github_token: String,

    #[arg(
        long = "github-repo",
        env = "STAGING_GATE_GITHUB_REPO",
        default_value = DEFAULT_GITHUB_REPO,
        help = "GitHub repository in owner/repo format whose workflow runs are watched"
    )]
    pub github_repo: String,

    #[arg(
        long = "github-api-base",
        env = "GITHUB_API_URL",
        default_value = DEFAULT_GITHUB_API_BASE,
        help = "Base URL for GitHub API calls"
    )]
    pub github_api_base: String,

    #[arg(
        long = "deploy-workflow",
        default_value = "platformDeploy.yml",
        help = "Workflow file name or id of the deploy workflow"
    )]
    pub deploy_workflow: String,

    #[arg(
        long = "pre-deploy-workflow",
        default_value = "preDeploy.yml",
        help = "Workflow file name or id of the pre-deploy workflow"
    )]
    pub pre_deploy_workflow: String,

    #[arg(
        long = "poll-rate-ms",
        default_value_t = DEFAULT_POLL_RATE_MS,
        value_parser = parse_positive_u64,
        help = "Base poll rate in milliseconds"
    )]
    pub poll_rate_ms: u64,

    #[arg(
        long = "poll-rate-multiplier",
        default_value_t = DEFAULT_POLL_RATE_MULTIPLIER,
        value_parser = parse_positive_u32,
        help = "Multiplier applied to --poll-rate-ms to get the minimum spacing between poll cycles"
    )]
    pub poll_rate_multiplier: u32,

    #[arg(
        long = "github-request-timeout-ms",
        default_value_t = 30_000,
        value_parser = parse_positive_u64,
        help = "Timeout for one GitHub API request in milliseconds"
    )]
    pub github_request_timeout_ms: u64,

    #[arg(
        long = "github-retry-max-attempts",
        default_value_t = 1,
        value_parser = parse_positive_usize,
        help = "Attempts per GitHub request for transient failures (429, 5xx, timeouts). 1 disables retries"
    )]
    pub github_retry_max_attempts: usize,

    #[arg(
        long = "github-retry-base-delay-ms",
        default_value_t = 500,
        value_parser = parse_positive_u64,
        help = "Base backoff delay in milliseconds between GitHub request attempts"
    )]
    pub github_retry_base_delay_ms: u64,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{parse_positive_u64, Cli, DEFAULT_GITHUB_REPO};

    #[test]
    fn unit_parse_positive_u64_rejects_zero_and_garbage() {
        assert_eq!(parse_positive_u64("6"), Ok(6));
        assert!(parse_positive_u64("0").is_err());
        assert!(parse_positive_u64("six").is_err());
    }

    #[test]
    fn functional_cli_defaults_match_staging_deploy_setup() {
        let cli = Cli::try_parse_from(["await-staging-deploys", "--github-token", "t"])
            .expect("parse");
        assert_eq!(cli.github_repo, DEFAULT_GITHUB_REPO);
        assert_eq!(cli.deploy_workflow, "platformDeploy.yml");
        assert_eq!(cli.pre_deploy_workflow, "preDeploy.yml");
        assert_eq!(cli.poll_rate_ms, 10_000);
        assert_eq!(cli.poll_rate_multiplier, 6);
        assert_eq!(cli.github_retry_max_attempts, 1);
    }

    #[test]
    fn functional_cli_accepts_tag_and_overrides() {
        let cli = Cli::try_parse_from([
            "await-staging-deploys",
            "--github-token",
            "t",
            "--tag",
            "1.4.0-2",
            "--github-repo",
            "owner/repo",
            "--poll-rate-ms",
            "250",
            "--poll-rate-multiplier",
            "2",
        ])
        .expect("parse");
        assert_eq!(cli.tag.as_deref(), Some("1.4.0-2"));
        assert_eq!(cli.github_repo, "owner/repo");
        assert_eq!(cli.poll_rate_ms, 250);
        assert_eq!(cli.poll_rate_multiplier, 2);
    }

    #[test]
    fn regression_cli_rejects_zero_poll_multiplier() {
        let result = Cli::try_parse_from([
            "await-staging-deploys",
            "--github-token",
            "t",
            "--poll-rate-multiplier",
            "0",
        ]);
        assert!(result.is_err());
    }
}
