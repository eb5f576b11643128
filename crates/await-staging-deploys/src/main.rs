mod bootstrap_helpers;
mod startup_config;

use anyhow::Result;
use clap::Parser;
use staging_gate_cli::Cli;
use staging_gate_runtime::run_staging_gate;
use tracing::info;

use crate::bootstrap_helpers::init_tracing;
use crate::startup_config::build_runtime_config;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let report = run_staging_gate(build_runtime_config(&cli)).await?;
    info!(cycles = report.cycles, "staging deploy gate resolved");
    Ok(())
}
