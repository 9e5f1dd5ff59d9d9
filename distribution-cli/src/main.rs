//! MountainShares distribution CLI
//!
//! Entry point for the ms-distribution binary.

use distribution_cli::run_cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    run_cli().await
}
