//! modsync - update Minecraft mods to a game version

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;

use modsync_cli::logging;
use modsync_cli::ui::{Output, UiActor};
use modsync_cli::{Cli, USER_AGENT};
use modsync_core::registry::ModrinthClient;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_dir = cli.log_dir();
    let _log_guard = logging::init_logging(&log_dir, cli.log_level)
        .with_context(|| format!("Failed to set up logging in {}", log_dir.display()))?;

    let config = cli.run_config()?;
    tracing::info!(
        "modsync {} starting: target {}, directory {}",
        env!("CARGO_PKG_VERSION"),
        config.target_version,
        config.package_dir.display()
    );

    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(15))
        .read_timeout(Duration::from_secs(60))
        .build()
        .context("Failed to build HTTP client")?;
    let registry = ModrinthClient::new(client.clone(), cli.registry_url.as_str());

    let actor = UiActor::spawn();
    let output = Output::new(actor.sender());
    output.info(&format!(
        "Updating {} for Minecraft {}{}",
        config.package_dir.display(),
        config.target_version,
        if config.dry_run { " (dry run)" } else { "" }
    ));

    let result = modsync_core::run(&config, &registry, client, Arc::new(output.clone())).await;
    if let Ok(report) = &result {
        output.report(report, &config.target_version, config.dry_run);
    }
    actor.finish();

    let report = result?;
    tracing::info!("Done: {:?}", report.summary);
    Ok(())
}
