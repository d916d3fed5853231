/*
[INPUT]:  CLI arguments, YAML configuration file, OS shutdown signals
[OUTPUT]: Running watch tasks with graceful shutdown
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, startup flow, or shutdown handling
*/

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cryptocom_stream::CryptocomStream;
use cryptocom_stream_watch::{WatchConfig, WatchRunner};

#[derive(Parser, Debug)]
#[command(name = "cryptocom-stream-watch", version, about = "Crypto.com WebSocket stream watcher")]
struct Cli {
    /// YAML file listing the watches to run
    #[arg(long = "config", value_name = "PATH")]
    config_path: PathBuf,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,
    /// Validate the configuration and exit
    #[arg(long = "dry-run")]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let filter = EnvFilter::try_new(&args.log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| anyhow!(err))?;

    let config = WatchConfig::from_file(&args.config_path)
        .with_context(|| format!("load config {}", args.config_path.display()))?;
    config.validate().context("validate config")?;
    info!(
        watches = config.watches.len(),
        sandbox = config.sandbox,
        dry_run = args.dry_run,
        "configuration loaded"
    );
    if args.dry_run {
        return Ok(());
    }

    let client = CryptocomStream::new(config.stream_config()).context("build stream client")?;
    let mut runner = WatchRunner::new(Arc::new(client));
    runner.cancel_on_signals();
    runner.spawn_from_config(&config)?;
    info!(watches = runner.len(), "watches started");

    runner.shutdown_token().cancelled().await;
    runner.shutdown_and_wait().await.context("shutdown watches")?;
    info!("watches stopped");
    Ok(())
}
