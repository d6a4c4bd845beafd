#![cfg(not(tarpaulin_include))]

use clap::Parser;
use dashboard::app;
use dashboard::config::DashboardConfig;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "website", version, about = "Serve the activity dashboard JSON API")]
struct Args {
    /// JSON config file; DASHBOARD_* variables override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on, overriding the config
    #[arg(long)]
    bind: Option<String>,
}

/// Main entry point for the dashboard web server
///
/// Loads the configured dataset once, then serves it until shut down.
/// `POST /api/reload` swaps in a freshly loaded dataset.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = DashboardConfig::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }

    app::run(config).await
}
