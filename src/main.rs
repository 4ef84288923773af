use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

use leadsift::config;
use leadsift::db;
use leadsift::enrich::{self, WorkerOptions};
use leadsift::search;

#[derive(Debug, Parser)]
#[command(author, version, about = "Run the lead enrichment worker")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| format!("sqlite://{}/leadsift.db", cfg.app.data_dir));

    let pool = db::init_pool(&database_url).await?;
    db::run_migrations(&pool).await?;

    let providers = search::providers_from_config(&cfg);
    if providers.is_empty() {
        warn!("no search providers configured; every pending lead will fail enrichment");
    } else {
        let names: Vec<&str> = providers.iter().map(|p| p.name()).collect();
        info!(?names, "provider chain configured");
    }

    let opts = WorkerOptions::from_app(&cfg.app);
    info!(batch_size = opts.batch_size, "starting enrichment worker");
    enrich::run_worker(&pool, &providers, &opts).await;

    Ok(())
}
