use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use leadsift::config;
use leadsift::db;
use leadsift::export;

#[derive(Debug, Parser)]
#[command(author, version, about = "Export verified leads as CSV")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Write the CSV here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
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

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| format!("sqlite://{}/leadsift.db", cfg.app.data_dir));

    let pool = db::init_pool(&database_url).await?;
    db::run_migrations(&pool).await?;

    let leads = db::fetch_verified_leads(&pool).await?;
    let csv = export::to_csv(&leads);

    match args.output {
        Some(path) => {
            tokio::fs::write(&path, csv)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(rows = leads.len(), path = %path.display(), "export written");
        }
        None => print!("{}", csv),
    }
    Ok(())
}
