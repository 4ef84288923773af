use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::info;

use leadsift::config;
use leadsift::db;
use leadsift::model::{ExtractionFilter, NewLead};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Ingest a JSON batch of scraped leads, deduplicating against the durable fingerprint set"
)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Path to the JSON batch file ({"leads": [...]} or a bare array)
    #[arg(long)]
    input: PathBuf,

    /// Active filter labels for this extraction run (repeatable)
    #[arg(long = "filter")]
    filters: Vec<String>,

    /// Free-text search term for this extraction run
    #[arg(long)]
    search: Option<String>,

    /// Mark the run's filter signature processed after ingesting
    /// (only pass this when the run exhausted its source or hit its target)
    #[arg(long)]
    mark_complete: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BatchFile {
    Wrapped { leads: Vec<NewLead> },
    Bare(Vec<NewLead>),
}

impl BatchFile {
    fn into_leads(self) -> Vec<NewLead> {
        match self {
            BatchFile::Wrapped { leads } => leads,
            BatchFile::Bare(leads) => leads,
        }
    }
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

    let filter = ExtractionFilter {
        labels: args.filters.clone(),
        search_term: args.search.clone(),
    };
    let signature = filter.signature();

    // Refuse to start a run whose filter combination is already covered.
    if !signature.is_empty() && db::is_filter_processed(&pool, &signature).await? {
        bail!(
            "filter combination already processed: {} (pick different filters or reset processed_filters)",
            signature
        );
    }

    let content = tokio::fs::read_to_string(&args.input)
        .await
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let batch: BatchFile = serde_json::from_str(&content).context("invalid batch JSON")?;
    let mut leads = batch.into_leads();

    // Stamp the run's signature on leads that did not carry one.
    if !signature.is_empty() {
        for lead in &mut leads {
            lead.filter_signature.get_or_insert_with(|| signature.clone());
        }
    }

    let summary = db::ingest_batch(&pool, &leads).await?;
    info!(
        accepted = summary.accepted,
        duplicates = summary.duplicates,
        "batch ingested"
    );

    if args.mark_complete && !signature.is_empty() {
        db::mark_filter_processed(&pool, &signature).await?;
        info!(%signature, "filter signature marked processed");
    }

    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}
