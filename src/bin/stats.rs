use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use leadsift::config;
use leadsift::db;

#[derive(Debug, Parser)]
#[command(author, version, about = "Print aggregate pipeline stats as JSON")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Also list verified recent hires
    #[arg(long)]
    recent_hires: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| format!("sqlite://{}/leadsift.db", cfg.app.data_dir));

    let pool = db::init_pool(&database_url).await?;
    db::run_migrations(&pool).await?;

    let stats = db::stats(&pool).await?;
    println!("{}", serde_json::to_string_pretty(&stats)?);

    if args.recent_hires {
        let hires = db::fetch_recent_hires(&pool).await?;
        println!("recent hires: {}", hires.len());
        for lead in hires {
            println!(
                "  {} — {} at {} <{}>",
                lead.name,
                lead.title,
                lead.company,
                lead.email_address.as_deref().unwrap_or("")
            );
        }
    }
    Ok(())
}
