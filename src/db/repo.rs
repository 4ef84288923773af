use super::model::{CompanyRecord, IngestSummary, LeadForEnrichment, VerifiedLead};
use crate::model::{LeadStatus, NewLead, Stats};
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::Row;
use sqlx::SqlitePool;
use std::collections::HashSet;
use tracing::{debug, instrument};

pub type Pool = SqlitePool;

pub async fn init_pool(database_url: &str) -> Result<Pool> {
    let normalized = prepare_sqlite_url(database_url);
    let pool = SqlitePool::connect(&normalized).await?;
    // Enable WAL and stricter durability.
    sqlx::query("PRAGMA journal_mode=WAL;")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous=FULL;")
        .execute(&pool)
        .await?;
    Ok(pool)
}

/// If using a file-backed SQLite URL, expand a leading `~/` and ensure the
/// parent directory exists. Leaves in-memory URLs untouched.
fn prepare_sqlite_url(url: &str) -> String {
    if !url.starts_with("sqlite:") || url.starts_with("sqlite::memory") {
        return url.to_string();
    }

    let rest = &url["sqlite:".len()..];
    let path_with_query = rest.strip_prefix("//").unwrap_or(rest);
    let (path_part, query_part) = match path_with_query.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path_with_query, None),
    };
    if path_part.is_empty() {
        return url.to_string();
    }

    let expanded_path = if let Some(rest) = path_part.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            format!("{}/{}", home.trim_end_matches('/'), rest)
        } else {
            path_part.to_string()
        }
    } else {
        path_part.to_string()
    };

    if let Some(parent) = std::path::Path::new(&expanded_path).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    let mut rebuilt = String::from("sqlite://");
    rebuilt.push_str(&expanded_path);
    if let Some(q) = query_part {
        rebuilt.push('?');
        rebuilt.push_str(q);
    }
    rebuilt
}

pub async fn run_migrations(pool: &Pool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Insert one lead with its precomputed fingerprint and status `pending`.
/// Returns false when the fingerprint already exists (including the race
/// where a concurrent batch inserted it first) — a duplicate, not an error.
async fn insert_lead(pool: &Pool, lead: &NewLead, fp: &str) -> Result<bool> {
    let extracted_at = lead.extracted_at.unwrap_or_else(Utc::now);
    let res = sqlx::query(
        "INSERT INTO leads (fingerprint, name, title, company, location, profile_url, \
         time_in_role, time_at_company, recently_hired, filter_signature, status, extracted_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(fp)
    .bind(&lead.name)
    .bind(&lead.title)
    .bind(&lead.company)
    .bind(&lead.location)
    .bind(&lead.profile_url)
    .bind(&lead.time_in_role)
    .bind(&lead.time_at_company)
    .bind(lead.recently_hired)
    .bind(&lead.filter_signature)
    .bind(LeadStatus::Pending.as_str())
    .bind(extracted_at)
    .execute(pool)
    .await;

    match res {
        Ok(_) => Ok(true),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Ok(false),
        Err(err) => Err(err.into()),
    }
}

/// Deduplicate and persist a batch of raw leads.
///
/// Within-batch duplicates collapse to the first occurrence; cross-session
/// duplicates are rejected by the UNIQUE fingerprint column. Always holds
/// `accepted + duplicates == batch.len()`.
#[instrument(skip_all, fields(batch = leads.len()))]
pub async fn ingest_batch(pool: &Pool, leads: &[NewLead]) -> Result<IngestSummary> {
    let mut summary = IngestSummary::default();
    let mut seen: HashSet<String> = HashSet::new();

    for lead in leads {
        let fp = lead.fingerprint();
        if !seen.insert(fp.clone()) {
            summary.duplicates += 1;
            continue;
        }
        if insert_lead(pool, lead, &fp).await? {
            summary.accepted += 1;
        } else {
            debug!(name = %lead.name, "skipping duplicate lead");
            summary.duplicates += 1;
        }
    }
    Ok(summary)
}

/// Up to `limit` pending leads in insertion order — the enrichment queue.
#[instrument(skip_all)]
pub async fn fetch_pending_leads(pool: &Pool, limit: u32) -> Result<Vec<LeadForEnrichment>> {
    let rows = sqlx::query("SELECT id, name, company FROM leads WHERE status = ? ORDER BY id ASC LIMIT ?")
        .bind(LeadStatus::Pending.as_str())
        .bind(limit as i64)
        .fetch_all(pool)
        .await?;
    Ok(rows
        .into_iter()
        .map(|row| LeadForEnrichment {
            id: row.get("id"),
            name: row.get("name"),
            company: row.get("company"),
        })
        .collect())
}

#[instrument(skip_all)]
pub async fn count_pending_leads(pool: &Pool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leads WHERE status = ?")
        .bind(LeadStatus::Pending.as_str())
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Record a successful enrichment: domain, candidate list, primary address.
#[instrument(skip_all)]
pub async fn mark_lead_verified(
    pool: &Pool,
    lead_id: i64,
    domain: &str,
    candidates: &[String],
    primary_email: &str,
) -> Result<()> {
    let now = Utc::now();
    let candidates_json =
        serde_json::to_string(candidates).context("failed to serialize email candidates")?;
    sqlx::query(
        "UPDATE leads SET status = ?, company_domain = ?, email_candidates = ?, \
         email_address = ?, processed_at = ?, verified_at = ? WHERE id = ?",
    )
    .bind(LeadStatus::EmailVerified.as_str())
    .bind(domain)
    .bind(candidates_json)
    .bind(primary_email)
    .bind(now)
    .bind(now)
    .bind(lead_id)
    .execute(pool)
    .await?;
    Ok(())
}

#[instrument(skip_all)]
pub async fn mark_lead_failed(pool: &Pool, lead_id: i64) -> Result<()> {
    sqlx::query("UPDATE leads SET status = ?, processed_at = ? WHERE id = ?")
        .bind(LeadStatus::Failed.as_str())
        .bind(Utc::now())
        .bind(lead_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Case-insensitive company cache lookup.
#[instrument(skip_all)]
pub async fn find_company(pool: &Pool, name: &str) -> Result<Option<CompanyRecord>> {
    let row = sqlx::query("SELECT domain, failed FROM companies WHERE name = ? COLLATE NOCASE")
        .bind(name)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|row| CompanyRecord {
        domain: row.try_get::<Option<String>, _>("domain").ok().flatten(),
        failed: row.get::<bool, _>("failed"),
    }))
}

/// Upsert a successful resolution: stores the domain and clears `failed`.
#[instrument(skip_all)]
pub async fn save_company_domain(pool: &Pool, name: &str, domain: &str) -> Result<()> {
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO companies (name, domain, failed, first_seen, last_updated) \
         VALUES (?, ?, 0, ?, ?) \
         ON CONFLICT(name) DO UPDATE SET domain = excluded.domain, failed = 0, \
         last_updated = excluded.last_updated",
    )
    .bind(name)
    .bind(domain)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

/// Upsert a failed resolution. A failed company is not retried automatically;
/// clearing the flag is an explicit operator action.
#[instrument(skip_all)]
pub async fn mark_company_failed(pool: &Pool, name: &str) -> Result<()> {
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO companies (name, domain, failed, first_seen, last_updated) \
         VALUES (?, NULL, 1, ?, ?) \
         ON CONFLICT(name) DO UPDATE SET failed = 1, last_updated = excluded.last_updated",
    )
    .bind(name)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

/// Append one entry to the external-call ledger. Rows are never mutated.
#[instrument(skip_all)]
pub async fn record_api_usage(
    pool: &Pool,
    provider: &str,
    company_name: &str,
    domain: Option<&str>,
    success: bool,
    cost: f64,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO api_usage (provider, company_name, domain, success, cost, called_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(provider)
    .bind(company_name)
    .bind(domain)
    .bind(success)
    .bind(cost)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

#[instrument(skip_all)]
pub async fn is_filter_processed(pool: &Pool, signature: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM processed_filters WHERE signature = ?")
        .bind(signature)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

/// Idempotent insert; re-marking an already processed signature is a no-op.
#[instrument(skip_all)]
pub async fn mark_filter_processed(pool: &Pool, signature: &str) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO processed_filters (signature, processed_at) VALUES (?, ?)")
        .bind(signature)
        .bind(Utc::now())
        .execute(pool)
        .await?;
    Ok(())
}

/// Aggregate counters for the stats boundary.
#[instrument(skip_all)]
pub async fn stats(pool: &Pool) -> Result<Stats> {
    let total_leads: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leads")
        .fetch_one(pool)
        .await?;
    let verified_emails: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leads WHERE status = ?")
        .bind(LeadStatus::EmailVerified.as_str())
        .fetch_one(pool)
        .await?;
    let pending_leads: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leads WHERE status = ?")
        .bind(LeadStatus::Pending.as_str())
        .fetch_one(pool)
        .await?;
    let failed_leads: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leads WHERE status = ?")
        .bind(LeadStatus::Failed.as_str())
        .fetch_one(pool)
        .await?;
    let total_companies: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM companies")
        .fetch_one(pool)
        .await?;
    let api_calls: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM api_usage")
        .fetch_one(pool)
        .await?;
    let total_cost: f64 = sqlx::query_scalar("SELECT COALESCE(SUM(cost), 0.0) FROM api_usage")
        .fetch_one(pool)
        .await?;

    let conversion_rate = if total_leads > 0 {
        let rate = verified_emails as f64 / total_leads as f64 * 100.0;
        (rate * 100.0).round() / 100.0
    } else {
        0.0
    };

    Ok(Stats {
        total_leads,
        verified_emails,
        pending_leads,
        failed_leads,
        total_companies,
        api_calls,
        total_cost,
        conversion_rate,
    })
}

fn verified_lead_from_row(row: sqlx::sqlite::SqliteRow) -> VerifiedLead {
    VerifiedLead {
        name: row.get("name"),
        title: row.get("title"),
        company: row.get("company"),
        location: row.try_get::<Option<String>, _>("location").ok().flatten(),
        email_address: row
            .try_get::<Option<String>, _>("email_address")
            .ok()
            .flatten(),
        company_domain: row
            .try_get::<Option<String>, _>("company_domain")
            .ok()
            .flatten(),
        profile_url: row
            .try_get::<Option<String>, _>("profile_url")
            .ok()
            .flatten(),
        extracted_at: row.get("extracted_at"),
    }
}

/// Verified leads, newest first, for the CSV export.
#[instrument(skip_all)]
pub async fn fetch_verified_leads(pool: &Pool) -> Result<Vec<VerifiedLead>> {
    let rows = sqlx::query(
        "SELECT name, title, company, location, email_address, company_domain, profile_url, \
         extracted_at FROM leads WHERE status = ? ORDER BY extracted_at DESC",
    )
    .bind(LeadStatus::EmailVerified.as_str())
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(verified_lead_from_row).collect())
}

/// Verified leads flagged as recently hired, newest first, capped at 1000.
#[instrument(skip_all)]
pub async fn fetch_recent_hires(pool: &Pool) -> Result<Vec<VerifiedLead>> {
    let rows = sqlx::query(
        "SELECT name, title, company, location, email_address, company_domain, profile_url, \
         extracted_at FROM leads WHERE status = ? AND recently_hired = 1 \
         ORDER BY extracted_at DESC LIMIT 1000",
    )
    .bind(LeadStatus::EmailVerified.as_str())
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(verified_lead_from_row).collect())
}
