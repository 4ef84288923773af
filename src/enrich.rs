//! Background enrichment queue: turns `pending` leads into verified email
//! candidates (or `failed`), one bounded batch at a time.

use anyhow::Result;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use crate::config::App;
use crate::db::{self, LeadForEnrichment, Pool};
use crate::email;
use crate::model::LeadStatus;
use crate::resolver;
use crate::search::SearchProvider;

/// Worker cadence. Carried as an explicit value so tests drive the loop with
/// near-zero delays.
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    pub batch_size: u32,
    pub lead_delay: Duration,
    pub queue_poll: Duration,
    pub idle_poll: Duration,
    pub error_backoff: Duration,
    pub provider_timeout: Duration,
}

impl WorkerOptions {
    pub fn from_app(app: &App) -> Self {
        Self {
            batch_size: app.batch_size,
            lead_delay: app.lead_delay(),
            queue_poll: app.queue_poll(),
            idle_poll: app.idle_poll(),
            error_backoff: app.error_backoff(),
            provider_timeout: app.provider_timeout(),
        }
    }
}

/// Enrich a single lead: resolve its company domain and derive candidates.
/// Returns the status the lead ended in. Storage errors propagate; provider
/// failures surface as a `Failed` outcome.
#[instrument(skip_all, fields(lead = lead.id, company = %lead.company))]
pub async fn enrich_lead(
    pool: &Pool,
    providers: &[Box<dyn SearchProvider>],
    timeout: Duration,
    lead: &LeadForEnrichment,
) -> Result<LeadStatus> {
    let domain =
        resolver::resolve_domain(pool, providers, timeout, &lead.company).await?;

    let Some(domain) = domain else {
        db::mark_lead_failed(pool, lead.id).await?;
        return Ok(LeadStatus::Failed);
    };

    let candidates = email::generate_candidates(&lead.name, &domain);
    let Some(primary) = candidates.first().cloned() else {
        warn!("lead name yields no usable email candidates");
        db::mark_lead_failed(pool, lead.id).await?;
        return Ok(LeadStatus::Failed);
    };

    db::mark_lead_verified(pool, lead.id, &domain, &candidates, &primary).await?;
    info!(%primary, "lead enriched");
    Ok(LeadStatus::EmailVerified)
}

/// Process one bounded batch of pending leads sequentially, throttled by
/// `lead_delay` between external-call sequences. A failure on one lead marks
/// that lead `failed` and never stops the batch. Returns the number of
/// pending leads remaining after the batch.
#[instrument(skip_all)]
pub async fn process_pending_batch(
    pool: &Pool,
    providers: &[Box<dyn SearchProvider>],
    opts: &WorkerOptions,
) -> Result<i64> {
    let batch = db::fetch_pending_leads(pool, opts.batch_size).await?;
    if batch.is_empty() {
        return Ok(0);
    }

    info!(batch = batch.len(), "processing pending leads");
    for (i, lead) in batch.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(opts.lead_delay).await;
        }
        match enrich_lead(pool, providers, opts.provider_timeout, lead).await {
            Ok(status) => {
                info!(lead = lead.id, status = status.as_str(), "lead processed");
            }
            Err(err) => {
                warn!(?err, lead = lead.id, "enrichment failed; marking lead failed");
                db::mark_lead_failed(pool, lead.id).await?;
            }
        }
    }

    db::count_pending_leads(pool).await
}

/// Perpetual worker loop. Re-polls quickly while leads remain, idles when
/// the queue is empty, and backs off on loop-level errors. Never returns as
/// long as the process runs.
pub async fn run_worker(
    pool: &Pool,
    providers: &[Box<dyn SearchProvider>],
    opts: &WorkerOptions,
) {
    loop {
        match process_pending_batch(pool, providers, opts).await {
            Ok(remaining) => {
                if remaining > 0 {
                    info!(remaining, "leads remaining in queue");
                    tokio::time::sleep(opts.queue_poll).await;
                } else {
                    tokio::time::sleep(opts.idle_poll).await;
                }
            }
            Err(err) => {
                error!(?err, "enrichment loop error; backing off");
                tokio::time::sleep(opts.error_backoff).await;
            }
        }
    }
}
