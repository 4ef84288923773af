use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use leadsift::db;
use leadsift::enrich::{self, WorkerOptions};
use leadsift::model::NewLead;
use leadsift::search::SearchProvider;

async fn setup_pool() -> sqlx::SqlitePool {
    let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

fn lead(name: &str, company: &str) -> NewLead {
    NewLead {
        name: name.into(),
        title: "Engineer".into(),
        company: company.into(),
        location: None,
        profile_url: None,
        time_in_role: None,
        time_at_company: None,
        recently_hired: false,
        extracted_at: None,
        filter_signature: None,
    }
}

/// Provider that always answers with the same site and counts its calls.
#[derive(Clone)]
struct FixedProvider {
    url: String,
    calls: Arc<Mutex<u64>>,
}

#[async_trait::async_trait]
impl SearchProvider for FixedProvider {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn cost_per_call(&self) -> f64 {
        0.001
    }

    async fn search(&self, _query: &str) -> Result<Vec<String>> {
        *self.calls.lock().await += 1;
        Ok(vec![self.url.clone()])
    }
}

async fn wait_until_drained(pool: &sqlx::SqlitePool) {
    for _ in 0..200 {
        if db::count_pending_leads(pool).await.unwrap() == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("queue did not drain in time");
}

#[tokio::test]
async fn worker_drains_queue_across_batches_and_wakes_for_new_leads() {
    let pool = setup_pool().await;

    // More leads than one batch so the worker must reschedule itself.
    let batch: Vec<NewLead> = (0..7)
        .map(|i| lead(&format!("Person {}", i), &format!("Company{}", i)))
        .collect();
    db::ingest_batch(&pool, &batch).await.unwrap();

    let provider = FixedProvider {
        url: "https://company0.com/".into(),
        calls: Arc::new(Mutex::new(0)),
    };
    let providers: Vec<Box<dyn SearchProvider>> = vec![Box::new(provider)];
    let opts = WorkerOptions {
        batch_size: 2,
        lead_delay: Duration::from_millis(1),
        queue_poll: Duration::from_millis(2),
        idle_poll: Duration::from_millis(2),
        error_backoff: Duration::from_millis(2),
        provider_timeout: Duration::from_millis(100),
    };

    let worker_pool = pool.clone();
    let handle = tokio::spawn(async move {
        enrich::run_worker(&worker_pool, &providers, &opts).await;
    });

    wait_until_drained(&pool).await;
    let stats = db::stats(&pool).await.unwrap();
    assert_eq!(stats.pending_leads, 0);
    assert_eq!(stats.verified_emails + stats.failed_leads, 7);

    // The loop idles rather than exiting: new leads picked up without a kick.
    db::ingest_batch(&pool, &[lead("Late Arrival", "Company0")])
        .await
        .unwrap();
    wait_until_drained(&pool).await;

    let status: String = sqlx::query_scalar("SELECT status FROM leads WHERE name = 'Late Arrival'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_ne!(status, "pending");

    handle.abort();
}
