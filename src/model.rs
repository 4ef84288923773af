use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fingerprint;

/// Lifecycle of a stored lead. Transitions are monotonic:
/// `Pending` → `EmailVerified` or `Pending` → `Failed`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LeadStatus {
    Pending,
    EmailVerified,
    Failed,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::Pending => "pending",
            LeadStatus::EmailVerified => "email_verified",
            LeadStatus::Failed => "failed",
        }
    }

    pub fn parse_status(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(LeadStatus::Pending),
            "email_verified" => Some(LeadStatus::EmailVerified),
            "failed" => Some(LeadStatus::Failed),
            _ => None,
        }
    }
}

/// A raw lead record as produced by the scraping side, before dedup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLead {
    pub name: String,
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub profile_url: Option<String>,
    #[serde(default)]
    pub time_in_role: Option<String>,
    #[serde(default)]
    pub time_at_company: Option<String>,
    #[serde(default)]
    pub recently_hired: bool,
    #[serde(default)]
    pub extracted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub filter_signature: Option<String>,
}

impl NewLead {
    /// Identity hash over (name, company, title), case-insensitive.
    pub fn fingerprint(&self) -> String {
        fingerprint::fingerprint(&self.name, &self.company, &self.title)
    }
}

/// The search-filter combination a run was extracted under: a set of filter
/// labels plus an optional free-text search term.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionFilter {
    pub labels: Vec<String>,
    pub search_term: Option<String>,
}

impl ExtractionFilter {
    /// Order-independent signature of this filter combination.
    pub fn signature(&self) -> String {
        fingerprint::filter_signature(&self.labels, self.search_term.as_deref())
    }
}

/// Aggregate counters reported by the stats boundary. Field names match the
/// JSON payload consumed by the popup UI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_leads: i64,
    pub verified_emails: i64,
    pub pending_leads: i64,
    pub failed_leads: i64,
    pub total_companies: i64,
    pub api_calls: i64,
    pub total_cost: f64,
    pub conversion_rate: f64,
}
