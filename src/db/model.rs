use chrono::{DateTime, Utc};

/// Outcome of ingesting one batch of raw leads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct IngestSummary {
    pub accepted: i64,
    pub duplicates: i64,
}

/// The slice of a lead the enrichment step needs.
#[derive(Debug, Clone)]
pub struct LeadForEnrichment {
    pub id: i64,
    pub name: String,
    pub company: String,
}

/// Cached company resolution state.
#[derive(Debug, Clone)]
pub struct CompanyRecord {
    pub domain: Option<String>,
    pub failed: bool,
}

/// A verified lead as exported to CSV.
#[derive(Debug, Clone)]
pub struct VerifiedLead {
    pub name: String,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub email_address: Option<String>,
    pub company_domain: Option<String>,
    pub profile_url: Option<String>,
    pub extracted_at: DateTime<Utc>,
}
