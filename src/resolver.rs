//! Company → domain resolution with cache, provider fallback, and a
//! relevance heuristic separating a company's real site from social and
//! aggregator noise.

use anyhow::Result;
use reqwest::Url;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::db::{self, Pool};
use crate::search::SearchProvider;

/// Domains that can never be a company's own site. Matched as substrings so
/// subdomains like `mobile.linkedin.com` are rejected too.
const SKIP_DOMAINS: &[&str] = &[
    "linkedin.com",
    "facebook.com",
    "twitter.com",
    "instagram.com",
    "wikipedia.org",
    "youtube.com",
    "glassdoor.com",
    "indeed.com",
    "crunchbase.com",
    "bloomberg.com",
    "reuters.com",
];

/// Normalized search query for a company: punctuation stripped, suffixed
/// with "official website".
pub fn build_query(company_name: &str) -> String {
    let clean: String = company_name
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    format!("{} official website", clean.trim())
}

/// Host of `url`, lowercased, without a leading `www.`.
pub fn domain_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    let domain = host.strip_prefix("www.").unwrap_or(host);
    Some(domain.to_lowercase())
}

/// Heuristic accept/reject for a candidate domain. Accepts when any company
/// token (length > 2, punctuation stripped) is a substring of a domain label
/// or vice versa. Intentionally permissive: string overlap, not exact match.
pub fn is_relevant_domain(domain: &str, company_name: &str) -> bool {
    if SKIP_DOMAINS.iter().any(|skip| domain.contains(skip)) {
        return false;
    }

    let lowered: String = company_name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    let words: Vec<&str> = lowered
        .split_whitespace()
        .filter(|w| w.len() > 2)
        .collect();
    let labels: Vec<&str> = domain.split('.').collect();

    words
        .iter()
        .any(|word| labels.iter().any(|label| label.contains(word) || word.contains(label)))
}

/// First candidate URL whose domain passes the relevance filter.
pub fn select_domain(urls: &[String], company_name: &str) -> Option<String> {
    urls.iter()
        .filter_map(|url| domain_from_url(url))
        .find(|domain| is_relevant_domain(domain, company_name))
}

/// Resolve a company name to its official domain.
///
/// Consults the company cache first; a cached domain short-circuits external
/// calls and a cached failure is final (re-resolution requires an explicit
/// cache reset). Otherwise walks the provider chain in priority order, each
/// call bounded by `timeout`; a provider failure or timeout falls through to
/// the next provider. Every external call is appended to the usage ledger.
/// The cache is updated with whichever outcome the chain produced.
///
/// Returns `Err` only for storage failures; provider errors never escape.
#[instrument(skip_all, fields(company = company_name))]
pub async fn resolve_domain(
    pool: &Pool,
    providers: &[Box<dyn SearchProvider>],
    timeout: Duration,
    company_name: &str,
) -> Result<Option<String>> {
    if let Some(cached) = db::find_company(pool, company_name).await? {
        if cached.failed {
            return Ok(None);
        }
        if let Some(domain) = cached.domain {
            info!(%domain, "company domain cache hit");
            return Ok(Some(domain));
        }
    }

    let query = build_query(company_name);
    for provider in providers {
        let outcome = match tokio::time::timeout(timeout, provider.search(&query)).await {
            Ok(Ok(urls)) => select_domain(&urls, company_name),
            Ok(Err(err)) => {
                warn!(?err, provider = provider.name(), "provider call failed");
                None
            }
            Err(_) => {
                warn!(provider = provider.name(), "provider call timed out");
                None
            }
        };

        db::record_api_usage(
            pool,
            provider.name(),
            company_name,
            outcome.as_deref(),
            outcome.is_some(),
            provider.cost_per_call(),
        )
        .await?;

        if let Some(domain) = outcome {
            info!(%domain, provider = provider.name(), "resolved company domain");
            db::save_company_domain(pool, company_name, &domain).await?;
            return Ok(Some(domain));
        }
    }

    warn!("no provider yielded a relevant domain");
    db::mark_company_failed(pool, company_name).await?;
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_query_strips_punctuation() {
        assert_eq!(build_query("Acme, Inc."), "Acme Inc official website");
        assert_eq!(build_query("O'Brien & Sons"), "OBrien  Sons official website");
    }

    #[test]
    fn domain_from_url_strips_www_and_lowercases() {
        assert_eq!(
            domain_from_url("https://www.Acme.COM/about").as_deref(),
            Some("acme.com")
        );
        assert_eq!(
            domain_from_url("http://sub.example.org").as_deref(),
            Some("sub.example.org")
        );
        assert!(domain_from_url("not a url").is_none());
    }

    #[test]
    fn denylisted_domains_are_rejected_even_as_subdomains() {
        assert!(!is_relevant_domain("linkedin.com/in/x", "Acme Corp"));
        assert!(!is_relevant_domain("mobile.linkedin.com", "LinkedIn"));
        assert!(!is_relevant_domain("en.wikipedia.org", "Wikipedia"));
    }

    #[test]
    fn token_overlap_accepts_in_both_directions() {
        // Company token inside domain label.
        assert!(is_relevant_domain("acmecorp.io", "Acme Corp"));
        // Domain label inside company token.
        assert!(is_relevant_domain("acme.com", "Acmeworks"));
        assert!(!is_relevant_domain("unrelated.net", "Acme Corp"));
    }

    #[test]
    fn short_tokens_do_not_match() {
        // "co" is <= 2 chars and must not cause an overlap.
        assert!(!is_relevant_domain("example.com", "Go Co"));
    }

    #[test]
    fn select_domain_takes_the_first_relevant_candidate() {
        let urls = vec![
            "https://www.linkedin.com/company/acme".to_string(),
            "https://www.acme.com/".to_string(),
            "https://acmecorp.io/".to_string(),
        ];
        assert_eq!(select_domain(&urls, "Acme Corp").as_deref(), Some("acme.com"));
        assert!(select_domain(&urls, "Wholly Unrelated").is_none());
    }
}
