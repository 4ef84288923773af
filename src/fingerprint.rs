//! Deterministic identity hashes for leads and filter combinations.
//!
//! The lead fingerprint is the durable dedup key: two observations of the
//! same (name, company, title) must collide regardless of extraction
//! session, page, or timestamp. The filter signature plays the same role for
//! search-filter combinations.

/// MD5 hex digest of the lowercased `name-company-title` string.
pub fn fingerprint(name: &str, company: &str, title: &str) -> String {
    let joined = format!("{}-{}-{}", name, company, title).to_lowercase();
    format!("{:x}", md5::compute(joined.as_bytes()))
}

/// Signature of a filter-label set plus optional search term.
///
/// Labels are sorted lexicographically before joining so the same filter set
/// selected in any UI order yields the same signature.
pub fn filter_signature(labels: &[String], search_term: Option<&str>) -> String {
    let mut parts: Vec<String> = labels.to_vec();
    parts.sort();
    if let Some(term) = search_term.filter(|t| !t.trim().is_empty()) {
        parts.push(format!("search:{}", term));
    }
    parts.join("|")
}
