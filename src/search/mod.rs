//! External search providers used for company-domain resolution.
//!
//! Each provider answers a text query with a ranked list of candidate URLs;
//! the resolver iterates an ordered chain of them and falls through on
//! failure. Providers are trait objects so the fallback order is data and
//! tests can substitute recording stubs.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, Url};
use serde_json::json;
use std::fmt;

use crate::config::Config;
use crate::search::model::SerpResponse;

pub mod model;

const BRIGHT_DATA_API_BASE: &str = "https://api.brightdata.com/";
const DATAFORSEO_API_BASE: &str = "https://api.dataforseo.com/";

pub const BRIGHT_DATA_COST: f64 = 0.0015;
pub const DATAFORSEO_COST: f64 = 0.0006;

/// A capability-typed external search service: given a text query, return a
/// ranked list of candidate URLs.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Cost booked to the usage ledger per call, successful or not.
    fn cost_per_call(&self) -> f64;

    async fn search(&self, query: &str) -> Result<Vec<String>>;
}

/// Build the provider chain in fixed priority order from configuration.
/// Sections that are absent produce no provider.
pub fn providers_from_config(cfg: &Config) -> Vec<Box<dyn SearchProvider>> {
    let mut chain: Vec<Box<dyn SearchProvider>> = Vec::new();
    if let Some(bd) = &cfg.providers.bright_data {
        chain.push(Box::new(BrightDataClient::new(bd.api_key.clone())));
    }
    if let Some(dfs) = &cfg.providers.dataforseo {
        chain.push(Box::new(DataForSeoClient::new(
            dfs.username.clone(),
            dfs.password.clone(),
        )));
    }
    chain
}

fn http_client() -> Client {
    Client::builder()
        .user_agent("leadsift/0.1")
        .no_proxy()
        .build()
        .expect("reqwest client")
}

/// The Google search URL a provider is asked to fetch for `query`.
pub fn google_search_url(query: &str) -> Url {
    Url::parse_with_params("https://www.google.com/search", &[("q", query)])
        .expect("valid google search URL")
}

static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s"'<>]+"#).expect("valid URL regex"));

/// Pull every `http(s)://...` URL out of a raw HTML page, in document order.
pub fn extract_urls_from_html(html: &str) -> Vec<String> {
    URL_PATTERN
        .find_iter(html)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Bright Data proxy-fetch provider: asks the zone to fetch a Google search
/// results page and scans the raw HTML for URLs.
#[derive(Clone)]
pub struct BrightDataClient {
    http: Client,
    base_url: Url,
    api_key: String,
}

impl fmt::Debug for BrightDataClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrightDataClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl BrightDataClient {
    pub fn new(api_key: String) -> Self {
        let base_url = Url::parse(BRIGHT_DATA_API_BASE).expect("valid Bright Data URL");
        Self::with_base_url(api_key, base_url)
    }

    pub fn with_base_url(api_key: String, base_url: Url) -> Self {
        Self {
            http: http_client(),
            base_url,
            api_key,
        }
    }

    pub fn build_body(query: &str) -> serde_json::Value {
        json!({
            "zone": "domain_finder",
            "url": google_search_url(query).as_str(),
            "format": "raw",
        })
    }
}

#[async_trait]
impl SearchProvider for BrightDataClient {
    fn name(&self) -> &'static str {
        "bright_data"
    }

    fn cost_per_call(&self) -> f64 {
        BRIGHT_DATA_COST
    }

    async fn search(&self, query: &str) -> Result<Vec<String>> {
        let endpoint = self
            .base_url
            .join("request")
            .context("invalid Bright Data base URL")?;
        let res = self
            .http
            .post(endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&Self::build_body(query))
            .send()
            .await
            .context("failed to reach Bright Data")?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!("bright data error {}: {}", status, body));
        }
        let html = res
            .text()
            .await
            .context("failed to read Bright Data response")?;
        Ok(extract_urls_from_html(&html))
    }
}

/// DataForSEO organic-SERP provider.
#[derive(Clone)]
pub struct DataForSeoClient {
    http: Client,
    base_url: Url,
    username: String,
    password: String,
}

impl fmt::Debug for DataForSeoClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataForSeoClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl DataForSeoClient {
    pub fn new(username: String, password: String) -> Self {
        let base_url = Url::parse(DATAFORSEO_API_BASE).expect("valid DataForSEO URL");
        Self::with_base_url(username, password, base_url)
    }

    pub fn with_base_url(username: String, password: String, base_url: Url) -> Self {
        Self {
            http: http_client(),
            base_url,
            username,
            password,
        }
    }

    pub fn build_body(query: &str) -> serde_json::Value {
        json!([{
            "keyword": query,
            "location_code": 2840,
            "language_code": "en",
            "device": "desktop",
            "os": "windows",
            "depth": 10,
        }])
    }
}

#[async_trait]
impl SearchProvider for DataForSeoClient {
    fn name(&self) -> &'static str {
        "dataforseo"
    }

    fn cost_per_call(&self) -> f64 {
        DATAFORSEO_COST
    }

    async fn search(&self, query: &str) -> Result<Vec<String>> {
        let endpoint = self
            .base_url
            .join("v3/serp/google/organic/live/advanced")
            .context("invalid DataForSEO base URL")?;
        let res = self
            .http
            .post(endpoint)
            .basic_auth(&self.username, Some(&self.password))
            .json(&Self::build_body(query))
            .send()
            .await
            .context("failed to reach DataForSEO")?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!("dataforseo error {}: {}", status, body));
        }
        let payload: SerpResponse = res
            .json()
            .await
            .context("invalid DataForSEO response JSON")?;
        Ok(payload.urls())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn google_search_url_encodes_query() {
        let url = google_search_url("Acme Corp official website");
        assert_eq!(url.host_str(), Some("www.google.com"));
        assert!(url.as_str().contains("q=Acme+Corp+official+website"));
    }

    #[test]
    fn bright_data_body_targets_the_search_page() {
        let body = BrightDataClient::build_body("Acme official website");
        assert_eq!(body["zone"], "domain_finder");
        assert_eq!(body["format"], "raw");
        assert!(body["url"]
            .as_str()
            .unwrap()
            .starts_with("https://www.google.com/search?q="));
    }

    #[test]
    fn dataforseo_body_is_a_single_task() {
        let body = DataForSeoClient::build_body("Acme official website");
        let task = &body[0];
        assert_eq!(task["keyword"], "Acme official website");
        assert_eq!(task["location_code"], 2840);
        assert_eq!(task["depth"], 10);
    }

    #[test]
    fn extracts_urls_in_document_order() {
        let html = r#"<a href="https://acme.com/about">x</a> text
            <img src='http://cdn.example.net/logo.png'> https://other.io"#;
        let urls = extract_urls_from_html(html);
        assert_eq!(
            urls,
            vec![
                "https://acme.com/about",
                "http://cdn.example.net/logo.png",
                "https://other.io",
            ]
        );
    }

    #[test]
    fn serp_response_flattens_to_urls() {
        let payload: SerpResponse = serde_json::from_value(serde_json::json!({
            "tasks": [{
                "result": [{
                    "items": [
                        {"url": "https://acme.com/"},
                        {"type": "paa", "url": null},
                        {"url": "https://linkedin.com/company/acme"}
                    ]
                }]
            }]
        }))
        .unwrap();
        assert_eq!(
            payload.urls(),
            vec!["https://acme.com/", "https://linkedin.com/company/acme"]
        );
    }

    #[test]
    fn empty_serp_response_yields_no_urls() {
        let payload: SerpResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(payload.urls().is_empty());
    }
}
