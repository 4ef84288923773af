//! Lead dedup + enrichment pipeline.
//!
//! Scraped profile observations arrive in batches, are deduplicated against
//! a durable fingerprint set, and queue as `pending` leads. A background
//! worker resolves each lead's employer to a domain through a chain of
//! external search providers and synthesizes candidate email addresses.

pub mod config;
pub mod db;
pub mod email;
pub mod enrich;
pub mod export;
pub mod fingerprint;
pub mod model;
pub mod resolver;
pub mod search;
