//! Configuration loader and validator for the lead enrichment service.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    #[serde(default)]
    pub providers: Providers,
}

/// App-level settings controlling the enrichment worker cadence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    pub data_dir: String,
    /// Max `pending` leads pulled per enrichment pass.
    pub batch_size: u32,
    /// Fixed delay between two leads within a pass (external-call throttle).
    pub lead_delay_ms: u64,
    /// Delay before the next pass when pending leads remain.
    pub queue_poll_ms: u64,
    /// Delay before re-checking the queue when it is empty.
    pub idle_poll_ms: u64,
    /// Backoff after a loop-level error (e.g. storage unavailable).
    pub error_backoff_ms: u64,
    /// Per-provider-call timeout.
    pub provider_timeout_secs: u64,
}

/// External search provider credentials. Absence of a section disables that
/// provider; with no providers configured, domain resolution always fails.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Providers {
    #[serde(default)]
    pub bright_data: Option<BrightData>,
    #[serde(default)]
    pub dataforseo: Option<DataForSeo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BrightData {
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataForSeo {
    pub username: String,
    pub password: String,
}

impl App {
    pub fn lead_delay(&self) -> Duration {
        Duration::from_millis(self.lead_delay_ms)
    }

    pub fn queue_poll(&self) -> Duration {
        Duration::from_millis(self.queue_poll_ms)
    }

    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }
}

impl Config {
    /// Ensure required directories exist (creates `app.data_dir` if missing).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        if self.app.data_dir.trim().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(&self.app.data_dir)
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.data_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("app.data_dir must be non-empty"));
    }
    if cfg.app.batch_size == 0 {
        return Err(ConfigError::Invalid("app.batch_size must be > 0"));
    }
    if cfg.app.queue_poll_ms == 0 {
        return Err(ConfigError::Invalid("app.queue_poll_ms must be > 0"));
    }
    if cfg.app.idle_poll_ms == 0 {
        return Err(ConfigError::Invalid("app.idle_poll_ms must be > 0"));
    }
    if cfg.app.error_backoff_ms == 0 {
        return Err(ConfigError::Invalid("app.error_backoff_ms must be > 0"));
    }
    if cfg.app.provider_timeout_secs == 0 {
        return Err(ConfigError::Invalid("app.provider_timeout_secs must be > 0"));
    }

    if let Some(bd) = &cfg.providers.bright_data {
        if bd.api_key.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "providers.bright_data.api_key must be non-empty",
            ));
        }
    }
    if let Some(dfs) = &cfg.providers.dataforseo {
        if dfs.username.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "providers.dataforseo.username must be non-empty",
            ));
        }
        if dfs.password.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "providers.dataforseo.password must be non-empty",
            ));
        }
    }

    Ok(())
}

/// Returns an example YAML configuration.
pub fn example() -> &'static str {
    r#"app:
  data_dir: "./data"
  batch_size: 5
  lead_delay_ms: 1000
  queue_poll_ms: 5000
  idle_poll_ms: 5000
  error_backoff_ms: 10000
  provider_timeout_secs: 15

providers:
  bright_data:
    api_key: "YOUR_BRIGHT_DATA_API_KEY"
  dataforseo:
    username: "YOUR_DATAFORSEO_USERNAME"
    password: "YOUR_DATAFORSEO_PASSWORD"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parse_example_ok() {
        let cfg: Config = serde_yaml::from_str(example()).unwrap();
        validate(&cfg).unwrap();
        assert_eq!(cfg.app.batch_size, 5);
        assert!(cfg.providers.bright_data.is_some());
        assert!(cfg.providers.dataforseo.is_some());
    }

    #[test]
    fn providers_section_is_optional() {
        let yaml = r#"app:
  data_dir: "./data"
  batch_size: 5
  lead_delay_ms: 1000
  queue_poll_ms: 5000
  idle_poll_ms: 5000
  error_backoff_ms: 10000
  provider_timeout_secs: 15
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        validate(&cfg).unwrap();
        assert!(cfg.providers.bright_data.is_none());
        assert!(cfg.providers.dataforseo.is_none());
    }

    #[test]
    fn invalid_batch_size() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.app.batch_size = 0;
        let err = validate(&cfg).unwrap_err();
        match err {
            ConfigError::Invalid(msg) => assert!(msg.contains("batch_size")),
            _ => panic!("wrong error"),
        }
    }

    #[test]
    fn invalid_provider_credentials() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.providers.bright_data = Some(BrightData { api_key: "".into() });
        let err = validate(&cfg).unwrap_err();
        match err {
            ConfigError::Invalid(msg) => assert!(msg.contains("bright_data")),
            _ => panic!("wrong error"),
        }

        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.providers.dataforseo = Some(DataForSeo {
            username: "user".into(),
            password: "".into(),
        });
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn ensure_dirs_creates_data_dir() {
        let td = tempdir().unwrap();
        let data_path = td.path().join("data");
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.app.data_dir = data_path.to_string_lossy().to_string();
        cfg.ensure_dirs().unwrap();
        assert!(data_path.exists());
    }

    #[test]
    fn load_from_file_ok() {
        let td = tempdir().unwrap();
        let p = td.path().join("config.yaml");
        fs::write(&p, example()).unwrap();
        let cfg = load(Some(&p)).unwrap();
        assert_eq!(cfg.app.provider_timeout_secs, 15);
    }
}
