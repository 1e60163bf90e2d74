use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Status-check cadence used when nothing else is configured.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

/// Configuration for the scholar client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Endpoint root of the analysis backend
    pub base_url: String,

    /// Status-check cadence in milliseconds
    pub poll_interval_ms: u64,

    /// Timeout applied to every backend request (seconds)
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            request_timeout_secs: 120,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        // Try to load from various locations
        let config_paths = [
            "video-scholar.toml",
            "config/video-scholar.toml",
            "~/.config/video-scholar/config.toml",
        ];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str(&config_str) {
                    Ok(config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        // Fall back to environment variables
        Self::from_env()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(base_url) = std::env::var("VIDEO_SCHOLAR_BASE_URL") {
            config.base_url = base_url;
        }

        if let Ok(interval) = std::env::var("VIDEO_SCHOLAR_POLL_INTERVAL_MS") {
            config.poll_interval_ms = interval.parse().unwrap_or(DEFAULT_POLL_INTERVAL_MS);
        }

        if let Ok(timeout) = std::env::var("VIDEO_SCHOLAR_REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = timeout.parse().unwrap_or(120);
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &str) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path);
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(anyhow!("base_url must not be empty"));
        }

        if self.poll_interval_ms == 0 {
            return Err(anyhow!("poll_interval_ms must be greater than 0"));
        }

        if self.request_timeout_secs == 0 {
            return Err(anyhow!("request_timeout_secs must be greater than 0"));
        }

        Ok(())
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn with_poll_interval_ms(mut self, poll_interval_ms: u64) -> Self {
        self.config.poll_interval_ms = poll_interval_ms;
        self
    }

    pub fn with_request_timeout_secs(mut self, request_timeout_secs: u64) -> Self {
        self.config.request_timeout_secs = request_timeout_secs;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.poll_interval_ms, 2000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .with_base_url("http://scholar.internal:9000")
            .with_poll_interval_ms(500)
            .with_request_timeout_secs(30)
            .build();

        assert_eq!(config.base_url, "http://scholar.internal:9000");
        assert_eq!(config.poll_interval_ms, 500);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_config_validation_rejects_zero_interval() {
        let config = ConfigBuilder::new().with_poll_interval_ms(0).build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_toml_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let original = ConfigBuilder::new()
            .with_base_url("http://localhost:8123")
            .with_poll_interval_ms(250)
            .build();

        write!(file, "{}", toml::to_string_pretty(&original).unwrap()).unwrap();

        let loaded: Config =
            toml::from_str(&std::fs::read_to_string(file.path()).unwrap()).unwrap();
        assert_eq!(loaded.base_url, original.base_url);
        assert_eq!(loaded.poll_interval_ms, original.poll_interval_ms);
    }
}
