use super::consts;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    base_url: String,
    timeout: Duration,
}

pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.config.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
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

impl Config {
    // Sets the default values.
    pub fn new() -> Self {
        // The base URL comes from the environment when present so the service
        // can be pointed elsewhere without code changes.
        let base_url = std::env::var(consts::QUESTION_SERVICE_URL)
            .unwrap_or_else(|_| consts::BASE_URL.to_string());
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(consts::DEFAULT_TIMEOUT_MS),
        }
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_strips_trailing_slash() {
        let config = Config::builder()
            .with_base_url("http://interview.local:4000/")
            .with_timeout(Duration::from_secs(2))
            .build();

        assert_eq!(config.base_url(), "http://interview.local:4000");
        assert_eq!(config.url("/answers"), "http://interview.local:4000/answers");
        assert_eq!(config.timeout(), Duration::from_secs(2));
    }
}
