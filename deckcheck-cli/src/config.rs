//! Configuration module
//!
//! Handles CLI configuration including the analysis server URL.

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the analysis server
    pub server_url: String,
}

impl Config {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.server_url.starts_with("http://") && !self.server_url.starts_with("https://") {
            anyhow::bail!("server URL must start with http:// or https://");
        }

        Ok(())
    }
}
