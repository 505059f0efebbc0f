//! Controller configuration
//!
//! Defines the polling cadence and the local upload checks applied
//! before anything is sent to the analysis server.

use std::time::Duration;

/// Default interval between two status polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// The server refuses request bodies above 16 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Job controller configuration
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// How often the poll timer queries the job status
    pub poll_interval: Duration,

    /// Largest file accepted for upload
    pub max_upload_bytes: usize,

    /// Lower-cased file extensions accepted for upload
    pub allowed_extensions: Vec<String>,
}

impl ControllerConfig {
    /// Creates a new configuration with defaults
    pub fn new() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_extensions: vec!["pdf".to_string()],
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - DECKCHECK_POLL_INTERVAL_MS (optional, milliseconds, default: 2000)
    /// - DECKCHECK_MAX_UPLOAD_BYTES (optional, default: 16 MiB)
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::new();

        if let Ok(raw) = std::env::var("DECKCHECK_POLL_INTERVAL_MS") {
            let millis = raw
                .parse::<u64>()
                .map_err(|_| anyhow::anyhow!("DECKCHECK_POLL_INTERVAL_MS must be an integer"))?;
            config.poll_interval = Duration::from_millis(millis);
        }

        if let Ok(raw) = std::env::var("DECKCHECK_MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = raw
                .parse::<usize>()
                .map_err(|_| anyhow::anyhow!("DECKCHECK_MAX_UPLOAD_BYTES must be an integer"))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Sets the poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.max_upload_bytes == 0 {
            anyhow::bail!("max_upload_bytes must be greater than 0");
        }

        if self.allowed_extensions.is_empty() {
            anyhow::bail!("at least one upload extension must be allowed");
        }

        Ok(())
    }

    /// Whether `extension` (already lower-cased) may be uploaded
    pub fn allows_extension(&self, extension: &str) -> bool {
        self.allowed_extensions.iter().any(|ext| ext == extension)
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::new()
    }
}
