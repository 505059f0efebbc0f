//! Deckcheck HTTP Client
//!
//! A small, typed HTTP client for the pitch-deck analysis server.
//!
//! The server exposes an upload endpoint that creates an analysis job, a
//! status endpoint polled while the job runs, and two report endpoints that
//! become available once the job completed.
//!
//! # Example
//!
//! ```no_run
//! use deckcheck_client::AnalysisClient;
//! use deckcheck_core::domain::upload::Upload;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AnalysisClient::new("http://localhost:5000");
//!
//!     let bytes = std::fs::read("deck.pdf")?;
//!     let job_id = client.create_job(Upload::new("deck.pdf", bytes)).await?;
//!     let status = client.get_status(&job_id).await?;
//!
//!     println!("Job {} is {:?}", job_id, status.status);
//!     Ok(())
//! }
//! ```

mod api;
pub mod error;
mod jobs;

pub use api::AnalysisApi;
pub use error::{ClientError, Result};

use deckcheck_core::dto::job::ErrorBody;
use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the analysis server API
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    /// Base URL of the server (e.g., "http://localhost:5000")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl AnalysisClient {
    /// Create a new analysis client
    ///
    /// # Example
    /// ```
    /// use deckcheck_client::AnalysisClient;
    ///
    /// let client = AnalysisClient::new("http://localhost:5000");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new analysis client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use deckcheck_client::AnalysisClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = AnalysisClient::with_client("http://localhost:5000", http_client);
    /// ```
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// Non-2xx responses are turned into `ClientError::Api`, carrying the
    /// `error` field of the body when the server sent one.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let response = Self::check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::Parse(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response whose body is raw bytes (report downloads)
    async fn handle_bytes_response(&self, response: reqwest::Response) -> Result<Vec<u8>> {
        let response = Self::check_status(response).await?;
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ClientError::api_error(
            status.as_u16(),
            error_message_from_body(&body),
        ))
    }
}

/// Extracts the `error` field from a JSON error body
///
/// Blank messages and non-JSON bodies (e.g. a proxy's HTML error page)
/// yield `None`.
fn error_message_from_body(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.error)
        .filter(|message| !message.trim().is_empty())
}
