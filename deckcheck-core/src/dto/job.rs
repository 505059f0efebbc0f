//! Job DTOs exchanged with the analysis server

use serde::{Deserialize, Serialize};

use crate::domain::job::{AnalysisResult, JobId};

/// Successful response of the create-job endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJobResponse {
    pub job_id: JobId,
    #[serde(default)]
    pub message: Option<String>,
}

/// Error body returned with non-2xx responses
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

/// Job status as reported by the poll endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteStatus {
    #[serde(rename = "in-progress", alias = "processing")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "error")]
    Error,
}

/// Response of the poll-status endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: RemoteStatus,
    /// Percent complete; not guaranteed to be within 0..=100
    #[serde(default)]
    pub progress: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    /// Present only when `status` is `completed`
    #[serde(default)]
    pub result: Option<AnalysisResult>,
    /// Present only when `status` is `error`
    #[serde(default)]
    pub error: Option<String>,
}

impl StatusResponse {
    pub fn in_progress(progress: i64, message: impl Into<String>) -> Self {
        Self {
            status: RemoteStatus::InProgress,
            progress: Some(progress),
            message: Some(message.into()),
            result: None,
            error: None,
        }
    }

    pub fn completed(result: AnalysisResult) -> Self {
        Self {
            status: RemoteStatus::Completed,
            progress: Some(100),
            message: None,
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: RemoteStatus::Error,
            progress: None,
            message: None,
            result: None,
            error: Some(error.into()),
        }
    }
}
