//! Job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;

/// Server-assigned job identifier
///
/// Opaque to the client: it is only stored, compared and interpolated into
/// request paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Position of the controller in the job lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
    Polling,
    Completed,
    Failed,
}

impl Phase {
    /// `Completed` and `Failed` end the current job
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Completed | Phase::Failed)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Submitting => "submitting",
            Phase::Polling => "polling",
            Phase::Completed => "completed",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Outcome of a completed analysis
///
/// Fields the client does not interpret are kept in `extra` so the result
/// is stored exactly as the server reported it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub company_name: String,
    /// Overall verification score in [0, 1]
    pub verification_score: f64,
    pub num_claims: u32,
    pub num_questions: u32,
    /// Absent when no recipient address was given with the upload
    #[serde(default)]
    pub email_sent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_error: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, JsonValue>,
}

/// Classification of a terminal failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// Rejected locally before any request was sent
    Validation,
    /// The request could not be completed
    Transport,
    /// Non-2xx response, malformed body or an explicit `error` status
    Server,
}

/// Error recorded when the controller enters `Failed`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl JobFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// The active analysis job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    /// Last known progress percentage, 0..=100
    pub progress: u8,
    /// Last status message reported by the server
    pub message: String,
    /// Present only once the job completed
    pub result: Option<AnalysisResult>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Creates a job record for a freshly accepted submission
    pub fn new(id: JobId, message: impl Into<String>) -> Self {
        Self {
            id,
            progress: 0,
            message: message.into(),
            result: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Records a progress report, keeping the stored value non-decreasing
    ///
    /// Server values outside 0..=100 are clamped. Returns the stored value.
    pub fn record_progress(&mut self, reported: i64) -> u8 {
        let clamped = reported.clamp(0, 100) as u8;
        self.progress = self.progress.max(clamped);
        self.progress
    }
}

/// Point-in-time view of the controller's state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobSnapshot {
    pub phase: Phase,
    pub job: Option<Job>,
    /// Present only in `Failed`
    pub error: Option<JobFailure>,
}

impl JobSnapshot {
    pub fn job_id(&self) -> Option<&JobId> {
        self.job.as_ref().map(|job| &job.id)
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.job.as_ref().and_then(|job| job.result.as_ref())
    }
}

/// Links to the rendered reports of a completed job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportLinks {
    /// PDF report download
    pub download: String,
    /// HTML report view
    pub view: String,
}
