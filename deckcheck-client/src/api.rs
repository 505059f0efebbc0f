//! Analysis API seam
//!
//! The job controller talks to the server only through this trait so it
//! can be driven by a scripted implementation in tests.

use async_trait::async_trait;
use deckcheck_core::domain::job::{JobId, ReportLinks};
use deckcheck_core::domain::upload::Upload;
use deckcheck_core::dto::job::StatusResponse;

use crate::AnalysisClient;
use crate::error::Result;

/// Operations the job controller needs from the analysis server
#[async_trait]
pub trait AnalysisApi: Send + Sync {
    /// Submits an upload and returns the new job's identifier
    async fn create_job(&self, upload: Upload) -> Result<JobId>;

    /// Fetches the current status of a job
    async fn get_status(&self, job_id: &JobId) -> Result<StatusResponse>;

    /// Report links handed to the view once a job completed
    fn report_links(&self, job_id: &JobId) -> ReportLinks;
}

#[async_trait]
impl AnalysisApi for AnalysisClient {
    async fn create_job(&self, upload: Upload) -> Result<JobId> {
        AnalysisClient::create_job(self, upload).await
    }

    async fn get_status(&self, job_id: &JobId) -> Result<StatusResponse> {
        AnalysisClient::get_status(self, job_id).await
    }

    fn report_links(&self, job_id: &JobId) -> ReportLinks {
        AnalysisClient::report_links(self, job_id)
    }
}
