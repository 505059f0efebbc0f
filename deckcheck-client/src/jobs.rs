//! Job-related API endpoints

use deckcheck_core::domain::job::{JobId, ReportLinks};
use deckcheck_core::domain::upload::Upload;
use deckcheck_core::dto::job::{CreateJobResponse, StatusResponse};
use reqwest::multipart::{Form, Part};
use tracing::debug;

use crate::AnalysisClient;
use crate::error::Result;

const PDF_MIME: &str = "application/pdf";

impl AnalysisClient {
    // =============================================================================
    // Job Lifecycle
    // =============================================================================

    /// Upload a file and create an analysis job
    ///
    /// The file goes in the `file` part of a multipart form; every metadata
    /// field of the upload is sent as its own text part.
    ///
    /// # Returns
    /// The server-assigned job identifier
    pub async fn create_job(&self, upload: Upload) -> Result<JobId> {
        let url = format!("{}/upload", self.base_url);
        debug!(
            "Uploading {} ({} bytes, {} field(s))",
            upload.file_name,
            upload.len(),
            upload.fields.len()
        );

        let form = build_form(upload)?;
        let response = self.client.post(&url).multipart(form).send().await?;

        let created: CreateJobResponse = self.handle_response(response).await?;
        Ok(created.job_id)
    }

    /// Get the current status of a job
    pub async fn get_status(&self, job_id: &JobId) -> Result<StatusResponse> {
        let url = format!("{}/status/{}", self.base_url, job_id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Reports
    // =============================================================================

    /// Download the PDF report of a completed job
    pub async fn download_report(&self, job_id: &JobId) -> Result<Vec<u8>> {
        let url = self.download_url(job_id);
        let response = self.client.get(&url).send().await?;

        self.handle_bytes_response(response).await
    }

    /// URL of the PDF report download
    pub fn download_url(&self, job_id: &JobId) -> String {
        format!("{}/download/{}", self.base_url, job_id)
    }

    /// URL of the HTML report view
    pub fn view_url(&self, job_id: &JobId) -> String {
        format!("{}/view/{}", self.base_url, job_id)
    }

    /// Both report links for a job
    pub fn report_links(&self, job_id: &JobId) -> ReportLinks {
        ReportLinks {
            download: self.download_url(job_id),
            view: self.view_url(job_id),
        }
    }
}

fn build_form(upload: Upload) -> Result<Form> {
    let file = Part::bytes(upload.bytes)
        .file_name(upload.file_name)
        .mime_str(PDF_MIME)?;

    let form = upload
        .fields
        .into_iter()
        .fold(Form::new().part("file", file), |form, (name, value)| {
            form.text(name, value)
        });

    Ok(form)
}
