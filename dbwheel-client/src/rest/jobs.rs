//! Job and run endpoints

use std::collections::HashMap;

use dbwheel_core::domain::job::{JobId, JobList, Run, RunId, RunNowResponse, RunOutput};
use serde_json::{Value, json};
use tracing::debug;

use super::RestWorkspace;
use crate::error::Result;

/// Largest page the job listing accepts
const JOB_PAGE: usize = 25;

impl RestWorkspace {
    // =============================================================================
    // Jobs
    // =============================================================================

    /// Every job in the workspace keyed by name
    ///
    /// Follows `has_more` across pages. When two jobs share a name the one
    /// listed last wins.
    pub(super) async fn jobs_by_name(&self) -> Result<HashMap<String, JobId>> {
        let mut jobs = HashMap::new();
        let mut offset = 0;

        loop {
            let response = self
                .get("2.1/jobs/list")
                .query(&[("limit", JOB_PAGE), ("offset", offset)])
                .send()
                .await?;
            let page: JobList = self.handle_response(response).await?;

            offset += page.jobs.len();
            jobs.extend(page.by_name());
            debug!("Listed {} job(s) so far", offset);

            if !page.has_more || page.jobs.is_empty() {
                return Ok(jobs);
            }
        }
    }

    pub(super) async fn create(&self, settings: &Value) -> Result<Value> {
        let response = self.post("2.1/jobs/create").json(settings).send().await?;

        self.handle_response(response).await
    }

    pub(super) async fn reset(&self, job_id: JobId, settings: &Value) -> Result<Value> {
        let response = self
            .post("2.1/jobs/reset")
            .json(&json!({ "job_id": job_id, "new_settings": settings }))
            .send()
            .await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Runs
    // =============================================================================

    pub(super) async fn trigger(&self, job_id: JobId) -> Result<RunId> {
        let response = self
            .post("2.1/jobs/run-now")
            .json(&json!({ "job_id": job_id }))
            .send()
            .await?;

        let triggered: RunNowResponse = self.handle_response(response).await?;
        Ok(triggered.run_id)
    }

    pub(super) async fn run(&self, run_id: RunId) -> Result<Run> {
        let response = self
            .get("2.1/jobs/runs/get")
            .query(&[("run_id", run_id)])
            .send()
            .await?;

        self.handle_response(response).await
    }

    pub(super) async fn run_output(&self, run_id: RunId) -> Result<RunOutput> {
        let response = self
            .get("2.1/jobs/runs/get-output")
            .query(&[("run_id", run_id)])
            .send()
            .await?;

        self.handle_response(response).await
    }
}
