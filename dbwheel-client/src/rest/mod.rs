//! Databricks REST backend
//!
//! Talks to the workspace API directly with a personal access token. Cluster,
//! library and DBFS endpoints live under `/api/2.0`; jobs and runs use
//! `/api/2.1`, whose job listing is paged.

mod clusters;
mod dbfs;
mod jobs;
mod libraries;

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use dbwheel_core::domain::cluster::ClusterEvent;
use dbwheel_core::domain::dbfs::FileInfo;
use dbwheel_core::domain::job::{JobId, Run, RunId, RunOutput};
use dbwheel_core::domain::library::LibraryFullStatus;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ClientError, Result};
use crate::workspace::Workspace;

/// HTTP client for a single Databricks workspace
#[derive(Debug, Clone)]
pub struct RestWorkspace {
    /// Workspace URL (e.g., "https://adb-123.4.azuredatabricks.net")
    base_url: String,
    token: String,
    client: Client,
}

impl RestWorkspace {
    /// Create a client for `base_url` authenticating with `token`
    ///
    /// # Example
    /// ```
    /// use dbwheel_client::RestWorkspace;
    ///
    /// let workspace = RestWorkspace::new("https://example.cloud.databricks.com/", "dapi123");
    /// assert_eq!(workspace.base_url(), "https://example.cloud.databricks.com");
    /// ```
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_client(base_url, token, Client::new())
    }

    /// Create a client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, token: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, endpoint: &str) -> RequestBuilder {
        self.client
            .get(format!("{}/api/{}", self.base_url, endpoint))
            .bearer_auth(&self.token)
    }

    fn post(&self, endpoint: &str) -> RequestBuilder {
        self.client
            .post(format!("{}/api/{}", self.base_url, endpoint))
            .bearer_auth(&self.token)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Check the status code and deserialize the JSON body
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Check the status code of a call whose body carries nothing useful
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}

#[async_trait]
impl Workspace for RestWorkspace {
    async fn dbfs_remove(&self, path: &str, recursive: bool) -> Result<()> {
        self.delete_path(path, recursive).await
    }

    async fn dbfs_copy(&self, local_dir: &Path, remote_dir: &str, overwrite: bool) -> Result<()> {
        self.upload_dir(local_dir, remote_dir, overwrite).await
    }

    async fn dbfs_list(&self, path: &str) -> Result<Vec<FileInfo>> {
        self.list_path(path).await
    }

    async fn uninstall_library(&self, cluster_id: &str, wheel: &str) -> Result<()> {
        self.uninstall_wheel(cluster_id, wheel).await
    }

    async fn install_library(&self, cluster_id: &str, wheel: &str) -> Result<()> {
        self.install_wheel(cluster_id, wheel).await
    }

    async fn restart_cluster(&self, cluster_id: &str) -> Result<()> {
        self.restart(cluster_id).await
    }

    async fn cluster_events(&self, cluster_id: &str) -> Result<Vec<ClusterEvent>> {
        self.recent_events(cluster_id).await
    }

    async fn library_statuses(&self, cluster_id: &str) -> Result<Vec<LibraryFullStatus>> {
        self.cluster_status(cluster_id).await
    }

    async fn list_jobs(&self) -> Result<HashMap<String, JobId>> {
        self.jobs_by_name().await
    }

    async fn create_job(&self, settings: &Value) -> Result<Value> {
        self.create(settings).await
    }

    async fn reset_job(&self, job_id: JobId, settings: &Value) -> Result<Value> {
        self.reset(job_id, settings).await
    }

    async fn run_now(&self, job_id: JobId) -> Result<RunId> {
        self.trigger(job_id).await
    }

    async fn get_run(&self, run_id: RunId) -> Result<Run> {
        self.run(run_id).await
    }

    async fn get_run_output(&self, run_id: RunId) -> Result<RunOutput> {
        self.run_output(run_id).await
    }
}
