//! Remote workspace capability
//!
//! Every remote operation dbwheel performs goes through [`Workspace`]. The
//! REST implementation talks to the Databricks API directly; the CLI
//! implementation shells out to the `databricks` and `dbfs` commands. Status
//! extraction and the poll loops are written against this trait only, so
//! both backends behave identically.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use dbwheel_core::domain::cluster::ClusterEvent;
use dbwheel_core::domain::dbfs::FileInfo;
use dbwheel_core::domain::job::{JobId, Run, RunId, RunOutput};
use dbwheel_core::domain::library::LibraryFullStatus;
use serde_json::Value;

use crate::error::Result;

#[async_trait]
pub trait Workspace: Send + Sync {
    // =============================================================================
    // DBFS
    // =============================================================================

    /// Delete a DBFS path; deleting a missing path is not an error
    async fn dbfs_remove(&self, path: &str, recursive: bool) -> Result<()>;

    /// Copy every file under `local_dir` into the DBFS directory `remote_dir`
    async fn dbfs_copy(&self, local_dir: &Path, remote_dir: &str, overwrite: bool) -> Result<()>;

    async fn dbfs_list(&self, path: &str) -> Result<Vec<FileInfo>>;

    // =============================================================================
    // Clusters and libraries
    // =============================================================================

    async fn uninstall_library(&self, cluster_id: &str, wheel: &str) -> Result<()>;

    async fn install_library(&self, cluster_id: &str, wheel: &str) -> Result<()>;

    async fn restart_cluster(&self, cluster_id: &str) -> Result<()>;

    /// Cluster events, newest first
    async fn cluster_events(&self, cluster_id: &str) -> Result<Vec<ClusterEvent>>;

    async fn library_statuses(&self, cluster_id: &str) -> Result<Vec<LibraryFullStatus>>;

    // =============================================================================
    // Jobs and runs
    // =============================================================================

    /// Job names mapped to job ids
    async fn list_jobs(&self) -> Result<HashMap<String, JobId>>;

    /// Create a job; returns the raw response, which carries the new `job_id`
    async fn create_job(&self, settings: &Value) -> Result<Value>;

    /// Replace the settings of an existing job
    async fn reset_job(&self, job_id: JobId, settings: &Value) -> Result<Value>;

    async fn run_now(&self, job_id: JobId) -> Result<RunId>;

    async fn get_run(&self, run_id: RunId) -> Result<Run>;

    async fn get_run_output(&self, run_id: RunId) -> Result<RunOutput>;
}
