//! Databricks CLI backend
//!
//! Shells out to the `databricks` and `dbfs` commands of the Databricks CLI,
//! which read credentials from `~/.databrickscfg`. An optional profile selects
//! the section of that file. Commands that report data are asked for JSON and
//! parsed into the same domain types the REST backend returns.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use async_trait::async_trait;
use dbwheel_core::domain::cluster::{ClusterEvent, ClusterEvents};
use dbwheel_core::domain::dbfs::FileInfo;
use dbwheel_core::domain::job::{JobId, JobList, Run, RunId, RunNowResponse, RunOutput};
use dbwheel_core::domain::library::{ClusterLibraryStatuses, LibraryFullStatus};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{ClientError, Result};
use crate::workspace::Workspace;

/// Workspace reached through the Databricks CLI
#[derive(Debug, Clone)]
pub struct CliWorkspace {
    profile: Option<String>,
    databricks: String,
    dbfs: String,
}

impl CliWorkspace {
    pub fn new(profile: Option<String>) -> Self {
        Self {
            profile,
            databricks: "databricks".to_string(),
            dbfs: "dbfs".to_string(),
        }
    }

    /// Use other executables than `databricks` and `dbfs` from `PATH`
    pub fn with_binaries(mut self, databricks: impl Into<String>, dbfs: impl Into<String>) -> Self {
        self.databricks = databricks.into();
        self.dbfs = dbfs.into();
        self
    }

    /// Arguments prefixed with `--profile` when one is set
    fn args<S: AsRef<str>>(&self, args: &[S]) -> Vec<String> {
        self.profile
            .iter()
            .flat_map(|profile| ["--profile".to_string(), profile.clone()])
            .chain(args.iter().map(|arg| arg.as_ref().to_string()))
            .collect()
    }

    /// Run a command to completion and return its stdout
    async fn exec(&self, program: &str, args: Vec<String>) -> Result<String> {
        let command = format!("{} {}", program, args.join(" "));
        debug!("Running {}", command);

        let output = Command::new(program).args(&args).output().await?;

        if !output.status.success() {
            return Err(ClientError::CommandFailed {
                command,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn databricks<S: AsRef<str>>(&self, args: &[S]) -> Result<String> {
        self.exec(&self.databricks, self.args(args)).await
    }

    async fn databricks_json<T: DeserializeOwned, S: AsRef<str>>(&self, args: &[S]) -> Result<T> {
        let stdout = self.databricks(args).await?;
        parse_json(&stdout)
    }

    async fn dbfs<S: AsRef<str>>(&self, args: &[S]) -> Result<String> {
        self.exec(&self.dbfs, self.args(args)).await
    }
}

fn parse_json<T: DeserializeOwned>(stdout: &str) -> Result<T> {
    serde_json::from_str(stdout)
        .map_err(|e| ClientError::ParseError(format!("Failed to parse CLI output: {}", e)))
}

/// Commands that answer with nothing on success still yield a JSON value
fn parse_json_or_empty(stdout: &str) -> Result<Value> {
    if stdout.trim().is_empty() {
        Ok(json!({}))
    } else {
        parse_json(stdout)
    }
}

/// Stage a job payload for `--json-file`; removed when dropped
fn stage_payload(payload: &Value) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("dbwheel-job-")
        .suffix(".json")
        .tempfile()?;
    let bytes = serde_json::to_vec_pretty(payload)
        .map_err(|e| ClientError::InvalidDefinition(e.to_string()))?;
    file.write_all(&bytes)?;
    file.flush()?;
    Ok(file)
}

fn listed_files(remote: &str, stdout: &str) -> Vec<FileInfo> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| FileInfo {
            path: line.to_string(),
            is_dir: line.ends_with('/'),
            file_size: None,
            modification_time: None,
        })
        .inspect(|file| debug!("{} contains {}", remote, file.path))
        .collect()
}

#[async_trait]
impl Workspace for CliWorkspace {
    async fn dbfs_remove(&self, path: &str, recursive: bool) -> Result<()> {
        let mut args = vec!["rm"];
        if recursive {
            args.push("-r");
        }
        args.push(path);
        self.dbfs(&args).await.map(|_| ())
    }

    async fn dbfs_copy(&self, local_dir: &Path, remote_dir: &str, overwrite: bool) -> Result<()> {
        let local = local_dir.to_string_lossy();
        let mut args = vec!["cp", "-r"];
        if overwrite {
            args.push("--overwrite");
        }
        args.extend([&*local, remote_dir]);

        info!("Copying {} to {}", local, remote_dir);
        self.dbfs(&args).await.map(|_| ())
    }

    async fn dbfs_list(&self, path: &str) -> Result<Vec<FileInfo>> {
        let stdout = self.dbfs(&["ls", "--absolute", path]).await?;
        Ok(listed_files(path, &stdout))
    }

    async fn uninstall_library(&self, cluster_id: &str, wheel: &str) -> Result<()> {
        self.databricks(&["libraries", "uninstall", "--cluster-id", cluster_id, "--whl", wheel])
            .await
            .map(|_| ())
    }

    async fn install_library(&self, cluster_id: &str, wheel: &str) -> Result<()> {
        self.databricks(&["libraries", "install", "--cluster-id", cluster_id, "--whl", wheel])
            .await
            .map(|_| ())
    }

    async fn restart_cluster(&self, cluster_id: &str) -> Result<()> {
        self.databricks(&["clusters", "restart", "--cluster-id", cluster_id])
            .await
            .map(|_| ())
    }

    async fn cluster_events(&self, cluster_id: &str) -> Result<Vec<ClusterEvent>> {
        let events: ClusterEvents = self
            .databricks_json(&[
                "clusters",
                "events",
                "--cluster-id",
                cluster_id,
                "--order",
                "DESC",
                "--output",
                "JSON",
            ])
            .await?;
        Ok(events.events)
    }

    async fn library_statuses(&self, cluster_id: &str) -> Result<Vec<LibraryFullStatus>> {
        let statuses: ClusterLibraryStatuses = self
            .databricks_json(&["libraries", "cluster-status", "--cluster-id", cluster_id])
            .await?;
        Ok(statuses.library_statuses)
    }

    async fn list_jobs(&self) -> Result<HashMap<String, JobId>> {
        let jobs: JobList = self
            .databricks_json(&["jobs", "list", "--output", "JSON"])
            .await?;
        Ok(jobs.by_name())
    }

    async fn create_job(&self, settings: &Value) -> Result<Value> {
        let payload = stage_payload(settings)?;
        let path = payload.path().to_string_lossy().into_owned();
        let stdout = self
            .databricks(&["jobs", "create", "--json-file", path.as_str()])
            .await?;
        parse_json_or_empty(&stdout)
    }

    async fn reset_job(&self, job_id: JobId, settings: &Value) -> Result<Value> {
        let payload = stage_payload(settings)?;
        let path = payload.path().to_string_lossy().into_owned();
        let job_id = job_id.to_string();
        let stdout = self
            .databricks(&["jobs", "reset", "--job-id", job_id.as_str(), "--json-file", path.as_str()])
            .await?;
        parse_json_or_empty(&stdout)
    }

    async fn run_now(&self, job_id: JobId) -> Result<RunId> {
        let job_id = job_id.to_string();
        let triggered: RunNowResponse = self
            .databricks_json(&["jobs", "run-now", "--job-id", job_id.as_str()])
            .await?;
        Ok(triggered.run_id)
    }

    async fn get_run(&self, run_id: RunId) -> Result<Run> {
        let run_id = run_id.to_string();
        self.databricks_json(&["runs", "get", "--run-id", run_id.as_str()])
            .await
    }

    async fn get_run_output(&self, run_id: RunId) -> Result<RunOutput> {
        let run_id = run_id.to_string();
        self.databricks_json(&["runs", "get-output", "--run-id", run_id.as_str()])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_without_profile() {
        let workspace = CliWorkspace::new(None);
        assert_eq!(
            workspace.args(&["clusters", "restart", "--cluster-id", "c1"]),
            vec!["clusters", "restart", "--cluster-id", "c1"]
        );
    }

    #[test]
    fn test_args_with_profile_come_first() {
        let workspace = CliWorkspace::new(Some("dev".to_string()));
        assert_eq!(
            workspace.args(&["ls", "dbfs:/FileStore"]),
            vec!["--profile", "dev", "ls", "dbfs:/FileStore"]
        );
    }

    #[test]
    fn test_staged_payload_is_json() {
        let payload = json!({"name": "nightly-etl", "tasks": []});
        let file = stage_payload(&payload).unwrap();
        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(file.path()).unwrap()).unwrap();
        assert_eq!(written, payload);
        assert!(file.path().to_string_lossy().ends_with(".json"));
    }

    #[test]
    fn test_empty_output_is_empty_object() {
        assert_eq!(parse_json_or_empty("  \n").unwrap(), json!({}));
        assert_eq!(parse_json_or_empty(r#"{"job_id": 3}"#).unwrap(), json!({"job_id": 3}));
    }

    #[test]
    fn test_listed_files() {
        let files = listed_files("dbfs:/w/", "dbfs:/w/a.whl\n\ndbfs:/w/sub/\n");
        assert_eq!(files.len(), 2);
        assert!(!files[0].is_dir);
        assert!(files[1].is_dir);
    }

    #[tokio::test]
    async fn test_failed_command_reports_exit_code() {
        let workspace = CliWorkspace::new(None).with_binaries("false", "false");
        let err = workspace.restart_cluster("c1").await.unwrap_err();
        match err {
            ClientError::CommandFailed { command, code, .. } => {
                assert!(command.starts_with("false clusters restart"));
                assert_eq!(code, Some(1));
            }
            other => panic!("expected command failure, got {:?}", other),
        }
    }
}
