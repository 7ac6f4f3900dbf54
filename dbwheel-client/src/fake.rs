//! Scripted in-memory workspace for tests
//!
//! Available to other crates through the `test-util` feature.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use dbwheel_core::domain::cluster::ClusterEvent;
use dbwheel_core::domain::dbfs::FileInfo;
use dbwheel_core::domain::job::{JobId, Run, RunId, RunOutput, RunState};
use dbwheel_core::domain::library::{Library, LibraryFullStatus};
use serde_json::{Value, json};

use crate::error::{ClientError, Result};
use crate::workspace::Workspace;

/// Each poll query pops the next scripted response; running out is an error
#[derive(Default)]
pub struct ScriptedWorkspace {
    pub jobs: HashMap<String, JobId>,
    pub next_job_id: JobId,
    failing: Option<String>,
    cluster_events: Mutex<VecDeque<Vec<ClusterEvent>>>,
    library_statuses: Mutex<VecDeque<Vec<LibraryFullStatus>>>,
    runs: Mutex<VecDeque<Run>>,
    calls: Mutex<Vec<String>>,
    payloads: Mutex<Vec<Value>>,
}

impl ScriptedWorkspace {
    pub fn with_jobs<'a>(jobs: impl IntoIterator<Item = (&'a str, JobId)>) -> Self {
        Self {
            jobs: jobs
                .into_iter()
                .map(|(name, id)| (name.to_string(), id))
                .collect(),
            next_job_id: 100,
            ..Self::default()
        }
    }

    /// Make every call to `operation` fail with an API error
    pub fn failing_on(mut self, operation: &str) -> Self {
        self.failing = Some(operation.to_string());
        self
    }

    pub fn push_cluster_events(&self, events: Vec<ClusterEvent>) {
        self.cluster_events.lock().unwrap().push_back(events);
    }

    pub fn push_library_statuses(&self, statuses: Vec<LibraryFullStatus>) {
        self.library_statuses.lock().unwrap().push_back(statuses);
    }

    pub fn push_run(&self, run: Run) {
        self.runs.lock().unwrap().push_back(run);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_matching(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    pub fn payloads(&self) -> Vec<Value> {
        self.payloads.lock().unwrap().clone()
    }

    /// Log the call, then fail it if its operation is the failing one
    fn record(&self, call: impl Into<String>) -> Result<()> {
        let call = call.into();
        let operation = call.split(' ').next().unwrap_or_default().to_string();
        self.calls.lock().unwrap().push(call);

        match &self.failing {
            Some(failing) if *failing == operation => {
                Err(ClientError::api_error(500, format!("{} failed", operation)))
            }
            _ => Ok(()),
        }
    }
}

fn exhausted(what: &str) -> ClientError {
    ClientError::ParseError(format!("script exhausted: {}", what))
}

pub fn event(kind: &str) -> ClusterEvent {
    ClusterEvent {
        cluster_id: Some("c1".to_string()),
        timestamp: Some(1_672_531_200_000),
        kind: kind.to_string(),
        details: None,
    }
}

pub fn wheel_status(path: &str, status: &str) -> LibraryFullStatus {
    LibraryFullStatus {
        library: Library::wheel(path),
        status: status.to_string(),
        messages: Vec::new(),
        is_library_for_all_clusters: false,
    }
}

pub fn run(run_id: RunId, state: &str, url: Option<&str>) -> Run {
    Run {
        run_id,
        job_id: Some(42),
        run_page_url: url.map(str::to_string),
        state: RunState {
            life_cycle_state: state.to_string(),
            result_state: (state == "TERMINATED").then(|| "SUCCESS".to_string()),
            state_message: None,
        },
    }
}

#[async_trait]
impl Workspace for ScriptedWorkspace {
    async fn dbfs_remove(&self, path: &str, recursive: bool) -> Result<()> {
        self.record(format!("dbfs_remove {} {}", path, recursive))?;
        Ok(())
    }

    async fn dbfs_copy(&self, local_dir: &Path, remote_dir: &str, overwrite: bool) -> Result<()> {
        self.record(format!(
            "dbfs_copy {} {} {}",
            local_dir.display(),
            remote_dir,
            overwrite
        ))?;
        Ok(())
    }

    async fn dbfs_list(&self, path: &str) -> Result<Vec<FileInfo>> {
        self.record(format!("dbfs_list {}", path))?;
        Ok(Vec::new())
    }

    async fn uninstall_library(&self, cluster_id: &str, wheel: &str) -> Result<()> {
        self.record(format!("uninstall_library {} {}", cluster_id, wheel))?;
        Ok(())
    }

    async fn install_library(&self, cluster_id: &str, wheel: &str) -> Result<()> {
        self.record(format!("install_library {} {}", cluster_id, wheel))?;
        Ok(())
    }

    async fn restart_cluster(&self, cluster_id: &str) -> Result<()> {
        self.record(format!("restart_cluster {}", cluster_id))?;
        Ok(())
    }

    async fn cluster_events(&self, cluster_id: &str) -> Result<Vec<ClusterEvent>> {
        self.record(format!("cluster_events {}", cluster_id))?;
        self.cluster_events
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| exhausted("cluster events"))
    }

    async fn library_statuses(&self, cluster_id: &str) -> Result<Vec<LibraryFullStatus>> {
        self.record(format!("library_statuses {}", cluster_id))?;
        self.library_statuses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| exhausted("library statuses"))
    }

    async fn list_jobs(&self) -> Result<HashMap<String, JobId>> {
        self.record("list_jobs")?;
        Ok(self.jobs.clone())
    }

    async fn create_job(&self, settings: &Value) -> Result<Value> {
        self.record("create_job")?;
        self.payloads.lock().unwrap().push(settings.clone());
        Ok(json!({ "job_id": self.next_job_id }))
    }

    async fn reset_job(&self, job_id: JobId, settings: &Value) -> Result<Value> {
        self.record(format!("reset_job {}", job_id))?;
        self.payloads.lock().unwrap().push(settings.clone());
        Ok(json!({}))
    }

    async fn run_now(&self, job_id: JobId) -> Result<RunId> {
        self.record(format!("run_now {}", job_id))?;
        Ok(job_id * 10)
    }

    async fn get_run(&self, run_id: RunId) -> Result<Run> {
        self.record(format!("get_run {}", run_id))?;
        self.runs
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| exhausted("runs"))
    }

    async fn get_run_output(&self, run_id: RunId) -> Result<RunOutput> {
        self.record(format!("get_run_output {}", run_id))?;
        Ok(RunOutput {
            logs: Some("done".to_string()),
            ..RunOutput::default()
        })
    }
}
