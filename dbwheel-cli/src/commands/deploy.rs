//! Full deployment flow

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use dbwheel_client::Workspace;
use dbwheel_core::domain::job::JobId;

use super::artifacts::upload_to;
use super::build::{DIST_DIR, build};
use super::cluster::reinstall_on;
use super::job::run_and_wait;
use crate::config::{Config, Waits};
use crate::project::ProjectDefaults;

#[derive(Args, Debug, Clone)]
pub struct DeployArgs {
    /// Databricks CLI profile
    #[arg(long)]
    pub profile: Option<String>,

    #[arg(long)]
    pub artifact_path: Option<String>,

    #[arg(long)]
    pub cluster_id: Option<String>,

    #[arg(long)]
    pub wheel: Option<String>,

    #[arg(long)]
    pub job_id: Option<JobId>,

    #[arg(long)]
    pub branch_name: Option<String>,

    /// Skip the build and upload what is already in the source path
    #[arg(long)]
    pub skip_build: bool,

    #[arg(long, default_value = DIST_DIR)]
    pub source_path: PathBuf,

    /// Do not fetch and print the run output
    #[arg(long)]
    pub no_output: bool,
}

/// Everything a deployment needs once the build output exists
#[derive(Debug, Clone)]
pub struct Release {
    pub source_path: PathBuf,
    pub artifact_path: String,
    pub cluster_id: String,
    pub wheel: String,
    pub job_id: JobId,
    pub fetch_output: bool,
}

/// Build, upload, reinstall and run, stopping at the first failure
pub async fn deploy(args: DeployArgs, config: &Config) -> Result<()> {
    // Resolve everything up front so a missing key fails before the build
    let cluster_id = config.cluster_id(args.cluster_id)?;
    let job_id = config.job_id(args.job_id)?;
    let mut defaults = ProjectDefaults::new(config, args.branch_name);
    let release = Release {
        artifact_path: defaults.artifact_path(args.artifact_path).await?,
        wheel: defaults.wheel(args.wheel).await?,
        source_path: args.source_path,
        cluster_id,
        job_id,
        fetch_output: !args.no_output,
    };
    let workspace = config.workspace(args.profile);

    if !args.skip_build {
        build().await?;
    }
    ship(workspace.as_ref(), &release, &config.waits).await
}

/// Upload, reinstall and run a built release
pub async fn ship(workspace: &dyn Workspace, release: &Release, waits: &Waits) -> Result<()> {
    upload_to(workspace, &release.source_path, &release.artifact_path).await?;
    reinstall_on(workspace, &release.cluster_id, &release.wheel, waits).await?;
    run_and_wait(workspace, release.job_id, release.fetch_output, waits).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbwheel_client::fake::{ScriptedWorkspace, event, run, wheel_status};
    use dbwheel_client::{ClientError, PollSettings};
    use std::time::Duration;

    const WHEEL: &str = "dbfs:/FileStore/wheels/main/etl/etl-0.1.0-py3-none-any.whl";

    fn release() -> Release {
        Release {
            source_path: PathBuf::from("dist"),
            artifact_path: "dbfs:/FileStore/wheels/main/etl/".to_string(),
            cluster_id: "c1".to_string(),
            wheel: WHEEL.to_string(),
            job_id: 42,
            fetch_output: true,
        }
    }

    fn waits() -> Waits {
        Waits {
            poll: PollSettings::default().with_delay(Duration::ZERO),
            ..Waits::default()
        }
    }

    #[tokio::test]
    async fn test_ship_runs_every_step_in_order() {
        let workspace = ScriptedWorkspace::default();
        workspace.push_cluster_events(vec![event("RUNNING")]);
        workspace.push_library_statuses(vec![wheel_status(WHEEL, "INSTALLED")]);
        workspace.push_run(run(420, "TERMINATED", None));

        ship(&workspace, &release(), &waits()).await.unwrap();

        let operations: Vec<String> = workspace
            .calls()
            .iter()
            .map(|call| call.split(' ').next().unwrap_or_default().to_string())
            .collect();
        assert_eq!(
            operations,
            vec![
                "dbfs_remove",
                "dbfs_copy",
                "dbfs_list",
                "uninstall_library",
                "restart_cluster",
                "cluster_events",
                "install_library",
                "library_statuses",
                "run_now",
                "get_run",
                "get_run_output",
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_upload_stops_deployment() {
        let workspace = ScriptedWorkspace::default().failing_on("dbfs_copy");

        let err = ship(&workspace, &release(), &waits()).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ClientError>(),
            Some(ClientError::ApiError { status: 500, .. })
        ));
        assert_eq!(
            workspace.calls(),
            vec![
                "dbfs_remove dbfs:/FileStore/wheels/main/etl/ true",
                "dbfs_copy dist dbfs:/FileStore/wheels/main/etl/ true",
            ]
        );
        assert_eq!(workspace.calls_matching(&format!("uninstall_library c1 {}", WHEEL)), 0);
        assert_eq!(workspace.calls_matching("run_now 42"), 0);
    }

    #[tokio::test]
    async fn test_failed_install_skips_job_run() {
        let workspace = ScriptedWorkspace::default();
        workspace.push_cluster_events(vec![event("RUNNING")]);
        workspace.push_library_statuses(vec![wheel_status(WHEEL, "FAILED")]);

        let err = ship(&workspace, &release(), &waits()).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ClientError>(),
            Some(ClientError::RemoteOperationFailed { status, .. }) if status == "FAILED"
        ));
        assert_eq!(workspace.calls_matching("run_now 42"), 0);
    }
}
