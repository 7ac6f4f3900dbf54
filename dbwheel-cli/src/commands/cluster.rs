//! Cluster commands

use anyhow::Result;
use clap::Args;
use dbwheel_client::{Workspace, wait_for_cluster, wait_for_library};

use crate::config::{Config, Waits};
use crate::output::{self, ConsoleObserver};
use crate::project::ProjectDefaults;

#[derive(Args, Debug, Clone)]
pub struct ReinstallArgs {
    /// Databricks CLI profile
    #[arg(long)]
    pub profile: Option<String>,

    /// Cluster to reinstall the wheel on
    #[arg(long)]
    pub cluster_id: Option<String>,

    /// DBFS path of the wheel
    #[arg(long)]
    pub wheel: Option<String>,

    /// Branch used for the default wheel path
    #[arg(long)]
    pub branch_name: Option<String>,
}

pub async fn reinstall(args: ReinstallArgs, config: &Config) -> Result<()> {
    let cluster_id = config.cluster_id(args.cluster_id)?;
    let mut defaults = ProjectDefaults::new(config, args.branch_name);
    let wheel = defaults.wheel(args.wheel).await?;
    let workspace = config.workspace(args.profile);

    reinstall_on(workspace.as_ref(), &cluster_id, &wheel, &config.waits).await
}

/// Uninstall, restart, wait for the cluster, install and wait for the library
pub async fn reinstall_on(
    workspace: &dyn Workspace,
    cluster_id: &str,
    wheel: &str,
    waits: &Waits,
) -> Result<()> {
    let mut observer = ConsoleObserver;

    output::step(&format!("Uninstalling {} from {}", wheel, cluster_id));
    workspace.uninstall_library(cluster_id, wheel).await?;

    output::step(&format!("Restarting cluster {}", cluster_id));
    workspace.restart_cluster(cluster_id).await?;
    wait_for_cluster(workspace, cluster_id, &waits.cluster, &waits.poll, &mut observer).await?;

    output::step(&format!("Installing {} on {}", wheel, cluster_id));
    workspace.install_library(cluster_id, wheel).await?;
    wait_for_library(
        workspace,
        cluster_id,
        wheel,
        &waits.library,
        &waits.poll,
        &mut observer,
    )
    .await?;

    output::success("Wheel installed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbwheel_client::fake::{ScriptedWorkspace, event, wheel_status};
    use dbwheel_client::{ClientError, PollSettings, StatusSets};
    use std::time::Duration;

    const WHEEL: &str = "dbfs:/FileStore/wheels/main/etl/etl-0.1.0-py3-none-any.whl";

    fn waits() -> Waits {
        Waits {
            poll: PollSettings::default().with_delay(Duration::ZERO),
            ..Waits::default()
        }
    }

    #[tokio::test]
    async fn test_reinstall_order() {
        let workspace = ScriptedWorkspace::default();
        workspace.push_cluster_events(vec![event("RESTARTING")]);
        workspace.push_cluster_events(vec![event("RUNNING"), event("RESTARTING")]);
        workspace.push_library_statuses(vec![wheel_status(WHEEL, "INSTALLED")]);

        reinstall_on(&workspace, "c1", WHEEL, &waits()).await.unwrap();

        assert_eq!(
            workspace.calls(),
            vec![
                format!("uninstall_library c1 {}", WHEEL),
                "restart_cluster c1".to_string(),
                "cluster_events c1".to_string(),
                "cluster_events c1".to_string(),
                format!("install_library c1 {}", WHEEL),
                "library_statuses c1".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_restart_skips_install() {
        let workspace = ScriptedWorkspace::default().failing_on("restart_cluster");

        let err = reinstall_on(&workspace, "c1", WHEEL, &waits()).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ClientError>(),
            Some(ClientError::ApiError { status: 500, .. })
        ));
        assert_eq!(workspace.calls_matching("cluster_events c1"), 0);
        assert_eq!(workspace.calls_matching(&format!("install_library c1 {}", WHEEL)), 0);
    }

    #[tokio::test]
    async fn test_cluster_error_event_stops_reinstall() {
        let workspace = ScriptedWorkspace::default();
        workspace.push_cluster_events(vec![event("ERROR")]);

        let err = reinstall_on(&workspace, "c1", WHEEL, &waits()).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ClientError>(),
            Some(ClientError::RemoteOperationFailed { status, .. }) if status == "ERROR"
        ));
        assert_eq!(workspace.calls_matching(&format!("install_library c1 {}", WHEEL)), 0);
    }

    #[tokio::test]
    async fn test_configured_cluster_target_is_honored() {
        let workspace = ScriptedWorkspace::default();
        workspace.push_cluster_events(vec![event("RESIZING")]);
        workspace.push_library_statuses(vec![wheel_status(WHEEL, "INSTALLED")]);
        let waits = Waits {
            cluster: StatusSets::new(["RUNNING", "RESIZING"], ["ERROR"]),
            ..waits()
        };

        reinstall_on(&workspace, "c1", WHEEL, &waits).await.unwrap();
        assert_eq!(workspace.calls_matching("cluster_events c1"), 1);
    }
}
