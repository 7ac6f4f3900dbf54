//! DBFS artifact commands

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use dbwheel_client::Workspace;

use super::build::DIST_DIR;
use crate::config::Config;
use crate::output;
use crate::project::ProjectDefaults;

#[derive(Args, Debug, Clone)]
pub struct UploadArgs {
    /// Databricks CLI profile
    #[arg(long)]
    pub profile: Option<String>,

    /// Remote directory, e.g. dbfs:/FileStore/wheels/main/my-project/
    #[arg(long)]
    pub artifact_path: Option<String>,

    /// Branch used for the default artifact path
    #[arg(long)]
    pub branch_name: Option<String>,

    /// Local directory to upload
    #[arg(long, default_value = DIST_DIR)]
    pub source_path: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct CleanArgs {
    /// Databricks CLI profile
    #[arg(long)]
    pub profile: Option<String>,

    /// Remote directory to remove
    #[arg(long)]
    pub artifact_path: Option<String>,

    /// Branch used for the default artifact path
    #[arg(long)]
    pub branch_name: Option<String>,
}

pub async fn upload(args: UploadArgs, config: &Config) -> Result<()> {
    let mut defaults = ProjectDefaults::new(config, args.branch_name);
    let artifact_path = defaults.artifact_path(args.artifact_path).await?;
    let workspace = config.workspace(args.profile);

    upload_to(workspace.as_ref(), &args.source_path, &artifact_path).await
}

/// Replace `artifact_path` with the contents of `source`, then list it
pub async fn upload_to(workspace: &dyn Workspace, source: &Path, artifact_path: &str) -> Result<()> {
    output::step(&format!("Uploading {} to {}", source.display(), artifact_path));

    workspace.dbfs_remove(artifact_path, true).await?;
    workspace.dbfs_copy(source, artifact_path, true).await?;

    let files = workspace.dbfs_list(artifact_path).await?;
    output::print_files(artifact_path, &files);
    Ok(())
}

pub async fn clean(args: CleanArgs, config: &Config) -> Result<()> {
    let mut defaults = ProjectDefaults::new(config, args.branch_name);
    let artifact_path = defaults.artifact_path(args.artifact_path).await?;
    let workspace = config.workspace(args.profile);

    output::step(&format!("Removing {}", artifact_path));
    workspace.dbfs_remove(&artifact_path, true).await?;
    output::success("Artifacts removed");
    Ok(())
}
