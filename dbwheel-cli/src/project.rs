//! Project defaults
//!
//! Default artifact locations need the project metadata and the current
//! branch. Both are read at most once per invocation, and only when a
//! command actually falls back to a default.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use dbwheel_core::project::{Project, ProjectContext};
use tokio::process::Command;
use tracing::debug;

use crate::config::Config;

const PYPROJECT: &str = "pyproject.toml";

/// Lazily computed defaults for artifact path and wheel
pub struct ProjectDefaults<'a> {
    config: &'a Config,
    branch: Option<String>,
    pyproject: PathBuf,
    context: Option<ProjectContext>,
}

impl<'a> ProjectDefaults<'a> {
    /// `branch` is the `--branch-name` flag, if given
    pub fn new(config: &'a Config, branch: Option<String>) -> Self {
        Self {
            config,
            branch,
            pyproject: PathBuf::from(PYPROJECT),
            context: None,
        }
    }

    #[cfg(test)]
    fn with_pyproject(mut self, path: impl Into<PathBuf>) -> Self {
        self.pyproject = path.into();
        self
    }

    pub async fn context(&mut self) -> Result<&ProjectContext> {
        let context = match self.context.take() {
            Some(context) => context,
            None => self.load().await?,
        };
        Ok(self.context.insert(context))
    }

    async fn load(&self) -> Result<ProjectContext> {
        let project = Project::from_pyproject(&self.pyproject)
            .with_context(|| format!("Failed to read project metadata from {}", self.pyproject.display()))?;

        let branch = match self
            .config
            .settings
            .optional(self.branch.clone(), "databricks.branch-name")
        {
            Some(branch) => branch,
            None => current_branch().await?,
        };

        debug!(
            "Project {} {} on branch {}",
            project.name, project.version, branch
        );
        Ok(ProjectContext::new(project, branch))
    }

    /// Flag, then `databricks.artifact-path`, then the branch default
    pub async fn artifact_path(&mut self, explicit: Option<String>) -> Result<String> {
        match self
            .config
            .settings
            .optional(explicit, "databricks.artifact-path")
        {
            Some(path) => Ok(path),
            None => Ok(self.context().await?.artifact_path()),
        }
    }

    /// Flag, then `databricks.wheel`, then the predicted wheel in the default artifact path
    pub async fn wheel(&mut self, explicit: Option<String>) -> Result<String> {
        match self.config.settings.optional(explicit, "databricks.wheel") {
            Some(wheel) => Ok(wheel),
            None => Ok(self.context().await?.wheel_path()),
        }
    }
}

/// Name of the checked out git branch
pub async fn current_branch() -> Result<String> {
    let output = Command::new("git")
        .args(["branch", "--show-current"])
        .output()
        .await
        .context("Failed to execute 'git branch --show-current'. Is git installed?")?;

    if !output.status.success() {
        bail!(
            "git branch --show-current failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let branch = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if branch.is_empty() {
        bail!("HEAD is detached; pass --branch-name or set databricks.branch-name");
    }
    Ok(branch)
}
