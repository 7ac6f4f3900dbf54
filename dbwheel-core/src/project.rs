//! Project metadata and artifact locations
//!
//! The wheel name and the default DBFS locations are derived from the
//! project's `pyproject.toml` and the current git branch. Both are read once
//! per invocation into a [`ProjectContext`] that is handed to the commands.

use std::path::Path;

use serde::Deserialize;

use crate::error::{CoreError, Result};

/// DBFS directory under which every project's wheels are uploaded
pub const ARTIFACT_ROOT: &str = "dbfs:/FileStore/wheels";

/// Name and version of the Python project being deployed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub name: String,
    pub version: String,
}

#[derive(Deserialize)]
struct PyProject {
    tool: Option<Tool>,
    project: Option<Metadata>,
}

#[derive(Deserialize)]
struct Tool {
    poetry: Option<Metadata>,
}

#[derive(Deserialize)]
struct Metadata {
    name: Option<String>,
    version: Option<String>,
}

impl Project {
    /// Read name and version from a `pyproject.toml`
    pub fn from_pyproject(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| CoreError::io(path, e))?;
        Self::parse_pyproject(path, &text)
    }

    /// Parse `[tool.poetry]`, falling back to the PEP 621 `[project]` table
    pub fn parse_pyproject(path: &Path, text: &str) -> Result<Self> {
        let doc: PyProject = toml::from_str(text).map_err(|e| CoreError::parse(path, e))?;

        let poetry = doc.tool.and_then(|tool| tool.poetry);
        [poetry, doc.project]
            .into_iter()
            .flatten()
            .find_map(|meta| match (meta.name, meta.version) {
                (Some(name), Some(version)) => Some(Self { name, version }),
                _ => None,
            })
            .ok_or_else(|| CoreError::parse(path, "no project name and version found"))
    }

    /// File name of the pure-Python wheel built for this project
    pub fn wheel_filename(&self) -> String {
        format!(
            "{}-{}-py3-none-any.whl",
            escape_name(&self.name),
            self.version
        )
    }
}

/// Replace every run of characters other than alphanumerics, `_` and `.`
/// with a single `_`
fn escape_name(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    let mut in_run = false;
    for c in name.chars() {
        if c.is_alphanumeric() || c == '_' || c == '.' {
            escaped.push(c);
            in_run = false;
        } else if !in_run {
            escaped.push('_');
            in_run = true;
        }
    }
    escaped
}

/// Everything needed to derive default artifact locations
#[derive(Debug, Clone)]
pub struct ProjectContext {
    pub project: Project,
    pub branch: String,
}

impl ProjectContext {
    pub fn new(project: Project, branch: impl Into<String>) -> Self {
        Self {
            project,
            branch: branch.into(),
        }
    }

    /// `dbfs:/FileStore/wheels/{branch}/{project}/`
    pub fn artifact_path(&self) -> String {
        format!("{}/{}/{}/", ARTIFACT_ROOT, self.branch, self.project.name)
    }

    /// Artifact path followed by the wheel file name
    pub fn wheel_path(&self) -> String {
        format!("{}{}", self.artifact_path(), self.project.wheel_filename())
    }
}
