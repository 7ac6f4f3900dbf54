//! Job definition upserts
//!
//! A job is identified by its name. Upserting a definition creates the job
//! when no job of that name exists and resets the existing job's settings
//! otherwise. Job templates may reference `job_id`, so [`define_job`]
//! renders once to learn the name, looks the id up, and renders again with
//! the id in scope.

use std::path::Path;

use dbwheel_core::domain::job::JobId;
use dbwheel_core::template::JobContext;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{ClientError, Result};
use crate::workspace::Workspace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
    Created,
    Reset,
}

#[derive(Debug, Clone)]
pub struct UpsertOutcome {
    pub action: UpsertAction,
    pub job_id: JobId,
    /// Raw workspace response
    pub response: Value,
}

/// A rendered job definition together with the job it targets
#[derive(Debug, Clone)]
pub struct JobDefinition {
    pub name: String,
    pub settings: Value,
    /// Existing job to reset; `None` creates a new job
    pub job_id: Option<JobId>,
}

/// Name of the job a definition describes
///
/// # Errors
/// `InvalidDefinition` when `name` is missing or not a string.
pub fn job_name(settings: &Value) -> Result<&str> {
    settings
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| ClientError::InvalidDefinition("job definition has no \"name\"".to_string()))
}

/// Existing job id for `name`, if any
pub async fn find_job(workspace: &dyn Workspace, name: &str) -> Result<Option<JobId>> {
    let jobs = workspace.list_jobs().await?;
    debug!("Workspace lists {} job(s)", jobs.len());
    Ok(jobs.get(name).copied())
}

/// Create or reset the job described by `settings`
///
/// With `job_id` the listing is skipped and that job is reset.
pub async fn upsert_job(
    workspace: &dyn Workspace,
    settings: &Value,
    job_id: Option<JobId>,
) -> Result<UpsertOutcome> {
    let name = job_name(settings)?;
    let job_id = match job_id {
        Some(id) => Some(id),
        None => find_job(workspace, name).await?,
    };

    apply_definition(
        workspace,
        &JobDefinition {
            name: name.to_string(),
            settings: settings.clone(),
            job_id,
        },
    )
    .await
}

/// Send a resolved definition to the workspace
pub async fn apply_definition(
    workspace: &dyn Workspace,
    definition: &JobDefinition,
) -> Result<UpsertOutcome> {
    match definition.job_id {
        Some(job_id) => {
            info!("Resetting job {} ({})", definition.name, job_id);
            let response = workspace.reset_job(job_id, &definition.settings).await?;
            Ok(UpsertOutcome {
                action: UpsertAction::Reset,
                job_id,
                response,
            })
        }
        None => {
            info!("Creating job {}", definition.name);
            let response = workspace.create_job(&definition.settings).await?;
            let job_id = response
                .get("job_id")
                .and_then(Value::as_i64)
                .ok_or_else(|| {
                    ClientError::ParseError(format!("create response has no job_id: {}", response))
                })?;
            Ok(UpsertOutcome {
                action: UpsertAction::Created,
                job_id,
                response,
            })
        }
    }
}

/// Render `template` and resolve the job it targets without changing anything
///
/// An explicit `job_id` is injected straight away. Otherwise the template is
/// rendered once to read the job name; when a job of that name exists the
/// template is rendered again with its id in scope.
pub async fn resolve_definition(
    workspace: &dyn Workspace,
    template: &Path,
    context: &JobContext,
    job_id: Option<JobId>,
) -> Result<JobDefinition> {
    if let Some(job_id) = job_id {
        let settings = context.clone().with_job_id(job_id).render_definition(template)?;
        let name = job_name(&settings)?.to_string();
        return Ok(JobDefinition {
            name,
            settings,
            job_id: Some(job_id),
        });
    }

    let first = context.render_definition(template)?;
    let name = job_name(&first)?.to_string();

    match find_job(workspace, &name).await? {
        Some(existing) => {
            debug!("Job {} exists as {}, rendering with its id", name, existing);
            let settings = context.clone().with_job_id(existing).render_definition(template)?;
            Ok(JobDefinition {
                name,
                settings,
                job_id: Some(existing),
            })
        }
        None => Ok(JobDefinition {
            name,
            settings: first,
            job_id: None,
        }),
    }
}

/// Render `template` and upsert the resulting job
pub async fn define_job(
    workspace: &dyn Workspace,
    template: &Path,
    context: &JobContext,
    job_id: Option<JobId>,
) -> Result<UpsertOutcome> {
    let definition = resolve_definition(workspace, template, context, job_id).await?;
    apply_definition(workspace, &definition).await
}
