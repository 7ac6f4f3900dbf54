//! Job command handlers
//!
//! Triggering the project's job and defining jobs from templates.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use dbwheel_client::upsert::{apply_definition, resolve_definition};
use dbwheel_client::{Workspace, wait_for_run};
use dbwheel_core::domain::job::JobId;
use dbwheel_core::template::{JobContext, load_config, parse_key_values};

use crate::config::{Config, Waits};
use crate::output::{self, ConsoleObserver};

#[derive(Args, Debug, Clone)]
pub struct RunJobArgs {
    /// Databricks CLI profile
    #[arg(long)]
    pub profile: Option<String>,

    /// Job to trigger
    #[arg(long)]
    pub job_id: Option<JobId>,

    /// Do not fetch and print the run output
    #[arg(long)]
    pub no_output: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DefineJobArgs {
    /// Databricks CLI profile
    #[arg(long)]
    pub profile: Option<String>,

    /// Reset this job instead of looking the job up by name
    #[arg(long)]
    pub job_id: Option<JobId>,

    /// Job definition template (JSON with Jinja syntax)
    #[arg(long)]
    pub template: PathBuf,

    /// Template variables (JSON or YAML)
    #[arg(long)]
    pub config: PathBuf,

    /// Extra template variable, repeatable
    #[arg(short = 'e', long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Print the rendered definition without changing the workspace
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn run_job(args: RunJobArgs, config: &Config) -> Result<()> {
    let job_id = config.job_id(args.job_id)?;
    let workspace = config.workspace(args.profile);

    run_and_wait(workspace.as_ref(), job_id, !args.no_output, &config.waits).await
}

/// Trigger `job_id`, wait for the run and print its output
pub async fn run_and_wait(
    workspace: &dyn Workspace,
    job_id: JobId,
    fetch_output: bool,
    waits: &Waits,
) -> Result<()> {
    output::step(&format!("Running job {}", job_id));
    let run_id = workspace.run_now(job_id).await?;

    let report = wait_for_run(
        workspace,
        run_id,
        &waits.run,
        &waits.poll,
        &mut ConsoleObserver,
        fetch_output,
    )
    .await?;

    if let Some(run_output) = &report.output {
        output::print_run_output(run_output);
    }

    output::success(&format!(
        "Run {} finished: {}",
        run_id,
        report.run.state.result_state.as_deref().unwrap_or("-")
    ));
    Ok(())
}

pub async fn define_job(args: DefineJobArgs, config: &Config) -> Result<()> {
    let overrides = parse_key_values(&args.env)?;
    let variables = load_config(&args.config, overrides.as_ref())
        .with_context(|| format!("Failed to load template variables from {}", args.config.display()))?;
    let context = JobContext::from_config(&variables)?.with_overrides(overrides.as_ref());

    let workspace = config.workspace(args.profile);
    let definition =
        resolve_definition(workspace.as_ref(), &args.template, &context, args.job_id).await?;

    if args.dry_run {
        let target = match definition.job_id {
            Some(job_id) => format!("would reset job {}", job_id),
            None => "would create a new job".to_string(),
        };
        output::step(&format!("{} ({})", definition.name, target));
        println!("{}", serde_json::to_string_pretty(&definition.settings)?);
        return Ok(());
    }

    let outcome = apply_definition(workspace.as_ref(), &definition).await?;
    output::print_upsert(&outcome);
    Ok(())
}
