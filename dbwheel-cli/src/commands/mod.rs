//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod artifacts;
mod build;
mod cluster;
mod deploy;
mod job;

pub use artifacts::{CleanArgs, UploadArgs};
pub use cluster::ReinstallArgs;
pub use deploy::DeployArgs;
pub use job::{DefineJobArgs, RunJobArgs};

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Rebuild the wheel into dist/
    Build,
    /// Replace the remote artifact directory with the local build output
    Upload(UploadArgs),
    /// Remove the remote artifact directory
    Clean(CleanArgs),
    /// Reinstall the wheel on a cluster, restarting it in between
    Reinstall(ReinstallArgs),
    /// Trigger the project's job and wait for the run to finish
    RunJob(RunJobArgs),
    /// Render a job definition template and create or reset the job
    DefineJob(DefineJobArgs),
    /// Build, upload, reinstall and run the job
    Deploy(DeployArgs),
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Build => build::build().await,
        Commands::Upload(args) => artifacts::upload(args, config).await,
        Commands::Clean(args) => artifacts::clean(args, config).await,
        Commands::Reinstall(args) => cluster::reinstall(args, config).await,
        Commands::RunJob(args) => job::run_job(args, config).await,
        Commands::DefineJob(args) => job::define_job(args, config).await,
        Commands::Deploy(args) => deploy::deploy(args, config).await,
    }
}
