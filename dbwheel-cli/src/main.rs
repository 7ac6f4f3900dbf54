//! dbwheel CLI
//!
//! Builds a Python wheel, ships it to DBFS, reinstalls it on a Databricks
//! cluster and runs the project's job.

mod commands;
mod config;
mod output;
mod project;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::{Config, GlobalArgs};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "dbwheel")]
#[command(about = "Deploy Python wheels and jobs to Databricks", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dbwheel=info,dbwheel_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.global)?;

    handle_command(cli.command, &config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_define_job_accepts_repeated_overrides() {
        let cli = Cli::try_parse_from([
            "dbwheel",
            "--config",
            "dbwheel.yml",
            "define-job",
            "--template",
            "job.json.j2",
            "--config",
            "vars.yml",
            "-e",
            "env=dev",
            "-e",
            "owner=data",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(cli.global.config.as_deref(), Some(std::path::Path::new("dbwheel.yml")));
        match cli.command {
            Commands::DefineJob(args) => {
                assert_eq!(args.env, vec!["env=dev", "owner=data"]);
                assert!(args.dry_run);
                assert_eq!(args.config, std::path::PathBuf::from("vars.yml"));
            }
            _ => panic!("expected define-job"),
        }
    }

    #[test]
    fn test_run_job_flags() {
        let cli = Cli::try_parse_from(["dbwheel", "--poll-delay", "1", "run-job", "--job-id", "42", "--no-output"])
            .unwrap();

        assert_eq!(cli.global.poll_delay, 1);
        match cli.command {
            Commands::RunJob(args) => {
                assert_eq!(args.job_id, Some(42));
                assert!(args.no_output);
            }
            _ => panic!("expected run-job"),
        }
    }
}
