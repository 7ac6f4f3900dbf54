//! Configuration module
//!
//! Global flags, the project configuration file and the workspace backend
//! they select.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use clap::Args;
use dbwheel_client::{CliWorkspace, PollSettings, RestWorkspace, StatusSets, Workspace};
use dbwheel_core::ConfigTree;
use dbwheel_core::domain::job::JobId;
use dbwheel_core::template::load_config;
use serde_json::Value;
use tracing::{debug, info};

/// Configuration files looked up in the working directory, in order
const DEFAULT_CONFIG_FILES: [&str; 3] = ["dbwheel.yaml", "dbwheel.yml", "dbwheel.json"];

/// Flags shared by every command
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Project configuration file (JSON or YAML)
    #[arg(long, env = "DBWHEEL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Workspace URL; together with --token the REST API is used instead of the Databricks CLI
    #[arg(long, env = "DATABRICKS_HOST")]
    pub host: Option<String>,

    /// Personal access token for the REST API
    #[arg(long, env = "DATABRICKS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Seconds between two status queries
    #[arg(long, default_value_t = 5)]
    pub poll_delay: u64,

    /// Give up waiting after this many seconds
    #[arg(long)]
    pub poll_timeout: Option<u64>,

    /// Give up waiting after this many status queries
    #[arg(long)]
    pub max_attempts: Option<u32>,
}

/// Pacing and terminal statuses of the wait operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Waits {
    pub poll: PollSettings,
    pub cluster: StatusSets,
    pub library: StatusSets,
    pub run: StatusSets,
}

impl Default for Waits {
    fn default() -> Self {
        Self {
            poll: PollSettings::default(),
            cluster: StatusSets::cluster(),
            library: StatusSets::library(),
            run: StatusSets::run(),
        }
    }
}

impl Waits {
    /// Status sets from `databricks.poll.<cluster|library|run>.<target|failure>`
    ///
    /// A list replaces the built-in set it names; absent keys keep it.
    fn from_settings(settings: &ConfigTree, poll: PollSettings) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            poll,
            cluster: status_sets(settings, "cluster", defaults.cluster)?,
            library: status_sets(settings, "library", defaults.library)?,
            run: status_sets(settings, "run", defaults.run)?,
        })
    }
}

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Project configuration tree (`databricks.*` keys)
    pub settings: ConfigTree,
    /// Every wait operation goes through these
    pub waits: Waits,
    host: Option<String>,
    token: Option<String>,
}

impl Config {
    /// Assemble the configuration from the global flags
    pub fn load(args: GlobalArgs) -> Result<Self> {
        let settings = match config_file(args.config.as_deref()) {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                let root = load_config(&path, None)
                    .with_context(|| format!("Failed to load configuration {}", path.display()))?;
                ConfigTree::new(root)
            }
            None => {
                debug!("No configuration file found, using flags only");
                ConfigTree::default()
            }
        };

        let poll = poll_settings(args.poll_delay, args.poll_timeout, args.max_attempts);
        let waits = Waits::from_settings(&settings, poll)?;

        Ok(Self {
            settings,
            waits,
            host: args.host,
            token: args.token,
        })
    }

    #[cfg(test)]
    pub fn with_settings(settings: ConfigTree) -> Self {
        Self {
            settings,
            waits: Waits::default(),
            host: None,
            token: None,
        }
    }

    /// Resolve the CLI profile from a flag or `databricks.profile`
    pub fn profile(&self, explicit: Option<String>) -> Option<String> {
        self.settings.optional(explicit, "databricks.profile")
    }

    /// REST workspace when host and token are known, Databricks CLI otherwise
    pub fn workspace(&self, profile: Option<String>) -> Box<dyn Workspace> {
        match (&self.host, &self.token) {
            (Some(host), Some(token)) => {
                debug!("Using the REST API at {}", host);
                Box::new(RestWorkspace::new(host.as_str(), token.as_str()))
            }
            _ => {
                let profile = self.profile(profile);
                debug!("Using the Databricks CLI (profile {:?})", profile);
                Box::new(CliWorkspace::new(profile))
            }
        }
    }

    pub fn cluster_id(&self, explicit: Option<String>) -> Result<String> {
        Ok(self.settings.require(explicit, "databricks.cluster-id")?)
    }

    pub fn job_id(&self, explicit: Option<JobId>) -> Result<JobId> {
        match explicit {
            Some(id) => Ok(id),
            None => {
                let raw = self.settings.require(None, "databricks.job-id")?;
                raw.parse()
                    .with_context(|| format!("databricks.job-id is not a job id: {}", raw))
            }
        }
    }
}

/// The explicit file, else the first default file present
fn config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => DEFAULT_CONFIG_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.is_file()),
    }
}

fn status_sets(settings: &ConfigTree, resource: &str, defaults: StatusSets) -> Result<StatusSets> {
    let target = status_list(settings, &format!("databricks.poll.{}.target", resource))?;
    let failure = status_list(settings, &format!("databricks.poll.{}.failure", resource))?;

    Ok(StatusSets {
        target: target.unwrap_or(defaults.target),
        failure: failure.unwrap_or(defaults.failure),
    })
}

fn status_list(settings: &ConfigTree, key: &str) -> Result<Option<Vec<String>>> {
    let Some(value) = settings.lookup(key) else {
        return Ok(None);
    };

    match value {
        Value::String(status) => Ok(Some(vec![status.clone()])),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(status) => Ok(status.clone()),
                other => Err(anyhow!("{} must list status names, found {}", key, other)),
            })
            .collect::<Result<Vec<_>>>()
            .map(Some),
        other => bail!("{} must list status names, found {}", key, other),
    }
}

fn poll_settings(delay: u64, timeout: Option<u64>, max_attempts: Option<u32>) -> PollSettings {
    let mut settings = PollSettings::default().with_delay(Duration::from_secs(delay));
    if let Some(timeout) = timeout {
        settings = settings.with_timeout(Duration::from_secs(timeout));
    }
    if let Some(max_attempts) = max_attempts {
        settings = settings.with_max_attempts(max_attempts);
    }
    settings
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_poll_settings_from_flags() {
        let settings = poll_settings(1, Some(60), None);
        assert_eq!(settings.delay, Duration::from_secs(1));
        assert_eq!(settings.timeout, Some(Duration::from_secs(60)));
        assert_eq!(settings.max_attempts, None);
    }

    #[test]
    fn test_explicit_config_file_wins() {
        let path = PathBuf::from("custom.yml");
        assert_eq!(config_file(Some(&path)), Some(path));
    }

    #[test]
    fn test_job_id_from_config() {
        let config = Config::with_settings(ConfigTree::new(json!({
            "databricks": { "job-id": 42, "profile": "dev" }
        })));
        assert_eq!(config.job_id(None).unwrap(), 42);
        assert_eq!(config.job_id(Some(7)).unwrap(), 7);
        assert_eq!(config.profile(None).as_deref(), Some("dev"));
    }

    #[test]
    fn test_job_id_must_be_numeric() {
        let config = Config::with_settings(ConfigTree::new(json!({
            "databricks": { "job-id": "nightly" }
        })));
        assert!(config.job_id(None).is_err());
    }

    #[test]
    fn test_status_sets_default_without_config() {
        let waits = Waits::from_settings(&ConfigTree::default(), PollSettings::default()).unwrap();
        assert_eq!(waits, Waits::default());
    }

    #[test]
    fn test_status_sets_from_config() {
        let settings = ConfigTree::new(json!({
            "databricks": { "poll": {
                "cluster": { "target": ["RUNNING", "RESIZING"] },
                "run": { "failure": "INTERNAL_ERROR" }
            }}
        }));
        let waits = Waits::from_settings(&settings, PollSettings::default()).unwrap();

        assert_eq!(waits.cluster.target, vec!["RUNNING", "RESIZING"]);
        assert_eq!(waits.cluster.failure, StatusSets::cluster().failure);
        assert_eq!(waits.run.target, StatusSets::run().target);
        assert_eq!(waits.run.failure, vec!["INTERNAL_ERROR"]);
        assert_eq!(waits.library, StatusSets::library());
    }

    #[test]
    fn test_status_sets_reject_non_strings() {
        let settings = ConfigTree::new(json!({
            "databricks": { "poll": { "library": { "target": [1, 2] } } }
        }));
        let err = Waits::from_settings(&settings, PollSettings::default()).unwrap_err();
        assert!(err.to_string().contains("databricks.poll.library.target"));
    }

    #[test]
    fn test_missing_cluster_id_names_key() {
        let config = Config::with_settings(ConfigTree::default());
        let err = config.cluster_id(None).unwrap_err();
        assert!(err.to_string().contains("databricks.cluster-id"));
    }
}
