//! dbwheel Client
//!
//! Remote side of a wheel deployment: the [`Workspace`] capability with its
//! REST and CLI backends, the wait operations that poll clusters, libraries
//! and runs, and job definition upserts.
//!
//! # Example
//!
//! ```no_run
//! use dbwheel_client::{PollSettings, RestWorkspace, StatusSets, TracingObserver, wait_for_cluster};
//! use dbwheel_client::Workspace;
//!
//! #[tokio::main]
//! async fn main() -> dbwheel_client::Result<()> {
//!     let workspace = RestWorkspace::new("https://example.cloud.databricks.com", "dapi123");
//!
//!     workspace.restart_cluster("0101-abcdef").await?;
//!     let report = wait_for_cluster(
//!         &workspace,
//!         "0101-abcdef",
//!         &StatusSets::cluster(),
//!         &PollSettings::default(),
//!         &mut TracingObserver,
//!     )
//!     .await?;
//!
//!     println!("Cluster is {}", report.status);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod poll;
pub mod rest;
pub mod upsert;
pub mod workspace;

#[cfg(any(test, feature = "test-util"))]
pub mod fake;

// Re-export commonly used types
pub use cli::CliWorkspace;
pub use error::{ClientError, Result};
pub use poll::{
    PollObserver, PollReport, PollSettings, ResourceKind, RunReport, StatusSets, TracingObserver,
    wait_for_cluster, wait_for_library, wait_for_run,
};
pub use rest::RestWorkspace;
pub use upsert::{UpsertAction, UpsertOutcome, define_job, upsert_job};
pub use workspace::Workspace;
