//! dbwheel Core
//!
//! Core types and pure logic for deploying Python wheels to a Databricks workspace.
//!
//! This crate contains:
//! - Domain types: payloads reported by the workspace (clusters, libraries, jobs, runs, DBFS)
//! - Configuration: dotted-key lookups over the project configuration tree
//! - Templates: Jinja-style rendering of configuration files and job definitions
//! - Project: wheel naming and default artifact locations

pub mod config;
pub mod domain;
pub mod error;
pub mod project;
pub mod template;

pub use config::{ConfigTree, resolve};
pub use error::{CoreError, Result};
