//! Remote domain types
//!
//! Payloads reported by the Databricks workspace, shared by the REST and CLI
//! backends. Status values are kept as plain strings: they are only compared
//! against the target and failure sets of a wait operation.

pub mod cluster;
pub mod dbfs;
pub mod job;
pub mod library;
