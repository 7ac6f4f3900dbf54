//! Wheel packaging

use std::path::Path;

use anyhow::{Context, Result, bail};
use tokio::process::Command;
use tracing::debug;

use crate::output;

/// Local build output uploaded by `upload`
pub const DIST_DIR: &str = "dist";

/// Remove `dist/` and build a fresh wheel with poetry
pub async fn build() -> Result<()> {
    output::step("Building wheel");

    let dist = Path::new(DIST_DIR);
    if dist.exists() {
        debug!("Removing {}", dist.display());
        tokio::fs::remove_dir_all(dist)
            .await
            .with_context(|| format!("Failed to remove {}", dist.display()))?;
    }

    let status = Command::new("poetry")
        .args(["build", "-f", "wheel"])
        .status()
        .await
        .context("Failed to execute 'poetry build'. Is poetry installed?")?;

    if !status.success() {
        bail!("poetry build failed ({})", status);
    }

    output::success("Wheel built");
    Ok(())
}
