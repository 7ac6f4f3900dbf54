//! DBFS endpoints
//!
//! Uploads use the streaming API: open a handle, append base64 blocks of at
//! most 1 MiB, then close the handle.

use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use dbwheel_core::domain::dbfs::{FileInfo, FileList, api_path};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use super::RestWorkspace;
use crate::error::Result;

/// Largest block `add-block` accepts
const BLOCK_SIZE: usize = 1024 * 1024;

#[derive(Deserialize)]
struct Handle {
    handle: i64,
}

impl RestWorkspace {
    /// Missing paths are not an error
    pub(super) async fn delete_path(&self, path: &str, recursive: bool) -> Result<()> {
        let response = self
            .post("2.0/dbfs/delete")
            .json(&json!({ "path": api_path(path), "recursive": recursive }))
            .send()
            .await?;

        match self.handle_empty_response(response).await {
            Err(e) if e.is_not_found() => {
                debug!("{} does not exist, nothing to delete", path);
                Ok(())
            }
            other => other,
        }
    }

    pub(super) async fn list_path(&self, path: &str) -> Result<Vec<FileInfo>> {
        let response = self
            .get("2.0/dbfs/list")
            .query(&[("path", api_path(path))])
            .send()
            .await?;

        let list: FileList = self.handle_response(response).await?;
        Ok(list.files)
    }

    async fn mkdirs(&self, path: &str) -> Result<()> {
        let response = self
            .post("2.0/dbfs/mkdirs")
            .json(&json!({ "path": path }))
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Upload every file below `local` into `remote_dir`, keeping relative paths
    ///
    /// A single file is uploaded directly into `remote_dir`.
    pub(super) async fn upload_dir(&self, local: &Path, remote_dir: &str, overwrite: bool) -> Result<()> {
        let remote_root = api_path(remote_dir).trim_end_matches('/').to_string();
        self.mkdirs(&remote_root).await?;

        for (file, relative) in local_files(local).await? {
            let target = format!("{}/{}", remote_root, relative);
            info!("Uploading {} to dbfs:{}", file.display(), target);
            self.upload_file(&file, &target, overwrite).await?;
        }

        Ok(())
    }

    async fn upload_file(&self, file: &Path, target: &str, overwrite: bool) -> Result<()> {
        let contents = tokio::fs::read(file).await?;

        let response = self
            .post("2.0/dbfs/create")
            .json(&json!({ "path": target, "overwrite": overwrite }))
            .send()
            .await?;
        let Handle { handle } = self.handle_response(response).await?;

        for block in contents.chunks(BLOCK_SIZE) {
            let response = self
                .post("2.0/dbfs/add-block")
                .json(&json!({ "handle": handle, "data": STANDARD.encode(block) }))
                .send()
                .await?;
            self.handle_empty_response(response).await?;
        }

        let response = self
            .post("2.0/dbfs/close")
            .json(&json!({ "handle": handle }))
            .send()
            .await?;
        self.handle_empty_response(response).await
    }
}

/// Files below `root` paired with their `/`-separated path relative to it
async fn local_files(root: &Path) -> Result<Vec<(PathBuf, String)>> {
    if tokio::fs::metadata(root).await?.is_file() {
        let name = root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Ok(vec![(root.to_path_buf(), name)]);
    }

    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                pending.push(path);
            } else if let Ok(relative) = path.strip_prefix(root) {
                let relative = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                files.push((path, relative));
            }
        }
    }

    files.sort();
    Ok(files)
}
