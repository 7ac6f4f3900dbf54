//! Library endpoints

use dbwheel_core::domain::library::{ClusterLibraryStatuses, Library, LibraryFullStatus};
use serde_json::json;

use super::RestWorkspace;
use crate::error::Result;

impl RestWorkspace {
    pub(super) async fn install_wheel(&self, cluster_id: &str, wheel: &str) -> Result<()> {
        let response = self
            .post("2.0/libraries/install")
            .json(&json!({
                "cluster_id": cluster_id,
                "libraries": [Library::wheel(wheel)],
            }))
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Uninstalls take effect on the next cluster restart
    pub(super) async fn uninstall_wheel(&self, cluster_id: &str, wheel: &str) -> Result<()> {
        let response = self
            .post("2.0/libraries/uninstall")
            .json(&json!({
                "cluster_id": cluster_id,
                "libraries": [Library::wheel(wheel)],
            }))
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    pub(super) async fn cluster_status(&self, cluster_id: &str) -> Result<Vec<LibraryFullStatus>> {
        let response = self
            .get("2.0/libraries/cluster-status")
            .query(&[("cluster_id", cluster_id)])
            .send()
            .await?;

        let statuses: ClusterLibraryStatuses = self.handle_response(response).await?;
        Ok(statuses.library_statuses)
    }
}
