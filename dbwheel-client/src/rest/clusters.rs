//! Cluster endpoints

use dbwheel_core::domain::cluster::{ClusterEvent, ClusterEvents};
use serde_json::json;

use super::RestWorkspace;
use crate::error::Result;

/// Events fetched per status query; only the newest one is inspected
const EVENT_PAGE: u32 = 25;

impl RestWorkspace {
    pub(super) async fn restart(&self, cluster_id: &str) -> Result<()> {
        let response = self
            .post("2.0/clusters/restart")
            .json(&json!({ "cluster_id": cluster_id }))
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Most recent events first
    pub(super) async fn recent_events(&self, cluster_id: &str) -> Result<Vec<ClusterEvent>> {
        let response = self
            .post("2.0/clusters/events")
            .json(&json!({
                "cluster_id": cluster_id,
                "order": "DESC",
                "limit": EVENT_PAGE,
            }))
            .send()
            .await?;

        let events: ClusterEvents = self.handle_response(response).await?;
        Ok(events.events)
    }
}
