//! Cluster domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single entry of a cluster's event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterEvent {
    #[serde(default)]
    pub cluster_id: Option<String>,
    /// Milliseconds since the epoch
    #[serde(default)]
    pub timestamp: Option<i64>,
    /// Event type, e.g. `RESTARTING`, `RUNNING`, `TERMINATING`
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

impl ClusterEvent {
    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp.and_then(DateTime::from_timestamp_millis)
    }
}

/// Page of cluster events, newest first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterEvents {
    #[serde(default)]
    pub events: Vec<ClusterEvent>,
    #[serde(default)]
    pub total_count: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_deserializes_type_field() {
        let events: ClusterEvents = serde_json::from_str(
            r#"{"events": [{"cluster_id": "c1", "timestamp": 1672531200000, "type": "RUNNING", "details": {}}], "total_count": 1}"#,
        )
        .unwrap();

        let event = &events.events[0];
        assert_eq!(event.kind, "RUNNING");
        assert_eq!(
            event.occurred_at().unwrap().to_rfc3339(),
            "2023-01-01T00:00:00+00:00"
        );
    }

    #[test]
    fn test_missing_events_is_empty() {
        let events: ClusterEvents = serde_json::from_str("{}").unwrap();
        assert!(events.events.is_empty());
    }
}
