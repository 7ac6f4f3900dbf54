//! Library domain types

use serde::{Deserialize, Serialize};

/// Library reference as accepted by the libraries API
///
/// Only wheels are installed by dbwheel; the other kinds are kept so the
/// status listing of a cluster deserializes whatever else is attached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Library {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub egg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pypi: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maven: Option<serde_json::Value>,
}

impl Library {
    pub fn wheel(path: impl Into<String>) -> Self {
        Self {
            whl: Some(path.into()),
            ..Self::default()
        }
    }

    /// Whether this entry refers to the wheel at `path`
    pub fn is_wheel(&self, path: &str) -> bool {
        self.whl.as_deref() == Some(path)
    }
}

/// Install status of one library on a cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryFullStatus {
    pub library: Library,
    /// e.g. `PENDING`, `INSTALLING`, `INSTALLED`, `FAILED`
    pub status: String,
    #[serde(default)]
    pub messages: Vec<String>,
    #[serde(default)]
    pub is_library_for_all_clusters: bool,
}

/// Library statuses reported for a cluster
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterLibraryStatuses {
    #[serde(default)]
    pub cluster_id: Option<String>,
    #[serde(default)]
    pub library_statuses: Vec<LibraryFullStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wheel_serializes_only_whl() {
        let library = Library::wheel("dbfs:/a.whl");
        assert_eq!(
            serde_json::to_value(&library).unwrap(),
            serde_json::json!({"whl": "dbfs:/a.whl"})
        );
    }

    #[test]
    fn test_status_listing_with_mixed_libraries() {
        let statuses: ClusterLibraryStatuses = serde_json::from_str(
            r#"{
                "cluster_id": "c1",
                "library_statuses": [
                    {"library": {"pypi": {"package": "requests"}}, "status": "INSTALLED"},
                    {"library": {"whl": "dbfs:/a.whl"}, "status": "PENDING", "messages": ["queued"]}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(statuses.library_statuses.len(), 2);
        assert!(!statuses.library_statuses[0].library.is_wheel("dbfs:/a.whl"));
        assert!(statuses.library_statuses[1].library.is_wheel("dbfs:/a.whl"));
        assert_eq!(statuses.library_statuses[1].messages, vec!["queued"]);
    }
}
