//! DBFS domain types

use serde::{Deserialize, Serialize};

/// Entry of a DBFS directory listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub path: String,
    #[serde(default)]
    pub is_dir: bool,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub modification_time: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileList {
    #[serde(default)]
    pub files: Vec<FileInfo>,
}

/// Strip the `dbfs:` scheme; the REST API takes absolute paths
pub fn api_path(path: &str) -> &str {
    path.strip_prefix("dbfs:").unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_path() {
        assert_eq!(api_path("dbfs:/FileStore/wheels/"), "/FileStore/wheels/");
        assert_eq!(api_path("/FileStore"), "/FileStore");
    }
}
