//! Configuration resolution
//!
//! The project configuration is a nested tree addressed by dotted keys such as
//! `databricks.cluster-id`. A value passed explicitly (usually a CLI flag)
//! always wins over the tree; `null` in the tree counts as "no value".

use serde_json::Value;

use crate::error::{CoreError, Result};

/// Immutable configuration tree loaded once per invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigTree {
    root: Value,
}

impl ConfigTree {
    /// Wrap a parsed configuration document
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// The underlying document
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Walk the tree one dotted segment at a time
    ///
    /// Returns `None` when a segment is missing, when an intermediate node is
    /// not a mapping, or when the value found is `null`.
    pub fn lookup(&self, key: &str) -> Option<&Value> {
        key.split('.').try_fold(&self.root, |node, segment| match node {
            Value::Object(map) => map.get(segment).filter(|value| !value.is_null()),
            _ => None,
        })
    }

    /// Resolve a value that must be present
    ///
    /// # Errors
    /// `ConfigurationMissing` naming `key` when neither `explicit` nor the tree
    /// provide a value.
    pub fn require(&self, explicit: Option<String>, key: &str) -> Result<String> {
        match explicit {
            Some(value) => Ok(value),
            None => self
                .lookup(key)
                .map(scalar_text)
                .ok_or_else(|| CoreError::ConfigurationMissing {
                    key: key.to_string(),
                }),
        }
    }

    /// Resolve a value the caller can default on its own
    pub fn optional(&self, explicit: Option<String>, key: &str) -> Option<String> {
        explicit.or_else(|| self.lookup(key).map(scalar_text))
    }
}

/// Resolve `key` from an explicit override, else from `config`
///
/// With `required` set a missing value is an error; otherwise `Ok(None)` is
/// returned and the caller supplies a default.
pub fn resolve(
    explicit: Option<String>,
    key: &str,
    config: &ConfigTree,
    required: bool,
) -> Result<Option<String>> {
    if required {
        config.require(explicit, key).map(Some)
    } else {
        Ok(config.optional(explicit, key))
    }
}

/// Text form of a configuration value
///
/// Strings are returned verbatim; everything else uses its compact JSON form.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ConfigTree {
        ConfigTree::new(json!({
            "databricks": {
                "profile": "dev",
                "cluster-id": "0101-abcdef",
                "job-id": 42,
                "wheel": null,
                "nested": { "flag": true }
            },
            "scalar": "leaf"
        }))
    }

    #[test]
    fn test_present_keys_resolve_when_required() {
        let config = sample();
        for (key, expected) in [
            ("databricks.profile", "dev"),
            ("databricks.cluster-id", "0101-abcdef"),
            ("databricks.job-id", "42"),
            ("databricks.nested.flag", "true"),
            ("scalar", "leaf"),
        ] {
            let value = resolve(None, key, &config, true).unwrap();
            assert_eq!(value.as_deref(), Some(expected), "key {}", key);
        }
    }

    #[test]
    fn test_absent_key_required_fails_with_key_name() {
        let err = resolve(None, "databricks.artifact-path", &sample(), true).unwrap_err();
        assert!(err.is_configuration_missing());
        assert!(err.to_string().contains("databricks.artifact-path"));
    }

    #[test]
    fn test_absent_key_optional_returns_none() {
        let value = resolve(None, "databricks.artifact-path", &sample(), false).unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn test_null_counts_as_missing() {
        let config = sample();
        assert!(config.lookup("databricks.wheel").is_none());
        assert!(resolve(None, "databricks.wheel", &config, true).is_err());
    }

    #[test]
    fn test_walking_through_a_scalar_is_missing() {
        let config = sample();
        assert!(config.lookup("scalar.deeper").is_none());
        assert!(config.lookup("databricks.profile.name").is_none());
    }

    #[test]
    fn test_explicit_value_always_wins() {
        let explicit = Some("override".to_string());
        for config in [sample(), ConfigTree::default()] {
            for required in [true, false] {
                let value = resolve(explicit.clone(), "databricks.profile", &config, required);
                assert_eq!(value.unwrap().as_deref(), Some("override"));
            }
        }
    }

    #[test]
    fn test_empty_tree_has_no_values() {
        let config = ConfigTree::default();
        assert!(config.lookup("databricks").is_none());
        assert_eq!(config.optional(None, "databricks.profile"), None);
    }

    #[test]
    fn test_object_value_is_returned_as_json() {
        let config = sample();
        assert_eq!(
            config.optional(None, "databricks.nested").as_deref(),
            Some(r#"{"flag":true}"#)
        );
    }
}
