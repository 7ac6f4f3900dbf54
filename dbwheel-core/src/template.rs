//! Template merging
//!
//! Configuration files and job definitions are Jinja-style templates rendered
//! with Tera. A configuration file is first rendered against the `key=value`
//! overrides given on the command line and then parsed as JSON or YAML; the
//! resulting tree becomes the context of the job definition template.

use std::collections::BTreeMap;
use std::error::Error as _;
use std::path::Path;

use serde_json::{Map, Value};
use tera::{Context, Tera};

use crate::domain::job::JobId;
use crate::error::{CoreError, Result};

/// Variables injected with `-e key=value`
pub type Overrides = BTreeMap<String, String>;

/// Build overrides from `key=value` items
///
/// Later items replace earlier ones with the same key. An empty list yields
/// `None` so callers can tell "no overrides" from an empty mapping.
///
/// # Errors
/// `InvalidKeyValue` for an item without `=` or with an empty key.
pub fn parse_key_values<S: AsRef<str>>(items: &[S]) -> Result<Option<Overrides>> {
    if items.is_empty() {
        return Ok(None);
    }

    let mut overrides = Overrides::new();
    for item in items {
        let item = item.as_ref();
        let (key, value) = item
            .split_once('=')
            .filter(|(key, _)| !key.is_empty())
            .ok_or_else(|| CoreError::InvalidKeyValue(item.to_string()))?;
        overrides.insert(key.to_string(), value.to_string());
    }

    Ok(Some(overrides))
}

/// Read `path` and render it against `context`
///
/// When the context is absent, `null` or an empty mapping the raw text is
/// returned untouched, so plain files without template syntax pass through.
pub fn merge_template(path: impl AsRef<Path>, context: Option<&Value>) -> Result<String> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|e| CoreError::io(path, e))?;

    match context {
        Some(context) if !is_empty_context(context) => render(path, &raw, context),
        _ => Ok(raw),
    }
}

/// Load a JSON or YAML configuration file, rendering it against `overrides` first
pub fn load_config(path: impl AsRef<Path>, overrides: Option<&Overrides>) -> Result<Value> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path)?;

    let context = overrides.map(|vars| {
        Value::Object(
            vars.iter()
                .map(|(key, value)| (key.clone(), Value::String(value.clone())))
                .collect(),
        )
    });
    let content = merge_template(path, context.as_ref())?;

    format.parse(path, &content)
}

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// Detect the format from the file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("yml") | Some("yaml") => Ok(Self::Yaml),
            _ => Err(CoreError::UnsupportedFileType {
                path: path.to_path_buf(),
            }),
        }
    }

    fn parse(self, path: &Path, content: &str) -> Result<Value> {
        match self {
            Self::Json => serde_json::from_str(content).map_err(|e| CoreError::parse(path, e)),
            Self::Yaml => {
                let mut document: serde_yaml::Value =
                    serde_yaml::from_str(content).map_err(|e| CoreError::parse(path, e))?;
                // `<<` merge keys are folded into their parent mapping
                document.apply_merge().map_err(|e| CoreError::parse(path, e))?;
                serde_yaml::from_value(document).map_err(|e| CoreError::parse(path, e))
            }
        }
    }
}

/// Render context for a job definition template
///
/// Layers, lowest to highest: the loaded configuration, the command line
/// overrides, and the resolved `job_id`.
#[derive(Debug, Clone, Default)]
pub struct JobContext {
    vars: Map<String, Value>,
}

impl JobContext {
    /// Start from a loaded configuration document
    ///
    /// # Errors
    /// `InvalidContext` when the document is neither a mapping nor `null`.
    pub fn from_config(config: &Value) -> Result<Self> {
        match config {
            Value::Null => Ok(Self::default()),
            Value::Object(map) => Ok(Self { vars: map.clone() }),
            other => Err(CoreError::InvalidContext(format!(
                "configuration must be a mapping, found {}",
                value_kind(other)
            ))),
        }
    }

    pub fn with_overrides(mut self, overrides: Option<&Overrides>) -> Self {
        for (key, value) in overrides.into_iter().flatten() {
            self.vars.insert(key.clone(), Value::String(value.clone()));
        }
        self
    }

    pub fn with_job_id(mut self, job_id: JobId) -> Self {
        self.vars.insert("job_id".to_string(), Value::from(job_id));
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }

    /// Render `template` against this context
    pub fn render(&self, template: impl AsRef<Path>) -> Result<String> {
        merge_template(template, Some(&Value::Object(self.vars.clone())))
    }

    /// Render `template` and parse the result as a JSON job definition
    pub fn render_definition(&self, template: impl AsRef<Path>) -> Result<Value> {
        let template = template.as_ref();
        let rendered = self.render(template)?;
        serde_json::from_str(&rendered).map_err(|e| CoreError::parse(template, e))
    }
}

fn render(path: &Path, raw: &str, context: &Value) -> Result<String> {
    let context = Context::from_value(context.clone())
        .map_err(|e| CoreError::InvalidContext(error_chain(&e)))?;

    Tera::one_off(raw, &context, false).map_err(|e| CoreError::TemplateRender {
        path: path.to_path_buf(),
        message: error_chain(&e),
    })
}

fn is_empty_context(context: &Value) -> bool {
    match context {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

/// Tera reports the useful part of an error (e.g. the undefined variable) in
/// its source chain, not in the top-level message.
fn error_chain(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
