// src/models/monitor.rs
// DOCUMENTATION: Striim monitor request/response models
// PURPOSE: Shapes exchanged with the dashboard's monitor page

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

/// Request to monitor one OJET source through the Striim REST API
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MonitorRequest {
    #[validate(length(min = 1, message = "Please enter Striim URL"))]
    pub striim_url: String,

    #[validate(length(min = 1, message = "Please enter Striim username"))]
    pub username: String,

    #[validate(length(min = 1, message = "Please enter Striim password"))]
    pub password: String,

    #[validate(length(min = 1, message = "Please enter namespace"))]
    pub namespace: String,

    #[validate(length(min = 1, message = "Please enter source name"))]
    pub source_name: String,
}

/// Outcome of one Striim console command
#[derive(Debug, Clone, Serialize)]
pub struct CommandOutcome {
    pub command: String,
    /// Rendered table, raw reply, or the error detail when `success` is false
    pub output: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricMap>,
}

impl CommandOutcome {
    pub fn failed(command: &str, detail: impl Into<String>) -> Self {
        Self {
            command: command.to_string(),
            output: detail.into(),
            success: false,
            metrics: None,
        }
    }
}

/// Ordered display-name to value map
/// DOCUMENTATION: Serialized as a JSON object in insertion order so tables and
/// JSON list metrics the same way.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MetricMap(IndexMap<String, Value>);

impl MetricMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace, keeping the original position on replace
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn extend(&mut self, other: MetricMap) {
        self.0.extend(other.0);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Text shown in a table cell; strings lose their quotes, null shows as `None`
    pub fn display(value: &Value) -> String {
        match value {
            Value::Null => "None".to_string(),
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}
