// src/services/metric_shapes.rs
// DOCUMENTATION: Reshaping of Striim command replies
// PURPOSE: Recognize the two reply shapes and flatten them into display metrics

use crate::models::MetricMap;
use serde_json::{Map, Value};

/// `show <source> status;` fields
const STATUS_FIELDS: &[(&str, &str)] = &[
    ("ServerStatus", "Server Status"),
    ("Enqueue", "Enqueue"),
    ("Dequeue", "Dequeue"),
    ("CaptureStatus", "Capture Status"),
    ("CaptureState", "Capture State"),
    ("SpillCount", "Spill Count"),
    ("Progress", "Progress"),
    ("Error", "Error"),
];

/// `show <source> memory;` fields
const MEMORY_FIELDS: &[(&str, &str)] = &[
    ("LogMinerSession", "LogMiner Session"),
    ("CaptureSession", "Capture Session"),
    ("ApplySession", "Apply Session"),
    ("StreamsPool", "Streams Pool"),
];

/// `mon <source>;` fields
const MON_FIELDS: &[(&str, &str)] = &[
    ("status", "Status"),
    ("input", "Input"),
    ("inputRate", "Input Rate"),
    ("rate", "Rate"),
    ("sourceInput", "Source Input"),
    ("sourceRate", "Source Rate"),
    ("cpuRate", "CPU Rate"),
    ("latestActivity", "Latest Activity"),
    ("lastEventPosition", "Last Event Position"),
    ("lastEventTimestamp", "Last Event Timestamp"),
    ("lastCheckpointPosition", "Last Checkpoint Position"),
    ("readLag", "Read Lag"),
    ("startScn", "Start SCN"),
    ("capturedScn", "Captured SCN"),
];

/// One `output` value from a tungsten reply, classified
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    /// Array of objects carrying nested `Status` and/or `Memory` objects
    StatusMemory {
        status: Option<Map<String, Value>>,
        memory: Option<Map<String, Value>>,
    },
    /// Single object with camel-case `mon` metrics
    Mon(Map<String, Value>),
    /// Anything else, passed through untouched
    Other(Value),
}

impl CommandOutput {
    pub fn classify(output: Value) -> Self {
        match output {
            Value::Array(entries) => {
                let mut status = None;
                let mut memory = None;
                for entry in &entries {
                    if let Some(object) = entry.as_object() {
                        if let Some(Value::Object(found)) = object.get("Status") {
                            status.get_or_insert_with(Map::new).extend(found.clone());
                        }
                        if let Some(Value::Object(found)) = object.get("Memory") {
                            memory.get_or_insert_with(Map::new).extend(found.clone());
                        }
                    }
                }

                if status.is_none() && memory.is_none() {
                    CommandOutput::Other(Value::Array(entries))
                } else {
                    CommandOutput::StatusMemory { status, memory }
                }
            }
            Value::Object(object)
                if MON_FIELDS.iter().any(|(field, _)| object.contains_key(*field)) =>
            {
                CommandOutput::Mon(object)
            }
            other => CommandOutput::Other(other),
        }
    }

    /// Display metrics for recognized shapes; `None` for `Other`
    pub fn metrics(&self) -> Option<MetricMap> {
        match self {
            CommandOutput::StatusMemory { status, memory } => {
                let mut metrics = MetricMap::new();
                if let Some(status) = status {
                    metrics.extend(map_fields(status, STATUS_FIELDS));
                }
                if let Some(memory) = memory {
                    metrics.extend(map_fields(memory, MEMORY_FIELDS));
                }
                Some(metrics)
            }
            CommandOutput::Mon(object) => Some(map_fields(object, MON_FIELDS)),
            CommandOutput::Other(_) => None,
        }
    }
}

/// Copy the known fields under their display names; absent fields are skipped
fn map_fields(source: &Map<String, Value>, table: &[(&str, &str)]) -> MetricMap {
    let mut metrics = MetricMap::new();
    for (field, display) in table {
        if let Some(value) = source.get(*field) {
            metrics.insert(*display, value.clone());
        }
    }
    metrics
}
