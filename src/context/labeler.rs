// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Dataset labeling for recorded tool calls
//!
//! Which calls "load a dataset" is a property of the backend, not of the hub,
//! so labeling is pluggable. [`RuleLabeler`] covers the common case of
//! keyword rules supplied in settings.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What a tool call tells us about data in the session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetLabel {
    pub dataset: Option<String>,
    pub information: Vec<String>,
}

impl DatasetLabel {
    pub fn is_empty(&self) -> bool {
        self.dataset.is_none() && self.information.is_empty()
    }
}

/// Maps a recorded tool call to a dataset label
pub trait DatasetLabeler: Send + Sync + std::fmt::Debug {
    fn label(&self, tool_name: &str, args: &Map<String, Value>, result: Option<&Value>)
        -> DatasetLabel;
}

/// Labels nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLabels;

impl DatasetLabeler for NoLabels {
    fn label(&self, _: &str, _: &Map<String, Value>, _: Option<&Value>) -> DatasetLabel {
        DatasetLabel::default()
    }
}

/// One keyword rule from the `hub.datasetRules` settings list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetRule {
    /// Case-insensitive substring of the namespaced tool name
    pub tool_contains: String,
    /// Dataset label to record, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,
    /// Available-information lines to record
    #[serde(default)]
    pub information: Vec<String>,
    /// Append "(N rows)" when the result carries a row count
    #[serde(default)]
    pub count_rows: bool,
}

/// First matching rule wins
#[derive(Debug, Clone, Default)]
pub struct RuleLabeler {
    rules: Vec<DatasetRule>,
}

impl RuleLabeler {
    pub fn new(rules: Vec<DatasetRule>) -> Self {
        Self { rules }
    }
}

impl DatasetLabeler for RuleLabeler {
    fn label(
        &self,
        tool_name: &str,
        _args: &Map<String, Value>,
        result: Option<&Value>,
    ) -> DatasetLabel {
        let lowered = tool_name.to_lowercase();
        let Some(rule) = self
            .rules
            .iter()
            .find(|rule| lowered.contains(&rule.tool_contains.to_lowercase()))
        else {
            return DatasetLabel::default();
        };

        let rows = if rule.count_rows {
            result.and_then(row_count)
        } else {
            None
        };
        let dataset = match (&rule.dataset, rows) {
            (Some(name), Some(n)) => Some(format!("{} ({} rows)", name, n)),
            (Some(name), None) => Some(name.clone()),
            (None, Some(n)) => Some(format!("Dataset ({} rows)", n)),
            (None, None) => None,
        };

        DatasetLabel {
            dataset,
            information: rule.information.clone(),
        }
    }
}

/// Row count from a `rowCount` field or the length of an array result.
/// Text results are parsed as JSON first since dispatch flattens to text.
fn row_count(result: &Value) -> Option<u64> {
    match result {
        Value::Array(rows) if !rows.is_empty() => Some(rows.len() as u64),
        Value::Object(map) => map
            .get("rowCount")
            .and_then(Value::as_u64)
            .filter(|n| *n > 0),
        Value::String(text) => serde_json::from_str::<Value>(text)
            .ok()
            .filter(|parsed| !parsed.is_string())
            .and_then(|parsed| row_count(&parsed)),
        _ => None,
    }
}
