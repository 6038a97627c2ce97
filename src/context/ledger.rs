// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Append-only record of what a conversation has already fetched

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use super::labeler::{DatasetLabeler, NoLabels};
use super::SummaryConfig;
use crate::events::{
    ConversationMessage, FetchStatus, NormalizedEvent, PromptFetchPart, ResourceFetchPart, Role,
    ToolCallEvent, ToolCallState,
};

/// A tool call seen in an assistant message
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallSummary {
    pub tool_name: String,
    pub args: Map<String, Value>,
    pub result: Option<Value>,
    pub message_id: String,
    pub turn_index: usize,
    pub timestamp: DateTime<Utc>,
    #[serde(skip)]
    pub(crate) sequence: u64,
}

/// A completed resource fetch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceFetchSummary {
    pub server_name: String,
    pub uri: String,
    pub name: String,
    pub message_id: String,
    pub turn_index: usize,
    pub timestamp: DateTime<Utc>,
    #[serde(skip)]
    pub(crate) sequence: u64,
}

/// A completed prompt fetch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFetchSummary {
    pub server_name: String,
    pub prompt_name: String,
    pub args: Map<String, Value>,
    pub message_id: String,
    pub turn_index: usize,
    pub timestamp: DateTime<Utc>,
    #[serde(skip)]
    pub(crate) sequence: u64,
}

/// A dataset or information line, kept at its first sighting
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LabelEntry {
    pub text: String,
    pub sequence: u64,
}

/// Session ledger of tool calls and fetches
///
/// Entries are never merged or removed. A repeated call is appended again and
/// the lookup index moves to the newest copy.
#[derive(Debug, Clone)]
pub struct DataContextLedger {
    pub(crate) tool_calls: Vec<ToolCallSummary>,
    pub(crate) resource_fetches: Vec<ResourceFetchSummary>,
    pub(crate) prompt_fetches: Vec<PromptFetchSummary>,
    pub(crate) datasets: Vec<LabelEntry>,
    pub(crate) information: Vec<LabelEntry>,
    index: HashMap<String, usize>,
    labeler: Arc<dyn DatasetLabeler>,
    pub(crate) config: SummaryConfig,
    messages_seen: usize,
    next_sequence: u64,
}

impl Default for DataContextLedger {
    fn default() -> Self {
        Self::new(SummaryConfig::default())
    }
}

impl DataContextLedger {
    pub fn new(config: SummaryConfig) -> Self {
        Self {
            tool_calls: Vec::new(),
            resource_fetches: Vec::new(),
            prompt_fetches: Vec::new(),
            datasets: Vec::new(),
            information: Vec::new(),
            index: HashMap::new(),
            labeler: Arc::new(NoLabels),
            config,
            messages_seen: 0,
            next_sequence: 0,
        }
    }

    pub fn with_labeler(mut self, labeler: Arc<dyn DatasetLabeler>) -> Self {
        self.labeler = labeler;
        self
    }

    /// Fold a whole conversation.
    pub fn from_conversation<'a>(
        self,
        messages: impl IntoIterator<Item = &'a ConversationMessage>,
    ) -> Self {
        messages
            .into_iter()
            .fold(self, |ledger, message| ledger.update(message))
    }

    /// Append one message and return the extended ledger.
    pub fn update(mut self, message: &ConversationMessage) -> Self {
        self.record_message(message);
        self
    }

    /// Append one message. Every message advances the turn index; only
    /// assistant messages contribute entries.
    pub fn record_message(&mut self, message: &ConversationMessage) {
        let turn_index = self.messages_seen;
        self.messages_seen += 1;
        if message.role != Role::Assistant {
            return;
        }

        for turn_event in &message.events {
            match &turn_event.event {
                NormalizedEvent::ToolCall(call) => {
                    self.record_tool_call(call, &message.id, turn_index)
                }
                NormalizedEvent::ResourceFetch(part) => {
                    self.record_resource(part, &message.id, turn_index)
                }
                NormalizedEvent::PromptFetch(part) => {
                    self.record_prompt(part, &message.id, turn_index)
                }
                NormalizedEvent::Text(_) | NormalizedEvent::Marker { .. } => {}
            }
        }
    }

    fn sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }

    fn record_tool_call(&mut self, call: &ToolCallEvent, message_id: &str, turn_index: usize) {
        // A failed call produced nothing worth reusing
        if call.state == ToolCallState::Error {
            tracing::debug!("Not recording failed call {}", call.tool_name);
            return;
        }

        let sequence = self.sequence();
        let label = self
            .labeler
            .label(&call.tool_name, &call.args, call.result.as_ref());
        if let Some(dataset) = label.dataset {
            push_unique(&mut self.datasets, dataset, sequence);
        }
        for info in label.information {
            push_unique(&mut self.information, info, sequence);
        }

        self.index
            .insert(call_key(&call.tool_name, &call.args), self.tool_calls.len());
        self.tool_calls.push(ToolCallSummary {
            tool_name: call.tool_name.clone(),
            args: call.args.clone(),
            result: call.result.clone(),
            message_id: message_id.to_string(),
            turn_index,
            timestamp: Utc::now(),
            sequence,
        });
    }

    fn record_resource(&mut self, part: &ResourceFetchPart, message_id: &str, turn_index: usize) {
        if part.status != FetchStatus::Complete {
            return;
        }
        let sequence = self.sequence();
        let name = part
            .resource
            .as_ref()
            .map(|resource| resource.name.clone())
            .filter(|name| !name.is_empty())
            .or_else(|| {
                part.uri
                    .rsplit('/')
                    .next()
                    .filter(|segment| !segment.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| part.uri.clone());

        push_unique(
            &mut self.information,
            format!("Resource: {} from {}", name, part.server_name),
            sequence,
        );
        self.resource_fetches.push(ResourceFetchSummary {
            server_name: part.server_name.clone(),
            uri: part.uri.clone(),
            name,
            message_id: message_id.to_string(),
            turn_index,
            timestamp: Utc::now(),
            sequence,
        });
    }

    fn record_prompt(&mut self, part: &PromptFetchPart, message_id: &str, turn_index: usize) {
        if part.status != FetchStatus::Complete {
            return;
        }
        let sequence = self.sequence();
        push_unique(
            &mut self.information,
            format!("Prompt: {} from {}", part.prompt_name, part.server_name),
            sequence,
        );
        self.prompt_fetches.push(PromptFetchSummary {
            server_name: part.server_name.clone(),
            prompt_name: part.prompt_name.clone(),
            args: part.args.clone(),
            message_id: message_id.to_string(),
            turn_index,
            timestamp: Utc::now(),
            sequence,
        });
    }

    /// Whether the same tool was already called with structurally equal
    /// arguments.
    pub fn is_redundant(&self, tool_name: &str, args: &Map<String, Value>) -> bool {
        self.index.contains_key(&call_key(tool_name, args))
    }

    /// Result of the newest matching call, if it produced one.
    pub fn cached_result(&self, tool_name: &str, args: &Map<String, Value>) -> Option<&Value> {
        self.index
            .get(&call_key(tool_name, args))
            .and_then(|&i| self.tool_calls.get(i))
            .and_then(|call| call.result.as_ref())
    }

    pub fn tool_calls(&self) -> &[ToolCallSummary] {
        &self.tool_calls
    }

    pub fn resource_fetches(&self) -> &[ResourceFetchSummary] {
        &self.resource_fetches
    }

    pub fn prompt_fetches(&self) -> &[PromptFetchSummary] {
        &self.prompt_fetches
    }

    pub fn datasets(&self) -> impl Iterator<Item = &str> {
        self.datasets.iter().map(|entry| entry.text.as_str())
    }

    pub fn available_information(&self) -> impl Iterator<Item = &str> {
        self.information.iter().map(|entry| entry.text.as_str())
    }

    /// Number of messages folded so far.
    pub fn messages_seen(&self) -> usize {
        self.messages_seen
    }

    pub fn is_empty(&self) -> bool {
        self.tool_calls.is_empty()
            && self.resource_fetches.is_empty()
            && self.prompt_fetches.is_empty()
    }
}

fn push_unique(entries: &mut Vec<LabelEntry>, text: String, sequence: u64) {
    if !entries.iter().any(|entry| entry.text == text) {
        entries.push(LabelEntry { text, sequence });
    }
}

/// Lookup key: tool name plus arguments serialized with sorted keys at every
/// depth, so insertion order never matters.
pub fn call_key(tool_name: &str, args: &Map<String, Value>) -> String {
    let args = canonical(&Value::Object(args.clone()));
    format!("{}\u{0}{}", tool_name, args)
}

fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonical(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        other => other.clone(),
    }
}
