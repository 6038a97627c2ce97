// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Merged tool catalog
//!
//! Tools from every backend are exposed under `<backend>__<tool>` with
//! sanitized schemas. The catalog also owns dispatch: a namespaced call is
//! routed back to its backend, credentials are re-injected, and the result is
//! flattened to text. Dispatch never returns an error; failures come back as
//! error [`ToolResult`]s the model can read.

pub mod builder;
pub mod denylist;
pub mod format;
pub mod schema;
pub mod synthetic;

pub use builder::CatalogBuilder;
pub use denylist::{ToolDenylist, DEFAULT_DENYLIST};
pub use format::{dispatch_error, format_call_result, FormattedResult};
pub use schema::{sanitize_schema, SanitizedSchema};
pub use synthetic::SyntheticTool;

pub use crate::naming::{check_backend_name, ToolName, SEPARATOR, SYNTHETIC_NAMESPACE};

use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::error::Result;
use crate::events::{SourceTransport, ToolCallEvent, ToolCallState};
use crate::mcp::{BackendSet, CredentialProvider};

/// Result of a dispatched tool call
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    /// Namespaced name of the tool that produced this
    pub tool_name: String,
    pub output: ToolOutput,
}

/// Output from a tool
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Success(String),
    Error(String),
}

impl ToolResult {
    pub fn success(tool_name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            output: ToolOutput::Success(output.into()),
        }
    }

    pub fn error(tool_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            output: ToolOutput::Error(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.output, ToolOutput::Error(_))
    }

    pub fn output_text(&self) -> &str {
        match &self.output {
            ToolOutput::Success(s) => s,
            ToolOutput::Error(s) => s,
        }
    }
}

/// Where a catalog entry is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchTarget {
    /// The owning backend, by original name
    Backend,
    /// One of the in-process `mcp__*` tools
    Synthetic(SyntheticTool),
}

/// One tool as exposed to the model
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub namespaced_name: String,
    pub backend_name: String,
    pub original_name: String,
    pub description: String,
    pub input_schema: Value,
    /// Credential params removed from the schema, injected at dispatch
    pub stripped_params: Vec<String>,
    pub target: DispatchTarget,
}

impl CatalogEntry {
    /// `{name, description, input_schema}` as handed to an LLM provider.
    pub fn definition(&self) -> Value {
        json!({
            "name": self.namespaced_name,
            "description": self.description,
            "input_schema": self.input_schema,
        })
    }
}

/// Namespaced tools from every backend plus their dispatcher
pub struct MergedToolCatalog {
    entries: BTreeMap<String, CatalogEntry>,
    backends: BackendSet,
    excluded: BTreeMap<String, String>,
    credentials: Arc<dyn CredentialProvider>,
    resource_max_chars: usize,
    generation: u64,
    current: Arc<AtomicU64>,
}

impl std::fmt::Debug for MergedToolCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergedToolCatalog")
            .field("tools", &self.entries.keys().collect::<Vec<_>>())
            .field("excluded", &self.excluded)
            .field("generation", &self.generation)
            .finish()
    }
}

impl MergedToolCatalog {
    pub(crate) fn new(
        entries: BTreeMap<String, CatalogEntry>,
        backends: BackendSet,
        excluded: BTreeMap<String, String>,
        credentials: Arc<dyn CredentialProvider>,
        resource_max_chars: usize,
    ) -> Self {
        Self {
            entries,
            backends,
            excluded,
            credentials,
            resource_max_chars,
            generation: 0,
            current: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn get(&self, namespaced_name: &str) -> Option<&CatalogEntry> {
        self.entries.get(namespaced_name)
    }

    pub fn contains(&self, namespaced_name: &str) -> bool {
        self.entries.contains_key(namespaced_name)
    }

    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Backends left out of this catalog, with the reason.
    pub fn excluded(&self) -> &BTreeMap<String, String> {
        &self.excluded
    }

    pub fn backends(&self) -> &BackendSet {
        &self.backends
    }

    /// Entries grouped by backend name.
    pub fn tools_by_backend(&self) -> BTreeMap<&str, Vec<&CatalogEntry>> {
        let mut grouped: BTreeMap<&str, Vec<&CatalogEntry>> = BTreeMap::new();
        for entry in self.entries.values() {
            grouped
                .entry(entry.backend_name.as_str())
                .or_default()
                .push(entry);
        }
        grouped
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// False once a newer catalog has been installed in the owning handle.
    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.generation
    }

    /// Transport label for calls dispatched to `namespaced_name`.
    pub fn transport_of(&self, namespaced_name: &str) -> SourceTransport {
        self.entries
            .get(namespaced_name)
            .filter(|entry| entry.target == DispatchTarget::Backend)
            .and_then(|entry| self.backends.get(&entry.backend_name))
            .map(|backend| backend.transport())
            .unwrap_or(SourceTransport::Direct)
    }

    /// Call a tool by namespaced name.
    pub async fn dispatch(&self, namespaced_name: &str, args: Value) -> ToolResult {
        let server_name = ToolName::parse(namespaced_name)
            .map(|name| name.backend().to_string())
            .unwrap_or_default();
        let fail_as = |message: &str, tool_name: &str, server_name: &str| {
            ToolResult::error(
                namespaced_name,
                dispatch_error(message, tool_name, server_name),
            )
        };
        let fail = |message: &str| fail_as(message, namespaced_name, &server_name);

        if !self.is_current() {
            tracing::warn!(
                "Refusing dispatch of {} on stale catalog generation {}",
                namespaced_name,
                self.generation
            );
            return fail("Tool catalog has been replaced; retry with the current catalog");
        }

        let Some(entry) = self.entries.get(namespaced_name) else {
            return fail(&format!("Unknown tool '{}'", namespaced_name));
        };

        let mut args = match args {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return fail(&format!("Tool arguments must be an object, got {}", other));
            }
        };

        match entry.target {
            DispatchTarget::Synthetic(tool) => {
                tool.execute(
                    namespaced_name,
                    &self.backends,
                    &args,
                    self.resource_max_chars,
                )
                .await
            }
            DispatchTarget::Backend => {
                // Past this point errors name the backend's own tool
                let fail = |message: &str| {
                    fail_as(message, &entry.original_name, &entry.backend_name)
                };
                let Some(backend) = self.backends.get(&entry.backend_name) else {
                    return fail(&format!("Backend '{}' is not connected", entry.backend_name));
                };

                if !entry.stripped_params.is_empty() {
                    match self.credentials.credential(&entry.backend_name) {
                        Some(token) => {
                            for param in &entry.stripped_params {
                                args.insert(param.clone(), Value::String(token.clone()));
                            }
                        }
                        None => tracing::warn!(
                            "No credential available to inject into {}",
                            namespaced_name
                        ),
                    }
                }

                tracing::debug!("Dispatching {} to '{}'", namespaced_name, entry.backend_name);
                match backend
                    .call_tool(&entry.original_name, Value::Object(args))
                    .await
                {
                    Ok(raw) => match format_call_result(&raw) {
                        Ok(formatted) if formatted.is_error => {
                            ToolResult::error(namespaced_name, formatted.text)
                        }
                        Ok(formatted) => ToolResult::success(namespaced_name, formatted.text),
                        Err(message) => {
                            tracing::error!("{} returned {}", namespaced_name, message);
                            fail(&message)
                        }
                    },
                    Err(e) => {
                        tracing::error!("Error executing {}: {}", namespaced_name, e);
                        fail(&e.to_string())
                    }
                }
            }
        }
    }

    /// Dispatch and report the call as a [`ToolCallEvent`] that has moved
    /// through input-available, executing, and a terminal state.
    pub async fn invoke(
        &self,
        call_id: impl Into<String>,
        namespaced_name: &str,
        args: Value,
    ) -> Result<ToolCallEvent> {
        let name = ToolName::parse(namespaced_name)?;
        let event_args = args.as_object().cloned().unwrap_or_default();
        let mut event = ToolCallEvent::new(&name, event_args, self.transport_of(namespaced_name))
            .with_call_id(call_id);

        event.advance(ToolCallState::Executing)?;
        let result = self.dispatch(namespaced_name, args).await;
        event.finish(
            Value::String(result.output_text().to_string()),
            result.is_error(),
        )?;
        Ok(event)
    }
}

/// Owner of the live catalog
///
/// Installing a catalog retires the previous one: it keeps answering
/// lookups but refuses to dispatch.
pub struct CatalogHandle {
    current: RwLock<Arc<MergedToolCatalog>>,
    generation: Arc<AtomicU64>,
}

impl CatalogHandle {
    pub fn new(catalog: MergedToolCatalog) -> Self {
        let generation = Arc::new(AtomicU64::new(0));
        let catalog = Self::adopt(catalog, &generation);
        Self {
            current: RwLock::new(Arc::new(catalog)),
            generation,
        }
    }

    fn adopt(mut catalog: MergedToolCatalog, generation: &Arc<AtomicU64>) -> MergedToolCatalog {
        catalog.generation = generation.fetch_add(1, Ordering::SeqCst) + 1;
        catalog.current = generation.clone();
        catalog
    }

    /// The catalog calls should go to right now.
    pub fn current(&self) -> Arc<MergedToolCatalog> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Swap in a new catalog and return it.
    pub fn install(&self, catalog: MergedToolCatalog) -> Arc<MergedToolCatalog> {
        let mut slot = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let catalog = Arc::new(Self::adopt(catalog, &self.generation));
        *slot = catalog.clone();
        tracing::info!("Installed tool catalog generation {}", catalog.generation);
        catalog
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_catalog() -> MergedToolCatalog {
        CatalogBuilder::default().merge(BackendSet::new(), Vec::new())
    }

    #[test]
    fn test_tool_result_helpers() {
        let ok = ToolResult::success("a__b", "done");
        assert!(!ok.is_error());
        assert_eq!(ok.output_text(), "done");

        let err = ToolResult::error("a__b", "nope");
        assert!(err.is_error());
        assert_eq!(err.output_text(), "nope");
    }

    #[test]
    fn test_standalone_catalog_is_current() {
        let catalog = empty_catalog();
        assert!(catalog.is_current());
        assert_eq!(catalog.generation(), 0);
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_handle_retires_previous_generation() {
        let handle = CatalogHandle::new(empty_catalog());
        let first = handle.current();
        assert_eq!(first.generation(), 1);
        assert!(first.is_current());

        let second = handle.install(empty_catalog());
        assert_eq!(second.generation(), 2);
        assert!(!first.is_current());
        assert!(second.is_current());
        assert_eq!(handle.generation(), 2);
    }

    #[tokio::test]
    async fn test_stale_catalog_refuses_dispatch() {
        let handle = CatalogHandle::new(empty_catalog());
        let stale = handle.current();
        handle.install(empty_catalog());

        let result = stale.dispatch("eda__load", json!({})).await;
        assert!(result.is_error());
        let payload: Value = serde_json::from_str(result.output_text()).unwrap();
        assert_eq!(payload["serverName"], "eda");
        assert!(payload["error"].as_str().unwrap().contains("replaced"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_error_result() {
        let result = empty_catalog().dispatch("nope__tool", json!({})).await;
        assert!(result.is_error());
        let payload: Value = serde_json::from_str(result.output_text()).unwrap();
        assert_eq!(payload["toolName"], "nope__tool");
    }

    #[tokio::test]
    async fn test_invoke_rejects_malformed_name() {
        assert!(empty_catalog()
            .invoke("c1", "no_separator", json!({}))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_invoke_unknown_tool_ends_in_error_state() {
        let event = empty_catalog()
            .invoke("c1", "eda__load", json!({"path": "x"}))
            .await
            .unwrap();
        assert_eq!(event.state, ToolCallState::Error);
        assert_eq!(event.tool_call_id.as_deref(), Some("c1"));
        assert_eq!(event.args.get("path"), Some(&json!("x")));
        assert!(event.result.is_some());
    }
}
