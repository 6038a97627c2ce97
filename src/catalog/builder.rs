// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Merging per-backend tool listings into one catalog

use futures::future::join_all;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use super::schema::sanitize_schema;
use super::synthetic::SyntheticTool;
use super::{CatalogEntry, DispatchTarget, MergedToolCatalog, ToolDenylist};
use crate::config::Settings;
use crate::error::{HubError, Result};
use crate::mcp::{BackendSet, CredentialProvider, StaticCredentials, Tool};
use crate::naming::{check_backend_name, ToolName, SYNTHETIC_NAMESPACE};

/// Builds [`MergedToolCatalog`]s
pub struct CatalogBuilder {
    denylist: ToolDenylist,
    credential_params: HashMap<String, String>,
    credentials: Arc<dyn CredentialProvider>,
    synthetic_tools: bool,
    resource_max_chars: usize,
}

impl Default for CatalogBuilder {
    fn default() -> Self {
        Self::new(ToolDenylist::standard())
    }
}

impl CatalogBuilder {
    pub fn new(denylist: ToolDenylist) -> Self {
        Self {
            denylist,
            credential_params: HashMap::new(),
            credentials: Arc::new(StaticCredentials::new()),
            synthetic_tools: false,
            resource_max_chars: 50_000,
        }
    }

    /// Builder matching the settings file: denylist, credential params and
    /// synthetic tools.
    pub fn from_settings(
        settings: &Settings,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self> {
        let mut builder = Self::new(ToolDenylist::new(&settings.hub.denylist)?)
            .with_credentials(credentials);
        for (name, backend) in &settings.mcp_servers {
            if let Some(param) = backend.credential_param() {
                builder = builder.with_credential_param(name, param);
            }
        }
        if settings.hub.synthetic_tools {
            builder = builder.with_synthetic_tools(settings.hub.resource_max_chars);
        }
        Ok(builder)
    }

    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Strip `param` from every schema of `backend` and inject the backend's
    /// credential under that name at dispatch.
    pub fn with_credential_param(
        mut self,
        backend: impl Into<String>,
        param: impl Into<String>,
    ) -> Self {
        self.credential_params.insert(backend.into(), param.into());
        self
    }

    /// Add the `mcp__*` resource and prompt tools.
    pub fn with_synthetic_tools(mut self, resource_max_chars: usize) -> Self {
        self.synthetic_tools = true;
        self.resource_max_chars = resource_max_chars;
        self
    }

    /// List every backend concurrently, then merge.
    pub async fn build(&self, backends: BackendSet) -> MergedToolCatalog {
        let listings = join_all(backends.iter().map(|(name, backend)| async move {
            let listing = backend
                .list_tools()
                .await
                .map_err(|e| HubError::backend_list(name, e));
            (name.clone(), listing)
        }))
        .await;

        self.merge(backends, listings)
    }

    /// Merge already fetched listings. A backend whose listing failed, whose
    /// name is unusable, or that lists the same tool twice is excluded; the
    /// others proceed.
    pub fn merge(
        &self,
        backends: BackendSet,
        listings: impl IntoIterator<Item = (String, Result<Vec<Tool>>)>,
    ) -> MergedToolCatalog {
        let mut entries: BTreeMap<String, CatalogEntry> = BTreeMap::new();
        let mut excluded = BTreeMap::new();

        for (backend, listing) in listings {
            let outcome = listing.and_then(|tools| {
                check_backend_name(&backend)?;
                self.backend_entries(&backend, tools)
            });
            match outcome {
                Ok(backend_entries) => {
                    tracing::debug!(
                        "Backend '{}' contributes {} tools",
                        backend,
                        backend_entries.len()
                    );
                    for entry in backend_entries {
                        if let Some(existing) = entries.get(&entry.namespaced_name) {
                            tracing::error!(
                                "Tool name {} from '{}' collides with '{}'; keeping the first",
                                entry.namespaced_name,
                                backend,
                                existing.backend_name
                            );
                            continue;
                        }
                        entries.insert(entry.namespaced_name.clone(), entry);
                    }
                }
                Err(e) => {
                    tracing::warn!("Excluding backend '{}' from catalog: {}", backend, e);
                    excluded.insert(backend, e.to_string());
                }
            }
        }

        if self.synthetic_tools {
            for tool in SyntheticTool::ALL {
                let definition = tool.definition();
                let namespaced = format!("{}__{}", SYNTHETIC_NAMESPACE, definition.name);
                entries.insert(
                    namespaced.clone(),
                    CatalogEntry {
                        namespaced_name: namespaced,
                        backend_name: SYNTHETIC_NAMESPACE.to_string(),
                        original_name: definition.name,
                        description: definition.description.unwrap_or_default(),
                        input_schema: definition.input_schema,
                        stripped_params: Vec::new(),
                        target: DispatchTarget::Synthetic(tool),
                    },
                );
            }
        }

        tracing::info!(
            "Catalog built: {} tools from {} backends ({} excluded)",
            entries.len(),
            backends.len(),
            excluded.len()
        );

        MergedToolCatalog::new(
            entries,
            backends,
            excluded,
            self.credentials.clone(),
            self.resource_max_chars,
        )
    }

    fn backend_entries(&self, backend: &str, tools: Vec<Tool>) -> Result<Vec<CatalogEntry>> {
        let credential_param = self.credential_params.get(backend).map(String::as_str);
        let mut seen = HashSet::new();
        let mut entries = Vec::new();

        for tool in tools {
            if !seen.insert(tool.name.clone()) {
                return Err(HubError::SchemaConflict {
                    backend: backend.to_string(),
                    tool: tool.name,
                });
            }
            if self.denylist.is_denied(&tool.name) {
                tracing::info!("Filtered denied tool {}__{}", backend, tool.name);
                continue;
            }
            let name = match ToolName::new(backend, &tool.name) {
                Ok(name) => name,
                Err(e) => {
                    tracing::warn!("Skipping tool from '{}': {}", backend, e);
                    continue;
                }
            };

            let sanitized = sanitize_schema(&tool.input_schema, credential_param);
            entries.push(CatalogEntry {
                namespaced_name: name.to_string(),
                backend_name: backend.to_string(),
                description: tool
                    .description
                    .filter(|d| !d.trim().is_empty())
                    .unwrap_or_else(|| format!("Tool {} from {}", tool.name, backend)),
                original_name: tool.name,
                input_schema: sanitized.schema,
                stripped_params: sanitized.stripped.into_iter().collect(),
                target: DispatchTarget::Backend,
            });
        }
        Ok(entries)
    }
}
