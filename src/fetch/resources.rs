// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Resource listing and reading across backends

use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::error::{HubError, Result};
use crate::events::{FetchedResource, ResourceFetchPart};
use crate::mcp::{BackendSet, Resource};
use crate::utils::truncate_chars;

/// Appended when a resource is cut at the size limit
pub const TRUNCATION_NOTICE: &str = "\n\n[Content truncated due to size limit]";

/// How many characters of a binary blob are shown in its placeholder
const BLOB_PREVIEW_CHARS: usize = 100;

/// A resource together with the backend that owns it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerResource {
    pub server_name: String,
    #[serde(flatten)]
    pub resource: Resource,
}

/// Resource text after flattening
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceText {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// List resources from every backend. Failing backends are skipped.
pub async fn list_all_resources(
    backends: &BackendSet,
    filter: Option<&(dyn Fn(&Resource) -> bool + Sync)>,
) -> Vec<ServerResource> {
    let listings = backends.iter().map(|(name, backend)| async move {
        (name.clone(), backend.list_resources().await)
    });

    let mut all = Vec::new();
    for (server_name, listing) in join_all(listings).await {
        match listing {
            Ok(resources) => {
                tracing::debug!(
                    "Found {} resources from '{}'",
                    resources.len(),
                    server_name
                );
                all.extend(
                    resources
                        .into_iter()
                        .filter(|r| filter.map_or(true, |keep| keep(r)))
                        .map(|resource| ServerResource {
                            server_name: server_name.clone(),
                            resource,
                        }),
                );
            }
            Err(e) => tracing::warn!("Failed to list resources from '{}': {}", server_name, e),
        }
    }
    all
}

/// Read one resource and flatten its contents to text.
///
/// Text parts are concatenated and binary parts replaced by a short
/// placeholder. The result is cut at `max_chars` with a notice.
pub async fn read_resource(
    backends: &BackendSet,
    server_name: &str,
    uri: &str,
    max_chars: usize,
) -> Result<ResourceText> {
    let backend = backends.get(server_name).ok_or_else(|| {
        HubError::Config(format!("Server {} not found", server_name))
    })?;
    let result = backend.read_resource(uri).await?;

    let mut content = String::new();
    for item in &result.contents {
        if let Some(text) = &item.text {
            content.push_str(text);
        } else if let Some(blob) = &item.blob {
            content.push_str(&format!(
                "[Binary content: {}...]",
                truncate_chars(blob, BLOB_PREVIEW_CHARS)
            ));
        }

        if content.chars().count() >= max_chars {
            content = format!("{}{}", truncate_chars(&content, max_chars), TRUNCATION_NOTICE);
            break;
        }
    }

    Ok(ResourceText {
        content,
        mime_type: result.contents.first().and_then(|c| c.mime_type.clone()),
    })
}

fn resource_name(uri: &str) -> String {
    uri.rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or(uri)
        .to_string()
}

/// Fetch resources and record each fetch as parts.
///
/// Every requested resource yields a `fetching` part followed by either a
/// `complete` or an `error` part. Unknown servers are skipped.
pub async fn fetch_resources_with_visibility(
    backends: &BackendSet,
    requests: &[(String, String)],
    max_chars: usize,
) -> Vec<ResourceFetchPart> {
    let mut parts = Vec::new();
    for (server_name, uri) in requests {
        if !backends.contains_key(server_name) {
            tracing::warn!("Server {} not found", server_name);
            continue;
        }

        let fetching = ResourceFetchPart::fetching(server_name, uri);
        parts.push(fetching.clone());

        match read_resource(backends, server_name, uri, max_chars).await {
            Ok(text) => {
                tracing::debug!("Fetched resource {} ({} chars)", uri, text.content.len());
                parts.push(fetching.complete(FetchedResource {
                    name: resource_name(uri),
                    title: None,
                    description: None,
                    mime_type: text.mime_type,
                    content: text.content,
                }));
            }
            Err(e) => {
                tracing::warn!("Failed to fetch resource {}: {}", uri, e);
                parts.push(fetching.failed(e.to_string()));
            }
        }
    }
    parts
}

/// Render fetched resources as a system-prompt section. Empty input gives `""`.
pub fn format_resources_for_prompt(resources: &[(String, String, FetchedResource)]) -> String {
    if resources.is_empty() {
        return String::new();
    }

    let sections: Vec<String> = resources
        .iter()
        .map(|(server_name, uri, resource)| {
            let mut section = format!(
                "### Resource: {} ({})\nURI: {}\n",
                resource.name, server_name, uri
            );
            if let Some(mime) = &resource.mime_type {
                section.push_str(&format!("Type: {}\n", mime));
            }
            if let Some(description) = &resource.description {
                section.push_str(&format!("Description: {}\n", description));
            }
            section.push_str(&format!("Content:\n```\n{}\n```", resource.content));
            section
        })
        .collect();

    format!("## Available MCP Resources\n\n{}", sections.join("\n\n---\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_name_from_uri() {
        assert_eq!(resource_name("file:///data/sleep.csv"), "sleep.csv");
        assert_eq!(resource_name("schema"), "schema");
        assert_eq!(resource_name("mem://dir/"), "mem://dir/");
    }

    #[test]
    fn test_format_resources_empty() {
        assert_eq!(format_resources_for_prompt(&[]), "");
    }

    #[test]
    fn test_format_resources_section() {
        let resource = FetchedResource {
            name: "schema.json".to_string(),
            title: None,
            description: None,
            mime_type: Some("application/json".to_string()),
            content: "{}".to_string(),
        };
        let out = format_resources_for_prompt(&[(
            "eda".to_string(),
            "file:///schema.json".to_string(),
            resource,
        )]);
        assert!(out.starts_with("## Available MCP Resources"));
        assert!(out.contains("### Resource: schema.json (eda)"));
        assert!(out.contains("Type: application/json"));
        assert!(out.contains("```\n{}\n```"));
    }
}
