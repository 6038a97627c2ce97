// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! In-process tools for resources and prompts
//!
//! These live in the reserved `mcp` namespace and let the model discover and
//! pull resources and prompt templates from any backend.

use serde_json::{json, Map, Value};

use super::ToolResult;
use crate::fetch::{get_prompt, list_all_prompts, list_all_resources, read_resource};
use crate::mcp::{BackendSet, Tool};
use crate::utils::pretty_json as pretty;

/// The synthetic tools, by original name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticTool {
    ListResources,
    ReadResource,
    ListPrompts,
    GetPrompt,
}

impl SyntheticTool {
    pub const ALL: [SyntheticTool; 4] = [
        SyntheticTool::ListResources,
        SyntheticTool::ReadResource,
        SyntheticTool::ListPrompts,
        SyntheticTool::GetPrompt,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SyntheticTool::ListResources => "list_resources",
            SyntheticTool::ReadResource => "read_resource",
            SyntheticTool::ListPrompts => "list_prompts",
            SyntheticTool::GetPrompt => "get_prompt",
        }
    }

    pub fn definition(&self) -> Tool {
        match self {
            SyntheticTool::ListResources => Tool::new(
                self.name(),
                "List all available resources from MCP servers. Resources are data sources like files, documents, schemas, or metadata that can provide context for analysis.",
                json!({
                    "type": "object",
                    "properties": {
                        "serverName": {
                            "type": "string",
                            "description": "Optional: Filter resources by server name"
                        }
                    }
                }),
            ),
            SyntheticTool::ReadResource => Tool::new(
                self.name(),
                "Read the content of a specific resource by URI. Use this to access detailed information from data sources.",
                json!({
                    "type": "object",
                    "properties": {
                        "serverName": {
                            "type": "string",
                            "description": "Name of the MCP server hosting the resource"
                        },
                        "uri": {"type": "string", "description": "URI of the resource to read"}
                    },
                    "required": ["serverName", "uri"]
                }),
            ),
            SyntheticTool::ListPrompts => Tool::new(
                self.name(),
                "List all available prompt templates from MCP servers. Prompts are reusable analysis templates or workflows.",
                json!({
                    "type": "object",
                    "properties": {
                        "serverName": {
                            "type": "string",
                            "description": "Optional: Filter prompts by server name"
                        }
                    }
                }),
            ),
            SyntheticTool::GetPrompt => Tool::new(
                self.name(),
                "Get a specific prompt template with arguments. This retrieves the prompt messages that can guide your analysis.",
                json!({
                    "type": "object",
                    "properties": {
                        "serverName": {
                            "type": "string",
                            "description": "Name of the MCP server hosting the prompt"
                        },
                        "promptName": {
                            "type": "string",
                            "description": "Name of the prompt template to retrieve"
                        },
                        "args": {
                            "type": "object",
                            "description": "Arguments to pass to the prompt template",
                            "additionalProperties": true
                        }
                    },
                    "required": ["serverName", "promptName"]
                }),
            ),
        }
    }

    /// Run the tool. Failures come back as an error result carrying a JSON
    /// `{"error": ...}` payload.
    pub async fn execute(
        &self,
        namespaced_name: &str,
        backends: &BackendSet,
        args: &Map<String, Value>,
        resource_max_chars: usize,
    ) -> ToolResult {
        let str_arg = |key: &str| args.get(key).and_then(Value::as_str);

        match self {
            SyntheticTool::ListResources => {
                let scoped = scope(backends, str_arg("serverName"));
                let resources = list_all_resources(&scoped, None).await;
                let listed: Vec<Value> = resources
                    .iter()
                    .map(|r| {
                        json!({
                            "server": r.server_name,
                            "uri": r.resource.uri,
                            "name": r.resource.name,
                            "description": r.resource.description,
                            "mimeType": r.resource.mime_type,
                        })
                    })
                    .collect();
                ToolResult::success(
                    namespaced_name,
                    pretty(&json!({"total": listed.len(), "resources": listed})),
                )
            }
            SyntheticTool::ReadResource => {
                let (Some(server), Some(uri)) = (str_arg("serverName"), str_arg("uri")) else {
                    return missing_args(namespaced_name, "serverName and uri are required");
                };
                if !backends.contains_key(server) {
                    return missing_args(namespaced_name, &format!("Server {} not found", server));
                }
                match read_resource(backends, server, uri, resource_max_chars).await {
                    Ok(text) => ToolResult::success(
                        namespaced_name,
                        pretty(&json!({
                            "uri": uri,
                            "server": server,
                            "mimeType": text.mime_type,
                            "content": text.content,
                        })),
                    ),
                    Err(e) => ToolResult::error(
                        namespaced_name,
                        json!({"error": e.to_string(), "uri": uri}).to_string(),
                    ),
                }
            }
            SyntheticTool::ListPrompts => {
                let scoped = scope(backends, str_arg("serverName"));
                let prompts = list_all_prompts(&scoped).await;
                let listed: Vec<Value> = prompts
                    .iter()
                    .map(|p| {
                        json!({
                            "server": p.server_name,
                            "name": p.prompt.name,
                            "title": p.prompt.title,
                            "description": p.prompt.description,
                            "arguments": p.prompt.arguments,
                        })
                    })
                    .collect();
                ToolResult::success(
                    namespaced_name,
                    pretty(&json!({"total": listed.len(), "prompts": listed})),
                )
            }
            SyntheticTool::GetPrompt => {
                let (Some(server), Some(prompt_name)) =
                    (str_arg("serverName"), str_arg("promptName"))
                else {
                    return missing_args(
                        namespaced_name,
                        "serverName and promptName are required",
                    );
                };
                if !backends.contains_key(server) {
                    return missing_args(namespaced_name, &format!("Server {} not found", server));
                }
                let prompt_args = args
                    .get("args")
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_default();
                match get_prompt(backends, server, prompt_name, prompt_args).await {
                    Ok(prompt) => ToolResult::success(
                        namespaced_name,
                        pretty(&json!({
                            "server": server,
                            "promptName": prompt_name,
                            "description": prompt.description,
                            "messages": prompt.messages,
                        })),
                    ),
                    Err(e) => ToolResult::error(
                        namespaced_name,
                        json!({"error": e.to_string(), "promptName": prompt_name}).to_string(),
                    ),
                }
            }
        }
    }
}

/// Restrict to one backend when a server filter is given. An unknown server
/// yields an empty set.
fn scope(backends: &BackendSet, server: Option<&str>) -> BackendSet {
    match server {
        Some(name) => backends
            .iter()
            .filter(|(backend, _)| backend.as_str() == name)
            .map(|(backend, handle)| (backend.clone(), handle.clone()))
            .collect(),
        None => backends.clone(),
    }
}

fn missing_args(namespaced_name: &str, message: &str) -> ToolResult {
    ToolResult::error(namespaced_name, json!({"error": message}).to_string())
}
