// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Prompt templates across backends

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{HubError, Result};
use crate::events::{FetchedPrompt, PromptFetchPart, PromptLine};
use crate::mcp::{BackendSet, Prompt};

/// A prompt together with the backend that owns it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerPrompt {
    pub server_name: String,
    #[serde(flatten)]
    pub prompt: Prompt,
}

/// List prompts from every backend. Failing backends are skipped.
pub async fn list_all_prompts(backends: &BackendSet) -> Vec<ServerPrompt> {
    let listings = backends.iter().map(|(name, backend)| async move {
        (name.clone(), backend.list_prompts().await)
    });

    let mut all = Vec::new();
    for (server_name, listing) in join_all(listings).await {
        match listing {
            Ok(prompts) => {
                tracing::debug!("Found {} prompts from '{}'", prompts.len(), server_name);
                all.extend(prompts.into_iter().map(|prompt| ServerPrompt {
                    server_name: server_name.clone(),
                    prompt,
                }));
            }
            Err(e) => tracing::warn!("Failed to list prompts from '{}': {}", server_name, e),
        }
    }
    all
}

/// Render a prompt with `args`, flattening each message to text.
pub async fn get_prompt(
    backends: &BackendSet,
    server_name: &str,
    prompt_name: &str,
    args: Map<String, Value>,
) -> Result<FetchedPrompt> {
    let backend = backends
        .get(server_name)
        .ok_or_else(|| HubError::Config(format!("Server {} not found", server_name)))?;
    let result = backend.get_prompt(prompt_name, args).await?;

    Ok(FetchedPrompt {
        description: result.description,
        messages: result
            .messages
            .iter()
            .map(|message| PromptLine {
                role: message.role.clone(),
                content: message.text(),
            })
            .collect(),
    })
}

/// Fetch a prompt and record the fetch as parts: `fetching`, then
/// `complete` or `error`.
pub async fn fetch_prompt_with_visibility(
    backends: &BackendSet,
    server_name: &str,
    prompt_name: &str,
    args: Map<String, Value>,
) -> Vec<PromptFetchPart> {
    let fetching = PromptFetchPart::fetching(server_name, prompt_name, args.clone());
    let mut parts = vec![fetching.clone()];

    match get_prompt(backends, server_name, prompt_name, args).await {
        Ok(prompt) => parts.push(fetching.complete(prompt)),
        Err(e) => {
            tracing::warn!("Failed to fetch prompt {}: {}", prompt_name, e);
            parts.push(fetching.failed(e.to_string()));
        }
    }
    parts
}

/// Render the available prompts as a list. Empty input gives `""`.
pub fn format_prompts_for_display(prompts: &[ServerPrompt]) -> String {
    if prompts.is_empty() {
        return String::new();
    }

    let lines: Vec<String> = prompts
        .iter()
        .map(|p| {
            let mut line = format!("- **{}** ({})", p.prompt.name, p.server_name);
            if let Some(description) = &p.prompt.description {
                line.push_str(&format!("\n  {}", description));
            }
            if !p.prompt.arguments.is_empty() {
                let args: Vec<String> = p
                    .prompt
                    .arguments
                    .iter()
                    .map(|a| format!("{}{}", a.name, if a.required { "*" } else { "" }))
                    .collect();
                line.push_str(&format!("\nArguments: {}", args.join(", ")));
            }
            line
        })
        .collect();

    format!(
        "## Available MCP Prompts\n\n\
         The following prompt templates are available from MCP servers:\n\n\
         {}\n\n\
         You can reference these prompts when needed.",
        lines.join("\n")
    )
}

/// Render prompt messages as `ROLE: content` blocks.
pub fn format_prompt_messages(prompt: &FetchedPrompt) -> String {
    prompt
        .messages
        .iter()
        .map(|m| format!("{}: {}", m.role.to_uppercase(), m.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}
