// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Commands that connect to backends

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::catalog::{
    CatalogBuilder, CatalogHandle, MergedToolCatalog, ToolName, SYNTHETIC_NAMESPACE,
};
use crate::cli::args::{CallArgs, ListArgs, OutputFormat, ToolsArgs};
use crate::config::Settings;
use crate::error::{HubError, Result};
use crate::fetch::{format_prompts_for_display, list_all_prompts, list_all_resources};
use crate::mcp::{
    connect_all, connect_backend, BackendSet, Connections, CredentialProvider, EnvCredentials,
};
use crate::utils::pretty_json;

use super::parse_object_arg;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolListing<'a> {
    name: &'a str,
    backend: &'a str,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    input_schema: Option<&'a Value>,
}

/// Connect everything (or one backend) and report failures on stderr.
async fn connect(
    settings: &Settings,
    credentials: &dyn CredentialProvider,
    only: Option<&str>,
) -> Result<Connections> {
    let Some(name) = only else {
        return Ok(connect_all(settings, credentials).await);
    };
    let config = settings
        .mcp_servers
        .get(name)
        .ok_or_else(|| HubError::Config(format!("Server {} not found", name)))?;

    let mut connections = Connections::default();
    match connect_backend(name, config, credentials).await {
        Ok(backend) => {
            connections.backends.insert(name.to_string(), backend);
        }
        Err(e) => {
            connections.failures.insert(name.to_string(), e);
        }
    }
    Ok(connections)
}

fn report_failures(connections: &Connections) {
    for (name, error) in &connections.failures {
        eprintln!("⚠️  {}: {}", name, error);
    }
}

async fn build_catalog(settings: &Settings, backends: BackendSet) -> Result<MergedToolCatalog> {
    let credentials: Arc<dyn CredentialProvider> = Arc::new(EnvCredentials::new(settings));
    let builder = CatalogBuilder::from_settings(settings, credentials)?;
    Ok(builder.build(backends).await)
}

/// `mcp-hub tools`
pub async fn execute_tools(
    args: &ToolsArgs,
    settings: &Settings,
    format: &OutputFormat,
) -> Result<()> {
    let credentials = EnvCredentials::new(settings);
    let connections = connect(settings, &credentials, args.backend.as_deref()).await?;
    report_failures(&connections);
    let catalog = build_catalog(settings, connections.backends).await?;

    let grouped = catalog.tools_by_backend();
    let grouped: BTreeMap<&str, _> = grouped
        .into_iter()
        .filter(|(backend, _)| args.backend.as_deref().map_or(true, |b| b == *backend))
        .collect();

    if matches!(format, OutputFormat::Json) {
        let listing: Vec<ToolListing> = grouped
            .values()
            .flatten()
            .map(|entry| ToolListing {
                name: &entry.namespaced_name,
                backend: &entry.backend_name,
                description: &entry.description,
                input_schema: args.schemas.then_some(&entry.input_schema),
            })
            .collect();
        println!(
            "{}",
            pretty_json(&json!({
                "tools": listing,
                "excluded": catalog.excluded(),
            }))
        );
        return Ok(());
    }

    if grouped.is_empty() {
        println!("No tools available.");
    }
    for (backend, entries) in &grouped {
        println!("\n{} ({} tools)", backend, entries.len());
        for entry in entries {
            println!("  {}", entry.namespaced_name);
            println!("      {}", first_line(&entry.description));
            if args.schemas {
                for line in pretty_json(&entry.input_schema).lines() {
                    println!("      {}", line);
                }
            }
        }
    }
    for (backend, reason) in catalog.excluded() {
        println!("\n{} excluded: {}", backend, reason);
    }
    Ok(())
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

/// `mcp-hub call`
pub async fn execute_call(
    args: &CallArgs,
    settings: &Settings,
    format: &OutputFormat,
) -> Result<()> {
    let name = ToolName::parse(&args.tool)?;
    let tool_args = Value::Object(parse_object_arg(&args.args)?);

    // Synthetic tools can reach any backend
    let only = (name.backend() != SYNTHETIC_NAMESPACE).then(|| name.backend());
    let credentials = EnvCredentials::new(settings);
    let connections = connect(settings, &credentials, only).await?;
    report_failures(&connections);

    let handle = CatalogHandle::new(build_catalog(settings, connections.backends).await?);
    let catalog = handle.current();
    let call_id = args
        .id
        .clone()
        .unwrap_or_else(|| format!("call_{}", uuid::Uuid::new_v4().simple()));
    let event = catalog.invoke(call_id, &args.tool, tool_args).await?;

    if matches!(format, OutputFormat::Json) {
        println!("{}", serde_json::to_string_pretty(&event)?);
        return Ok(());
    }

    println!("{} [{}] via {:?}", event.tool_name, event.state, event.source_transport);
    if let Some(Value::String(text)) = &event.result {
        println!("{}", text);
    }
    Ok(())
}

/// `mcp-hub resources`
pub async fn execute_resources(
    args: &ListArgs,
    settings: &Settings,
    format: &OutputFormat,
) -> Result<()> {
    let credentials = EnvCredentials::new(settings);
    let connections = connect(settings, &credentials, args.backend.as_deref()).await?;
    report_failures(&connections);
    let resources = list_all_resources(&connections.backends, None).await;

    if matches!(format, OutputFormat::Json) {
        println!("{}", serde_json::to_string_pretty(&resources)?);
        return Ok(());
    }
    if resources.is_empty() {
        println!("No resources available.");
    }
    for item in &resources {
        println!("{}  {}  ({})", item.server_name, item.resource.uri, item.resource.name);
        if let Some(description) = &item.resource.description {
            println!("      {}", first_line(description));
        }
    }
    Ok(())
}

/// `mcp-hub prompts`
pub async fn execute_prompts(
    args: &ListArgs,
    settings: &Settings,
    format: &OutputFormat,
) -> Result<()> {
    let credentials = EnvCredentials::new(settings);
    let connections = connect(settings, &credentials, args.backend.as_deref()).await?;
    report_failures(&connections);
    let prompts = list_all_prompts(&connections.backends).await;

    if matches!(format, OutputFormat::Json) {
        println!("{}", serde_json::to_string_pretty(&prompts)?);
        return Ok(());
    }
    if prompts.is_empty() {
        println!("No prompts available.");
    } else {
        println!("{}", format_prompts_for_display(&prompts));
    }
    Ok(())
}
