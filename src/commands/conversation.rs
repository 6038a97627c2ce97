// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Offline commands over recorded messages

use serde_json::{json, Value};
use std::sync::Arc;

use crate::cli::args::{ClassifyArgs, ContextArgs, OutputFormat};
use crate::config::Settings;
use crate::context::{DataContextLedger, RuleLabeler};
use crate::error::{HubError, Result};
use crate::events::{parse_conversation, Normalizer, RawMessage, TextRole};
use crate::phase::{classify, TurnClassification};
use crate::utils::pretty_json;

use super::{parse_object_arg, read_json};

/// Classify one assistant turn given as a message object or a bare parts
/// array.
pub fn classify_document(
    document: Value,
    settings: &Settings,
    stream_open: bool,
) -> Result<TurnClassification> {
    let normalizer = Normalizer::new(&settings.hub.transport_hints)?;
    let events = match document {
        Value::Array(parts) => normalizer.normalize_turn(&parts),
        Value::Object(_) => {
            let message: RawMessage = serde_json::from_value(document)?;
            normalizer.normalize_message(&message).events
        }
        other => {
            return Err(HubError::Protocol(format!(
                "Expected a message object or parts array, got {}",
                other
            )))
        }
    };
    tracing::debug!("Classifying {} normalized events", events.len());
    Ok(classify(&events, stream_open, &settings.hub.classifier))
}

/// Fold a conversation document into a ledger configured from settings.
pub fn ledger_from_document(document: Value, settings: &Settings) -> Result<DataContextLedger> {
    let normalizer = Normalizer::new(&settings.hub.transport_hints)?;
    let messages: Vec<_> = parse_conversation(document)?
        .iter()
        .map(|message| normalizer.normalize_message(message))
        .collect();

    let labeler = RuleLabeler::new(settings.hub.dataset_rules.clone());
    Ok(DataContextLedger::new(settings.hub.summary)
        .with_labeler(Arc::new(labeler))
        .from_conversation(&messages))
}

fn role_label(role: TextRole) -> &'static str {
    match role {
        TextRole::Unclassified => "text",
        TextRole::Reasoning => "reasoning",
        TextRole::FinalAnswer => "answer",
    }
}

/// `mcp-hub classify`
pub fn execute_classify(
    args: &ClassifyArgs,
    settings: &Settings,
    format: &OutputFormat,
) -> Result<()> {
    let classification = classify_document(read_json(&args.file)?, settings, args.open)?;

    if matches!(format, OutputFormat::Json) {
        println!("{}", serde_json::to_string_pretty(&classification)?);
        return Ok(());
    }

    println!("Phase: {:?}", classification.phase);
    for fragment in &classification.fragments {
        let marker = if fragment.settled { "" } else { " (unsettled)" };
        println!(
            "\n[{}] {}{}",
            fragment.position,
            role_label(fragment.role),
            marker
        );
        println!("{}", fragment.text);
    }
    for plan in &classification.plans {
        println!("\nPlan: {}", plan.title);
        if let Some(description) = &plan.description {
            println!("  {}", description);
        }
    }
    match &classification.final_text {
        Some(text) => println!("\n--- Final answer ---\n{}", text),
        None => println!("\nNo final answer yet."),
    }
    Ok(())
}

/// `mcp-hub context`
pub fn execute_context(
    args: &ContextArgs,
    settings: &Settings,
    format: &OutputFormat,
) -> Result<()> {
    let ledger = ledger_from_document(read_json(&args.file)?, settings)?;
    let summary = match args.budget {
        Some(budget) => ledger.summarize(budget),
        None => ledger.summary(),
    };

    let check = match (&args.check_tool, &args.check_args) {
        (Some(tool), Some(raw)) => {
            let check_args = parse_object_arg(raw)?;
            Some(json!({
                "tool": tool,
                "redundant": ledger.is_redundant(tool, &check_args),
                "cachedResult": ledger.cached_result(tool, &check_args),
            }))
        }
        _ => None,
    };

    if matches!(format, OutputFormat::Json) {
        println!(
            "{}",
            pretty_json(&json!({
                "summary": summary,
                "toolCalls": ledger.tool_calls(),
                "resourceFetches": ledger.resource_fetches(),
                "promptFetches": ledger.prompt_fetches(),
                "check": check,
            }))
        );
        return Ok(());
    }

    if summary.is_empty() {
        println!("No session data context.");
    } else {
        println!("{}", summary);
    }
    if let Some(check) = check {
        let verdict = if check["redundant"].as_bool().unwrap_or(false) {
            "already called with these arguments"
        } else {
            "not called yet"
        };
        println!("\n{}: {}", check["tool"].as_str().unwrap_or_default(), verdict);
    }
    Ok(())
}
