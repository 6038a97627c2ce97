// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! CLI argument definitions using Clap
//!
//! Defines all command-line arguments and subcommands for mcp-hub.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// mcp-hub - one tool catalog over many MCP servers
#[derive(Parser, Debug)]
#[command(name = "mcp-hub")]
#[command(version, about = "Normalize and aggregate MCP tool servers")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file path (defaults to ./mcp-config.json, then ~/.mcp-hub)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Connect every backend and list the merged tool catalog
    Tools(ToolsArgs),

    /// Dispatch one tool call through the catalog
    Call(CallArgs),

    /// List resources across backends
    Resources(ListArgs),

    /// List prompt templates across backends
    Prompts(ListArgs),

    /// Classify an assistant message read from a JSON file
    Classify(ClassifyArgs),

    /// Summarize what a conversation has already fetched
    Context(ContextArgs),
}

/// Arguments for the tools subcommand
#[derive(clap::Args, Debug, Default)]
pub struct ToolsArgs {
    /// Only show tools of this backend
    #[arg(short, long)]
    pub backend: Option<String>,

    /// Print full input schemas
    #[arg(long)]
    pub schemas: bool,
}

/// Arguments for the call subcommand
#[derive(clap::Args, Debug)]
pub struct CallArgs {
    /// Namespaced tool name, `<backend>__<tool>`
    pub tool: String,

    /// Tool arguments as a JSON object
    #[arg(short, long, default_value = "{}")]
    pub args: String,

    /// Call id recorded on the resulting event
    #[arg(long)]
    pub id: Option<String>,
}

/// Arguments for the resources and prompts subcommands
#[derive(clap::Args, Debug, Default)]
pub struct ListArgs {
    /// Only query this backend
    #[arg(short, long)]
    pub backend: Option<String>,
}

/// Arguments for the classify subcommand
#[derive(clap::Args, Debug)]
pub struct ClassifyArgs {
    /// JSON file holding one message (`{id, role, parts}`) or a parts array
    pub file: PathBuf,

    /// Treat the response stream as still open
    #[arg(long)]
    pub open: bool,
}

/// Arguments for the context subcommand
#[derive(clap::Args, Debug)]
pub struct ContextArgs {
    /// JSON file holding a message array or `{messages: [...]}`
    pub file: PathBuf,

    /// Character budget (defaults to hub.summary.budgetChars)
    #[arg(short, long)]
    pub budget: Option<usize>,

    /// Check whether this tool call would repeat an earlier one
    #[arg(long, requires = "check_args")]
    pub check_tool: Option<String>,

    /// Arguments for --check-tool as a JSON object
    #[arg(long)]
    pub check_args: Option<String>,
}

/// Output format for command results
#[derive(ValueEnum, Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Text,

    /// JSON output
    Json,
}
