// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! mcp-hub - one tool catalog over many MCP servers
//!
//! Entry point for the mcp-hub CLI application.

use clap::Parser;

use mcp_hub::cli::{Cli, Commands};
use mcp_hub::commands::{self, conversation, mcp};
use mcp_hub::error::Result;
use mcp_hub::utils;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize tracing
    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());

    // `-v` turns on the hub's own diagnostics; `RUST_LOG` still takes precedence.
    if cli.verbose > 0 {
        let level = if cli.verbose > 1 { "trace" } else { "debug" };
        if let Ok(parsed) = format!("mcp_hub={}", level).parse() {
            env_filter = env_filter.add_directive(parsed);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("{}", utils::format_error(&e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = commands::load_settings(cli.config.as_deref())?;

    match &cli.command {
        Commands::Tools(args) => mcp::execute_tools(args, &settings, &cli.format).await,
        Commands::Call(args) => mcp::execute_call(args, &settings, &cli.format).await,
        Commands::Resources(args) => mcp::execute_resources(args, &settings, &cli.format).await,
        Commands::Prompts(args) => mcp::execute_prompts(args, &settings, &cli.format).await,
        Commands::Classify(args) => conversation::execute_classify(args, &settings, &cli.format),
        Commands::Context(args) => conversation::execute_context(args, &settings, &cli.format),
    }
}
