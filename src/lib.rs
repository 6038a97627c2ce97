// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! mcp-hub - normalization and aggregation layer for MCP tool servers.
//!
//! This crate exposes the shared runtime used by the `mcp-hub` CLI
//! (`src/main.rs`) and by chat front ends that embed it.
//!
//! Architecture highlights:
//! - `events`: canonical event model and the raw-part normalizer
//! - `phase`: per-turn reasoning/final-answer classification
//! - `catalog`: merged `<backend>__<tool>` catalog and dispatch
//! - `context`: session ledger of prior calls and fetches, plus its summary
//! - `mcp`, `fetch`: backend clients, resource and prompt managers
//!
//! Data flows from raw message parts through `events` into `phase` (current
//! turn) and `context` (whole session). `catalog` dispatch produces the
//! tool-call events the normalizer later reads back.

pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod fetch;
pub mod mcp;
pub mod naming;
pub mod phase;
pub mod utils;

pub use error::{HubError, Result};
