// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Session data context
//!
//! Tracks which tool calls, resources, and prompts a conversation has
//! already pulled in, so a caller can skip redundant calls and remind the
//! model what it already has:
//!
//! - [`DataContextLedger`]: append-only fold over normalized messages
//! - [`DatasetLabeler`]: pluggable mapping from tool calls to dataset labels
//! - `summarize`: a budgeted `## Session Data Context` block

pub mod labeler;
pub mod ledger;
pub mod summary;

pub use labeler::{DatasetLabel, DatasetLabeler, DatasetRule, NoLabels, RuleLabeler};
pub use ledger::{
    call_key, DataContextLedger, PromptFetchSummary, ResourceFetchSummary, ToolCallSummary,
};

use serde::{Deserialize, Serialize};

/// Size limits for the summary block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryConfig {
    /// Hard upper bound on summary length, in characters
    #[serde(default = "default_budget_chars")]
    pub budget_chars: usize,
    /// Most recent items listed per category
    #[serde(default = "default_per_category")]
    pub per_category: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            budget_chars: default_budget_chars(),
            per_category: default_per_category(),
        }
    }
}

fn default_budget_chars() -> usize {
    2000
}

fn default_per_category() -> usize {
    3
}
