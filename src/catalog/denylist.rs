// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Tools that must never be exposed

use regex::{Regex, RegexBuilder};

use crate::error::Result;

/// Code execution and charting tools are rendered client-side instead
pub const DEFAULT_DENYLIST: &[&str] = &[
    "^run_",
    "_python$",
    "^plot_",
    "^create_chart",
    "^visualize_",
    "^generate_plot",
];

/// Case-insensitive patterns matched against original tool names
#[derive(Debug, Clone, Default)]
pub struct ToolDenylist {
    patterns: Vec<Regex>,
}

impl ToolDenylist {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                RegexBuilder::new(p.as_ref())
                    .case_insensitive(true)
                    .build()
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// The built-in list.
    pub fn standard() -> Self {
        Self::new(DEFAULT_DENYLIST).unwrap_or_default()
    }

    pub fn is_denied(&self, tool_name: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(tool_name))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
