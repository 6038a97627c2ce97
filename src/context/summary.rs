// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Budgeted summary block for the system prompt

use super::ledger::DataContextLedger;

const HEADER: &str = "## Session Data Context\n";
const REMINDER: &str =
    "\n⚠️ REUSE existing data. Only reload if user requests new/different data.\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Datasets,
    Resources,
    Prompts,
    Information,
}

impl Category {
    const ORDER: [Category; 4] = [
        Category::Datasets,
        Category::Resources,
        Category::Prompts,
        Category::Information,
    ];

    fn label(&self) -> &'static str {
        match self {
            Category::Datasets => "Datasets",
            Category::Resources => "Resources",
            Category::Prompts => "Prompts",
            Category::Information => "Available Info",
        }
    }
}

struct Item {
    category: Category,
    text: String,
    sequence: u64,
}

impl DataContextLedger {
    /// Summary using the ledger's configured budget.
    pub fn summary(&self) -> String {
        self.summarize(self.config.budget_chars)
    }

    /// Render the ledger in at most `budget` characters.
    ///
    /// Each category shows its most recent items. When the block is over
    /// budget the oldest shown item goes first. A block is never rendered
    /// without at least one item line: an empty ledger, one whose entries
    /// have no summary line, or one that cannot fit a single item renders
    /// as `""`.
    pub fn summarize(&self, budget: usize) -> String {
        let mut items = self.recent_items();
        while !items.is_empty() {
            let rendered = render(&items);
            if rendered.chars().count() <= budget {
                return rendered;
            }
            if let Some(oldest) = items
                .iter()
                .enumerate()
                .min_by_key(|(_, item)| item.sequence)
                .map(|(i, _)| i)
            {
                items.remove(oldest);
            }
        }
        if !self.is_empty() {
            tracing::debug!("Session summary has nothing to show in {} chars", budget);
        }
        String::new()
    }

    fn recent_items(&self) -> Vec<Item> {
        let keep = self.config.per_category;
        let mut items = Vec::new();

        let mut take = |category: Category, entries: Vec<(String, u64)>| {
            let skip = entries.len().saturating_sub(keep);
            items.extend(entries.into_iter().skip(skip).map(|(text, sequence)| Item {
                category,
                text,
                sequence,
            }));
        };

        take(
            Category::Datasets,
            self.datasets
                .iter()
                .map(|entry| (entry.text.clone(), entry.sequence))
                .collect(),
        );
        take(
            Category::Resources,
            self.resource_fetches
                .iter()
                .map(|r| (format!("{} ({})", r.name, r.server_name), r.sequence))
                .collect(),
        );
        take(
            Category::Prompts,
            self.prompt_fetches
                .iter()
                .map(|p| (format!("{} ({})", p.prompt_name, p.server_name), p.sequence))
                .collect(),
        );
        take(
            Category::Information,
            self.information
                .iter()
                .map(|entry| (entry.text.clone(), entry.sequence))
                .collect(),
        );
        items
    }
}

fn render(items: &[Item]) -> String {
    let mut sections = vec![HEADER.to_string()];
    for category in Category::ORDER {
        let shown: Vec<&str> = items
            .iter()
            .filter(|item| item.category == category)
            .map(|item| item.text.as_str())
            .collect();
        if !shown.is_empty() {
            sections.push(format!("**{}:** {}", category.label(), shown.join(", ")));
        }
    }
    sections.push(REMINDER.to_string());
    sections.join("\n")
}
