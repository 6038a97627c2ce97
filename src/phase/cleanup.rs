// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Text cleanup applied before classification
//!
//! Plans are lifted out into previews; artifacts and notebook code blocks
//! render elsewhere and are removed from the conversational text.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static PLAN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)<plan(?:\s+title="([^"]*)")?(?:\s+description="([^"]*)")?\s*>(.*?)</plan>"#,
    )
    .expect("Invalid plan regex")
});

static ANY_PLAN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<plan[^>]*>.*?</plan>").expect("Invalid plan regex"));

static ARTIFACT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<artifact[^>]*>.*?</artifact>").expect("Invalid artifact regex")
});

static CODE_BLOCK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:jsx|javascript|tsx|js|typescript|ts)\s.*?```")
        .expect("Invalid code block regex")
});

/// A `<plan>` block lifted out of assistant text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanPreview {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub content: String,
}

/// Extract plan previews and strip plans, artifacts and code blocks.
///
/// Returns the remaining text untrimmed.
pub fn clean_text(text: &str, plans: &mut Vec<PlanPreview>) -> String {
    for captures in PLAN_PATTERN.captures_iter(text) {
        plans.push(PlanPreview {
            title: captures
                .get(1)
                .map(|m| m.as_str())
                .filter(|t| !t.is_empty())
                .unwrap_or("Plan")
                .to_string(),
            description: captures
                .get(2)
                .map(|m| m.as_str().to_string())
                .filter(|d| !d.is_empty()),
            content: captures
                .get(3)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default(),
        });
    }

    let text = CODE_BLOCK_PATTERN.replace_all(text, "");
    let text = ARTIFACT_PATTERN.replace_all(&text, "");
    ANY_PLAN_PATTERN.replace_all(&text, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_extracted_and_removed() {
        let mut plans = Vec::new();
        let text = r#"Before <plan title="Clean data" description="Drop NaNs">
1. load
2. clean
</plan> after"#;
        let cleaned = clean_text(text, &mut plans);
        assert_eq!(cleaned, "Before  after");
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].title, "Clean data");
        assert_eq!(plans[0].description.as_deref(), Some("Drop NaNs"));
        assert_eq!(plans[0].content, "1. load\n2. clean");
    }

    #[test]
    fn test_plan_without_title_defaults() {
        let mut plans = Vec::new();
        clean_text("<plan>steps</plan>", &mut plans);
        assert_eq!(plans[0].title, "Plan");
        assert!(plans[0].description.is_none());
    }

    #[test]
    fn test_artifact_removed() {
        let mut plans = Vec::new();
        let cleaned = clean_text(
            "Chart: <artifact type=\"jsx\" id=\"a1\">export default 1</artifact>done",
            &mut plans,
        );
        assert_eq!(cleaned, "Chart: done");
        assert!(plans.is_empty());
    }

    #[test]
    fn test_notebook_code_block_removed() {
        let mut plans = Vec::new();
        let cleaned = clean_text("x ```tsx\nconst a = 1;\n``` y", &mut plans);
        assert_eq!(cleaned, "x  y");

        let kept = clean_text("```python\nprint(1)\n```", &mut plans);
        assert!(kept.contains("print(1)"));
    }
}
