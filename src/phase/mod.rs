// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Turn phase classification
//!
//! Splits the text of one assistant turn into reasoning and a final answer,
//! and derives what the turn is doing right now. The classifier is a plain
//! function of the events and the stream flag; callers re-run it on every
//! update instead of patching a previous result.

pub mod cleanup;

pub use cleanup::{clean_text, PlanPreview};

use serde::{Deserialize, Serialize};

use crate::events::{NormalizedEvent, TextRole, TurnEvent};

/// Classifier settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifierConfig {
    /// A trailing candidate must be longer than this (in chars) to count as
    /// the final answer
    #[serde(default = "default_min_final_answer_chars")]
    pub min_final_answer_chars: usize,

    /// Splits reasoning from the answer inside a single text part
    #[serde(default = "default_answer_delimiter")]
    pub answer_delimiter: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_final_answer_chars: default_min_final_answer_chars(),
            answer_delimiter: default_answer_delimiter(),
        }
    }
}

fn default_min_final_answer_chars() -> usize {
    100
}

fn default_answer_delimiter() -> String {
    "---ANSWER---".to_string()
}

/// What the turn is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationPhase {
    Idle,
    Thinking,
    Generating,
    Complete,
}

/// A text fragment with its decided role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedFragment {
    /// Raw part index within the turn
    pub position: usize,
    /// Either `Reasoning` or `FinalAnswer`
    pub role: TextRole,
    /// Trimmed, cleaned text
    pub text: String,
    /// The role cannot change when more parts are appended
    pub settled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnClassification {
    pub fragments: Vec<ClassifiedFragment>,
    pub phase: ConversationPhase,
    pub final_text: Option<String>,
    pub plans: Vec<PlanPreview>,
}

impl TurnClassification {
    pub fn reasoning(&self) -> impl Iterator<Item = &ClassifiedFragment> {
        self.fragments
            .iter()
            .filter(|f| f.role == TextRole::Reasoning)
    }
}

/// A text that may become the final answer
struct Candidate {
    index: usize,
    /// Came from the answer half of a delimited part
    delimited: bool,
}

/// Classify one assistant turn.
pub fn classify(
    events: &[TurnEvent],
    stream_open: bool,
    config: &ClassifierConfig,
) -> TurnClassification {
    let last_tool = events
        .iter()
        .filter(|e| e.event.is_tool_call())
        .map(|e| e.position)
        .max();
    let has_tools = last_tool.is_some();

    let mut fragments: Vec<ClassifiedFragment> = Vec::new();
    let mut candidates: Vec<Candidate> = Vec::new();
    let mut plans = Vec::new();

    for turn_event in events {
        let NormalizedEvent::Text(fragment) = &turn_event.event else {
            continue;
        };
        let position = turn_event.position;
        let mut push = |role: TextRole, text: &str, settled: bool| {
            fragments.push(ClassifiedFragment {
                position,
                role,
                text: text.to_string(),
                settled,
            });
            fragments.len() - 1
        };

        if fragment.role == TextRole::Reasoning {
            let text = fragment.text.trim();
            if !text.is_empty() {
                push(TextRole::Reasoning, text, true);
            }
            continue;
        }

        let cleaned = clean_text(&fragment.text, &mut plans);
        let text = cleaned.trim();
        if text.is_empty() {
            continue;
        }

        if let Some((thinking, answer)) = text.split_once(config.answer_delimiter.as_str()) {
            let thinking = thinking.trim();
            if !thinking.is_empty() {
                push(TextRole::Reasoning, thinking, true);
            }
            let answer = answer.trim();
            if !answer.is_empty() {
                let index = push(TextRole::FinalAnswer, answer, false);
                candidates.push(Candidate {
                    index,
                    delimited: true,
                });
            }
            continue;
        }

        match last_tool {
            Some(tool_position) if position < tool_position => {
                // A later tool call never goes away, so this stays reasoning.
                push(TextRole::Reasoning, text, true);
            }
            _ => {
                let index = push(TextRole::FinalAnswer, text, false);
                candidates.push(Candidate {
                    index,
                    delimited: false,
                });
            }
        }
    }

    // Only the last candidate survives; earlier ones become reasoning.
    let mut final_text = None;
    if let Some((retained, superseded)) = candidates.split_last() {
        let later_delimited = |i: usize| candidates[i + 1..].iter().any(|c| c.delimited);
        for (i, candidate) in superseded.iter().enumerate() {
            let fragment = &mut fragments[candidate.index];
            fragment.role = TextRole::Reasoning;
            // A positional candidate behind a newer one is either still
            // superseded or sits before a new tool call. A delimited one can
            // only be displaced for good by another delimited answer.
            fragment.settled = !candidate.delimited || later_delimited(i);
        }

        let fragment = &mut fragments[retained.index];
        if fragment.text.chars().count() > config.min_final_answer_chars {
            final_text = Some(fragment.text.clone());
        } else {
            fragment.role = TextRole::Reasoning;
        }
    }

    let has_activity = has_tools || fragments.iter().any(|f| f.role == TextRole::Reasoning);
    let phase = if !stream_open {
        ConversationPhase::Complete
    } else if final_text.is_some() {
        ConversationPhase::Generating
    } else if has_activity {
        ConversationPhase::Thinking
    } else {
        ConversationPhase::Idle
    };

    tracing::trace!(
        fragments = fragments.len(),
        final_text = final_text.is_some(),
        ?phase,
        "classified turn"
    );

    TurnClassification {
        fragments,
        phase,
        final_text,
        plans,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{MarkerKind, SourceTransport, TextFragment, ToolCallEvent};
    use crate::naming::ToolName;
    use serde_json::Map;

    fn text(position: usize, text: &str) -> TurnEvent {
        TurnEvent {
            position,
            event: NormalizedEvent::Text(TextFragment {
                text: text.to_string(),
                role: TextRole::Unclassified,
            }),
        }
    }

    fn reasoning(position: usize, text: &str) -> TurnEvent {
        TurnEvent {
            position,
            event: NormalizedEvent::Text(TextFragment {
                text: text.to_string(),
                role: TextRole::Reasoning,
            }),
        }
    }

    fn tool(position: usize) -> TurnEvent {
        let name = ToolName::parse("eda__describe").unwrap();
        TurnEvent {
            position,
            event: NormalizedEvent::ToolCall(ToolCallEvent::new(
                &name,
                Map::new(),
                SourceTransport::Direct,
            )),
        }
    }

    fn long(n: usize) -> String {
        "a".repeat(n)
    }

    #[test]
    fn test_empty_turn() {
        let config = ClassifierConfig::default();
        let open = classify(&[], true, &config);
        assert_eq!(open.phase, ConversationPhase::Idle);
        assert!(open.fragments.is_empty());
        assert_eq!(classify(&[], false, &config).phase, ConversationPhase::Complete);
    }

    #[test]
    fn test_threshold_boundary() {
        let config = ClassifierConfig::default();

        let at_limit = classify(&[tool(0), text(1, &long(100))], true, &config);
        assert!(at_limit.final_text.is_none());
        assert_eq!(at_limit.fragments[0].role, TextRole::Reasoning);
        assert_eq!(at_limit.phase, ConversationPhase::Thinking);

        let over = classify(&[tool(0), text(1, &long(101))], true, &config);
        assert_eq!(over.final_text.as_deref(), Some(long(101).as_str()));
        assert_eq!(over.fragments[0].role, TextRole::FinalAnswer);
        assert_eq!(over.phase, ConversationPhase::Generating);
    }

    #[test]
    fn test_threshold_counts_chars_not_bytes() {
        let config = ClassifierConfig::default();
        let accented = "é".repeat(60);
        let result = classify(&[text(0, &accented)], false, &config);
        assert!(result.final_text.is_none());
    }

    #[test]
    fn test_threshold_configurable() {
        let config = ClassifierConfig {
            min_final_answer_chars: 3,
            ..Default::default()
        };
        let result = classify(&[text(0, "four")], true, &config);
        assert_eq!(result.final_text.as_deref(), Some("four"));
    }

    #[test]
    fn test_text_before_tool_is_reasoning() {
        let config = ClassifierConfig::default();
        let result = classify(
            &[text(0, &long(300)), tool(1), text(2, &long(150))],
            true,
            &config,
        );
        assert_eq!(result.fragments[0].role, TextRole::Reasoning);
        assert!(result.fragments[0].settled);
        assert_eq!(result.fragments[1].role, TextRole::FinalAnswer);
        assert!(!result.fragments[1].settled);
    }

    #[test]
    fn test_only_last_candidate_retained() {
        let config = ClassifierConfig::default();
        let result = classify(
            &[tool(0), text(1, &long(200)), text(2, &long(120))],
            true,
            &config,
        );
        assert_eq!(result.fragments.len(), 2);
        assert_eq!(result.fragments[0].role, TextRole::Reasoning);
        assert!(result.fragments[0].settled);
        assert_eq!(result.final_text, Some(long(120)));
    }

    #[test]
    fn test_delimiter_splits_fragment() {
        let config = ClassifierConfig::default();
        let body = format!("weighing options ---ANSWER--- {}", long(150));
        let result = classify(&[text(0, &body)], true, &config);
        assert_eq!(result.fragments.len(), 2);
        assert_eq!(result.fragments[0].text, "weighing options");
        assert_eq!(result.fragments[0].role, TextRole::Reasoning);
        assert_eq!(result.final_text, Some(long(150)));
    }

    #[test]
    fn test_delimited_answer_ignores_tool_position() {
        let config = ClassifierConfig::default();
        let body = format!("x---ANSWER---{}", long(150));
        let result = classify(&[text(0, &body), tool(1)], true, &config);
        assert_eq!(result.final_text, Some(long(150)));
    }

    #[test]
    fn test_reasoning_parts_stay_reasoning() {
        let config = ClassifierConfig::default();
        let result = classify(&[reasoning(0, &long(500))], true, &config);
        assert!(result.final_text.is_none());
        assert_eq!(result.phase, ConversationPhase::Thinking);
        assert!(result.fragments[0].settled);
    }

    #[test]
    fn test_markers_and_blank_text_ignored() {
        let config = ClassifierConfig::default();
        let marker = TurnEvent {
            position: 0,
            event: NormalizedEvent::Marker {
                marker: MarkerKind::StepStart,
            },
        };
        let result = classify(&[marker, text(1, "   ")], true, &config);
        assert!(result.fragments.is_empty());
        assert_eq!(result.phase, ConversationPhase::Idle);
    }

    #[test]
    fn test_plans_collected() {
        let config = ClassifierConfig::default();
        let body = r#"<plan title="Load">read the csv</plan>"#;
        let result = classify(&[text(0, body)], false, &config);
        assert!(result.fragments.is_empty());
        assert_eq!(result.plans.len(), 1);
        assert_eq!(result.plans[0].content, "read the csv");
    }

    #[test]
    fn test_classify_is_idempotent() {
        let config = ClassifierConfig::default();
        let events = vec![text(0, "hi"), tool(1), text(2, &long(180))];
        assert_eq!(
            classify(&events, true, &config),
            classify(&events, true, &config)
        );
    }
}
