// ABOUTME: Coaching decision pipeline: rule selection, generative fallback, and usage tracking
// ABOUTME: Defines the CoachingMessage shape shared by rule matches and fallback text
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// YAML rule catalog parsing
pub mod catalog;
/// Generative fallback with timeout, cancellation, and filler lines
pub mod fallback;
/// Rule matching and ranking
pub mod selector;
/// Placeholder rendering
pub mod template;
/// Usage counters, selection log, and effectiveness scores
pub mod usage;

pub use catalog::{load_catalog_file, parse_catalog, CoachCatalog};
pub use fallback::{FallbackGateway, FallbackOutcome, FillerReason};
pub use selector::{CoachingSelector, SelectionQuery, SelectionResult};
pub use template::{format_pace, render_template};
pub use usage::{RuleUsage, UsageTracker};

use chrono::{DateTime, Utc};
use pierre_core::models::{CoachingRule, EmotionalTone, MessageSource};
use serde::{Deserialize, Serialize};

/// A message ready for the voice collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachingMessage {
    /// Text to speak
    pub text: String,
    /// Where the text came from
    pub source: MessageSource,
    /// Matched rule, for rule messages
    pub rule_id: Option<String>,
    /// Delivery tone, for rule messages
    pub tone: Option<EmotionalTone>,
    /// Selection time
    pub created_at: DateTime<Utc>,
}

impl CoachingMessage {
    /// Message from a matched rule
    #[must_use]
    pub fn from_rule(rule: &CoachingRule, text: String, created_at: DateTime<Utc>) -> Self {
        Self {
            text,
            source: MessageSource::Rule,
            rule_id: Some(rule.id.clone()),
            tone: Some(rule.tone),
            created_at,
        }
    }

    /// Message from the fallback path; `None` when the call was cancelled
    #[must_use]
    pub fn from_fallback(outcome: FallbackOutcome, created_at: DateTime<Utc>) -> Option<Self> {
        let (text, source) = match outcome {
            FallbackOutcome::Generated(text) => (text, MessageSource::Fallback),
            FallbackOutcome::Filler { text, .. } => (text, MessageSource::Filler),
            FallbackOutcome::Cancelled => return None,
        };
        Some(Self {
            text,
            source,
            rule_id: None,
            tone: None,
            created_at,
        })
    }
}
