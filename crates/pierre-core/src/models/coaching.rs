// ABOUTME: Coaching data models: authored rules and the selection events they produce
// ABOUTME: Only usage counters and effectiveness scores are mutated at runtime
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::coaching::{MAX_PRIORITY, MIN_PRIORITY};

/// Emotional register a rule is written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionalTone {
    /// Upbeat encouragement
    #[default]
    Encouraging,
    /// Calm, even delivery
    Calm,
    /// High-energy push
    Energetic,
    /// Direct, no-nonsense instruction
    Firm,
    /// Light-hearted
    Playful,
}

/// A pre-authored candidate message with matching, priority, and usage constraints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachingRule {
    /// Rule identifier
    pub id: String,
    /// Coach that owns the rule
    pub coach_id: String,
    /// Message category (e.g. `pace`, `motivation`, `milestone`)
    pub category: String,
    /// Message template with `{variable}` placeholders
    pub template: String,
    /// Condition tokens; empty means the rule matches any context
    #[serde(default)]
    pub conditions: Vec<String>,
    /// Priority from 1 (lowest) to 10 (highest)
    pub priority: u8,
    /// Minimum seconds between two selections of this rule
    #[serde(default)]
    pub cooldown_secs: u64,
    /// Maximum selections per run
    pub max_uses_per_run: u32,
    /// Inactive rules are never candidates
    #[serde(default = "default_active")]
    pub active: bool,
    /// Emotional tone of the message
    #[serde(default)]
    pub tone: EmotionalTone,
    /// BCP-47 language tag
    #[serde(default = "default_language")]
    pub language: String,
    /// Selections during the current run
    #[serde(default)]
    pub usage_count: u32,
    /// When this rule was last selected
    #[serde(default)]
    pub last_used_at: Option<DateTime<Utc>>,
    /// Feedback-derived effectiveness in [0, 1]
    #[serde(default)]
    pub effectiveness: Option<f64>,
}

fn default_active() -> bool {
    true
}

fn default_language() -> String {
    "en".to_owned()
}

impl CoachingRule {
    /// Create an active rule with no conditions, no cooldown, and a single use per run
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        coach_id: impl Into<String>,
        category: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            coach_id: coach_id.into(),
            category: category.into(),
            template: template.into(),
            conditions: Vec::new(),
            priority: 5,
            cooldown_secs: 0,
            max_uses_per_run: 1,
            active: true,
            tone: EmotionalTone::default(),
            language: default_language(),
            usage_count: 0,
            last_used_at: None,
            effectiveness: None,
        }
    }

    /// Set condition tokens
    #[must_use]
    pub fn with_conditions<I, S>(mut self, conditions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conditions = conditions.into_iter().map(Into::into).collect();
        self
    }

    /// Set priority, clamped to 1..=10
    #[must_use]
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority.clamp(MIN_PRIORITY, MAX_PRIORITY);
        self
    }

    /// Set cooldown
    #[must_use]
    pub fn with_cooldown_secs(mut self, cooldown_secs: u64) -> Self {
        self.cooldown_secs = cooldown_secs;
        self
    }

    /// Set per-run usage cap
    #[must_use]
    pub fn with_max_uses(mut self, max_uses_per_run: u32) -> Self {
        self.max_uses_per_run = max_uses_per_run;
        self
    }

    /// Whether the per-run cap has been reached
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.usage_count >= self.max_uses_per_run
    }

    /// Whether the rule is still cooling down at `now`
    #[must_use]
    pub fn in_cooldown(&self, now: DateTime<Utc>) -> bool {
        if self.cooldown_secs == 0 {
            return false;
        }
        self.last_used_at.is_some_and(|last| {
            let elapsed = now.signed_duration_since(last).num_milliseconds();
            let cooldown_ms =
                i64::try_from(self.cooldown_secs.saturating_mul(1000)).unwrap_or(i64::MAX);
            elapsed < cooldown_ms
        })
    }
}

/// Where a delivered message came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSource {
    /// A catalog rule matched
    Rule,
    /// The generative collaborator produced the text
    Fallback,
    /// Generation failed or timed out; a generic filler was used
    Filler,
}

/// Record of one coaching selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionEvent {
    /// Session the message was selected for
    pub session_id: Uuid,
    /// Matched rule; `None` for fallback and filler messages
    pub rule_id: Option<String>,
    /// Where the text came from
    pub source: MessageSource,
    /// When the selection was made
    pub timestamp: DateTime<Utc>,
    /// Rendered text
    pub text: String,
    /// Whether the voice collaborator accepted the message
    pub delivered: bool,
}
