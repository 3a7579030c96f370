// ABOUTME: Coaching selector matching a condition set against a coach's rule catalog
// ABOUTME: Applies activity, usage cap, cooldown, lenient token matching, and seeded ranking
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Coaching Selector
//!
//! Candidates are ranked by priority (descending), then usage count
//! (ascending). Ties are broken by a seeded `ChaCha8Rng`, so the same seed and
//! the same sequence of calls always pick the same rules.
//!
//! Matching is deliberately lenient: a rule condition matches when it is a
//! case-insensitive substring of any context token, or any context token is a
//! substring of it. `"pace"` therefore matches `"pace:slower_than_target"`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use pierre_core::models::CoachingRule;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::template::render_template;
use crate::conditions::ConditionSet;

/// Outcome of one selection
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionResult {
    /// A rule matched; `text` is its rendered template
    Matched {
        /// The chosen rule, as it was before this selection
        rule: CoachingRule,
        /// Rendered message
        text: String,
    },
    /// No rule matched and generative fallback is enabled
    Fallback,
    /// No rule matched and fallback is disabled; skip this tick
    NoCandidates,
}

/// What to select for
#[derive(Debug, Clone, Copy)]
pub struct SelectionQuery<'a> {
    /// Coach whose rules are eligible
    pub coach_id: &'a str,
    /// Restrict to one category; `None` accepts any
    pub category: Option<&'a str>,
    /// Current context
    pub conditions: &'a ConditionSet,
    /// Template variables
    pub variables: &'a HashMap<String, String>,
    /// Evaluation time for cooldowns
    pub now: DateTime<Utc>,
}

/// Rule selector with a deterministic tie-break
#[derive(Debug, Clone)]
pub struct CoachingSelector {
    rng: ChaCha8Rng,
    fallback_enabled: bool,
}

impl CoachingSelector {
    /// Create a selector seeded with `seed`
    #[must_use]
    pub fn new(seed: u64, fallback_enabled: bool) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            fallback_enabled,
        }
    }

    /// Pick the best eligible rule from `rules`
    pub fn select_message(
        &mut self,
        rules: &[CoachingRule],
        query: &SelectionQuery<'_>,
    ) -> SelectionResult {
        let candidates: Vec<&CoachingRule> = rules
            .iter()
            .filter(|rule| is_candidate(rule, query))
            .filter(|rule| matches_conditions(rule, query.conditions))
            .collect();

        let Some(best) = candidates.iter().map(|rule| rank_key(rule)).max() else {
            return if self.fallback_enabled {
                SelectionResult::Fallback
            } else {
                SelectionResult::NoCandidates
            };
        };

        let tied: Vec<&CoachingRule> = candidates
            .into_iter()
            .filter(|rule| rank_key(rule) == best)
            .collect();

        match tied.choose(&mut self.rng) {
            Some(rule) => SelectionResult::Matched {
                text: render_template(&rule.template, query.variables),
                rule: (*rule).clone(),
            },
            None => SelectionResult::NoCandidates,
        }
    }
}

/// Higher is better: priority first, then fewer uses
fn rank_key(rule: &CoachingRule) -> (u8, std::cmp::Reverse<u32>) {
    (rule.priority, std::cmp::Reverse(rule.usage_count))
}

fn is_candidate(rule: &CoachingRule, query: &SelectionQuery<'_>) -> bool {
    let category_ok = match query.category {
        None => true,
        Some(category) => {
            rule.conditions.is_empty() || rule.category.eq_ignore_ascii_case(category)
        }
    };

    rule.coach_id == query.coach_id
        && category_ok
        && rule.active
        && !rule.is_exhausted()
        && !rule.in_cooldown(query.now)
}

/// Bidirectional case-insensitive containment between rule conditions and context tokens
#[must_use]
pub fn matches_conditions(rule: &CoachingRule, conditions: &ConditionSet) -> bool {
    if rule.conditions.is_empty() {
        return true;
    }
    let context: Vec<String> = conditions.iter().map(str::to_lowercase).collect();
    rule.conditions.iter().any(|condition| {
        let condition = condition.to_lowercase();
        context
            .iter()
            .any(|token| token.contains(&condition) || condition.contains(token.as_str()))
    })
}
