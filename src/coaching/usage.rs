// ABOUTME: Usage and effectiveness tracker for coaching rules
// ABOUTME: Per-run counters are keyed by session and rule; effectiveness is shared across runs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use pierre_core::errors::{AppError, AppResult};
use pierre_core::models::{CoachingRule, SelectionEvent};
use tracing::{debug, info};
use uuid::Uuid;

use crate::logging::CoachLogger;

/// How often a rule was used in one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleUsage {
    /// Selections in the run
    pub count: u32,
    /// Time of the latest selection
    pub last_used_at: Option<DateTime<Utc>>,
}

/// Rule definitions, per-run counters, and the selection analytics log
#[derive(Debug, Default)]
pub struct UsageTracker {
    rules: DashMap<String, CoachingRule>,
    usage: DashMap<(Uuid, String), RuleUsage>,
    events: DashMap<Uuid, Vec<SelectionEvent>>,
}

impl UsageTracker {
    /// Create an empty tracker
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register rule definitions, keeping the effectiveness of rules already known
    pub fn load_rules(&self, rules: impl IntoIterator<Item = CoachingRule>) {
        for mut rule in rules {
            rule.usage_count = 0;
            rule.last_used_at = None;
            self.rules
                .entry(rule.id.clone())
                .and_modify(|existing| {
                    let effectiveness = existing.effectiveness;
                    *existing = rule.clone();
                    existing.effectiveness = effectiveness;
                })
                .or_insert(rule);
        }
    }

    /// Rules owned by `coach_id` with `session_id`'s counters applied, sorted by id
    #[must_use]
    pub fn rules_for_session(&self, session_id: Uuid, coach_id: &str) -> Vec<CoachingRule> {
        let mut rules: Vec<CoachingRule> = self
            .rules
            .iter()
            .filter(|entry| entry.coach_id == coach_id)
            .map(|entry| entry.value().clone())
            .collect();
        for rule in &mut rules {
            let usage = self.usage(session_id, &rule.id);
            rule.usage_count = usage.count;
            rule.last_used_at = usage.last_used_at;
        }
        rules.sort_by(|a, b| a.id.cmp(&b.id));
        rules
    }

    /// Definition of one rule; runtime counters are always zero here
    #[must_use]
    pub fn rule(&self, rule_id: &str) -> Option<CoachingRule> {
        self.rules.get(rule_id).map(|entry| entry.value().clone())
    }

    /// Usage of one rule within one run
    #[must_use]
    pub fn usage(&self, session_id: Uuid, rule_id: &str) -> RuleUsage {
        self.usage
            .get(&(session_id, rule_id.to_owned()))
            .map(|entry| *entry.value())
            .unwrap_or_default()
    }

    /// Claim one use of a rule in a run
    ///
    /// The cap and cooldown checks and the increment happen under the same
    /// entry lock, so concurrent claims never exceed the cap.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown rule and `InvalidState` when the rule
    /// is at its per-run cap or still cooling down.
    pub fn reserve(&self, session_id: Uuid, rule_id: &str, now: DateTime<Utc>) -> AppResult<()> {
        let mut view = self
            .rule(rule_id)
            .ok_or_else(|| AppError::not_found(format!("coaching rule {rule_id}")))?;

        let mut usage = self
            .usage
            .entry((session_id, rule_id.to_owned()))
            .or_default();
        view.usage_count = usage.count;
        view.last_used_at = usage.last_used_at;
        if view.is_exhausted() {
            return Err(AppError::invalid_state(format!(
                "coaching rule {rule_id} reached its cap of {} uses",
                view.max_uses_per_run
            )));
        }
        if view.in_cooldown(now) {
            return Err(AppError::invalid_state(format!(
                "coaching rule {rule_id} is cooling down"
            )));
        }
        usage.count += 1;
        usage.last_used_at = Some(now);
        Ok(())
    }

    /// Append an event to the analytics log without touching counters
    pub fn log_event(&self, event: SelectionEvent) {
        CoachLogger::log_selection(
            event.session_id,
            event.rule_id.as_deref(),
            event.source,
            event.delivered,
        );
        self.events.entry(event.session_id).or_default().push(event);
    }

    /// Record a selection; rule selections claim a use before the event is logged
    ///
    /// # Errors
    ///
    /// As [`UsageTracker::reserve`]; nothing is logged on error.
    pub fn record_selection(&self, event: SelectionEvent) -> AppResult<()> {
        if let Some(rule_id) = event.rule_id.as_deref() {
            self.reserve(event.session_id, rule_id, event.timestamp)?;
        }
        self.log_event(event);
        Ok(())
    }

    /// Zero a run's counters for one coach's rules
    pub fn reset_for_new_session(&self, session_id: Uuid, coach_id: &str) {
        let before = self.usage.len();
        self.usage.retain(|(session, rule_id), _| {
            *session != session_id
                || self
                    .rules
                    .get(rule_id)
                    .is_some_and(|rule| rule.coach_id != coach_id)
        });
        debug!(
            session.id = %session_id,
            coach.id = coach_id,
            rules.reset = before.saturating_sub(self.usage.len()),
            "Reset rule usage"
        );
    }

    /// Drop a finished run's counters; its events stay in the log
    pub fn release_session(&self, session_id: Uuid) {
        self.usage.retain(|(session, _), _| *session != session_id);
    }

    /// Zero the counters of every run
    pub fn reset_all(&self) {
        let cleared = self.usage.len();
        self.usage.clear();
        info!(usage.cleared = cleared, "Reset usage for all runs");
    }

    /// Fold feedback in `[0, 1]` into the rule's effectiveness score
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for non-finite or out-of-range feedback and
    /// `NotFound` for an unknown rule.
    pub fn record_feedback(&self, rule_id: &str, feedback: f64) -> AppResult<f64> {
        if !feedback.is_finite() || !(0.0..=1.0).contains(&feedback) {
            return Err(AppError::invalid_input(format!(
                "feedback must be within [0, 1], got {feedback}"
            )));
        }
        let mut rule = self
            .rules
            .get_mut(rule_id)
            .ok_or_else(|| AppError::not_found(format!("coaching rule {rule_id}")))?;

        let score = rule
            .effectiveness
            .map_or(feedback, |prior| (prior + feedback) / 2.0)
            .clamp(0.0, 1.0);
        rule.effectiveness = Some(score);
        drop(rule);

        debug!(rule.id = rule_id, rule.effectiveness = score, "Recorded feedback");
        Ok(score)
    }

    /// Selection events recorded for a session, oldest first
    #[must_use]
    pub fn events_for_session(&self, session_id: Uuid) -> Vec<SelectionEvent> {
        self.events
            .get(&session_id)
            .map(|events| events.value().clone())
            .unwrap_or_default()
    }
}
