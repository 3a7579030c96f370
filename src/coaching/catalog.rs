// ABOUTME: Parser for coaching rule catalogs written in YAML
// ABOUTME: Accepts a bare YAML document or markdown with YAML frontmatter
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! A catalog file describes one coach and its rules:
//!
//! ```yaml
//! coach_id: steady-sam
//! persona: Calm marathon coach who favours short sentences
//! rules:
//!   - id: warmup-easy
//!     category: warmup
//!     template: "Easy does it, {name}. Let the legs wake up."
//!     conditions: ["phase:warmup"]
//!     priority: 8
//!     max_uses_per_run: 1
//! ```

use std::collections::HashSet;
use std::path::Path;

use pierre_core::constants::coaching::{MAX_PRIORITY, MIN_PRIORITY};
use pierre_core::errors::{AppError, AppResult, ErrorCode};
use pierre_core::models::{CoachingRule, EmotionalTone};
use serde::{Deserialize, Serialize};

use crate::collaborators::memory::StaticRuleCatalog;

const fn default_priority() -> u8 {
    5
}

const fn default_max_uses() -> u32 {
    1
}

const fn default_active() -> bool {
    true
}

/// Rule entry as authored; the coach id comes from the enclosing catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogRule {
    /// Rule identifier, unique within the catalog
    pub id: String,
    /// Message category
    pub category: String,
    /// Template with `{variable}` placeholders
    pub template: String,
    /// Condition tokens
    #[serde(default)]
    pub conditions: Vec<String>,
    /// Priority (1-10)
    #[serde(default = "default_priority")]
    pub priority: u8,
    /// Cooldown between selections (seconds)
    #[serde(default)]
    pub cooldown_secs: u64,
    /// Per-run cap
    #[serde(default = "default_max_uses")]
    pub max_uses_per_run: u32,
    /// Whether the rule is eligible
    #[serde(default = "default_active")]
    pub active: bool,
    /// Delivery tone
    #[serde(default)]
    pub tone: EmotionalTone,
    /// Language tag; defaults to `en`
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    coach_id: String,
    #[serde(default)]
    persona: Option<String>,
    #[serde(default)]
    rules: Vec<CatalogRule>,
}

/// A parsed, validated catalog
#[derive(Debug, Clone)]
pub struct CoachCatalog {
    /// Coach the rules belong to
    pub coach_id: String,
    /// Persona used for generated fallback text
    pub persona: Option<String>,
    /// Rules with runtime counters zeroed
    pub rules: Vec<CoachingRule>,
}

impl From<CoachCatalog> for StaticRuleCatalog {
    fn from(catalog: CoachCatalog) -> Self {
        let rules = Self::new(catalog.rules);
        match catalog.persona {
            Some(persona) => rules.with_persona(catalog.coach_id, persona),
            None => rules,
        }
    }
}

/// Extract YAML from a frontmatter block, or take the whole content
fn yaml_body(content: &str) -> AppResult<&str> {
    let trimmed = content.trim();
    let Some(after_first) = trimmed.strip_prefix("---") else {
        return Ok(trimmed);
    };
    let end = after_first.find("\n---").ok_or_else(|| {
        AppError::new(
            ErrorCode::InvalidFormat,
            "Catalog frontmatter missing closing delimiter (---)",
        )
    })?;
    Ok(after_first[..end].trim())
}

/// Parse and validate a catalog
///
/// # Errors
///
/// Returns `InvalidFormat` for malformed YAML, `ValueOutOfRange` for a priority
/// outside 1-10, and `InvalidInput` for empty ids, empty templates, or duplicates.
pub fn parse_catalog(content: &str) -> AppResult<CoachCatalog> {
    let document: CatalogDocument = serde_yaml::from_str(yaml_body(content)?).map_err(|e| {
        AppError::new(ErrorCode::InvalidFormat, format!("Invalid catalog YAML: {e}"))
    })?;

    if document.coach_id.trim().is_empty() {
        return Err(AppError::invalid_input("Catalog coach_id must not be empty"));
    }

    let mut seen = HashSet::new();
    let mut rules = Vec::with_capacity(document.rules.len());
    for entry in document.rules {
        validate_rule(&entry)?;
        if !seen.insert(entry.id.clone()) {
            return Err(AppError::invalid_input(format!(
                "Duplicate rule id '{}'",
                entry.id
            )));
        }
        rules.push(into_rule(&document.coach_id, entry));
    }

    Ok(CoachCatalog {
        coach_id: document.coach_id,
        persona: document.persona,
        rules,
    })
}

/// Read and parse a catalog file
///
/// # Errors
///
/// Returns `StorageError` if the file cannot be read, otherwise as [`parse_catalog`]
pub async fn load_catalog_file(path: impl AsRef<Path>) -> AppResult<CoachCatalog> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        AppError::storage(format!("Failed to read catalog {}: {e}", path.display()))
    })?;
    parse_catalog(&content)
}

fn validate_rule(entry: &CatalogRule) -> AppResult<()> {
    if entry.id.trim().is_empty() {
        return Err(AppError::invalid_input("Rule id must not be empty"));
    }
    if entry.template.trim().is_empty() {
        return Err(AppError::invalid_input(format!(
            "Rule '{}' has an empty template",
            entry.id
        )));
    }
    if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&entry.priority) {
        return Err(AppError::new(
            ErrorCode::ValueOutOfRange,
            format!(
                "Rule '{}' priority {} outside {MIN_PRIORITY}-{MAX_PRIORITY}",
                entry.id, entry.priority
            ),
        ));
    }
    Ok(())
}

fn into_rule(coach_id: &str, entry: CatalogRule) -> CoachingRule {
    let mut rule = CoachingRule::new(entry.id, coach_id, entry.category, entry.template)
        .with_conditions(entry.conditions)
        .with_priority(entry.priority)
        .with_cooldown_secs(entry.cooldown_secs)
        .with_max_uses(entry.max_uses_per_run);
    rule.active = entry.active;
    rule.tone = entry.tone;
    if let Some(language) = entry.language {
        rule.language = language;
    }
    rule
}
