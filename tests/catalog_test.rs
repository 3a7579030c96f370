// ABOUTME: Integration tests for YAML coaching catalogs
// ABOUTME: Covers defaults, frontmatter documents, validation errors, and file loading
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(missing_docs)]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use std::io::Write;

use async_trait::async_trait;
use pierre_core::errors::{AppResult, ErrorCode};
use pierre_core::models::{CoachingRule, EmotionalTone};
use pierre_live_coach::coaching::{load_catalog_file, parse_catalog};
use pierre_live_coach::collaborators::memory::StaticRuleCatalog;
use pierre_live_coach::collaborators::RuleCatalog;

const CATALOG: &str = r#"
coach_id: steady-sam
persona: Calm marathon coach who favours short sentences
rules:
  - id: warmup-easy
    category: warmup
    template: "Easy does it, {name}."
    conditions: ["phase:warmup"]
    priority: 8
    tone: calm
  - id: push-on
    category: motivation
    template: "Push on, you have more in you."
    cooldown_secs: 120
    max_uses_per_run: 3
    active: false
    language: fr
"#;

#[test]
fn test_parse_applies_defaults() {
    let catalog = parse_catalog(CATALOG).unwrap();
    assert_eq!(catalog.coach_id, "steady-sam");
    assert_eq!(
        catalog.persona.as_deref(),
        Some("Calm marathon coach who favours short sentences")
    );
    assert_eq!(catalog.rules.len(), 2);

    let warmup = &catalog.rules[0];
    assert_eq!(warmup.coach_id, "steady-sam");
    assert_eq!(warmup.conditions, vec!["phase:warmup"]);
    assert_eq!(warmup.priority, 8);
    assert_eq!(warmup.cooldown_secs, 0);
    assert_eq!(warmup.max_uses_per_run, 1);
    assert!(warmup.active);
    assert_eq!(warmup.tone, EmotionalTone::Calm);
    assert_eq!(warmup.language, "en");
    assert_eq!(warmup.usage_count, 0);

    let push = &catalog.rules[1];
    assert_eq!(push.priority, 5);
    assert_eq!(push.cooldown_secs, 120);
    assert_eq!(push.max_uses_per_run, 3);
    assert!(!push.active);
    assert_eq!(push.tone, EmotionalTone::Encouraging);
    assert_eq!(push.language, "fr");
}

#[test]
fn test_markdown_frontmatter_is_accepted() {
    let document = format!("---\n{}\n---\n\n# Steady Sam\n\nNotes for authors.\n", CATALOG.trim());
    let catalog = parse_catalog(&document).unwrap();
    assert_eq!(catalog.rules.len(), 2);

    let unterminated = format!("---\n{}\n", CATALOG.trim());
    let err = parse_catalog(&unterminated).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidFormat);
}

#[test]
fn test_invalid_catalogs_are_rejected() {
    let malformed = parse_catalog("coach_id: [unclosed").unwrap_err();
    assert_eq!(malformed.code, ErrorCode::InvalidFormat);

    let no_coach = parse_catalog("coach_id: '  '\nrules: []").unwrap_err();
    assert_eq!(no_coach.code, ErrorCode::InvalidInput);

    let empty_template = parse_catalog(
        "coach_id: c\nrules:\n  - id: r1\n    category: pace\n    template: '  '\n",
    )
    .unwrap_err();
    assert_eq!(empty_template.code, ErrorCode::InvalidInput);

    let duplicate = parse_catalog(
        "coach_id: c\nrules:\n  - {id: r1, category: pace, template: a}\n  - {id: r1, category: pace, template: b}\n",
    )
    .unwrap_err();
    assert_eq!(duplicate.code, ErrorCode::InvalidInput);
    assert!(duplicate.message.contains("r1"));

    let priority = parse_catalog(
        "coach_id: c\nrules:\n  - {id: r1, category: pace, template: a, priority: 11}\n",
    )
    .unwrap_err();
    assert_eq!(priority.code, ErrorCode::ValueOutOfRange);
}

#[tokio::test]
async fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CATALOG.as_bytes()).unwrap();

    let catalog = load_catalog_file(file.path()).await.unwrap();
    assert_eq!(catalog.coach_id, "steady-sam");

    let dir = tempfile::tempdir().unwrap();
    let err = load_catalog_file(dir.path().join("missing.yaml"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::StorageError);
}

#[tokio::test]
async fn test_catalog_converts_into_a_rule_catalog() {
    let rules: StaticRuleCatalog = parse_catalog(CATALOG).unwrap().into();

    let loaded = rules.rules_for_coach("steady-sam").await.unwrap();
    assert_eq!(loaded.len(), 2);
    assert!(rules.rules_for_coach("someone-else").await.unwrap().is_empty());
    assert_eq!(
        rules.coach_persona("steady-sam").await.unwrap().as_deref(),
        Some("Calm marathon coach who favours short sentences")
    );
}

struct RulesOnlyCatalog;

#[async_trait]
impl RuleCatalog for RulesOnlyCatalog {
    async fn rules_for_coach(&self, coach_id: &str) -> AppResult<Vec<CoachingRule>> {
        Ok(vec![CoachingRule::new("hello", coach_id, "motivation", "Hello")])
    }
}

#[tokio::test]
async fn test_catalog_without_personas_reports_none() {
    let catalog = RulesOnlyCatalog;
    assert_eq!(catalog.rules_for_coach("steady-sam").await.unwrap().len(), 1);
    assert_eq!(catalog.coach_persona("steady-sam").await.unwrap(), None);
}
