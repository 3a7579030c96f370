// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides logging setup, synthetic GPS tracks, rule builders, and an in-memory registry
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]
//! Shared test utilities for `pierre_live_coach`

use std::sync::Once;

use chrono::{DateTime, Duration, TimeZone, Utc};
use pierre_core::constants::geo::EARTH_RADIUS_M;
use pierre_core::models::{CoachingRule, GeoFix};
use pierre_live_coach::collaborators::memory::{
    InMemoryCollaborators, ScriptedGenerator, StaticRuleCatalog,
};
use pierre_live_coach::config::LiveCoachConfig;
use pierre_live_coach::live::SessionRegistry;

static INIT_LOGGER: Once = Once::new();

/// Latitude of the synthetic track origin
pub const ORIGIN_LAT: f64 = 45.5017;
/// Longitude of the synthetic track origin
pub const ORIGIN_LON: f64 = -73.5673;
/// Coach used by most tests
pub const COACH: &str = "coach-ava";

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            Ok("WARN" | "ERROR") | _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Fixed instant all synthetic tracks start from
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 7, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Degrees of latitude spanning `meters` along a meridian
pub fn meters_to_lat(meters: f64) -> f64 {
    (meters / EARTH_RADIUS_M).to_degrees()
}

/// Fix `meters_north` of the origin, `secs` after the base time, 5 m accuracy
pub fn fix_at(meters_north: f64, secs: i64) -> GeoFix {
    GeoFix::new(
        ORIGIN_LAT + meters_to_lat(meters_north),
        ORIGIN_LON,
        base_time() + Duration::seconds(secs),
    )
    .with_accuracy(5.0)
}

/// Straight northbound track of `count` fixes, `step_m` apart every `step_secs`
pub fn straight_track(count: usize, step_m: f64, step_secs: i64) -> Vec<GeoFix> {
    (0..count)
        .map(|i| fix_at(i as f64 * step_m, i as i64 * step_secs))
        .collect()
}

/// Rule for [`COACH`] with the given conditions and priority
pub fn rule(id: &str, conditions: &[&str], priority: u8) -> CoachingRule {
    CoachingRule::new(id, COACH, "motivation", format!("line from {id}"))
        .with_conditions(conditions.iter().copied())
        .with_priority(priority)
}

/// Default configuration with fast, deterministic sync retries
pub fn test_config() -> LiveCoachConfig {
    let mut config = LiveCoachConfig::default();
    config.sync.base_delay_ms = 1;
    config.sync.max_delay_ms = 5;
    config.sync.jitter_enabled = false;
    config
}

/// Registry over in-memory collaborators
pub fn test_registry(
    rules: Vec<CoachingRule>,
    generator: ScriptedGenerator,
) -> (SessionRegistry, InMemoryCollaborators) {
    init_test_logging();
    let memory = InMemoryCollaborators::new(StaticRuleCatalog::new(rules), generator);
    let registry = SessionRegistry::new(test_config(), memory.as_collaborators());
    (registry, memory)
}

/// Registry with a custom configuration
pub fn test_registry_with_config(
    config: LiveCoachConfig,
    memory: &InMemoryCollaborators,
) -> SessionRegistry {
    init_test_logging();
    SessionRegistry::new(config, memory.as_collaborators())
}
