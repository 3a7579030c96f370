// ABOUTME: Benchmark fixtures generating synthetic GPS tracks and coaching rule catalogs
// ABOUTME: Data is deterministic so runs are comparable across machines and commits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Duration, TimeZone, Utc};
use pierre_core::constants::geo::EARTH_RADIUS_M;
use pierre_core::models::{CoachingRule, GeoFix};

/// Coach owning every generated rule
pub const BENCH_COACH: &str = "coach-bench";

const ORIGIN_LAT: f64 = 45.5017;
const ORIGIN_LON: f64 = -73.5673;

/// Predefined sizes for benchmark scenarios
#[derive(Debug, Clone, Copy)]
pub enum BatchSize {
    /// Quick runs
    Small,
    /// A typical 10 km run at one fix per second
    Medium,
    /// A marathon
    Large,
}

impl BatchSize {
    #[must_use]
    pub const fn count(self) -> usize {
        match self {
            Self::Small => 100,
            Self::Medium => 3_000,
            Self::Large => 15_000,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 7, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// A run heading north at roughly 3.3 m/s with a little lateral wobble and rolling hills
#[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
#[must_use]
pub fn generate_track(count: usize) -> Vec<GeoFix> {
    (0..count)
        .map(|i| {
            let step = i as f64;
            let north_m = step * 3.3;
            let east_m = (step / 15.0).sin() * 4.0;
            let lat = ORIGIN_LAT + (north_m / EARTH_RADIUS_M).to_degrees();
            let lon = ORIGIN_LON
                + (east_m / (EARTH_RADIUS_M * ORIGIN_LAT.to_radians().cos())).to_degrees();
            GeoFix::new(lat, lon, base_time() + Duration::seconds(i as i64))
                .with_accuracy(4.0 + (step / 7.0).cos().abs() * 6.0)
                .with_altitude(40.0 + (step / 120.0).sin() * 15.0)
        })
        .collect()
}

/// `count` rules spread over categories and condition tokens
#[must_use]
pub fn generate_rules(count: usize) -> Vec<CoachingRule> {
    const CATEGORIES: [&str; 4] = ["motivation", "pace", "form", "milestone"];
    const CONDITIONS: [&str; 6] = [
        "phase:warmup",
        "phase:main",
        "pace:slower_than_target",
        "hr:above_zone",
        "trend:slowing",
        "weather:hot",
    ];

    (0..count)
        .map(|i| {
            let rule = CoachingRule::new(
                format!("rule-{i:04}"),
                BENCH_COACH,
                CATEGORIES[i % CATEGORIES.len()],
                "{distance_km} km in, pace {pace}. Keep it smooth.",
            )
            .with_priority(u8::try_from(i % 10 + 1).unwrap_or(5))
            .with_max_uses(1_000);
            if i % 5 == 0 {
                rule
            } else {
                rule.with_conditions([CONDITIONS[i % CONDITIONS.len()]])
            }
        })
        .collect()
}
