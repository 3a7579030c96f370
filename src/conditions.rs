// ABOUTME: Context builder turning a session snapshot into normalized condition tokens
// ABOUTME: Pure and deterministic; tokens use category:value form and iterate in sorted order
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Context Builder
//!
//! [`build_conditions`] is rebuilt every coaching tick and never persisted.
//!
//! | Category | Tokens |
//! |----------|--------|
//! | phase    | `warmup`, `first_km`, `final_km`, `kilometer_marker`, `main` |
//! | pace     | `faster_than_target`, `slower_than_target`, `on_target` |
//! | hr       | `below_zone`, `in_zone`, `above_zone` |
//! | trend    | `slowing`, `speeding_up` |
//! | weather  | normalized condition, plus `hot` / `cold` |

use std::collections::BTreeSet;
use std::fmt;

use pierre_core::constants::coaching::{
    COLD_WEATHER_CELSIUS, HOT_WEATHER_CELSIUS, PACE_TARGET_BAND,
};
use pierre_core::models::RunSessionSnapshot;
use serde::{Deserialize, Serialize};

use crate::config::CoachingConfig;

/// Ordered set of condition tokens
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionSet(BTreeSet<String>);

impl ConditionSet {
    /// Empty set
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Add a token
    pub fn insert(&mut self, token: impl Into<String>) {
        self.0.insert(token.into());
    }

    /// Exact membership test
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.0.contains(token)
    }

    /// Tokens in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of tokens
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no tokens are present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Tokens as owned strings
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for ConditionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for ConditionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        f.write_str(&joined.join(","))
    }
}

/// Target heart rate zone (inclusive bounds, bpm)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartRateZone {
    /// Lower bound
    pub min_bpm: u16,
    /// Upper bound
    pub max_bpm: u16,
}

/// Current weather at the runner's position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherConditions {
    /// Free-form condition, e.g. "Light Rain"
    pub condition: String,
    /// Air temperature (Celsius)
    pub temperature_celsius: Option<f64>,
}

/// Caller-computed flags the snapshot alone cannot express
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionFlags {
    /// Still inside the first kilometer after warmup
    pub first_km: bool,
    /// Inside the final kilometer of a planned distance
    pub final_km: bool,
    /// Pace dropped since the previous tick
    pub slowing: bool,
    /// Pace improved since the previous tick
    pub speeding_up: bool,
}

/// Optional inputs beside the snapshot
#[derive(Debug, Clone, Default)]
pub struct ContextInput<'a> {
    /// Most recent heart rate
    pub heart_rate_bpm: Option<u16>,
    /// Target zone for the workout
    pub target_zone: Option<HeartRateZone>,
    /// Current weather
    pub weather: Option<&'a WeatherConditions>,
    /// Phase and trend flags
    pub flags: ConditionFlags,
}

/// Build the condition set for one tick
#[must_use]
pub fn build_conditions(
    snapshot: &RunSessionSnapshot,
    input: &ContextInput<'_>,
    config: &CoachingConfig,
) -> ConditionSet {
    let mut set = ConditionSet::new();
    set.insert(format!("phase:{}", phase(snapshot, input.flags, config)));

    if let (Some(target), Some(current)) = (
        snapshot.target_pace_secs_per_km,
        snapshot.current_pace_secs_per_km,
    ) {
        set.insert(format!("pace:{}", pace_vs_target(current, target)));
    }

    if let (Some(bpm), Some(zone)) = (input.heart_rate_bpm, input.target_zone) {
        let token = if bpm < zone.min_bpm {
            "below_zone"
        } else if bpm > zone.max_bpm {
            "above_zone"
        } else {
            "in_zone"
        };
        set.insert(format!("hr:{token}"));
    }

    if input.flags.slowing {
        set.insert("trend:slowing");
    }
    if input.flags.speeding_up {
        set.insert("trend:speeding_up");
    }

    if let Some(weather) = input.weather {
        let normalized = normalize_condition(&weather.condition);
        if !normalized.is_empty() {
            set.insert(format!("weather:{normalized}"));
        }
        if let Some(celsius) = weather.temperature_celsius {
            if celsius > HOT_WEATHER_CELSIUS {
                set.insert("weather:hot");
            } else if celsius < COLD_WEATHER_CELSIUS {
                set.insert("weather:cold");
            }
        }
    }

    set
}

fn phase(
    snapshot: &RunSessionSnapshot,
    flags: ConditionFlags,
    config: &CoachingConfig,
) -> &'static str {
    if snapshot.moving_secs < config.warmup_secs as f64 {
        "warmup"
    } else if flags.first_km {
        "first_km"
    } else if flags.final_km {
        "final_km"
    } else if near_kilometer_marker(snapshot.distance_m, config.km_marker_tolerance_m) {
        "kilometer_marker"
    } else {
        "main"
    }
}

fn near_kilometer_marker(distance_m: f64, tolerance_m: f64) -> bool {
    let nearest = (distance_m / 1000.0).round() * 1000.0;
    nearest >= 1000.0 && (distance_m - nearest).abs() <= tolerance_m
}

fn pace_vs_target(current: f64, target: f64) -> &'static str {
    // Lower seconds per kilometer is faster
    if current < target * (1.0 - PACE_TARGET_BAND) {
        "faster_than_target"
    } else if current > target * (1.0 + PACE_TARGET_BAND) {
        "slower_than_target"
    } else {
        "on_target"
    }
}

fn normalize_condition(condition: &str) -> String {
    condition
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kilometer_marker_requires_a_full_kilometer() {
        assert!(!near_kilometer_marker(30.0, 50.0));
        assert!(near_kilometer_marker(980.0, 50.0));
        assert!(near_kilometer_marker(2_049.0, 50.0));
        assert!(!near_kilometer_marker(2_200.0, 50.0));
    }

    #[test]
    fn weather_is_lowercased_with_underscores() {
        assert_eq!(normalize_condition("  Light   Rain "), "light_rain");
    }
}
