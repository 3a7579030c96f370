// ABOUTME: Configuration module for the live coaching engine
// ABOUTME: Re-exports tracking, coaching, fallback, sync, and athlete configuration types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Live coach runtime configuration with environment overrides
pub mod live_coach;

pub use live_coach::{
    AthleteConfig, CoachingConfig, ConfigError, FallbackConfig, LiveCoachConfig, SyncConfig,
    TrackingConfig,
};
