// ABOUTME: Runtime configuration for tracking, coaching, fallback generation, and sync
// ABOUTME: Starts from pierre-core constants, applies PIERRE_* environment overrides, then validates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Live Coach Configuration
//!
//! Every tunable in the engine lives here. Values come from the defaults in
//! `pierre_core::constants`, then environment variables override them:
//!
//! ```bash
//! export PIERRE_TRACKING_MAX_ACCURACY_M=30
//! export PIERRE_COACHING_TICK_SECS=45
//! export PIERRE_FALLBACK_TIMEOUT_SECS=5
//! ```
//!
//! The loaded configuration is validated before use; `LiveCoachConfig::global()`
//! caches a validated instance for the process.

use std::env;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

use pierre_core::constants::{coaching, fallback, physiology, sync, tracking};
use pierre_core::errors::AppError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Value outside acceptable range
    #[error("Invalid range: {0}")]
    InvalidRange(&'static str),

    /// Failed to parse an environment override
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        Self::config(error.to_string()).with_source(error)
    }
}

/// Track builder thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Fixes with worse accuracy are rejected (meters)
    pub max_accuracy_m: f64,
    /// Fastest plausible speed between two fixes (m/s)
    pub max_speed_mps: f64,
    /// Segments in the pace smoothing window
    pub pace_window: usize,
    /// Altitude noise floor (meters)
    pub altitude_noise_floor_m: f64,
    /// Speed under which the runner counts as stopped (m/s)
    pub pause_speed_mps: f64,
    /// Time under the pause speed before a pause fires (seconds)
    pub pause_duration_secs: u64,
    /// Whether detected pauses transition the session to Paused
    pub auto_pause: bool,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            max_accuracy_m: tracking::DEFAULT_MAX_ACCURACY_M,
            max_speed_mps: tracking::DEFAULT_MAX_SPEED_MPS,
            pace_window: tracking::DEFAULT_PACE_WINDOW,
            altitude_noise_floor_m: tracking::DEFAULT_ALTITUDE_NOISE_FLOOR_M,
            pause_speed_mps: tracking::DEFAULT_PAUSE_SPEED_MPS,
            pause_duration_secs: tracking::DEFAULT_PAUSE_DURATION_SECS,
            auto_pause: true,
        }
    }
}

/// Context builder and selector settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoachingConfig {
    /// Coaching evaluation cadence (seconds)
    pub tick_secs: u64,
    /// Elapsed time treated as warmup (seconds)
    pub warmup_secs: u64,
    /// Tolerance around whole kilometers for the marker phase (meters)
    pub km_marker_tolerance_m: f64,
    /// Whether a selection miss goes to the generative fallback
    pub fallback_enabled: bool,
    /// Seed for tie-breaks and filler choice
    pub seed: u64,
    /// Messages of recent history handed to the generator
    pub recent_history_len: usize,
    /// Longest wait for one voice line (seconds)
    pub voice_timeout_secs: u64,
}

impl Default for CoachingConfig {
    fn default() -> Self {
        Self {
            tick_secs: coaching::DEFAULT_TICK_SECS,
            warmup_secs: coaching::DEFAULT_WARMUP_SECS,
            km_marker_tolerance_m: coaching::DEFAULT_KM_MARKER_TOLERANCE_M,
            fallback_enabled: true,
            seed: coaching::DEFAULT_SEED,
            recent_history_len: coaching::RECENT_HISTORY_LEN,
            voice_timeout_secs: coaching::DEFAULT_VOICE_TIMEOUT_SECS,
        }
    }
}

impl CoachingConfig {
    /// Tick cadence as a `Duration`
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_secs)
    }

    /// Voice timeout as a `Duration`
    #[must_use]
    pub const fn voice_timeout(&self) -> Duration {
        Duration::from_secs(self.voice_timeout_secs)
    }
}

/// Generative fallback settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// Maximum wait for the generative collaborator (seconds)
    pub timeout_secs: u64,
    /// Filler lines used when generation fails
    pub fillers: Vec<String>,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            timeout_secs: fallback::DEFAULT_TIMEOUT_SECS,
            fillers: fallback::DEFAULT_FILLERS
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
        }
    }
}

impl FallbackConfig {
    /// Timeout as a `Duration`
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Sync retry policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Attempts before giving up
    pub max_attempts: u32,
    /// First retry delay (milliseconds)
    pub base_delay_ms: u64,
    /// Retry delay cap (milliseconds)
    pub max_delay_ms: u64,
    /// Randomize delays to avoid synchronized retries
    pub jitter_enabled: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_attempts: sync::DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: sync::DEFAULT_BASE_DELAY_MS,
            max_delay_ms: sync::DEFAULT_MAX_DELAY_MS,
            jitter_enabled: true,
        }
    }
}

/// Athlete parameters used by metric estimates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AthleteConfig {
    /// Body weight for calorie estimates (kg)
    pub body_weight_kg: f64,
}

impl Default for AthleteConfig {
    fn default() -> Self {
        Self {
            body_weight_kg: physiology::DEFAULT_BODY_WEIGHT_KG,
        }
    }
}

/// Main live coach configuration container
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LiveCoachConfig {
    /// Track builder thresholds
    pub tracking: TrackingConfig,
    /// Context builder and selector settings
    pub coaching: CoachingConfig,
    /// Generative fallback settings
    pub fallback: FallbackConfig,
    /// Sync retry policy
    pub sync: SyncConfig,
    /// Athlete parameters
    pub athlete: AthleteConfig,
}

/// Global configuration singleton
static LIVE_COACH_CONFIG: OnceLock<LiveCoachConfig> = OnceLock::new();

impl LiveCoachConfig {
    /// Get the global configuration instance
    pub fn global() -> &'static Self {
        LIVE_COACH_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                warn!("Failed to load live coach config: {}, using defaults", e);
                Self::default()
            })
        })
    }

    /// Load configuration from defaults and environment overrides
    ///
    /// # Errors
    ///
    /// Returns an error if an environment variable cannot be parsed or validation fails
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::default().apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate value ranges and cross-field constraints
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidRange` naming the first violated constraint
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.tracking;
        if t.max_accuracy_m.is_nan() || t.max_accuracy_m <= 0.0 {
            return Err(ConfigError::InvalidRange("max_accuracy_m must be > 0"));
        }
        if t.max_speed_mps.is_nan() || t.max_speed_mps <= 0.0 {
            return Err(ConfigError::InvalidRange("max_speed_mps must be > 0"));
        }
        if t.pace_window == 0 {
            return Err(ConfigError::InvalidRange("pace_window must be >= 1"));
        }
        if t.altitude_noise_floor_m < 0.0 {
            return Err(ConfigError::InvalidRange(
                "altitude_noise_floor_m must be >= 0",
            ));
        }
        if t.pause_speed_mps < 0.0 || t.pause_speed_mps >= t.max_speed_mps {
            return Err(ConfigError::InvalidRange(
                "pause_speed_mps must be in [0, max_speed_mps)",
            ));
        }

        let c = &self.coaching;
        if !(coaching::MIN_TICK_SECS..=coaching::MAX_TICK_SECS).contains(&c.tick_secs) {
            return Err(ConfigError::InvalidRange("tick_secs must be in [5, 600]"));
        }
        if c.km_marker_tolerance_m < 0.0 || c.km_marker_tolerance_m >= 500.0 {
            return Err(ConfigError::InvalidRange(
                "km_marker_tolerance_m must be in [0, 500)",
            ));
        }
        if c.voice_timeout_secs == 0 {
            return Err(ConfigError::InvalidRange("voice_timeout_secs must be > 0"));
        }

        if self.fallback.timeout_secs == 0 {
            return Err(ConfigError::InvalidRange("fallback timeout_secs must be > 0"));
        }
        if self.fallback.fillers.is_empty() {
            return Err(ConfigError::InvalidRange(
                "fallback fillers must not be empty",
            ));
        }

        let s = &self.sync;
        if s.max_attempts == 0 {
            return Err(ConfigError::InvalidRange("sync max_attempts must be >= 1"));
        }
        if s.base_delay_ms > s.max_delay_ms {
            return Err(ConfigError::InvalidRange(
                "sync base_delay_ms must be <= max_delay_ms",
            ));
        }

        let weight = self.athlete.body_weight_kg;
        if weight.is_nan() || weight <= 20.0 || weight >= 300.0 {
            return Err(ConfigError::InvalidRange(
                "body_weight_kg must be in (20, 300)",
            ));
        }

        Ok(())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(mut self) -> Result<Self, ConfigError> {
        override_from_env(
            "PIERRE_TRACKING_MAX_ACCURACY_M",
            &mut self.tracking.max_accuracy_m,
        )?;
        override_from_env(
            "PIERRE_TRACKING_MAX_SPEED_MPS",
            &mut self.tracking.max_speed_mps,
        )?;
        override_from_env(
            "PIERRE_TRACKING_PAUSE_SPEED_MPS",
            &mut self.tracking.pause_speed_mps,
        )?;
        override_from_env(
            "PIERRE_TRACKING_PAUSE_SECS",
            &mut self.tracking.pause_duration_secs,
        )?;
        override_from_env("PIERRE_TRACKING_AUTO_PAUSE", &mut self.tracking.auto_pause)?;

        override_from_env("PIERRE_COACHING_TICK_SECS", &mut self.coaching.tick_secs)?;
        override_from_env(
            "PIERRE_COACHING_WARMUP_SECS",
            &mut self.coaching.warmup_secs,
        )?;
        override_from_env(
            "PIERRE_COACHING_FALLBACK_ENABLED",
            &mut self.coaching.fallback_enabled,
        )?;
        override_from_env("PIERRE_COACHING_SEED", &mut self.coaching.seed)?;
        override_from_env(
            "PIERRE_COACHING_VOICE_TIMEOUT_SECS",
            &mut self.coaching.voice_timeout_secs,
        )?;

        override_from_env(
            "PIERRE_FALLBACK_TIMEOUT_SECS",
            &mut self.fallback.timeout_secs,
        )?;

        override_from_env("PIERRE_SYNC_MAX_ATTEMPTS", &mut self.sync.max_attempts)?;
        override_from_env("PIERRE_SYNC_BASE_DELAY_MS", &mut self.sync.base_delay_ms)?;
        override_from_env("PIERRE_SYNC_MAX_DELAY_MS", &mut self.sync.max_delay_ms)?;

        override_from_env(
            "PIERRE_ATHLETE_WEIGHT_KG",
            &mut self.athlete.body_weight_kg,
        )?;

        Ok(self)
    }
}

/// Replace `target` with the parsed value of `var` when it is set
fn override_from_env<T: FromStr>(var: &'static str, target: &mut T) -> Result<(), ConfigError> {
    if let Ok(val) = env::var(var) {
        *target = val
            .trim()
            .parse()
            .map_err(|_| ConfigError::Parse(format!("Invalid {var}: {val}")))?;
    }
    Ok(())
}
