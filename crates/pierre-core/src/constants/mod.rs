// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Tracking thresholds, coaching defaults, physiology, and sync retry constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants module
//!
//! Default values for every tunable in the engine. Runtime configuration starts
//! from these and applies environment overrides on top.

/// Geodesy constants
pub mod geo {
    /// Mean Earth radius used by the haversine formula (meters)
    pub const EARTH_RADIUS_M: f64 = 6_371_000.0;
    /// Valid latitude range (degrees)
    pub const MAX_LATITUDE: f64 = 90.0;
    /// Valid longitude range (degrees)
    pub const MAX_LONGITUDE: f64 = 180.0;
}

/// Track builder defaults
pub mod tracking {
    /// Fixes with worse horizontal accuracy are rejected (meters)
    pub const DEFAULT_MAX_ACCURACY_M: f64 = 50.0;
    /// Fastest plausible running speed; faster implied jumps are dropped (m/s)
    pub const DEFAULT_MAX_SPEED_MPS: f64 = 12.0;
    /// Number of recent segments used to smooth pace
    pub const DEFAULT_PACE_WINDOW: usize = 5;
    /// Below this windowed distance the runner is treated as stationary (meters)
    pub const MIN_PACE_DISTANCE_M: f64 = 1.0;
    /// Altitude changes smaller than this are GPS noise (meters)
    pub const DEFAULT_ALTITUDE_NOISE_FLOOR_M: f64 = 2.0;
    /// Speed under which a runner counts as stopped (m/s)
    pub const DEFAULT_PAUSE_SPEED_MPS: f64 = 0.5;
    /// How long a runner must stay under the pause speed (seconds)
    pub const DEFAULT_PAUSE_DURATION_SECS: u64 = 10;
}

/// Run session defaults
pub mod session {
    /// Average pace is not reported until this much distance is covered (meters)
    pub const MIN_DISTANCE_FOR_PACE_M: f64 = 10.0;
    /// Minimum heart rate sample accepted (bpm)
    pub const MIN_HEART_RATE_BPM: u16 = 30;
    /// Maximum heart rate sample accepted (bpm)
    pub const MAX_HEART_RATE_BPM: u16 = 240;
}

/// Context builder and selector defaults
pub mod coaching {
    /// Elapsed time considered warmup (seconds)
    pub const DEFAULT_WARMUP_SECS: u64 = 300;
    /// Distance tolerance around each whole kilometer (meters)
    pub const DEFAULT_KM_MARKER_TOLERANCE_M: f64 = 50.0;
    /// Relative band around target pace considered on target
    pub const PACE_TARGET_BAND: f64 = 0.05;
    /// Relative pace change between ticks that counts as a trend
    pub const PACE_TREND_BAND: f64 = 0.05;
    /// Default coaching tick cadence (seconds)
    pub const DEFAULT_TICK_SECS: u64 = 60;
    /// Shortest allowed coaching tick cadence (seconds)
    pub const MIN_TICK_SECS: u64 = 5;
    /// Longest allowed coaching tick cadence (seconds)
    pub const MAX_TICK_SECS: u64 = 600;
    /// Longest a single voice line may take before it counts as undelivered (seconds)
    pub const DEFAULT_VOICE_TIMEOUT_SECS: u64 = 15;
    /// Lowest rule priority
    pub const MIN_PRIORITY: u8 = 1;
    /// Highest rule priority
    pub const MAX_PRIORITY: u8 = 10;
    /// Default RNG seed for tie-breaks and filler choice
    pub const DEFAULT_SEED: u64 = 0x5049_4552_5245;
    /// Temperature above which the `weather:hot` token is added (Celsius)
    pub const HOT_WEATHER_CELSIUS: f64 = 25.0;
    /// Temperature below which the `weather:cold` token is added (Celsius)
    pub const COLD_WEATHER_CELSIUS: f64 = 5.0;
    /// Number of recent messages handed to the generative collaborator
    pub const RECENT_HISTORY_LEN: usize = 5;
}

/// Fallback gateway defaults
pub mod fallback {
    /// Maximum time to wait for the generative collaborator (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 8;
    /// Filler lines spoken when generation fails or times out
    pub const DEFAULT_FILLERS: &[&str] = &[
        "Nice work, keep it steady.",
        "You're doing great, stay relaxed.",
        "Keep your breathing easy and your form tall.",
    ];
}

/// Sync retry defaults
pub mod sync {
    /// Attempts before a sync is marked failed
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
    /// First retry delay (milliseconds)
    pub const DEFAULT_BASE_DELAY_MS: u64 = 500;
    /// Retry delay cap (milliseconds)
    pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;
}

/// Physiology constants
pub mod physiology {
    /// Energy cost of running per kilogram per kilometer (kcal)
    pub const RUNNING_KCAL_PER_KG_KM: f64 = 1.036;
    /// Body weight used when the athlete has not provided one (kg)
    pub const DEFAULT_BODY_WEIGHT_KG: f64 = 70.0;
}

/// Service identifiers used in structured logging
pub mod service_names {
    /// Library service name
    pub const PIERRE_LIVE_COACH: &str = "pierre-live-coach";
}
