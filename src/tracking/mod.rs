// ABOUTME: Track builder folding raw position fixes into sequenced, distance-annotated track points
// ABOUTME: Rejects bad fixes with a tagged reason, smooths pace, accumulates elevation, detects pauses
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Track Builder
//!
//! Every call to [`TrackBuilder::ingest_fix`] returns an [`IngestOutcome`]; no
//! error ever crosses this boundary. Accepted fixes become immutable
//! [`TrackPoint`]s with strictly increasing sequence numbers and
//! non-decreasing cumulative distance.
//!
//! Checks run in this order:
//!
//! 1. coordinate validity (`InvalidCoordinate`)
//! 2. reported accuracy (`LowAccuracy`)
//! 3. timestamp ordering (`OutOfOrder`)
//! 4. implied speed since the last accepted fix (`ImplausibleJump`)

/// Great-circle distance and coordinate validation
pub mod geo;
/// Pace smoothing and elevation gain
pub mod pace;
/// Auto-pause detection
pub mod pause;

pub use geo::{haversine_distance, is_valid_coordinate};
pub use pace::{ElevationTracker, PaceSmoother};
pub use pause::{PauseDetector, PauseSignal, PauseUpdate};

use chrono::{DateTime, Utc};
use pierre_core::errors::IngestRejection;
use pierre_core::models::{GeoFix, TrackPoint};

use crate::config::TrackingConfig;

/// Result of folding one position fix
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// The fix was dropped; cumulative distance is unchanged
    Rejected(IngestRejection),
    /// The fix produced a new track point
    Accepted {
        /// The new point
        point: TrackPoint,
        /// Auto-pause transition to apply, when auto-pause is enabled
        pause_signal: Option<PauseSignal>,
    },
    /// The session is not recording, so the fix was not considered
    Ignored,
}

impl IngestOutcome {
    /// The accepted point, if any
    #[must_use]
    pub const fn point(&self) -> Option<&TrackPoint> {
        match self {
            Self::Accepted { point, .. } => Some(point),
            Self::Rejected(_) | Self::Ignored => None,
        }
    }

    /// The rejection reason, if any
    #[must_use]
    pub const fn rejection(&self) -> Option<&IngestRejection> {
        match self {
            Self::Rejected(reason) => Some(reason),
            Self::Accepted { .. } | Self::Ignored => None,
        }
    }
}

/// Folds position fixes for a single session
#[derive(Debug, Clone)]
pub struct TrackBuilder {
    config: TrackingConfig,
    last_fix: Option<GeoFix>,
    points: Vec<TrackPoint>,
    cumulative_distance_m: f64,
    pace: PaceSmoother,
    elevation: ElevationTracker,
    pause: PauseDetector,
}

impl TrackBuilder {
    /// Create an empty builder
    #[must_use]
    pub fn new(config: TrackingConfig) -> Self {
        Self {
            pace: PaceSmoother::new(config.pace_window),
            elevation: ElevationTracker::new(config.altitude_noise_floor_m),
            pause: PauseDetector::new(config.pause_speed_mps, config.pause_duration_secs),
            config,
            last_fix: None,
            points: Vec::new(),
            cumulative_distance_m: 0.0,
        }
    }

    /// Validate and fold a fix into the track
    pub fn ingest_fix(&mut self, fix: &GeoFix) -> IngestOutcome {
        if let Err(rejection) = self.validate(fix) {
            return IngestOutcome::Rejected(rejection);
        }

        let Some(previous) = self.last_fix.as_ref() else {
            return self.accept_first(fix);
        };

        let elapsed_secs = elapsed_secs(previous.timestamp, fix.timestamp);
        if elapsed_secs <= 0.0 {
            return IngestOutcome::Rejected(IngestRejection::OutOfOrder { behind_ms: 0 });
        }
        let delta_m = haversine_distance(
            previous.latitude,
            previous.longitude,
            fix.latitude,
            fix.longitude,
        );
        let speed_mps = delta_m / elapsed_secs;
        if speed_mps > self.config.max_speed_mps {
            return IngestOutcome::Rejected(IngestRejection::ImplausibleJump {
                speed_mps,
                max_mps: self.config.max_speed_mps,
            });
        }

        let segment_start = previous.timestamp;
        self.cumulative_distance_m += delta_m;
        let pace_secs_per_km = self.pace.push(delta_m, elapsed_secs);
        let elevation_gain_m = self.elevation.update(fix.altitude);
        let pause = self.pause.update(speed_mps, segment_start, fix.timestamp);

        let point = TrackPoint {
            sequence: self.points.len() as u64,
            latitude: fix.latitude,
            longitude: fix.longitude,
            altitude: fix.altitude,
            cumulative_distance_m: self.cumulative_distance_m,
            segment_distance_m: delta_m,
            pace_secs_per_km,
            speed_mps,
            elevation_gain_m,
            is_pause_point: pause.is_pause_point,
            timestamp: fix.timestamp,
        };
        self.commit(fix, point.clone());

        IngestOutcome::Accepted {
            point,
            pause_signal: pause.signal.filter(|_| self.config.auto_pause),
        }
    }

    fn accept_first(&mut self, fix: &GeoFix) -> IngestOutcome {
        let point = TrackPoint {
            sequence: 0,
            latitude: fix.latitude,
            longitude: fix.longitude,
            altitude: fix.altitude,
            cumulative_distance_m: 0.0,
            segment_distance_m: 0.0,
            pace_secs_per_km: None,
            speed_mps: 0.0,
            elevation_gain_m: self.elevation.update(fix.altitude),
            is_pause_point: false,
            timestamp: fix.timestamp,
        };
        self.commit(fix, point.clone());
        IngestOutcome::Accepted {
            point,
            pause_signal: None,
        }
    }

    fn commit(&mut self, fix: &GeoFix, point: TrackPoint) {
        self.last_fix = Some(fix.clone());
        self.points.push(point);
    }

    fn validate(&self, fix: &GeoFix) -> Result<(), IngestRejection> {
        if !is_valid_coordinate(fix.latitude, fix.longitude) {
            return Err(IngestRejection::InvalidCoordinate {
                latitude: fix.latitude,
                longitude: fix.longitude,
            });
        }

        if let Some(accuracy) = fix.accuracy {
            if accuracy.is_nan() || accuracy > self.config.max_accuracy_m {
                return Err(IngestRejection::LowAccuracy {
                    accuracy_m: accuracy,
                    threshold_m: self.config.max_accuracy_m,
                });
            }
        }

        if let Some(last) = &self.last_fix {
            if fix.timestamp <= last.timestamp {
                return Err(IngestRejection::OutOfOrder {
                    behind_ms: last
                        .timestamp
                        .signed_duration_since(fix.timestamp)
                        .num_milliseconds(),
                });
            }
        }

        Ok(())
    }

    /// Accepted points in sequence order
    #[must_use]
    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    /// Most recent accepted point
    #[must_use]
    pub fn last_point(&self) -> Option<&TrackPoint> {
        self.points.last()
    }

    /// Cumulative distance over all accepted points (meters)
    #[must_use]
    pub const fn distance_m(&self) -> f64 {
        self.cumulative_distance_m
    }

    /// Cumulative positive elevation gain (meters)
    #[must_use]
    pub const fn elevation_gain_m(&self) -> f64 {
        self.elevation.gain()
    }

    /// Current smoothed pace (seconds per kilometer)
    #[must_use]
    pub fn current_pace(&self) -> Option<f64> {
        self.pace.current()
    }

    /// Whether the detector currently considers the runner stopped
    #[must_use]
    pub const fn is_stationary(&self) -> bool {
        self.pause.is_paused()
    }
}

/// Elapsed seconds from `start` to `end` at nanosecond precision; zero when `end` is not later
pub(crate) fn elapsed_secs(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    end.signed_duration_since(start)
        .to_std()
        .map_or(0.0, |span| span.as_secs_f64())
}
