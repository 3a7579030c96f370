// ABOUTME: Telemetry data models: raw position fixes, heart rate samples, and track points
// ABOUTME: TrackPoint is derived once per accepted fix and is immutable afterwards
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single raw timestamped position reading from the location provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoFix {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Altitude in meters above sea level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    /// Horizontal accuracy radius in meters (lower is better)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    /// Device-reported speed in m/s
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    /// Bearing in degrees from north
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearing: Option<f64>,
    /// When the fix was taken
    pub timestamp: DateTime<Utc>,
}

impl GeoFix {
    /// Create a fix with only the required fields
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
            accuracy: None,
            speed: None,
            bearing: None,
            timestamp,
        }
    }

    /// Set the horizontal accuracy
    #[must_use]
    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    /// Set the altitude
    #[must_use]
    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }
}

/// A heart rate reading from the health provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartRateSample {
    /// Beats per minute
    pub bpm: u16,
    /// When the sample was taken
    pub timestamp: DateTime<Utc>,
}

/// An accepted, sequenced, distance-annotated point derived from a `GeoFix`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    /// Position in the session's track, strictly increasing from 0
    pub sequence: u64,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Altitude in meters, when the fix carried one
    pub altitude: Option<f64>,
    /// Cumulative distance from the first point (meters)
    pub cumulative_distance_m: f64,
    /// Distance covered since the previous point (meters)
    pub segment_distance_m: f64,
    /// Smoothed pace in seconds per kilometer; `None` while stationary
    pub pace_secs_per_km: Option<f64>,
    /// Instantaneous speed over the last segment (m/s)
    pub speed_mps: f64,
    /// Cumulative positive elevation gain (meters)
    pub elevation_gain_m: f64,
    /// Whether the runner had been stationary long enough to count as paused
    pub is_pause_point: bool,
    /// Timestamp of the originating fix
    pub timestamp: DateTime<Utc>,
}
