// ABOUTME: Rejection reasons for raw position fixes folded by the track builder
// ABOUTME: Non-fatal: a rejected fix is logged and dropped, never propagated
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a position fix was not turned into a track point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum IngestRejection {
    /// Reported horizontal accuracy is worse than the configured threshold
    #[error("accuracy {accuracy_m:.1} m exceeds threshold {threshold_m:.1} m")]
    LowAccuracy {
        /// Accuracy reported by the fix (meters)
        accuracy_m: f64,
        /// Configured maximum accuracy (meters)
        threshold_m: f64,
    },
    /// Timestamp is not after the last accepted fix
    #[error("fix is {behind_ms} ms behind the last accepted fix")]
    OutOfOrder {
        /// How far behind the last accepted fix this one is
        behind_ms: i64,
    },
    /// Latitude or longitude outside the valid range, or not finite
    #[error("invalid coordinate ({latitude}, {longitude})")]
    InvalidCoordinate {
        /// Reported latitude
        latitude: f64,
        /// Reported longitude
        longitude: f64,
    },
    /// Implied speed since the last accepted fix is not humanly plausible
    #[error("implied speed {speed_mps:.1} m/s exceeds maximum {max_mps:.1} m/s")]
    ImplausibleJump {
        /// Speed implied by distance over elapsed time
        speed_mps: f64,
        /// Configured maximum plausible speed
        max_mps: f64,
    },
}

impl IngestRejection {
    /// Short machine-readable label, used as a structured log field
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::LowAccuracy { .. } => "low_accuracy",
            Self::OutOfOrder { .. } => "out_of_order",
            Self::InvalidCoordinate { .. } => "invalid_coordinate",
            Self::ImplausibleJump { .. } => "implausible_jump",
        }
    }
}
