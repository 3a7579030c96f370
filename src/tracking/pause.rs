// ABOUTME: Auto-pause detection from sustained low speed between accepted fixes
// ABOUTME: A single fix above the threshold cancels a pending pause and resumes a fired one
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Duration, Utc};

/// Longest configurable stationary window (one day)
const MAX_PAUSE_WINDOW_SECS: u64 = 86_400;

/// Transition requested of the session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseSignal {
    /// Runner has been stationary long enough; move Active to Paused
    Pause,
    /// Runner is moving again after an auto-pause; move Paused to Active
    Resume,
}

/// Result of feeding one segment into the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PauseUpdate {
    /// The point lies inside a sustained stationary stretch
    pub is_pause_point: bool,
    /// Transition to apply, if any
    pub signal: Option<PauseSignal>,
}

/// Detects sustained low-speed stretches
#[derive(Debug, Clone)]
pub struct PauseDetector {
    speed_threshold_mps: f64,
    min_duration: Duration,
    slow_since: Option<DateTime<Utc>>,
    paused: bool,
}

impl PauseDetector {
    /// Create a detector firing after `min_duration_secs` under `speed_threshold_mps`
    #[must_use]
    pub fn new(speed_threshold_mps: f64, min_duration_secs: u64) -> Self {
        Self {
            speed_threshold_mps,
            min_duration: Duration::seconds(
                i64::try_from(min_duration_secs.min(MAX_PAUSE_WINDOW_SECS)).unwrap_or(0),
            ),
            slow_since: None,
            paused: false,
        }
    }

    /// Feed a segment's speed; `segment_start` is the previous accepted fix time
    pub fn update(
        &mut self,
        speed_mps: f64,
        segment_start: DateTime<Utc>,
        segment_end: DateTime<Utc>,
    ) -> PauseUpdate {
        if speed_mps >= self.speed_threshold_mps {
            self.slow_since = None;
            let signal = if self.paused {
                self.paused = false;
                Some(PauseSignal::Resume)
            } else {
                None
            };
            return PauseUpdate {
                is_pause_point: false,
                signal,
            };
        }

        let since = *self.slow_since.get_or_insert(segment_start);
        if segment_end.signed_duration_since(since) < self.min_duration {
            return PauseUpdate::default();
        }

        let signal = if self.paused {
            None
        } else {
            self.paused = true;
            Some(PauseSignal::Pause)
        };
        PauseUpdate {
            is_pause_point: true,
            signal,
        }
    }

    /// Whether a pause has fired and not yet been cancelled
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }
}
