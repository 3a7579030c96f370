// ABOUTME: Trailing-window pace smoothing and altitude gain accumulation
// ABOUTME: Smoothing avoids divide-by-zero and GPS jitter while the runner is stationary
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::VecDeque;

use pierre_core::constants::tracking::MIN_PACE_DISTANCE_M;

/// Pace over the last N segments, computed as total time over total distance
#[derive(Debug, Clone)]
pub struct PaceSmoother {
    window: usize,
    segments: VecDeque<(f64, f64)>,
}

impl PaceSmoother {
    /// Create a smoother over `window` segments (at least one)
    #[must_use]
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            segments: VecDeque::with_capacity(window),
        }
    }

    /// Add a segment and return the smoothed pace in seconds per kilometer
    ///
    /// Returns `None` when the windowed distance is too small to be meaningful.
    pub fn push(&mut self, distance_m: f64, elapsed_secs: f64) -> Option<f64> {
        if self.segments.len() == self.window {
            self.segments.pop_front();
        }
        self.segments.push_back((distance_m, elapsed_secs));
        self.current()
    }

    /// Smoothed pace over the current window
    #[must_use]
    pub fn current(&self) -> Option<f64> {
        let (distance, secs) = self
            .segments
            .iter()
            .fold((0.0, 0.0), |(d, s), (sd, ss)| (d + sd, s + ss));
        (distance >= MIN_PACE_DISTANCE_M).then(|| secs / distance * 1000.0)
    }
}

/// Cumulative positive elevation gain with a noise floor
///
/// The reference altitude only moves when a change exceeds the floor, so a
/// slow climb made of sub-floor steps is still counted once it adds up.
#[derive(Debug, Clone)]
pub struct ElevationTracker {
    noise_floor_m: f64,
    reference_m: Option<f64>,
    gain_m: f64,
}

impl ElevationTracker {
    /// Create a tracker ignoring changes at or below `noise_floor_m`
    #[must_use]
    pub const fn new(noise_floor_m: f64) -> Self {
        Self {
            noise_floor_m,
            reference_m: None,
            gain_m: 0.0,
        }
    }

    /// Fold in an altitude reading and return the cumulative gain
    pub fn update(&mut self, altitude_m: Option<f64>) -> f64 {
        let Some(altitude) = altitude_m.filter(|a| a.is_finite()) else {
            return self.gain_m;
        };
        match self.reference_m {
            None => self.reference_m = Some(altitude),
            Some(reference) => {
                let delta = altitude - reference;
                if delta.abs() > self.noise_floor_m {
                    if delta > 0.0 {
                        self.gain_m += delta;
                    }
                    self.reference_m = Some(altitude);
                }
            }
        }
        self.gain_m
    }

    /// Cumulative gain so far
    #[must_use]
    pub const fn gain(&self) -> f64 {
        self.gain_m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stationary_window_has_no_pace() {
        let mut smoother = PaceSmoother::new(3);
        assert_eq!(smoother.push(0.2, 5.0), None);
        assert_eq!(smoother.push(0.3, 5.0), None);
    }

    #[test]
    fn test_window_drops_oldest_segment() {
        let mut smoother = PaceSmoother::new(2);
        smoother.push(100.0, 20.0);
        smoother.push(100.0, 20.0);
        let pace = smoother.push(100.0, 40.0).unwrap_or_default();
        // (20 + 40) s over 200 m
        assert!((pace - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_elevation_ignores_noise_but_counts_accumulated_climb() {
        let mut tracker = ElevationTracker::new(2.0);
        tracker.update(Some(100.0));
        tracker.update(Some(101.0));
        tracker.update(Some(99.5));
        assert!(tracker.gain().abs() < f64::EPSILON);
        tracker.update(Some(102.5));
        assert!((tracker.gain() - 2.5).abs() < 1e-9);
        tracker.update(Some(95.0));
        assert!((tracker.gain() - 2.5).abs() < 1e-9);
    }
}
