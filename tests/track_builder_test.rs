// ABOUTME: Integration tests for the track builder
// ABOUTME: Covers fix validation order, distance and pace derivation, elevation gain, and auto-pause signals
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(missing_docs)]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use chrono::Duration;
use common::{base_time, fix_at, straight_track, ORIGIN_LAT, ORIGIN_LON};
use pierre_core::errors::IngestRejection;
use pierre_core::models::GeoFix;
use pierre_live_coach::config::TrackingConfig;
use pierre_live_coach::tracking::{IngestOutcome, PauseSignal, TrackBuilder};

fn builder() -> TrackBuilder {
    TrackBuilder::new(TrackingConfig::default())
}

fn accepted(outcome: &IngestOutcome) -> (&pierre_core::models::TrackPoint, Option<PauseSignal>) {
    match outcome {
        IngestOutcome::Accepted {
            point,
            pause_signal,
        } => (point, *pause_signal),
        other => panic!("expected an accepted fix, got {other:?}"),
    }
}

#[test]
fn test_two_fixes_hundred_meters_apart() {
    let mut track = builder();
    let first = track.ingest_fix(&fix_at(0.0, 0));
    let (point, _) = accepted(&first);
    assert_eq!(point.sequence, 0);
    assert!(point.cumulative_distance_m.abs() < f64::EPSILON);
    assert_eq!(point.pace_secs_per_km, None);

    let second = track.ingest_fix(&fix_at(100.0, 20));
    let (point, signal) = accepted(&second);
    assert_eq!(point.sequence, 1);
    assert!((point.cumulative_distance_m - 100.0).abs() <= 1.0);
    assert!((point.segment_distance_m - 100.0).abs() <= 1.0);
    let pace = point.pace_secs_per_km.unwrap();
    // 20 s per 100 m is 3:20/km
    assert!((pace - 200.0).abs() <= 2.0, "pace was {pace}");
    assert!((point.speed_mps - 5.0).abs() <= 0.05);
    assert_eq!(signal, None);
}

#[test]
fn test_low_accuracy_fix_is_rejected_without_moving_distance() {
    let mut track = builder();
    track.ingest_fix(&fix_at(0.0, 0));
    track.ingest_fix(&fix_at(50.0, 10));
    let before = track.distance_m();

    let noisy = fix_at(100.0, 20).with_accuracy(60.0);
    let outcome = track.ingest_fix(&noisy);

    assert!(matches!(
        outcome,
        IngestOutcome::Rejected(IngestRejection::LowAccuracy { accuracy_m, threshold_m })
            if (accuracy_m - 60.0).abs() < f64::EPSILON && (threshold_m - 50.0).abs() < f64::EPSILON
    ));
    assert!((track.distance_m() - before).abs() < f64::EPSILON);
    assert_eq!(track.points().len(), 2);
}

#[test]
fn test_fix_without_accuracy_is_accepted() {
    let mut track = builder();
    let fix = GeoFix::new(ORIGIN_LAT, ORIGIN_LON, base_time());
    assert!(track.ingest_fix(&fix).point().is_some());
}

#[test]
fn test_out_of_order_and_duplicate_timestamps_are_rejected() {
    let mut track = builder();
    track.ingest_fix(&fix_at(0.0, 10));

    let earlier = track.ingest_fix(&fix_at(20.0, 5));
    assert_eq!(
        earlier.rejection(),
        Some(&IngestRejection::OutOfOrder { behind_ms: 5_000 })
    );

    let same_instant = track.ingest_fix(&fix_at(20.0, 10));
    assert_eq!(
        same_instant.rejection(),
        Some(&IngestRejection::OutOfOrder { behind_ms: 0 })
    );
    assert_eq!(track.points().len(), 1);
}

#[test]
fn test_sub_millisecond_gaps_keep_speed_finite() {
    let mut track = builder();
    track.ingest_fix(&fix_at(0.0, 0));

    let mut same_spot = fix_at(0.0, 0);
    same_spot.timestamp += Duration::microseconds(400);
    let outcome = track.ingest_fix(&same_spot);
    let (point, _) = accepted(&outcome);
    assert!(point.speed_mps.is_finite());
    assert!(point.speed_mps.abs() < f64::EPSILON);
    assert_eq!(point.pace_secs_per_km, None);

    let mut nudge = fix_at(0.05, 0);
    nudge.timestamp += Duration::microseconds(400) + Duration::nanoseconds(300);
    assert!(matches!(
        track.ingest_fix(&nudge).rejection(),
        Some(IngestRejection::ImplausibleJump { speed_mps, .. }) if speed_mps.is_finite()
    ));

    let next = track.ingest_fix(&fix_at(10.0, 5));
    let (point, _) = accepted(&next);
    assert!((point.cumulative_distance_m - 10.0).abs() <= 0.1);
    assert!((point.speed_mps - 2.0).abs() <= 0.05);
    assert!(track.points().iter().all(|p| p.speed_mps.is_finite()));
}

#[test]
fn test_invalid_coordinates_are_rejected_first() {
    let mut track = builder();
    let bad_lat = GeoFix::new(91.0, 0.0, base_time()).with_accuracy(500.0);
    assert!(matches!(
        track.ingest_fix(&bad_lat).rejection(),
        Some(IngestRejection::InvalidCoordinate { .. })
    ));

    let nan = GeoFix::new(f64::NAN, 0.0, base_time());
    assert!(matches!(
        track.ingest_fix(&nan).rejection(),
        Some(IngestRejection::InvalidCoordinate { .. })
    ));
    assert!(track.points().is_empty());
}

#[test]
fn test_implausible_jump_is_dropped_and_next_fix_measured_from_last_accepted() {
    let mut track = builder();
    track.ingest_fix(&fix_at(0.0, 0));

    // 1 km in 10 s
    let jump = track.ingest_fix(&fix_at(1_000.0, 10));
    assert!(matches!(
        jump.rejection(),
        Some(IngestRejection::ImplausibleJump { speed_mps, max_mps })
            if *speed_mps > 90.0 && (*max_mps - 12.0).abs() < f64::EPSILON
    ));

    let next = track.ingest_fix(&fix_at(60.0, 20));
    let (point, _) = accepted(&next);
    assert_eq!(point.sequence, 1);
    assert!((point.cumulative_distance_m - 60.0).abs() <= 0.6);
}

#[test]
fn test_sequence_and_distance_are_monotonic_across_rejections() {
    let mut track = builder();
    let mut fixes = straight_track(20, 25.0, 6);
    // Sprinkle in a noisy fix and a stale one
    fixes.insert(5, fix_at(400.0, 31).with_accuracy(80.0));
    fixes.insert(9, fix_at(10.0, 1));

    for fix in &fixes {
        track.ingest_fix(fix);
    }

    let points = track.points();
    assert_eq!(points.len(), 20);
    for pair in points.windows(2) {
        assert_eq!(pair[1].sequence, pair[0].sequence + 1);
        assert!(pair[1].cumulative_distance_m >= pair[0].cumulative_distance_m);
        assert!(pair[1].timestamp > pair[0].timestamp);
    }
    assert!((track.distance_m() - 475.0).abs() <= 4.0);
}

#[test]
fn test_stationary_runner_has_no_pace() {
    let mut track = builder();
    track.ingest_fix(&fix_at(0.0, 0));
    let outcome = track.ingest_fix(&fix_at(0.0, 5));
    let (point, _) = accepted(&outcome);
    assert_eq!(point.pace_secs_per_km, None);
    assert_eq!(track.current_pace(), None);
}

#[test]
fn test_elevation_gain_ignores_noise() {
    let mut track = builder();
    let altitudes = [100.0, 101.0, 103.5, 103.0, 110.0, 104.0];
    for (i, altitude) in altitudes.iter().enumerate() {
        let fix = fix_at(i as f64 * 10.0, i as i64 * 5).with_altitude(*altitude);
        track.ingest_fix(&fix);
    }
    assert!((track.elevation_gain_m() - 10.0).abs() < 1e-9);
    assert!((track.last_point().unwrap().elevation_gain_m - 10.0).abs() < 1e-9);
}

#[test]
fn test_auto_pause_fires_once_after_sustained_stop_and_resumes_on_movement() {
    let mut track = builder();
    let mut signals = Vec::new();
    let mut first_pause_point = None;

    // Stand still for 15 s, one fix per second
    for secs in 0..=15 {
        let outcome = track.ingest_fix(&fix_at(0.0, secs));
        let (point, signal) = accepted(&outcome);
        if point.is_pause_point && first_pause_point.is_none() {
            first_pause_point = Some(point.timestamp);
        }
        signals.extend(signal);
    }
    assert_eq!(signals, vec![PauseSignal::Pause]);
    assert_eq!(first_pause_point, Some(base_time() + Duration::seconds(10)));
    assert!(track.is_stationary());

    let moving = track.ingest_fix(&fix_at(5.0, 16));
    let (point, signal) = accepted(&moving);
    assert!(!point.is_pause_point);
    assert_eq!(signal, Some(PauseSignal::Resume));
    assert!(!track.is_stationary());
}

#[test]
fn test_disabled_auto_pause_marks_points_without_signals() {
    let mut track = TrackBuilder::new(TrackingConfig {
        auto_pause: false,
        ..TrackingConfig::default()
    });
    let mut pause_points = 0;
    for secs in 0..=12 {
        let outcome = track.ingest_fix(&fix_at(0.0, secs));
        let (point, signal) = accepted(&outcome);
        assert_eq!(signal, None);
        if point.is_pause_point {
            pause_points += 1;
        }
    }
    assert_eq!(pause_points, 3);
}
