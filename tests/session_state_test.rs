// ABOUTME: Integration tests for the run session state machine
// ABOUTME: Covers lifecycle transitions, idempotent pause/resume, auto-pause, and metric aggregation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(missing_docs)]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use common::{base_time, fix_at, straight_track, COACH};
use pierre_core::errors::{AppError, ErrorCode, SessionStateError};
use pierre_core::models::{SessionState, WorkoutType};
use pierre_live_coach::config::TrackingConfig;
use pierre_live_coach::session::{PauseOrigin, RunSession, SessionParams, Transition};
use pierre_live_coach::tracking::IngestOutcome;
use uuid::Uuid;

fn new_session(target_pace: Option<f64>) -> RunSession {
    RunSession::new(
        SessionParams {
            owner_id: Uuid::new_v4(),
            coach_id: COACH.to_owned(),
            workout_type: WorkoutType::Tempo,
            target_pace_secs_per_km: target_pace,
            body_weight_kg: 70.0,
        },
        TrackingConfig::default(),
    )
}

fn started() -> RunSession {
    let mut session = new_session(None);
    session.start(base_time()).unwrap();
    session
}

#[test]
fn test_new_session_is_not_started() {
    let session = new_session(Some(300.0));
    let snapshot = session.snapshot();
    assert_eq!(snapshot.state, SessionState::NotStarted);
    assert_eq!(snapshot.coach_id, COACH);
    assert_eq!(snapshot.workout_type, WorkoutType::Tempo);
    assert_eq!(snapshot.target_pace_secs_per_km, Some(300.0));
    assert_eq!(snapshot.started_at, None);
}

#[test]
fn test_start_only_once() {
    let mut session = new_session(None);
    let transition = session.start(base_time()).unwrap();
    assert_eq!(
        transition,
        Transition {
            from: SessionState::NotStarted,
            to: SessionState::Active
        }
    );
    assert_eq!(session.snapshot().started_at, Some(base_time()));

    let err = session.start(base_time()).unwrap_err();
    assert_eq!(
        err,
        SessionStateError::AlreadyStarted {
            state: SessionState::Active
        }
    );
}

#[test]
fn test_pause_twice_keeps_one_pause_marker() {
    let mut session = started();
    assert!(session.pause().unwrap().is_some());
    assert!(session.pause().unwrap().is_none());

    let snapshot = session.snapshot();
    assert_eq!(snapshot.state, SessionState::Paused);
    assert_eq!(snapshot.pause_count, 1);
    assert_eq!(session.paused_by(), Some(PauseOrigin::Manual));
}

#[test]
fn test_resume_when_active_is_a_no_op() {
    let mut session = started();
    assert!(session.resume().unwrap().is_none());
    assert_eq!(session.state(), SessionState::Active);
}

#[test]
fn test_lifecycle_calls_outside_a_live_run_fail() {
    let mut session = new_session(None);
    assert_eq!(
        session.pause().unwrap_err(),
        SessionStateError::NotActive {
            state: SessionState::NotStarted
        }
    );
    assert!(session.end(base_time()).is_err());

    session.start(base_time()).unwrap();
    session.end(base_time()).unwrap();
    assert!(session.pause().is_err());
    assert!(session.resume().is_err());
    assert!(session.end(base_time()).is_err());

    let app_error: AppError = session.resume().unwrap_err().into();
    assert_eq!(app_error.code, ErrorCode::InvalidState);
}

#[test]
fn test_end_from_paused_freezes_metrics() {
    let mut session = started();
    for fix in straight_track(5, 50.0, 15) {
        session.ingest_fix(&fix);
    }
    session.pause().unwrap();
    let (transition, frozen) = session.end(base_time()).unwrap();
    assert_eq!(transition.from, SessionState::Paused);
    assert_eq!(frozen.state, SessionState::Ended);

    let late = session.ingest_fix(&fix_at(300.0, 120));
    assert_eq!(late.outcome, IngestOutcome::Ignored);
    assert!((session.snapshot().distance_m - frozen.distance_m).abs() < f64::EPSILON);
    assert_eq!(session.snapshot().point_count, 5);
}

#[test]
fn test_fixes_before_start_are_ignored() {
    let mut session = new_session(None);
    let result = session.ingest_fix(&fix_at(0.0, 0));
    assert_eq!(result.outcome, IngestOutcome::Ignored);
    assert!(session.track().is_empty());
}

#[test]
fn test_distance_not_accrued_while_paused_or_across_the_resume_gap() {
    let mut session = started();
    session.ingest_fix(&fix_at(0.0, 0));
    session.ingest_fix(&fix_at(100.0, 20));
    assert!((session.snapshot().distance_m - 100.0).abs() < 1.0);

    session.pause().unwrap();
    let paused = session.ingest_fix(&fix_at(200.0, 40));
    assert!(paused.outcome.point().is_some());
    assert_eq!(paused.transition, None);
    assert!((session.snapshot().distance_m - 100.0).abs() < 1.0);

    session.resume().unwrap();
    // The first segment after a manual resume spans the gap and is skipped
    session.ingest_fix(&fix_at(300.0, 60));
    session.ingest_fix(&fix_at(400.0, 80));

    let snapshot = session.snapshot();
    assert!((snapshot.distance_m - 200.0).abs() < 2.0);
    assert!((snapshot.moving_secs - 40.0).abs() < f64::EPSILON);
    assert_eq!(snapshot.point_count, 5);
}

#[test]
fn test_calories_and_average_pace() {
    let mut session = started();
    // 1 km at 5:00/km
    for fix in straight_track(11, 100.0, 30) {
        session.ingest_fix(&fix);
    }
    let snapshot = session.snapshot();
    assert!((snapshot.distance_m - 1_000.0).abs() < 5.0);
    assert!((snapshot.moving_secs - 300.0).abs() < f64::EPSILON);
    assert!((snapshot.calories_kcal - 72.52).abs() < 0.5);
    let average = snapshot.average_pace_secs_per_km.unwrap();
    assert!((average - 300.0).abs() < 2.0);
    let current = snapshot.current_pace_secs_per_km.unwrap();
    assert!((current - 300.0).abs() < 2.0);
}

#[test]
fn test_average_pace_waits_for_ten_meters() {
    let mut session = started();
    session.ingest_fix(&fix_at(0.0, 0));
    session.ingest_fix(&fix_at(4.0, 2));
    assert_eq!(session.snapshot().average_pace_secs_per_km, None);
}

#[test]
fn test_auto_pause_and_auto_resume_transitions() {
    let mut session = started();
    let mut transitions = Vec::new();
    for secs in 0..=12 {
        transitions.extend(session.ingest_fix(&fix_at(0.0, secs)).transition);
    }
    assert_eq!(
        transitions,
        vec![Transition {
            from: SessionState::Active,
            to: SessionState::Paused
        }]
    );
    assert_eq!(session.paused_by(), Some(PauseOrigin::Auto));

    let resumed = session.ingest_fix(&fix_at(5.0, 13));
    assert_eq!(
        resumed.transition,
        Some(Transition {
            from: SessionState::Paused,
            to: SessionState::Active
        })
    );
    assert_eq!(session.snapshot().pause_count, 1);
}

#[test]
fn test_movement_does_not_resume_a_manual_pause() {
    let mut session = started();
    session.ingest_fix(&fix_at(0.0, 0));
    session.pause().unwrap();
    for secs in 1..=12 {
        session.ingest_fix(&fix_at(0.0, secs));
    }
    let moving = session.ingest_fix(&fix_at(10.0, 14));
    assert_eq!(moving.transition, None);
    assert_eq!(session.state(), SessionState::Paused);
}

#[test]
fn test_sync_states_follow_ended() {
    let mut session = started();
    assert!(session.transition_sync(SessionState::Syncing).is_err());
    session.end(base_time()).unwrap();
    session.transition_sync(SessionState::SyncPending).unwrap();
    session.transition_sync(SessionState::Syncing).unwrap();
    session.transition_sync(SessionState::Synced).unwrap();
    assert!(session.transition_sync(SessionState::Syncing).is_err());
    assert!(session.state().is_finished());
}
