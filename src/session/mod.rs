// ABOUTME: Run session state machine owning one run's lifecycle and aggregated metrics
// ABOUTME: Consumes track builder output; moving time, calories, and average pace derive from it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Run Session
//!
//! ```text
//! NotStarted -> Active <-> Paused -> Ended -> SyncPending -> Syncing -> Synced
//!                                                    ^          |
//!                                                    +----------+-> SyncFailed -> Syncing
//! ```
//!
//! The state only regresses between `Active` and `Paused`. Once `Ended`, the
//! metrics are frozen and only the sync sub-states may change.
//!
//! Fixes are folded into the track while the session is `Active` or `Paused`,
//! so auto-pause can detect movement again, but distance and moving time only
//! accumulate for segments recorded while `Active`.

/// Upload with capped, jittered exponential backoff
pub mod sync;

pub use sync::{SyncCoordinator, SyncOutcome, SyncTarget};

use chrono::{DateTime, Utc};
use pierre_core::constants::physiology::RUNNING_KCAL_PER_KG_KM;
use pierre_core::constants::session::MIN_DISTANCE_FOR_PACE_M;
use pierre_core::errors::SessionStateError;
use pierre_core::models::{GeoFix, RunSessionSnapshot, SessionState, TrackPoint, WorkoutType};
use uuid::Uuid;

use crate::config::TrackingConfig;
use crate::tracking::{elapsed_secs, IngestOutcome, PauseSignal, TrackBuilder};

/// Who put the session into `Paused`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseOrigin {
    /// The runner pressed pause
    Manual,
    /// The track builder detected a stationary stretch
    Auto,
}

/// Parameters fixed at session creation
#[derive(Debug, Clone)]
pub struct SessionParams {
    /// Owner of the session
    pub owner_id: Uuid,
    /// Coach delivering guidance
    pub coach_id: String,
    /// Kind of workout
    pub workout_type: WorkoutType,
    /// Optional target pace (seconds per kilometer)
    pub target_pace_secs_per_km: Option<f64>,
    /// Body weight used for the calorie estimate
    pub body_weight_kg: f64,
}

/// A lifecycle change, returned so callers can log and publish it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// State before the change
    pub from: SessionState,
    /// State after the change
    pub to: SessionState,
}

/// Accepted or rejected fix plus any lifecycle change it caused
#[derive(Debug, Clone, PartialEq)]
pub struct FixResult {
    /// Track builder outcome
    pub outcome: IngestOutcome,
    /// Auto-pause or auto-resume transition
    pub transition: Option<Transition>,
}

/// One run's lifecycle and metrics
#[derive(Debug, Clone)]
pub struct RunSession {
    snapshot: RunSessionSnapshot,
    track: TrackBuilder,
    body_weight_kg: f64,
    paused_by: Option<PauseOrigin>,
    skip_next_segment: bool,
    distance_m: f64,
    moving_secs: f64,
}

impl RunSession {
    /// Create a session in `NotStarted`
    #[must_use]
    pub fn new(params: SessionParams, tracking: TrackingConfig) -> Self {
        Self {
            snapshot: RunSessionSnapshot::new(
                Uuid::new_v4(),
                params.owner_id,
                params.coach_id,
                params.workout_type,
                params.target_pace_secs_per_km,
            ),
            track: TrackBuilder::new(tracking),
            body_weight_kg: params.body_weight_kg,
            paused_by: None,
            skip_next_segment: false,
            distance_m: 0.0,
            moving_secs: 0.0,
        }
    }

    /// Session identifier
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.snapshot.session_id
    }

    /// Current lifecycle state
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.snapshot.state
    }

    /// Copy of the current snapshot
    #[must_use]
    pub fn snapshot(&self) -> RunSessionSnapshot {
        self.snapshot.clone()
    }

    /// Accepted track points
    #[must_use]
    pub fn track(&self) -> &[TrackPoint] {
        self.track.points()
    }

    /// Who paused the session, while paused
    #[must_use]
    pub const fn paused_by(&self) -> Option<PauseOrigin> {
        self.paused_by
    }

    /// `NotStarted` to `Active`
    ///
    /// # Errors
    ///
    /// Returns `AlreadyStarted` if the session has left `NotStarted`
    pub fn start(&mut self, at: DateTime<Utc>) -> Result<Transition, SessionStateError> {
        if self.snapshot.state != SessionState::NotStarted {
            return Err(SessionStateError::AlreadyStarted {
                state: self.snapshot.state,
            });
        }
        self.snapshot.started_at = Some(at);
        Ok(self.set_state(SessionState::Active))
    }

    /// `Active` to `Paused`; a no-op when already paused
    ///
    /// # Errors
    ///
    /// Returns `NotActive` unless the session is `Active` or `Paused`
    pub fn pause(&mut self) -> Result<Option<Transition>, SessionStateError> {
        self.pause_with(PauseOrigin::Manual)
    }

    /// `Paused` to `Active`; a no-op when already active
    ///
    /// # Errors
    ///
    /// Returns `NotActive` unless the session is `Active` or `Paused`
    pub fn resume(&mut self) -> Result<Option<Transition>, SessionStateError> {
        match self.snapshot.state {
            SessionState::Active => Ok(None),
            SessionState::Paused => {
                if self.paused_by == Some(PauseOrigin::Manual) {
                    self.skip_next_segment = true;
                }
                self.paused_by = None;
                Ok(Some(self.set_state(SessionState::Active)))
            }
            state => Err(SessionStateError::NotActive { state }),
        }
    }

    fn pause_with(
        &mut self,
        origin: PauseOrigin,
    ) -> Result<Option<Transition>, SessionStateError> {
        match self.snapshot.state {
            SessionState::Paused => {
                // A manual pause overrides an auto-pause so movement won't resume it
                if origin == PauseOrigin::Manual {
                    self.paused_by = Some(PauseOrigin::Manual);
                }
                Ok(None)
            }
            SessionState::Active => {
                self.paused_by = Some(origin);
                self.snapshot.pause_count = self.snapshot.pause_count.saturating_add(1);
                Ok(Some(self.set_state(SessionState::Paused)))
            }
            state => Err(SessionStateError::NotActive { state }),
        }
    }

    /// `Active | Paused` to `Ended`; freezes metrics and returns the final snapshot
    ///
    /// # Errors
    ///
    /// Returns `NotActive` unless the session is `Active` or `Paused`
    pub fn end(
        &mut self,
        at: DateTime<Utc>,
    ) -> Result<(Transition, RunSessionSnapshot), SessionStateError> {
        if !self.snapshot.state.is_live() {
            return Err(SessionStateError::NotActive {
                state: self.snapshot.state,
            });
        }
        self.paused_by = None;
        self.snapshot.ended_at = Some(at);
        let transition = self.set_state(SessionState::Ended);
        Ok((transition, self.snapshot.clone()))
    }

    /// Move between sync sub-states
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` for any edge outside the sync graph
    pub fn transition_sync(&mut self, to: SessionState) -> Result<Transition, SessionStateError> {
        use SessionState::{Ended, SyncFailed, SyncPending, Synced, Syncing};

        let from = self.snapshot.state;
        let allowed = matches!(
            (from, to),
            (Ended | Syncing, SyncPending)
                | (SyncPending | SyncFailed, Syncing)
                | (Syncing, Synced | SyncFailed)
        );
        if !allowed {
            return Err(SessionStateError::InvalidTransition { from, to });
        }
        Ok(self.set_state(to))
    }

    /// Fold a position fix; ignored unless the session is `Active` or `Paused`
    pub fn ingest_fix(&mut self, fix: &GeoFix) -> FixResult {
        if !self.snapshot.state.is_live() {
            return FixResult {
                outcome: IngestOutcome::Ignored,
                transition: None,
            };
        }

        let outcome = self.track.ingest_fix(fix);
        let IngestOutcome::Accepted {
            point,
            pause_signal,
        } = &outcome
        else {
            return FixResult {
                outcome,
                transition: None,
            };
        };

        if self.snapshot.state == SessionState::Active && point.sequence > 0 {
            if self.skip_next_segment {
                self.skip_next_segment = false;
            } else {
                self.distance_m += point.segment_distance_m;
                if let Some(previous) = self.previous_point_time(point.sequence) {
                    self.moving_secs += elapsed_secs(previous, point.timestamp);
                }
            }
        }
        let transition = pause_signal.and_then(|signal| self.apply_pause_signal(signal));
        self.refresh_metrics();

        FixResult {
            outcome,
            transition,
        }
    }

    fn previous_point_time(&self, sequence: u64) -> Option<DateTime<Utc>> {
        let index = usize::try_from(sequence.checked_sub(1)?).ok()?;
        self.track.points().get(index).map(|p| p.timestamp)
    }

    fn apply_pause_signal(&mut self, signal: PauseSignal) -> Option<Transition> {
        match signal {
            PauseSignal::Pause => self.pause_with(PauseOrigin::Auto).ok().flatten(),
            PauseSignal::Resume if self.paused_by == Some(PauseOrigin::Auto) => {
                self.paused_by = None;
                Some(self.set_state(SessionState::Active))
            }
            PauseSignal::Resume => None,
        }
    }

    fn refresh_metrics(&mut self) {
        let snapshot = &mut self.snapshot;
        snapshot.distance_m = self.distance_m;
        snapshot.moving_secs = self.moving_secs;
        snapshot.elevation_gain_m = self.track.elevation_gain_m();
        snapshot.current_pace_secs_per_km = self.track.current_pace();
        snapshot.point_count = self.track.points().len() as u64;
        snapshot.calories_kcal =
            snapshot.distance_km() * self.body_weight_kg * RUNNING_KCAL_PER_KG_KM;
        snapshot.average_pace_secs_per_km = (self.distance_m >= MIN_DISTANCE_FOR_PACE_M)
            .then(|| self.moving_secs / (self.distance_m / 1000.0));
    }

    fn set_state(&mut self, to: SessionState) -> Transition {
        let from = self.snapshot.state;
        self.snapshot.state = to;
        Transition { from, to }
    }
}
