// ABOUTME: Run session data models: lifecycle state, workout type, and metric snapshot
// ABOUTME: Snapshots are mutated only by the session state machine and read everywhere else
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a run session, including the post-run sync sub-states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Created but not yet started
    NotStarted,
    /// Recording telemetry
    Active,
    /// Temporarily stopped, manually or by auto-pause
    Paused,
    /// Finished; metrics are frozen
    Ended,
    /// Waiting for the first upload attempt
    SyncPending,
    /// Upload in progress
    Syncing,
    /// Upload confirmed by the sync collaborator
    Synced,
    /// Upload gave up; awaiting manual retry
    SyncFailed,
}

impl SessionState {
    /// Whether the session currently holds its owner's single active slot
    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Active | Self::Paused)
    }

    /// Whether the run itself is over (Ended or any sync sub-state)
    #[must_use]
    pub const fn is_finished(self) -> bool {
        matches!(
            self,
            Self::Ended | Self::SyncPending | Self::Syncing | Self::Synced | Self::SyncFailed
        )
    }

    /// Stable lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Ended => "ended",
            Self::SyncPending => "sync_pending",
            Self::Syncing => "syncing",
            Self::Synced => "synced",
            Self::SyncFailed => "sync_failed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of workout being coached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutType {
    /// Conversational-pace run
    #[default]
    EasyRun,
    /// Sustained comfortably-hard effort
    Tempo,
    /// Repeated hard efforts with recoveries
    Intervals,
    /// Extended aerobic run
    LongRun,
    /// Very easy run after hard days
    Recovery,
    /// Race effort
    Race,
}

impl WorkoutType {
    /// Parse workout type from string
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "easy_run" | "easy" => Some(Self::EasyRun),
            "tempo" => Some(Self::Tempo),
            "intervals" | "interval" => Some(Self::Intervals),
            "long_run" | "long" => Some(Self::LongRun),
            "recovery" => Some(Self::Recovery),
            "race" => Some(Self::Race),
            _ => None,
        }
    }
}

/// Point-in-time view of one run's lifecycle and aggregated metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSessionSnapshot {
    /// Session identifier
    pub session_id: Uuid,
    /// User who owns the session
    pub owner_id: Uuid,
    /// Coach delivering guidance for this run
    pub coach_id: String,
    /// Kind of workout
    pub workout_type: WorkoutType,
    /// Target pace in seconds per kilometer
    pub target_pace_secs_per_km: Option<f64>,
    /// Current lifecycle state
    pub state: SessionState,
    /// When the session was started
    pub started_at: Option<DateTime<Utc>>,
    /// When the session was ended
    pub ended_at: Option<DateTime<Utc>>,
    /// Total distance (meters)
    pub distance_m: f64,
    /// Moving time, excluding pauses (seconds)
    pub moving_secs: f64,
    /// Estimated energy expenditure (kcal)
    pub calories_kcal: f64,
    /// Cumulative positive elevation gain (meters)
    pub elevation_gain_m: f64,
    /// Average pace over moving time (seconds per kilometer)
    pub average_pace_secs_per_km: Option<f64>,
    /// Most recent smoothed pace (seconds per kilometer)
    pub current_pace_secs_per_km: Option<f64>,
    /// Number of accepted track points
    pub point_count: u64,
    /// Number of pauses recorded
    pub pause_count: u32,
}

impl RunSessionSnapshot {
    /// Fresh snapshot for a session that has not started
    #[must_use]
    pub fn new(
        session_id: Uuid,
        owner_id: Uuid,
        coach_id: impl Into<String>,
        workout_type: WorkoutType,
        target_pace_secs_per_km: Option<f64>,
    ) -> Self {
        Self {
            session_id,
            owner_id,
            coach_id: coach_id.into(),
            workout_type,
            target_pace_secs_per_km,
            state: SessionState::NotStarted,
            started_at: None,
            ended_at: None,
            distance_m: 0.0,
            moving_secs: 0.0,
            calories_kcal: 0.0,
            elevation_gain_m: 0.0,
            average_pace_secs_per_km: None,
            current_pace_secs_per_km: None,
            point_count: 0,
            pause_count: 0,
        }
    }

    /// Whether telemetry is currently being counted
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Whether the session is paused
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.state == SessionState::Paused
    }

    /// Distance in kilometers
    #[must_use]
    pub fn distance_km(&self) -> f64 {
        self.distance_m / 1000.0
    }
}
