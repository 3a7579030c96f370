// ABOUTME: Core data models for the Pierre live coaching engine
// ABOUTME: Re-exports telemetry, run session, and coaching rule data structures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Data Models
//!
//! - `GeoFix` / `TrackPoint`: raw telemetry and the derived, sequenced track
//! - `RunSessionSnapshot` / `SessionState`: the run lifecycle and its metrics
//! - `CoachingRule` / `SelectionEvent`: the coaching catalog and what was said

mod coaching;
mod session;
mod tracking;

pub use coaching::{CoachingRule, EmotionalTone, MessageSource, SelectionEvent};
pub use session::{RunSessionSnapshot, SessionState, WorkoutType};
pub use tracking::{GeoFix, HeartRateSample, TrackPoint};
