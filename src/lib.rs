// ABOUTME: Main library entry point for the Pierre live running coach
// ABOUTME: Wires GPS tracking, session lifecycle, coaching selection, fallback generation, and sync
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![recursion_limit = "256"]
#![deny(unsafe_code)]

//! # Pierre Live Coach
//!
//! Decision engine for a live running session. It turns a stream of GPS
//! fixes and heart rate samples into session metrics and, on a fixed
//! cadence, picks one spoken coaching line for the runner.
//!
//! ## Architecture
//!
//! - **Tracking**: validates fixes and folds them into a track with distance,
//!   pace, elevation gain, and auto-pause detection
//! - **Session**: run lifecycle state machine and post-run upload with retries
//! - **Conditions**: derives condition tags from the latest snapshot
//! - **Coaching**: rule matching, ranking, usage caps, cooldowns, and a
//!   bounded generative fallback
//! - **Live**: per-owner registry and the [`live::LiveRun`] handle that ties
//!   the pieces together
//! - **Collaborators**: traits for storage, rule catalogs, voice output, text
//!   generation, and upload, plus in-memory implementations
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use pierre_live_coach::collaborators::memory::{
//!     InMemoryCollaborators, ScriptedGenerator, StaticRuleCatalog,
//! };
//! use pierre_live_coach::config::LiveCoachConfig;
//! use pierre_live_coach::live::{SessionRegistry, StartRequest, TickInput};
//! use pierre_core::errors::AppResult;
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let memory = InMemoryCollaborators::new(
//!         StaticRuleCatalog::new(Vec::new()),
//!         ScriptedGenerator::replying("Keep it steady."),
//!     );
//!     let registry = SessionRegistry::new(LiveCoachConfig::default(), memory.as_collaborators());
//!     let run = registry.start(Uuid::new_v4(), StartRequest::new("coach-ava")).await?;
//!     let message = run.coach_tick(TickInput::default()).await?;
//!     println!("{message:?}");
//!     run.end().await?;
//!     Ok(())
//! }
//! ```

/// Condition tags derived from session state
pub mod conditions;

/// Rule selection, fallback generation, and usage tracking
pub mod coaching;

/// Collaborator interfaces and in-memory implementations
pub mod collaborators;

/// Configuration loading and validation
pub mod config;

/// Live run orchestration and the per-owner session registry
pub mod live;

/// Generative text providers
pub mod llm;

/// Logging setup and structured coaching events
pub mod logging;

/// Run lifecycle and post-run sync
pub mod session;

/// GPS fix validation and track metrics
pub mod tracking;
