// ABOUTME: Narrow async interfaces to the systems around the coaching engine
// ABOUTME: Persistence, rule catalog, voice output, generative text, and history sync
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Collaborators
//!
//! The engine never talks to storage, speech, or the network directly. Each
//! boundary is a trait object so the host app, the replay binary, and the tests
//! can plug in their own implementation.

/// In-memory implementations for tests and offline replay
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use pierre_core::errors::{AppResult, SyncError};
use pierre_core::models::{CoachingRule, RunSessionSnapshot, TrackPoint};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Durable storage for track points and session snapshots
#[async_trait]
pub trait TrackStore: Send + Sync {
    /// Persist one accepted track point
    async fn save_track_point(&self, session_id: Uuid, point: &TrackPoint) -> AppResult<()>;

    /// Persist a session snapshot (called at least once, when the session ends)
    async fn save_snapshot(&self, snapshot: &RunSessionSnapshot) -> AppResult<()>;
}

/// Source of authored coaching rules
#[async_trait]
pub trait RuleCatalog: Send + Sync {
    /// Rules belonging to a coach
    async fn rules_for_coach(&self, coach_id: &str) -> AppResult<Vec<CoachingRule>>;

    /// Persona description used when asking for generated text
    async fn coach_persona(&self, _coach_id: &str) -> AppResult<Option<String>> {
        Ok(None)
    }
}

/// Spoken output
#[async_trait]
pub trait VoiceOutput: Send + Sync {
    /// Speak `text` with the given voice profile
    async fn speak(&self, text: &str, voice_profile_id: Option<&str>) -> AppResult<()>;
}

/// Input for the generative text collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Who is speaking
    pub coach_persona: String,
    /// Current condition tokens
    pub conditions: Vec<String>,
    /// Recently delivered messages, oldest first
    pub recent_history: Vec<String>,
}

/// Generative text service
#[async_trait]
pub trait CoachTextGenerator: Send + Sync {
    /// Produce one coaching line
    async fn generate(&self, request: &GenerationRequest) -> AppResult<String>;
}

/// Remote history sync
#[async_trait]
pub trait SyncClient: Send + Sync {
    /// Upload a finished session
    async fn upload(
        &self,
        snapshot: &RunSessionSnapshot,
        track: &[TrackPoint],
    ) -> Result<(), SyncError>;
}

/// The full set of collaborators a session registry needs
#[derive(Clone)]
pub struct Collaborators {
    /// Persistence
    pub track_store: Arc<dyn TrackStore>,
    /// Rule source
    pub rule_catalog: Arc<dyn RuleCatalog>,
    /// Voice output
    pub voice: Arc<dyn VoiceOutput>,
    /// Generative text
    pub generator: Arc<dyn CoachTextGenerator>,
    /// History sync
    pub sync_client: Arc<dyn SyncClient>,
}
