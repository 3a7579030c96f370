// ABOUTME: In-memory collaborator implementations backing the replay binary and tests
// ABOUTME: Record what the engine hands them and can be scripted to delay or fail
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use pierre_core::errors::{AppError, AppResult, SyncError};
use pierre_core::models::{CoachingRule, RunSessionSnapshot, TrackPoint};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    CoachTextGenerator, Collaborators, GenerationRequest, RuleCatalog, SyncClient, TrackStore,
    VoiceOutput,
};

/// Track points and snapshots kept in memory
#[derive(Debug, Default)]
pub struct InMemoryTrackStore {
    points: DashMap<Uuid, Vec<TrackPoint>>,
    snapshots: DashMap<Uuid, RunSessionSnapshot>,
}

impl InMemoryTrackStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Points saved for a session
    #[must_use]
    pub fn points(&self, session_id: Uuid) -> Vec<TrackPoint> {
        self.points
            .get(&session_id)
            .map(|points| points.value().clone())
            .unwrap_or_default()
    }

    /// Latest snapshot saved for a session
    #[must_use]
    pub fn snapshot(&self, session_id: Uuid) -> Option<RunSessionSnapshot> {
        self.snapshots
            .get(&session_id)
            .map(|snapshot| snapshot.value().clone())
    }
}

#[async_trait]
impl TrackStore for InMemoryTrackStore {
    async fn save_track_point(&self, session_id: Uuid, point: &TrackPoint) -> AppResult<()> {
        self.points.entry(session_id).or_default().push(point.clone());
        Ok(())
    }

    async fn save_snapshot(&self, snapshot: &RunSessionSnapshot) -> AppResult<()> {
        self.snapshots.insert(snapshot.session_id, snapshot.clone());
        Ok(())
    }
}

/// Fixed rule catalog
#[derive(Debug, Default, Clone)]
pub struct StaticRuleCatalog {
    rules: Vec<CoachingRule>,
    personas: HashMap<String, String>,
}

impl StaticRuleCatalog {
    /// Catalog holding `rules`
    #[must_use]
    pub fn new(rules: Vec<CoachingRule>) -> Self {
        Self {
            rules,
            personas: HashMap::new(),
        }
    }

    /// Attach a persona description to a coach
    #[must_use]
    pub fn with_persona(mut self, coach_id: impl Into<String>, persona: impl Into<String>) -> Self {
        self.personas.insert(coach_id.into(), persona.into());
        self
    }
}

#[async_trait]
impl RuleCatalog for StaticRuleCatalog {
    async fn rules_for_coach(&self, coach_id: &str) -> AppResult<Vec<CoachingRule>> {
        Ok(self
            .rules
            .iter()
            .filter(|rule| rule.coach_id == coach_id)
            .cloned()
            .collect())
    }

    async fn coach_persona(&self, coach_id: &str) -> AppResult<Option<String>> {
        Ok(self.personas.get(coach_id).cloned())
    }
}

/// A line handed to the voice collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpokenLine {
    /// Spoken text
    pub text: String,
    /// Voice profile requested
    pub voice_profile_id: Option<String>,
}

/// Voice output that records every line, optionally taking a while to speak
#[derive(Debug, Default)]
pub struct RecordingVoice {
    spoken: Mutex<Vec<SpokenLine>>,
    fail: bool,
    delay: Option<Duration>,
}

impl RecordingVoice {
    /// Voice that accepts everything
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Voice that records lines but reports every delivery as failed
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Take `delay` to speak each line, after recording it
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Lines spoken so far
    pub async fn spoken(&self) -> Vec<SpokenLine> {
        self.spoken.lock().await.clone()
    }
}

#[async_trait]
impl VoiceOutput for RecordingVoice {
    async fn speak(&self, text: &str, voice_profile_id: Option<&str>) -> AppResult<()> {
        self.spoken.lock().await.push(SpokenLine {
            text: text.to_owned(),
            voice_profile_id: voice_profile_id.map(str::to_owned),
        });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(AppError::external_service("voice", "speech output unavailable"));
        }
        Ok(())
    }
}

/// Generator replying with a fixed line, optionally after a delay or with an error
#[derive(Debug, Clone)]
pub struct ScriptedGenerator {
    reply: String,
    delay: Option<Duration>,
    fail: bool,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl ScriptedGenerator {
    /// Generator answering `reply` immediately
    #[must_use]
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            delay: None,
            fail: false,
            requests: Arc::default(),
        }
    }

    /// Generator that always errors
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::replying("")
        }
    }

    /// Wait `delay` before answering
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests received so far
    pub async fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl CoachTextGenerator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> AppResult<String> {
        self.requests.lock().await.push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(AppError::external_service("generator", "scripted failure"));
        }
        Ok(self.reply.clone())
    }
}

/// Sync client answering from a script, then succeeding once the script runs out
#[derive(Debug, Default)]
pub struct ScriptedSyncClient {
    script: Mutex<VecDeque<Result<(), SyncError>>>,
    uploads: Mutex<Vec<Uuid>>,
}

impl ScriptedSyncClient {
    /// Client that always succeeds
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Client answering `results` in order
    #[must_use]
    pub fn with_script(results: impl IntoIterator<Item = Result<(), SyncError>>) -> Self {
        Self {
            script: Mutex::new(results.into_iter().collect()),
            uploads: Mutex::default(),
        }
    }

    /// Number of upload attempts received
    pub async fn attempts(&self) -> usize {
        self.uploads.lock().await.len()
    }
}

#[async_trait]
impl SyncClient for ScriptedSyncClient {
    async fn upload(
        &self,
        snapshot: &RunSessionSnapshot,
        _track: &[TrackPoint],
    ) -> Result<(), SyncError> {
        self.uploads.lock().await.push(snapshot.session_id);
        self.script.lock().await.pop_front().unwrap_or(Ok(()))
    }
}

/// Concrete in-memory handles, kept so callers can inspect them after a run
#[derive(Clone)]
pub struct InMemoryCollaborators {
    /// Track store
    pub track_store: Arc<InMemoryTrackStore>,
    /// Rule catalog
    pub rule_catalog: Arc<StaticRuleCatalog>,
    /// Voice
    pub voice: Arc<RecordingVoice>,
    /// Generator
    pub generator: Arc<ScriptedGenerator>,
    /// Sync client
    pub sync_client: Arc<ScriptedSyncClient>,
}

impl InMemoryCollaborators {
    /// Defaults around a rule catalog and a generator
    #[must_use]
    pub fn new(catalog: StaticRuleCatalog, generator: ScriptedGenerator) -> Self {
        Self {
            track_store: Arc::new(InMemoryTrackStore::new()),
            rule_catalog: Arc::new(catalog),
            voice: Arc::new(RecordingVoice::new()),
            generator: Arc::new(generator),
            sync_client: Arc::new(ScriptedSyncClient::new()),
        }
    }

    /// Type-erased set for the registry
    #[must_use]
    pub fn as_collaborators(&self) -> Collaborators {
        Collaborators {
            track_store: self.track_store.clone(),
            rule_catalog: self.rule_catalog.clone(),
            voice: self.voice.clone(),
            generator: self.generator.clone(),
            sync_client: self.sync_client.clone(),
        }
    }
}
