// ABOUTME: Live run orchestration tying telemetry ingestion, coaching ticks, delivery, and sync together
// ABOUTME: One ingestion mutex per run; the coaching loop reads only the published snapshot
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Live Run
//!
//! A [`LiveRun`] is the handle for one active run, obtained from
//! [`SessionRegistry::start`]. It is cheap to clone and safe to share between
//! the telemetry task, the coaching loop, and the UI.
//!
//! - Telemetry calls [`LiveRun::ingest_fix`] and [`LiveRun::ingest_heart_rate`].
//!   Fixes are folded under a single mutex, so distance accumulation follows
//!   arrival order.
//! - Every mutation publishes a fresh [`RunSessionSnapshot`] on a `watch`
//!   channel. [`LiveRun::subscribe`] sees the current value immediately.
//! - [`LiveRun::coach_tick`] evaluates one coaching decision from the latest
//!   published snapshot without touching the ingestion mutex until delivery.
//! - [`LiveRun::end`] cancels the run's token. An in-flight fallback call or
//!   voice line is dropped. Delivery checks the session state and claims the
//!   rule under the ingestion mutex, then speaks outside it with a timeout.

/// One live session per owner
pub mod registry;

pub use registry::SessionRegistry;

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use pierre_core::constants::coaching::PACE_TREND_BAND;
use pierre_core::constants::session::{MAX_HEART_RATE_BPM, MIN_HEART_RATE_BPM};
use pierre_core::errors::{AppError, AppResult};
use pierre_core::models::{
    GeoFix, HeartRateSample, RunSessionSnapshot, SelectionEvent, SessionState, TrackPoint,
    WorkoutType,
};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::coaching::{
    format_pace, CoachingMessage, CoachingSelector, FallbackGateway, SelectionQuery,
    SelectionResult, UsageTracker,
};
use crate::collaborators::{Collaborators, GenerationRequest};
use crate::conditions::{
    build_conditions, ConditionFlags, ContextInput, HeartRateZone, WeatherConditions,
};
use crate::config::LiveCoachConfig;
use crate::logging::CoachLogger;
use crate::session::{FixResult, RunSession, SyncCoordinator, SyncOutcome, SyncTarget, Transition};
use crate::tracking::IngestOutcome;

const METERS_PER_KM: f64 = 1000.0;

/// Parameters for starting a run
#[derive(Debug, Clone)]
pub struct StartRequest {
    /// Coach delivering guidance
    pub coach_id: String,
    /// Kind of workout
    pub workout_type: WorkoutType,
    /// Target pace (seconds per kilometer)
    pub target_pace_secs_per_km: Option<f64>,
    /// Voice profile passed to the voice collaborator
    pub voice_profile_id: Option<String>,
    /// Start time; defaults to now
    pub started_at: Option<DateTime<Utc>>,
}

impl StartRequest {
    /// Easy run with `coach_id`
    #[must_use]
    pub fn new(coach_id: impl Into<String>) -> Self {
        Self {
            coach_id: coach_id.into(),
            workout_type: WorkoutType::default(),
            target_pace_secs_per_km: None,
            voice_profile_id: None,
            started_at: None,
        }
    }

    /// Set the workout type
    #[must_use]
    pub const fn with_workout_type(mut self, workout_type: WorkoutType) -> Self {
        self.workout_type = workout_type;
        self
    }

    /// Set the target pace
    #[must_use]
    pub const fn with_target_pace(mut self, secs_per_km: f64) -> Self {
        self.target_pace_secs_per_km = Some(secs_per_km);
        self
    }

    /// Set the voice profile
    #[must_use]
    pub fn with_voice_profile(mut self, voice_profile_id: impl Into<String>) -> Self {
        self.voice_profile_id = Some(voice_profile_id.into());
        self
    }

    /// Set the start time
    #[must_use]
    pub const fn starting_at(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = Some(started_at);
        self
    }
}

/// Per-tick inputs the session snapshot does not carry
#[derive(Debug, Clone)]
pub struct TickInput {
    /// Evaluation time, used for cooldowns and message timestamps
    pub now: DateTime<Utc>,
    /// Restrict selection to one category
    pub category: Option<String>,
    /// Target heart rate zone
    pub target_zone: Option<HeartRateZone>,
    /// Current weather
    pub weather: Option<WeatherConditions>,
    /// Planned total distance, enabling the final-kilometer phase
    pub planned_distance_m: Option<f64>,
    /// Extra template variables; override the built-in ones
    pub variables: HashMap<String, String>,
}

impl TickInput {
    /// Tick evaluated at `now` with no extra inputs
    #[must_use]
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            category: None,
            target_zone: None,
            weather: None,
            planned_distance_m: None,
            variables: HashMap::new(),
        }
    }
}

impl Default for TickInput {
    fn default() -> Self {
        Self::at(Utc::now())
    }
}

struct CoachingState {
    selector: CoachingSelector,
    last_tick_pace: Option<f64>,
    recent_history: VecDeque<String>,
}

struct LiveRunInner {
    session_id: Uuid,
    owner_id: Uuid,
    coach_id: String,
    coach_persona: String,
    voice_profile_id: Option<String>,
    config: Arc<LiveCoachConfig>,
    session: Mutex<RunSession>,
    snapshot_tx: watch::Sender<RunSessionSnapshot>,
    heart_rate_tx: watch::Sender<Option<HeartRateSample>>,
    coaching: Mutex<CoachingState>,
    usage: Arc<UsageTracker>,
    fallback: FallbackGateway,
    collaborators: Collaborators,
    sync: SyncCoordinator,
    cancel: CancellationToken,
    active_owners: Arc<DashMap<Uuid, Uuid>>,
}

/// Handle to one active run
#[derive(Clone)]
pub struct LiveRun {
    inner: Arc<LiveRunInner>,
}

impl std::fmt::Debug for LiveRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveRun")
            .field("session_id", &self.inner.session_id)
            .field("owner_id", &self.inner.owner_id)
            .finish_non_exhaustive()
    }
}

impl LiveRun {
    fn new(
        registry: &SessionRegistry,
        session: RunSession,
        request: StartRequest,
        coach_persona: String,
    ) -> Self {
        let config = registry.config.clone();
        let snapshot = session.snapshot();
        let (snapshot_tx, _) = watch::channel(snapshot.clone());
        let (heart_rate_tx, _) = watch::channel(None);

        Self {
            inner: Arc::new(LiveRunInner {
                session_id: snapshot.session_id,
                owner_id: snapshot.owner_id,
                coach_id: request.coach_id,
                coach_persona,
                voice_profile_id: request.voice_profile_id,
                session: Mutex::new(session),
                snapshot_tx,
                heart_rate_tx,
                coaching: Mutex::new(CoachingState {
                    selector: CoachingSelector::new(
                        config.coaching.seed,
                        config.coaching.fallback_enabled,
                    ),
                    last_tick_pace: None,
                    recent_history: VecDeque::with_capacity(config.coaching.recent_history_len),
                }),
                usage: registry.usage.clone(),
                fallback: FallbackGateway::new(
                    registry.collaborators.generator.clone(),
                    &config.fallback,
                    config.coaching.seed,
                ),
                collaborators: registry.collaborators.clone(),
                sync: SyncCoordinator::new(
                    registry.collaborators.sync_client.clone(),
                    config.sync.clone(),
                ),
                cancel: CancellationToken::new(),
                active_owners: registry.active.clone(),
                config,
            }),
        }
    }

    /// Session identifier
    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.inner.session_id
    }

    /// Owner of the run
    #[must_use]
    pub fn owner_id(&self) -> Uuid {
        self.inner.owner_id
    }

    /// Coach delivering guidance
    #[must_use]
    pub fn coach_id(&self) -> &str {
        &self.inner.coach_id
    }

    /// Latest published snapshot
    #[must_use]
    pub fn snapshot(&self) -> RunSessionSnapshot {
        self.inner.snapshot_tx.borrow().clone()
    }

    /// Observe snapshots; the receiver starts at the current value
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RunSessionSnapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    /// Accepted track points so far
    pub async fn track(&self) -> Vec<TrackPoint> {
        self.inner.session.lock().await.track().to_vec()
    }

    /// Selection events recorded for this run
    #[must_use]
    pub fn selection_events(&self) -> Vec<SelectionEvent> {
        self.inner.usage.events_for_session(self.inner.session_id)
    }

    /// Token cancelled when the run ends
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.inner.cancel.clone()
    }

    /// Fold a position fix into the run
    pub async fn ingest_fix(&self, fix: &GeoFix) -> IngestOutcome {
        let inner = &self.inner;
        let mut session = inner.session.lock().await;
        let FixResult {
            outcome,
            transition,
        } = session.ingest_fix(fix);

        match &outcome {
            IngestOutcome::Accepted { point, .. } => {
                if let Err(e) = inner
                    .collaborators
                    .track_store
                    .save_track_point(inner.session_id, point)
                    .await
                {
                    warn!(
                        session.id = %inner.session_id,
                        error = %e,
                        "Failed to persist track point"
                    );
                }
            }
            IngestOutcome::Rejected(rejection) => {
                CoachLogger::log_ingest_rejection(inner.session_id, rejection);
            }
            IngestOutcome::Ignored => {
                debug!(session.id = %inner.session_id, state = %session.state(), "Fix ignored");
            }
        }

        if let Some(transition) = transition {
            self.log_transition(transition);
        }
        if outcome.point().is_some() || transition.is_some() {
            inner.snapshot_tx.send_replace(session.snapshot());
        }
        outcome
    }

    /// Store the latest heart rate; samples outside 30-240 bpm are dropped
    pub fn ingest_heart_rate(&self, bpm: u16, at: DateTime<Utc>) -> bool {
        if !(MIN_HEART_RATE_BPM..=MAX_HEART_RATE_BPM).contains(&bpm) {
            debug!(session.id = %self.inner.session_id, bpm, "Heart rate sample out of range");
            return false;
        }
        self.inner
            .heart_rate_tx
            .send_replace(Some(HeartRateSample { bpm, timestamp: at }));
        true
    }

    /// Pause the run; a no-op when already paused
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the run is active or paused
    pub async fn pause(&self) -> AppResult<RunSessionSnapshot> {
        let mut session = self.inner.session.lock().await;
        if let Some(transition) = session.pause()? {
            self.log_transition(transition);
            self.inner.snapshot_tx.send_replace(session.snapshot());
        }
        Ok(session.snapshot())
    }

    /// Resume the run; a no-op when already active
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the run is active or paused
    pub async fn resume(&self) -> AppResult<RunSessionSnapshot> {
        let mut session = self.inner.session.lock().await;
        if let Some(transition) = session.resume()? {
            self.log_transition(transition);
            self.inner.snapshot_tx.send_replace(session.snapshot());
        }
        Ok(session.snapshot())
    }

    /// End the run, freeze metrics, release the owner slot, and start syncing
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the run is active or paused
    pub async fn end(&self) -> AppResult<RunSessionSnapshot> {
        let inner = &self.inner;
        let mut session = inner.session.lock().await;
        let (transition, snapshot) = session.end(Utc::now())?;
        inner.cancel.cancel();
        self.log_transition(transition);
        inner.snapshot_tx.send_replace(snapshot.clone());
        inner
            .active_owners
            .remove_if(&inner.owner_id, |_, session_id| *session_id == inner.session_id);
        drop(session);
        inner.usage.release_session(inner.session_id);

        if let Err(e) = inner.collaborators.track_store.save_snapshot(&snapshot).await {
            warn!(session.id = %inner.session_id, error = %e, "Failed to persist final snapshot");
        }

        let run = self.clone();
        tokio::spawn(async move {
            if let Err(e) = run.inner.sync.sync(&run).await {
                warn!(session.id = %run.inner.session_id, error = %e, "Sync aborted");
            }
        });

        Ok(snapshot)
    }

    /// Retry a failed upload
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the session is in `SyncFailed`
    pub async fn retry_sync(&self) -> AppResult<SyncOutcome> {
        let state = self.inner.session.lock().await.state();
        if state != SessionState::SyncFailed {
            return Err(AppError::invalid_state(format!(
                "sync retry requires sync_failed, session is {state}"
            )));
        }
        self.inner.sync.retry(self).await
    }

    /// Evaluate one coaching decision and deliver it
    ///
    /// Returns `Ok(None)` when the run is not active, nothing matched with
    /// fallback disabled, or the run ended before delivery.
    ///
    /// # Errors
    ///
    /// Reserved for collaborator failures that cannot be recovered locally
    pub async fn coach_tick(&self, input: TickInput) -> AppResult<Option<CoachingMessage>> {
        let inner = &self.inner;
        if inner.cancel.is_cancelled() {
            return Ok(None);
        }
        let snapshot = inner.snapshot_tx.borrow().clone();
        if !snapshot.is_active() {
            debug!(session.id = %inner.session_id, state = %snapshot.state, "Skipping tick");
            return Ok(None);
        }
        let heart_rate = inner.heart_rate_tx.borrow().as_ref().map(|sample| sample.bpm);

        let mut coaching = inner.coaching.lock().await;
        let flags = self.condition_flags(&snapshot, &input, coaching.last_tick_pace);
        if snapshot.current_pace_secs_per_km.is_some() {
            coaching.last_tick_pace = snapshot.current_pace_secs_per_km;
        }

        let conditions = build_conditions(
            &snapshot,
            &ContextInput {
                heart_rate_bpm: heart_rate,
                target_zone: input.target_zone,
                weather: input.weather.as_ref(),
                flags,
            },
            &inner.config.coaching,
        );
        let variables = template_variables(&snapshot, heart_rate, &input.variables);
        let rules = inner.usage.rules_for_session(inner.session_id, &inner.coach_id);
        let query = SelectionQuery {
            coach_id: &inner.coach_id,
            category: input.category.as_deref(),
            conditions: &conditions,
            variables: &variables,
            now: input.now,
        };

        let message = match coaching.selector.select_message(&rules, &query) {
            SelectionResult::Matched { rule, text } => {
                CoachingMessage::from_rule(&rule, text, input.now)
            }
            SelectionResult::Fallback => {
                let request = GenerationRequest {
                    coach_persona: inner.coach_persona.clone(),
                    conditions: conditions.to_vec(),
                    recent_history: coaching.recent_history.iter().cloned().collect(),
                };
                let outcome = inner.fallback.generate(&request, &inner.cancel).await;
                let Some(message) = CoachingMessage::from_fallback(outcome, input.now) else {
                    return Ok(None);
                };
                message
            }
            SelectionResult::NoCandidates => {
                debug!(
                    session.id = %inner.session_id,
                    conditions = %conditions,
                    "No coaching candidates"
                );
                return Ok(None);
            }
        };

        if !self.deliver(&message).await {
            return Ok(None);
        }

        let history_len = inner.config.coaching.recent_history_len;
        if history_len > 0 {
            if coaching.recent_history.len() >= history_len {
                coaching.recent_history.pop_front();
            }
            coaching.recent_history.push_back(message.text.clone());
        }
        Ok(Some(message))
    }

    /// Tick on the configured interval until the run ends
    pub fn spawn_coaching_loop<F>(&self, mut inputs: F) -> JoinHandle<()>
    where
        F: FnMut() -> TickInput + Send + 'static,
    {
        let run = self.clone();
        let period = self.inner.config.coaching.tick_interval();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    () = run.inner.cancel.cancelled() => break,
                    _ = interval.tick() => {
                        if let Err(e) = run.coach_tick(inputs()).await {
                            warn!(
                                session.id = %run.inner.session_id,
                                error = %e,
                                "Coaching tick failed"
                            );
                        }
                    }
                }
            }
            debug!(session.id = %run.inner.session_id, "Coaching loop stopped");
        })
    }

    /// Claim the rule, speak outside the session lock, and record the outcome
    ///
    /// Returns `false` when the run ended first or the rule's use could not be
    /// claimed. A voice failure or timeout still records the selection.
    async fn deliver(&self, message: &CoachingMessage) -> bool {
        let inner = &self.inner;
        let session = inner.session.lock().await;
        if session.state().is_finished() {
            debug!(session.id = %inner.session_id, "Run ended before delivery, dropping message");
            return false;
        }
        if let Some(rule_id) = message.rule_id.as_deref() {
            if let Err(e) = inner.usage.reserve(inner.session_id, rule_id, message.created_at) {
                debug!(
                    session.id = %inner.session_id,
                    rule.id = rule_id,
                    error = %e,
                    "Rule no longer available"
                );
                return false;
            }
        }
        drop(session);

        let speak = inner
            .collaborators
            .voice
            .speak(&message.text, inner.voice_profile_id.as_deref());
        let delivered = tokio::select! {
            biased;
            () = inner.cancel.cancelled() => {
                debug!(session.id = %inner.session_id, "Run ended during delivery, dropping message");
                return false;
            }
            result = tokio::time::timeout(inner.config.coaching.voice_timeout(), speak) => {
                match result {
                    Ok(Ok(())) => true,
                    Ok(Err(e)) => {
                        warn!(session.id = %inner.session_id, error = %e, "Voice delivery failed");
                        false
                    }
                    Err(_) => {
                        warn!(session.id = %inner.session_id, "Voice delivery timed out");
                        false
                    }
                }
            }
        };

        inner.usage.log_event(SelectionEvent {
            session_id: inner.session_id,
            rule_id: message.rule_id.clone(),
            source: message.source,
            timestamp: message.created_at,
            text: message.text.clone(),
            delivered,
        });
        true
    }

    fn condition_flags(
        &self,
        snapshot: &RunSessionSnapshot,
        input: &TickInput,
        previous_pace: Option<f64>,
    ) -> ConditionFlags {
        let warmup_done = snapshot.moving_secs >= self.inner.config.coaching.warmup_secs as f64;
        let (slowing, speeding_up) = match (previous_pace, snapshot.current_pace_secs_per_km) {
            (Some(previous), Some(current)) if previous > 0.0 => (
                current > previous * (1.0 + PACE_TREND_BAND),
                current < previous * (1.0 - PACE_TREND_BAND),
            ),
            _ => (false, false),
        };

        ConditionFlags {
            first_km: warmup_done && snapshot.distance_m < METERS_PER_KM,
            final_km: input
                .planned_distance_m
                .is_some_and(|planned| planned - snapshot.distance_m <= METERS_PER_KM),
            slowing,
            speeding_up,
        }
    }

    fn log_transition(&self, transition: Transition) {
        CoachLogger::log_transition(self.inner.session_id, transition.from, transition.to);
    }
}

/// Built-in template variables, overridden by caller-supplied ones
fn template_variables(
    snapshot: &RunSessionSnapshot,
    heart_rate: Option<u16>,
    extra: &HashMap<String, String>,
) -> HashMap<String, String> {
    let mut variables = HashMap::new();
    variables.insert("distance_km".to_owned(), format!("{:.2}", snapshot.distance_km()));
    variables.insert(
        "elapsed_min".to_owned(),
        format!("{:.0}", snapshot.moving_secs / 60.0),
    );
    variables.insert("calories".to_owned(), format!("{:.0}", snapshot.calories_kcal));
    if let Some(pace) = snapshot.current_pace_secs_per_km {
        variables.insert("pace".to_owned(), format_pace(pace));
    }
    if let Some(pace) = snapshot.average_pace_secs_per_km {
        variables.insert("average_pace".to_owned(), format_pace(pace));
    }
    if let Some(pace) = snapshot.target_pace_secs_per_km {
        variables.insert("target_pace".to_owned(), format_pace(pace));
    }
    if let Some(bpm) = heart_rate {
        variables.insert("heart_rate".to_owned(), bpm.to_string());
    }
    variables.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
    variables
}

#[async_trait]
impl SyncTarget for LiveRun {
    fn session_id(&self) -> Uuid {
        self.inner.session_id
    }

    async fn sync_payload(&self) -> (RunSessionSnapshot, Vec<TrackPoint>) {
        let session = self.inner.session.lock().await;
        (session.snapshot(), session.track().to_vec())
    }

    async fn set_sync_state(&self, state: SessionState) -> AppResult<()> {
        let mut session = self.inner.session.lock().await;
        let transition = session.transition_sync(state)?;
        self.log_transition(transition);
        self.inner.snapshot_tx.send_replace(session.snapshot());
        Ok(())
    }
}
