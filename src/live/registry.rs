// ABOUTME: Session registry enforcing a single live run per owner
// ABOUTME: Claims the owner slot atomically, primes the coach's rules, and hands out LiveRun handles
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use pierre_core::errors::{AppResult, SessionStateError};
use tracing::info;
use uuid::Uuid;

use super::{LiveRun, StartRequest};
use crate::coaching::UsageTracker;
use crate::collaborators::Collaborators;
use crate::config::LiveCoachConfig;
use crate::logging::CoachLogger;
use crate::session::{RunSession, SessionParams};

const DEFAULT_PERSONA: &str = "a supportive running coach";

/// Creates runs and tracks which owners currently hold one
pub struct SessionRegistry {
    pub(super) config: Arc<LiveCoachConfig>,
    pub(super) collaborators: Collaborators,
    pub(super) usage: Arc<UsageTracker>,
    /// Owner id to the session holding the owner's slot
    pub(super) active: Arc<DashMap<Uuid, Uuid>>,
}

impl SessionRegistry {
    /// Create a registry
    #[must_use]
    pub fn new(config: LiveCoachConfig, collaborators: Collaborators) -> Self {
        Self {
            config: Arc::new(config),
            collaborators,
            usage: Arc::new(UsageTracker::new()),
            active: Arc::new(DashMap::new()),
        }
    }

    /// Shared usage tracker
    #[must_use]
    pub const fn usage(&self) -> &Arc<UsageTracker> {
        &self.usage
    }

    /// Session currently holding `owner_id`'s slot
    #[must_use]
    pub fn active_session(&self, owner_id: Uuid) -> Option<Uuid> {
        self.active.get(&owner_id).map(|entry| *entry.value())
    }

    /// Start a run for `owner_id`
    ///
    /// Loads the coach's rules and zeroes the new run's counters before the
    /// run becomes active. Other runs keep their counters.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` (`AlreadyActive`) if the owner already has an
    /// active or paused run, or the rule catalog's error if loading fails.
    pub async fn start(&self, owner_id: Uuid, request: StartRequest) -> AppResult<LiveRun> {
        let mut session = RunSession::new(
            SessionParams {
                owner_id,
                coach_id: request.coach_id.clone(),
                workout_type: request.workout_type,
                target_pace_secs_per_km: request.target_pace_secs_per_km,
                body_weight_kg: self.config.athlete.body_weight_kg,
            },
            self.config.tracking.clone(),
        );
        let session_id = session.id();

        match self.active.entry(owner_id) {
            Entry::Occupied(existing) => {
                return Err(SessionStateError::AlreadyActive {
                    owner_id,
                    session_id: *existing.get(),
                }
                .into());
            }
            Entry::Vacant(slot) => {
                slot.insert(session_id);
            }
        }

        let persona = match self.prepare_coach(session_id, &request.coach_id).await {
            Ok(persona) => persona,
            Err(e) => {
                self.active.remove(&owner_id);
                return Err(e);
            }
        };

        let transition = match session.start(request.started_at.unwrap_or_else(Utc::now)) {
            Ok(transition) => transition,
            Err(e) => {
                self.active.remove(&owner_id);
                return Err(e.into());
            }
        };
        CoachLogger::log_transition(session_id, transition.from, transition.to);
        info!(
            session.id = %session_id,
            owner.id = %owner_id,
            coach.id = %request.coach_id,
            "Run started"
        );

        Ok(LiveRun::new(self, session, request, persona))
    }

    async fn prepare_coach(&self, session_id: Uuid, coach_id: &str) -> AppResult<String> {
        let catalog = &self.collaborators.rule_catalog;
        let rules = catalog.rules_for_coach(coach_id).await?;
        self.usage.load_rules(rules);
        self.usage.reset_for_new_session(session_id, coach_id);
        Ok(catalog
            .coach_persona(coach_id)
            .await?
            .unwrap_or_else(|| DEFAULT_PERSONA.to_owned()))
    }
}
