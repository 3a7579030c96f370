// ABOUTME: Hands finished sessions to the sync collaborator and folds results into sync states
// ABOUTME: Transient failures retry with capped exponential backoff plus jitter; terminal ones stop
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pierre_core::errors::{AppResult, SyncError};
use pierre_core::models::{RunSessionSnapshot, SessionState, TrackPoint};
use rand::Rng;
use tracing::debug;
use uuid::Uuid;

use crate::collaborators::SyncClient;
use crate::config::SyncConfig;
use crate::logging::CoachLogger;

/// Final result of a sync run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The collaborator confirmed the upload
    Synced {
        /// Attempts used, including the successful one
        attempts: u32,
    },
    /// Retries exhausted or a terminal error; the session is `SyncFailed`
    Failed {
        /// Attempts used
        attempts: u32,
        /// Last error reported by the collaborator
        error: SyncError,
    },
}

impl SyncOutcome {
    /// Whether the upload succeeded
    #[must_use]
    pub const fn is_synced(&self) -> bool {
        matches!(self, Self::Synced { .. })
    }
}

/// Session whose sync state the coordinator drives
#[async_trait]
pub trait SyncTarget: Send + Sync {
    /// Session identifier, for logging
    fn session_id(&self) -> Uuid;

    /// Frozen snapshot and track to upload
    async fn sync_payload(&self) -> (RunSessionSnapshot, Vec<TrackPoint>);

    /// Apply a sync sub-state transition
    ///
    /// # Errors
    ///
    /// Returns an error if the transition is not allowed from the current state
    async fn set_sync_state(&self, state: SessionState) -> AppResult<()>;
}

/// Drives uploads through `SyncPending -> Syncing -> Synced | SyncFailed`
#[derive(Clone)]
pub struct SyncCoordinator {
    client: Arc<dyn SyncClient>,
    config: SyncConfig,
}

impl SyncCoordinator {
    /// Create a coordinator
    #[must_use]
    pub fn new(client: Arc<dyn SyncClient>, config: SyncConfig) -> Self {
        Self { client, config }
    }

    /// First sync after `Ended`
    ///
    /// # Errors
    ///
    /// Returns an error if the target rejects a state transition
    pub async fn sync(&self, target: &dyn SyncTarget) -> AppResult<SyncOutcome> {
        target.set_sync_state(SessionState::SyncPending).await?;
        self.run_attempts(target).await
    }

    /// Manual retry from `SyncFailed`
    ///
    /// # Errors
    ///
    /// Returns an error if the session is not in `SyncFailed`
    pub async fn retry(&self, target: &dyn SyncTarget) -> AppResult<SyncOutcome> {
        self.run_attempts(target).await
    }

    async fn run_attempts(&self, target: &dyn SyncTarget) -> AppResult<SyncOutcome> {
        let session_id = target.session_id();
        let (snapshot, track) = target.sync_payload().await;
        let mut attempt = 0_u32;

        loop {
            attempt += 1;
            target.set_sync_state(SessionState::Syncing).await?;

            let error = match self.client.upload(&snapshot, &track).await {
                Ok(()) => {
                    CoachLogger::log_sync_attempt(session_id, attempt, true, None);
                    target.set_sync_state(SessionState::Synced).await?;
                    return Ok(SyncOutcome::Synced { attempts: attempt });
                }
                Err(error) => error,
            };

            let detail = error.to_string();
            CoachLogger::log_sync_attempt(session_id, attempt, false, Some(&detail));

            if !error.is_retryable() || attempt >= self.config.max_attempts {
                target.set_sync_state(SessionState::SyncFailed).await?;
                return Ok(SyncOutcome::Failed {
                    attempts: attempt,
                    error,
                });
            }

            target.set_sync_state(SessionState::SyncPending).await?;
            let delay = self.backoff_delay(attempt);
            debug!(
                session.id = %session_id,
                sync.attempt = attempt,
                sync.delay_ms = delay.as_millis() as u64,
                "Scheduling sync retry"
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Delay before retry number `attempt + 1`
    ///
    /// `base * 2^(attempt - 1)` capped at `max_delay_ms`; with jitter enabled
    /// the delay is drawn uniformly from the upper half of that value.
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let capped = self
            .config
            .base_delay_ms
            .saturating_mul(1_u64 << exponent)
            .min(self.config.max_delay_ms);

        let millis = if self.config.jitter_enabled && capped > 1 {
            rand::thread_rng().gen_range(capped / 2..=capped)
        } else {
            capped
        };
        Duration::from_millis(millis)
    }
}
