// ABOUTME: Run session lifecycle misuse errors surfaced to the caller
// ABOUTME: Never retried automatically; converts into AppError with InvalidState
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use thiserror::Error;
use uuid::Uuid;

use super::{AppError, ErrorCode};
use crate::models::SessionState;

/// Lifecycle operation attempted in a state that does not allow it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionStateError {
    /// The owner already has a session in `Active` or `Paused`
    #[error("owner {owner_id} already has active session {session_id}")]
    AlreadyActive {
        /// Owner attempting to start
        owner_id: Uuid,
        /// Session currently holding the owner slot
        session_id: Uuid,
    },
    /// `start` was called on a session that already left `NotStarted`
    #[error("session already started (state: {state})")]
    AlreadyStarted {
        /// Current state
        state: SessionState,
    },
    /// A sync transition was requested from a state that does not allow it
    #[error("invalid sync transition from {from} to {to}")]
    InvalidTransition {
        /// Current state
        from: SessionState,
        /// Requested state
        to: SessionState,
    },
    /// The session is not `Active` or `Paused`
    #[error("session is not active (state: {state})")]
    NotActive {
        /// State the session was in when the operation was attempted
        state: SessionState,
    },
}

impl From<SessionStateError> for AppError {
    fn from(error: SessionStateError) -> Self {
        Self::new(ErrorCode::InvalidState, error.to_string()).with_source(error)
    }
}
