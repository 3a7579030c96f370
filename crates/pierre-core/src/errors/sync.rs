// ABOUTME: Errors reported by the sync collaborator when uploading a finished run
// ABOUTME: Transient errors are retried with backoff; terminal errors fail immediately
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use thiserror::Error;

use super::{AppError, ErrorCode};

/// Sync collaborator failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Network hiccup, rate limit, or server error; worth retrying
    #[error("transient sync failure: {0}")]
    Transient(String),
    /// Rejected payload or revoked credentials; retrying will not help
    #[error("terminal sync failure: {0}")]
    Terminal(String),
}

impl SyncError {
    /// Whether the coordinator should schedule another attempt
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

impl From<SyncError> for AppError {
    fn from(error: SyncError) -> Self {
        let code = if error.is_retryable() {
            ErrorCode::ExternalServiceUnavailable
        } else {
            ErrorCode::ExternalServiceError
        };
        Self::new(code, error.to_string()).with_source(error)
    }
}
