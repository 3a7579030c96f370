// ABOUTME: Fallback gateway to the generative text collaborator when no rule matches
// ABOUTME: Bounded by a timeout, cancellable, and substitutes a filler line on any failure
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::collaborators::{CoachTextGenerator, GenerationRequest};
use crate::config::FallbackConfig;

/// Used only when the configured filler list is empty
const LAST_RESORT_FILLER: &str = "Keep going, you're doing great.";

/// Why a filler replaced generated text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillerReason {
    /// The collaborator did not answer within the timeout
    Timeout,
    /// The collaborator returned an error
    ServiceError,
    /// The collaborator answered with blank text
    EmptyResponse,
}

/// Result of one fallback call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackOutcome {
    /// Text produced by the collaborator
    Generated(String),
    /// A generic filler line
    Filler {
        /// The filler text
        text: String,
        /// What went wrong
        reason: FillerReason,
    },
    /// The run ended while waiting; nothing should be delivered
    Cancelled,
}

/// Boundary to the generative text collaborator
pub struct FallbackGateway {
    generator: Arc<dyn CoachTextGenerator>,
    timeout: Duration,
    fillers: Vec<String>,
    rng: Mutex<ChaCha8Rng>,
}

impl FallbackGateway {
    /// Create a gateway; `seed` drives filler choice
    #[must_use]
    pub fn new(
        generator: Arc<dyn CoachTextGenerator>,
        config: &FallbackConfig,
        seed: u64,
    ) -> Self {
        Self {
            generator,
            timeout: config.timeout(),
            fillers: config.fillers.clone(),
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    /// Ask the collaborator for a line, never waiting longer than the timeout
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> FallbackOutcome {
        let call = tokio::time::timeout(self.timeout, self.generator.generate(request));

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("Fallback generation cancelled");
                return FallbackOutcome::Cancelled;
            }
            result = call => result,
        };

        match result {
            Ok(Ok(text)) if !text.trim().is_empty() => {
                FallbackOutcome::Generated(text.trim().to_owned())
            }
            Ok(Ok(_)) => self.filler(FillerReason::EmptyResponse),
            Ok(Err(error)) => {
                warn!(error = %error, "Fallback generation failed, using filler");
                self.filler(FillerReason::ServiceError)
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.timeout.as_secs(),
                    "Fallback generation timed out, using filler"
                );
                self.filler(FillerReason::Timeout)
            }
        }
    }

    fn filler(&self, reason: FillerReason) -> FallbackOutcome {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let text = self
            .fillers
            .choose(&mut *rng)
            .map_or_else(|| LAST_RESORT_FILLER.to_owned(), Clone::clone);
        FallbackOutcome::Filler { text, reason }
    }
}
