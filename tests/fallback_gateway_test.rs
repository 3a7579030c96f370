// ABOUTME: Integration tests for the generative fallback gateway
// ABOUTME: Uses paused tokio time to exercise timeouts and cancellation without real waiting
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(missing_docs)]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{base_time, init_test_logging};
use pierre_core::models::MessageSource;
use pierre_live_coach::coaching::{CoachingMessage, FallbackGateway, FallbackOutcome, FillerReason};
use pierre_live_coach::collaborators::memory::ScriptedGenerator;
use pierre_live_coach::collaborators::GenerationRequest;
use pierre_live_coach::config::FallbackConfig;
use tokio_util::sync::CancellationToken;

fn request() -> GenerationRequest {
    GenerationRequest {
        coach_persona: "a calm coach".to_owned(),
        conditions: vec!["phase:main".to_owned()],
        recent_history: Vec::new(),
    }
}

fn gateway(generator: ScriptedGenerator, seed: u64) -> (FallbackGateway, FallbackConfig) {
    init_test_logging();
    let config = FallbackConfig::default();
    (
        FallbackGateway::new(Arc::new(generator), &config, seed),
        config,
    )
}

#[tokio::test(start_paused = true)]
async fn test_generated_text_is_trimmed() {
    let (gateway, _) = gateway(ScriptedGenerator::replying("  Shoulders down.\n"), 1);
    let outcome = gateway.generate(&request(), &CancellationToken::new()).await;
    assert_eq!(outcome, FallbackOutcome::Generated("Shoulders down.".to_owned()));
}

#[tokio::test(start_paused = true)]
async fn test_slow_generator_times_out_with_filler() {
    let generator = ScriptedGenerator::replying("too late").with_delay(Duration::from_secs(20));
    let (gateway, config) = gateway(generator, 1);

    let started = tokio::time::Instant::now();
    let outcome = gateway.generate(&request(), &CancellationToken::new()).await;
    let waited = started.elapsed();

    match outcome {
        FallbackOutcome::Filler { text, reason } => {
            assert_eq!(reason, FillerReason::Timeout);
            assert!(config.fillers.contains(&text));
        }
        other => panic!("expected a filler, got {other:?}"),
    }
    assert!(waited >= config.timeout());
    assert!(waited < Duration::from_secs(20));
}

#[tokio::test(start_paused = true)]
async fn test_service_error_and_blank_reply_use_filler() {
    let (failing, _) = gateway(ScriptedGenerator::failing(), 1);
    let outcome = failing.generate(&request(), &CancellationToken::new()).await;
    assert!(matches!(
        outcome,
        FallbackOutcome::Filler {
            reason: FillerReason::ServiceError,
            ..
        }
    ));

    let (blank, _) = gateway(ScriptedGenerator::replying("   "), 1);
    let outcome = blank.generate(&request(), &CancellationToken::new()).await;
    assert!(matches!(
        outcome,
        FallbackOutcome::Filler {
            reason: FillerReason::EmptyResponse,
            ..
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_drops_the_call() {
    let generator = ScriptedGenerator::replying("never").with_delay(Duration::from_secs(5));
    let (gateway, _) = gateway(generator.clone(), 1);
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let outcome = gateway.generate(&request(), &cancel).await;
    assert_eq!(outcome, FallbackOutcome::Cancelled);
    assert_eq!(generator.requests().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_already_cancelled_token_returns_immediately() {
    let (gateway, _) = gateway(ScriptedGenerator::replying("hello"), 1);
    let cancel = CancellationToken::new();
    cancel.cancel();
    assert_eq!(
        gateway.generate(&request(), &cancel).await,
        FallbackOutcome::Cancelled
    );
}

#[tokio::test(start_paused = true)]
async fn test_filler_choice_is_seeded() {
    let fillers = |seed: u64| async move {
        let (gateway, _) = gateway(ScriptedGenerator::failing(), seed);
        let mut picked = Vec::new();
        for _ in 0..6 {
            if let FallbackOutcome::Filler { text, .. } =
                gateway.generate(&request(), &CancellationToken::new()).await
            {
                picked.push(text);
            }
        }
        picked
    };
    let first = fillers(9).await;
    assert_eq!(first.len(), 6);
    assert_eq!(first, fillers(9).await);
}

#[test]
fn test_fallback_outcomes_map_to_message_sources() {
    let generated =
        CoachingMessage::from_fallback(FallbackOutcome::Generated("Nice".to_owned()), base_time())
            .unwrap();
    assert_eq!(generated.source, MessageSource::Fallback);
    assert_eq!(generated.rule_id, None);

    let filler = CoachingMessage::from_fallback(
        FallbackOutcome::Filler {
            text: "Keep going".to_owned(),
            reason: FillerReason::Timeout,
        },
        base_time(),
    )
    .unwrap();
    assert_eq!(filler.source, MessageSource::Filler);
    assert_eq!(filler.text, "Keep going");

    assert!(CoachingMessage::from_fallback(FallbackOutcome::Cancelled, base_time()).is_none());
}
