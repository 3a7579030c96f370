// ABOUTME: Replays a recorded GPS track through a live run with in-memory collaborators
// ABOUTME: Prints every coaching line the engine would have spoken and the final session snapshot
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Coaching replay tool.
//!
//! Usage:
//! ```bash
//! # Replay a track against a rule catalog, ticking every 10 fixes
//! cargo run --bin pierre-coach-replay -- --fixes run.json --rules coach.yaml
//!
//! # Aim for 5:00/km and tick every 30 fixes
//! cargo run --bin pierre-coach-replay -- --fixes run.json --rules coach.yaml \
//!     --target-pace 300 --tick-every 30
//!
//! # Use an OpenAI-compatible endpoint for fallback lines (LOCAL_LLM_* env vars)
//! cargo run --bin pierre-coach-replay -- --fixes run.json --rules coach.yaml --llm
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use pierre_core::models::{GeoFix, SessionState, WorkoutType};
use pierre_live_coach::coaching::{load_catalog_file, CoachingMessage};
use pierre_live_coach::collaborators::memory::{InMemoryCollaborators, ScriptedGenerator};
use pierre_live_coach::config::LiveCoachConfig;
use pierre_live_coach::live::{SessionRegistry, StartRequest, TickInput};
use pierre_live_coach::logging;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

/// How long to wait for the post-run upload before printing
const SYNC_WAIT_SECS: u64 = 10;

#[derive(Parser)]
#[command(
    name = "pierre-coach-replay",
    about = "Pierre live coach track replay",
    long_about = "Feed a recorded list of GPS fixes through the live coaching engine and print what it would say"
)]
struct ReplayArgs {
    /// JSON file holding an array of fixes
    #[arg(long)]
    fixes: PathBuf,

    /// YAML rule catalog
    #[arg(long)]
    rules: PathBuf,

    /// Coach id; defaults to the catalog's coach
    #[arg(long)]
    coach: Option<String>,

    /// Workout type (easy, tempo, intervals, long, recovery, race)
    #[arg(long, default_value = "easy")]
    workout: String,

    /// Target pace in seconds per kilometer
    #[arg(long)]
    target_pace: Option<f64>,

    /// Planned distance in meters, enables final-kilometer guidance
    #[arg(long)]
    planned_distance: Option<f64>,

    /// Evaluate coaching after every N fixes
    #[arg(long, default_value_t = 10)]
    tick_every: usize,

    /// Seed for tie-breaks and filler choice
    #[arg(long)]
    seed: Option<u64>,

    /// Line returned by the offline fallback generator
    #[arg(long, default_value = "Stay tall and keep the rhythm.")]
    fallback_line: String,

    /// Use the OpenAI-compatible generator configured by LOCAL_LLM_* variables
    #[arg(long)]
    llm: bool,
}

#[derive(Serialize)]
struct ReplayReport<'a> {
    messages: &'a [CoachingMessage],
    rejected_fixes: usize,
    snapshot: pierre_core::models::RunSessionSnapshot,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_from_env()?;
    let args = ReplayArgs::parse();
    if args.tick_every == 0 {
        bail!("--tick-every must be at least 1");
    }

    let raw = tokio::fs::read_to_string(&args.fixes)
        .await
        .with_context(|| format!("Failed to read {}", args.fixes.display()))?;
    let fixes: Vec<GeoFix> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse fixes in {}", args.fixes.display()))?;
    let Some(first) = fixes.first() else {
        bail!("{} contains no fixes", args.fixes.display());
    };

    let catalog = load_catalog_file(&args.rules).await?;
    let coach_id = args.coach.clone().unwrap_or_else(|| catalog.coach_id.clone());
    let workout_type = WorkoutType::parse(&args.workout)
        .with_context(|| format!("Unknown workout type '{}'", args.workout))?;

    let mut config = LiveCoachConfig::load()?;
    if let Some(seed) = args.seed {
        config.coaching.seed = seed;
    }

    let memory = InMemoryCollaborators::new(
        catalog.into(),
        ScriptedGenerator::replying(args.fallback_line.clone()),
    );
    let mut collaborators = memory.as_collaborators();
    if args.llm {
        collaborators.generator = llm_generator()?;
    }

    let registry = SessionRegistry::new(config, collaborators);
    let mut request = StartRequest::new(coach_id)
        .with_workout_type(workout_type)
        .starting_at(first.timestamp);
    if let Some(pace) = args.target_pace {
        request = request.with_target_pace(pace);
    }
    let run = registry.start(Uuid::new_v4(), request).await?;
    info!(session.id = %run.session_id(), fixes = fixes.len(), "Replaying track");

    let mut messages = Vec::new();
    let mut rejected_fixes = 0;
    for (index, fix) in fixes.iter().enumerate() {
        if run.ingest_fix(fix).await.rejection().is_some() {
            rejected_fixes += 1;
        }
        if (index + 1) % args.tick_every != 0 {
            continue;
        }

        let mut tick = TickInput::at(fix.timestamp);
        tick.planned_distance_m = args.planned_distance;
        if let Some(message) = run.coach_tick(tick).await? {
            println!(
                "[{}] {:>7.0} m  {:?}: {}",
                fix.timestamp.format("%H:%M:%S"),
                run.snapshot().distance_m,
                message.source,
                message.text
            );
            messages.push(message);
        }
    }

    run.end().await?;
    let mut updates = run.subscribe();
    let settled = tokio::time::timeout(
        Duration::from_secs(SYNC_WAIT_SECS),
        updates.wait_for(|s| matches!(s.state, SessionState::Synced | SessionState::SyncFailed)),
    )
    .await;
    if !matches!(settled, Ok(Ok(_))) {
        warn!(session.id = %run.session_id(), "Sync did not settle before exit");
    }

    let report = ReplayReport {
        messages: &messages,
        rejected_fixes,
        snapshot: run.snapshot(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(feature = "llm-openai-compatible")]
fn llm_generator() -> Result<Arc<dyn pierre_live_coach::collaborators::CoachTextGenerator>> {
    Ok(Arc::new(
        pierre_live_coach::llm::OpenAiCompatibleGenerator::from_env()?,
    ))
}

#[cfg(not(feature = "llm-openai-compatible"))]
fn llm_generator() -> Result<Arc<dyn pierre_live_coach::collaborators::CoachTextGenerator>> {
    bail!("--llm requires the llm-openai-compatible feature")
}
