// ABOUTME: Logging configuration and structured logging setup for the live coaching engine
// ABOUTME: Configures log levels, formatters, and domain-specific structured log helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Production-ready logging configuration with structured output

use std::env;
use std::io;

use anyhow::Result;
use pierre_core::constants::service_names;
use pierre_core::errors::IngestRejection;
use pierre_core::models::{MessageSource, SessionState};
use tracing::level_filters::LevelFilter;
use tracing::{debug, info, warn};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};
use uuid::Uuid;

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty, compact)
    pub format: LogFormat,
    /// Include source file and line numbers
    pub include_location: bool,
    /// Include thread information
    pub include_thread: bool,
    /// Include span open/close events
    pub include_spans: bool,
    /// Service name for structured logging
    pub service_name: String,
    /// Service version
    pub service_version: String,
    /// Environment (development, staging, production)
    pub environment: String,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// `JSON` format for production logging
    Json,
    /// Pretty format for development
    Pretty,
    /// Compact format for on-device logs
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty,
            include_location: false,
            include_thread: false,
            include_spans: false,
            service_name: service_names::PIERRE_LIVE_COACH.into(),
            service_version: env!("CARGO_PKG_VERSION").to_owned(),
            environment: "development".into(),
        }
    }
}

impl LoggingConfig {
    /// Create logging configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let level = env::var("RUST_LOG").unwrap_or_else(|_| "info".into());

        let format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") => LogFormat::Compact,
            _ => LogFormat::Pretty,
        };

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let is_production = environment == "production";

        Self {
            level,
            format,
            include_location: is_production || env::var("LOG_INCLUDE_LOCATION").is_ok(),
            include_thread: is_production || env::var("LOG_INCLUDE_THREAD").is_ok(),
            include_spans: env::var("LOG_INCLUDE_SPANS").is_ok(),
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| service_names::PIERRE_LIVE_COACH.into()),
            service_version: env::var("SERVICE_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_owned()),
            environment,
        }
    }

    /// Build the filter: the configured level plus noise reduction for HTTP internals
    fn env_filter(&self) -> EnvFilter {
        let base = env::var("RUST_LOG").unwrap_or_else(|_| self.level.clone());
        let mut filter = EnvFilter::new(base);
        for directive in ["hyper=warn", "hyper::proto=warn", "reqwest=warn"] {
            if let Ok(parsed) = directive.parse() {
                filter = filter.add_directive(parsed);
            }
        }
        filter.add_directive(
            format!("pierre_live_coach={}", self.level)
                .parse()
                .unwrap_or_else(|_| LevelFilter::INFO.into()),
        )
    }

    /// Initialize the global tracing subscriber
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber has already been installed
    pub fn init(&self) -> Result<()> {
        let registry = tracing_subscriber::registry().with(self.env_filter());
        let span_events = if self.include_spans {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        match self.format {
            LogFormat::Json => {
                let json_layer = fmt::layer()
                    .with_file(self.include_location)
                    .with_line_number(self.include_location)
                    .with_thread_ids(self.include_thread)
                    .with_thread_names(self.include_thread)
                    .with_target(true)
                    .with_writer(io::stdout)
                    .with_span_events(span_events)
                    .json();
                registry.with(json_layer).try_init()?;
            }
            LogFormat::Pretty => {
                let pretty_layer = fmt::layer()
                    .with_file(self.include_location)
                    .with_line_number(self.include_location)
                    .with_thread_ids(self.include_thread)
                    .with_thread_names(self.include_thread)
                    .with_target(true)
                    .with_writer(io::stdout)
                    .with_span_events(span_events);
                registry.with(pretty_layer).try_init()?;
            }
            LogFormat::Compact => {
                let compact_layer = fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(io::stdout)
                    .with_span_events(FmtSpan::NONE);
                registry.with(compact_layer).try_init()?;
            }
        }

        info!(
            service.name = %self.service_name,
            service.version = %self.service_version,
            environment = %self.environment,
            log.level = %self.level,
            log.format = ?self.format,
            "Pierre live coach starting up"
        );

        Ok(())
    }
}

/// Initialize logging from environment
///
/// # Errors
///
/// Returns an error if logging initialization fails
pub fn init_from_env() -> Result<()> {
    LoggingConfig::from_env().init()
}

/// Domain-specific structured log events
pub struct CoachLogger;

impl CoachLogger {
    /// Log a dropped position fix
    pub fn log_ingest_rejection(session_id: Uuid, rejection: &IngestRejection) {
        match rejection {
            IngestRejection::ImplausibleJump { .. } | IngestRejection::InvalidCoordinate { .. } => {
                warn!(
                    session.id = %session_id,
                    ingest.reason = rejection.label(),
                    ingest.details = %rejection,
                    "Position fix rejected"
                );
            }
            IngestRejection::LowAccuracy { .. } | IngestRejection::OutOfOrder { .. } => {
                debug!(
                    session.id = %session_id,
                    ingest.reason = rejection.label(),
                    ingest.details = %rejection,
                    "Position fix rejected"
                );
            }
        }
    }

    /// Log a session lifecycle transition
    pub fn log_transition(session_id: Uuid, from: SessionState, to: SessionState) {
        info!(
            session.id = %session_id,
            session.from = %from,
            session.to = %to,
            "Session state transition"
        );
    }

    /// Log a coaching selection
    pub fn log_selection(
        session_id: Uuid,
        rule_id: Option<&str>,
        source: MessageSource,
        delivered: bool,
    ) {
        info!(
            session.id = %session_id,
            coaching.rule = rule_id.unwrap_or("none"),
            coaching.source = ?source,
            coaching.delivered = delivered,
            "Coaching message selected"
        );
    }

    /// Log a sync attempt outcome
    pub fn log_sync_attempt(session_id: Uuid, attempt: u32, success: bool, details: Option<&str>) {
        if success {
            info!(
                session.id = %session_id,
                sync.attempt = attempt,
                "Session synced"
            );
        } else {
            warn!(
                session.id = %session_id,
                sync.attempt = attempt,
                sync.details = details.unwrap_or(""),
                "Session sync attempt failed"
            );
        }
    }
}
