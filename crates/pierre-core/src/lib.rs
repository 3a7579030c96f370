// ABOUTME: Core types and constants for the Pierre live coaching engine
// ABOUTME: Foundation crate with error handling, telemetry/session/coaching models, and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Pierre Core
//!
//! Foundation crate providing shared types and constants for the Pierre live
//! coaching engine. This crate is designed to change infrequently, enabling
//! incremental compilation benefits in the workspace.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, and domain-specific errors
//! - **constants**: Tracking, coaching, and physiological constants organized by domain
//! - **models**: Telemetry, run session, and coaching rule data models

/// Unified error handling system with standard error codes
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Core data models (`GeoFix`, `TrackPoint`, `RunSessionSnapshot`, `CoachingRule`, etc.)
pub mod models;
