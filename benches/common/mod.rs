// ABOUTME: Common benchmark utilities and fixtures for the live coaching engine
// ABOUTME: Provides deterministic tracks and rule sets shared by Criterion benchmarks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Common benchmark utilities and test fixtures.

pub mod fixtures;
