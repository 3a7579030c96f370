// ABOUTME: Generative text providers implementing the coaching text generator interface
// ABOUTME: Compiled behind the llm-openai-compatible feature
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// `OpenAI`-compatible chat completions provider
#[cfg(feature = "llm-openai-compatible")]
pub mod openai_compatible;

#[cfg(feature = "llm-openai-compatible")]
pub use openai_compatible::{OpenAiCompatibleConfig, OpenAiCompatibleGenerator};
