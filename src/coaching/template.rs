// ABOUTME: Message template rendering with {variable} placeholders
// ABOUTME: Unresolved placeholders render empty; an unterminated brace is emitted literally
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::HashMap;

/// Substitute `{name}` placeholders from `variables`
#[must_use]
pub fn render_template(template: &str, variables: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        if let Some(value) = variables.get(after[..close].trim()) {
            out.push_str(value);
        }
        rest = &after[close + 1..];
    }

    out.push_str(rest);
    out
}

/// Format seconds per kilometer as `m:ss`
#[must_use]
pub fn format_pace(secs_per_km: f64) -> String {
    if !secs_per_km.is_finite() || secs_per_km < 0.0 {
        return String::new();
    }
    let total = secs_per_km.round() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
