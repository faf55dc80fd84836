//! Orchestrator utility functions

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Compute a short hash for a prompt
///
/// Returns an 8-character hexadecimal hash suitable for logging, so prompts
/// can be correlated across log lines without being written out.
pub fn hash_prompt(prompt: &str) -> String {
    let mut hasher = DefaultHasher::new();
    prompt.hash(&mut hasher);
    format!("{:016x}", hasher.finish())[..8].to_string()
}

/// Extract a JSON document from model output
///
/// Models often wrap JSON in a markdown code fence even when asked for raw
/// JSON; the fence is stripped before parsing.
pub fn parse_json_output(text: &str) -> Result<serde_json::Value, serde_json::Error> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed);
    serde_json::from_str(body.trim())
}
