//! JSON output formatting, pretty by default or compact on one line.

use super::OutputConfig;
use serde::Serialize;

/// JSON output formatter
pub struct JsonOutput;

impl JsonOutput {
    /// Format data as JSON string
    ///
    /// Serialization failures are rendered as an `{"error": ...}` object so
    /// callers always get valid JSON.
    pub fn format<T: Serialize + ?Sized>(data: &T, config: &OutputConfig) -> String {
        if config.compact {
            serde_json::to_string(data).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
        } else {
            serde_json::to_string_pretty(data)
                .unwrap_or_else(|e| format!("{{\n  \"error\": \"{}\"\n}}", e))
        }
    }
}
