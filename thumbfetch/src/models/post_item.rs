//! Post record as read from the input batch

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Handle shown in outcome lines when a record has none
pub const UNKNOWN_HANDLE: &str = "unknown";

/// One post record
///
/// Stored as the raw JSON object so every input field survives untouched and in
/// order; enrichment only appends `display_url`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostItem(Map<String, Value>);

impl PostItem {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Convenience constructor for the two fields the pipeline reads
    pub fn with_shortcode(shortcode: &str, handle: Option<&str>) -> Self {
        let mut fields = Map::new();
        fields.insert("shortcode".to_string(), Value::String(shortcode.to_string()));
        if let Some(handle) = handle {
            fields.insert("handle".to_string(), Value::String(handle.to_string()));
        }
        Self(fields)
    }

    /// Shortcode, if present as a non-empty string
    pub fn shortcode(&self) -> Option<&str> {
        self.0
            .get("shortcode")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Owner handle, or [`UNKNOWN_HANDLE`]
    pub fn handle(&self) -> &str {
        self.0
            .get("handle")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_HANDLE)
    }

    pub fn display_url(&self) -> Option<&str> {
        self.0.get("display_url").and_then(Value::as_str)
    }

    /// Copy of this record with `display_url` attached
    pub fn enriched(&self, display_url: &str) -> Self {
        let mut fields = self.0.clone();
        fields.insert(
            "display_url".to_string(),
            Value::String(display_url.to_string()),
        );
        Self(fields)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}
