//! Insight payload returned by the external summarizer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Short natural-language summary of an engine result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    /// One-line headline.
    pub summary: String,
    /// Ordered supporting statements.
    pub bullets: Vec<String>,
    /// Provider specific structured data.
    #[serde(default)]
    pub meta: Value,
}
