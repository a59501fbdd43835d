//! Data model for document analysis.
//!
//! Every entity here is constructed, used, and discarded within a single
//! analysis call; no persistent state is owned by this subsystem.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// =============================================================================
// REQUEST SIDE
// =============================================================================

/// Options controlling restriction and context behavior for one analysis call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOptions {
    /// Restrict assigned tags to the existing tag names, both at the prompt
    /// level and by post-hoc filtering.
    #[serde(default)]
    pub restrict_to_existing_tags: bool,
    /// Restrict the correspondent to existing names at the prompt level.
    /// There is no post-hoc correspondent filter.
    #[serde(default)]
    pub restrict_to_existing_correspondents: bool,
    /// Restrict the document type to the existing type names, both at the
    /// prompt level and by post-hoc filtering.
    #[serde(default)]
    pub restrict_to_existing_document_types: bool,
    /// When no restriction flag is set, list existing names in the prompt as
    /// non-binding reference material.
    #[serde(default)]
    pub use_existing_data: bool,
    /// Opaque caller-supplied context appended to the prompt, subject to a
    /// token ceiling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_api_data: Option<JsonValue>,
}

/// Immutable input to one analysis call.
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    /// Document text to analyze.
    pub content: String,
    /// Existing tag names (allow-list and reference material).
    pub existing_tags: Vec<String>,
    /// Existing correspondent names.
    pub existing_correspondents: Vec<String>,
    /// Existing document-type names.
    pub existing_document_types: Vec<String>,
    /// Document identifier, opaque to this subsystem.
    pub document_id: String,
    /// Optional prompt override replacing the built instructional text.
    pub custom_prompt: Option<String>,
    /// Per-call options.
    pub options: AnalysisOptions,
}

/// One custom field the model must fill in, sourced from configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomFieldSpec {
    /// Field name as it appears in the `custom_fields` template.
    pub name: String,
    /// Hint describing the expected value, shown to the model.
    pub value_hint: String,
}

/// Assembled prompt pair plus the computed budgets. Created fresh per call.
#[derive(Debug, Clone)]
pub struct PromptBundle {
    /// System prompt: instructions, templates, restriction blocks.
    pub system_prompt: String,
    /// User prompt: the (possibly truncated) document content.
    pub user_prompt: String,
    /// Estimated token count of the system prompt.
    pub prompt_tokens: usize,
    /// Tokens left for document content after prompt and response reserve.
    pub available_tokens: usize,
    /// Whether the document content was shortened to fit the budget.
    pub truncated: bool,
}

// =============================================================================
// RESULT SIDE
// =============================================================================

/// Normalized analysis output.
///
/// Invariant: `tags` is always present (possibly empty), never null. All
/// scalar fields degrade to `None` when absent or mistyped in model output.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub correspondent: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub document_type: Option<String>,
    /// Document date in `YYYY-MM-DD` form, or `None`.
    #[serde(default)]
    pub document_date: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub custom_fields: Option<serde_json::Map<String, JsonValue>>,
}

impl AnalysisResult {
    /// The degraded fallback shape returned when model output cannot be
    /// parsed: empty tags, everything else null.
    pub fn degraded() -> Self {
        Self::default()
    }
}

/// Token usage reported by a backend. All zeros when the backend does not
/// report usage (the Ollama generate endpoint).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UsageMetrics {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl UsageMetrics {
    /// True when the backend reported nothing.
    pub fn is_empty(&self) -> bool {
        self.prompt_tokens == 0 && self.completion_tokens == 0 && self.total_tokens == 0
    }
}

/// The complete outcome of one analysis call.
///
/// Analysis never raises past its boundary: failures surface as the `error`
/// field alongside a degraded `document`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    /// Normalized (and restriction-enforced) metadata.
    pub document: AnalysisResult,
    /// Backend usage metrics, when the call reached a backend.
    pub metrics: Option<UsageMetrics>,
    /// Whether the document content was truncated to fit the token budget.
    pub truncated: bool,
    /// Human-readable failure description, `None` on clean success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisOutcome {
    /// A degraded outcome carrying an error description.
    pub fn degraded(error: impl Into<String>) -> Self {
        Self {
            document: AnalysisResult::degraded(),
            metrics: None,
            truncated: false,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degraded_result_shape() {
        let result = AnalysisResult::degraded();
        assert!(result.tags.is_empty());
        assert!(result.correspondent.is_none());
        assert!(result.title.is_none());
        assert!(result.document_type.is_none());
        assert!(result.document_date.is_none());
        assert!(result.language.is_none());
        assert!(result.custom_fields.is_none());
    }

    #[test]
    fn test_result_serialization_always_has_tags() {
        let result = AnalysisResult::degraded();
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("tags").unwrap().is_array());
    }

    #[test]
    fn test_result_deserialization_defaults() {
        let result: AnalysisResult = serde_json::from_str(r#"{"title": "Invoice"}"#).unwrap();
        assert_eq!(result.title.as_deref(), Some("Invoice"));
        assert!(result.tags.is_empty());
        assert!(result.correspondent.is_none());
    }

    #[test]
    fn test_options_deserialize_camel_case() {
        let json = r#"{
            "restrictToExistingTags": true,
            "restrictToExistingDocumentTypes": false,
            "externalApiData": {"order": 42}
        }"#;
        let options: AnalysisOptions = serde_json::from_str(json).unwrap();
        assert!(options.restrict_to_existing_tags);
        assert!(!options.restrict_to_existing_correspondents);
        assert!(!options.restrict_to_existing_document_types);
        assert!(options.external_api_data.is_some());
    }

    #[test]
    fn test_usage_metrics_is_empty() {
        assert!(UsageMetrics::default().is_empty());
        let usage = UsageMetrics {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        };
        assert!(!usage.is_empty());
    }

    #[test]
    fn test_degraded_outcome_carries_error() {
        let outcome = AnalysisOutcome::degraded("backend unreachable");
        assert_eq!(outcome.error.as_deref(), Some("backend unreachable"));
        assert!(outcome.document.tags.is_empty());
        assert!(outcome.metrics.is_none());
        assert!(!outcome.truncated);
    }

    #[test]
    fn test_custom_field_spec_roundtrip() {
        let spec = CustomFieldSpec {
            name: "invoice_number".to_string(),
            value_hint: "string or null".to_string(),
        };
        let json = serde_json::to_string(&spec).unwrap();
        let back: CustomFieldSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(spec, back);
    }
}
