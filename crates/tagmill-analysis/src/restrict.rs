//! Restriction enforcement.
//!
//! The prompt asks the model to stay inside the allow-lists; this module
//! guarantees it. Pure post-processing over a normalized result: tags
//! outside the allow-list are dropped (preserving model order), a
//! document type outside its allow-list is nulled. An empty allow-list
//! disables its filter, matching the prompt assembler which emits no
//! restriction block for an empty list. Correspondents are restricted
//! at the prompt level only and pass through untouched.

use tracing::info;

use tagmill_core::{AnalysisRequest, AnalysisResult};

/// Apply post-hoc restriction filtering to a normalized result.
///
/// Pure and idempotent: enforcing twice yields the same result as once.
pub fn enforce(mut result: AnalysisResult, request: &AnalysisRequest) -> AnalysisResult {
    let opts = &request.options;

    if opts.restrict_to_existing_tags && !request.existing_tags.is_empty() {
        let before = result.tags.len();
        result
            .tags
            .retain(|tag| request.existing_tags.iter().any(|allowed| allowed == tag));
        let dropped = before - result.tags.len();
        if dropped > 0 {
            info!(
                subsystem = "analysis",
                component = "restrict",
                document_id = %request.document_id,
                dropped_count = dropped,
                "Dropped tags outside the allow-list"
            );
        }
    }

    if opts.restrict_to_existing_document_types && !request.existing_document_types.is_empty() {
        if let Some(doc_type) = &result.document_type {
            let allowed = request
                .existing_document_types
                .iter()
                .any(|name| name == doc_type);
            if !allowed {
                info!(
                    subsystem = "analysis",
                    component = "restrict",
                    document_id = %request.document_id,
                    document_type = %doc_type,
                    "Nulled document type outside the allow-list"
                );
                result.document_type = None;
            }
        }
    }

    result
}
