//! The analysis entry point.
//!
//! [`DocumentAnalyzer::analyze`] runs one request through prompt assembly,
//! the chat backend, normalization, and restriction enforcement. It never
//! returns `Err` and never panics on input: every failure in the pipeline
//! becomes an [`AnalysisOutcome`] carrying a degraded document and an error
//! string, so a queue of documents can keep draining past a bad one.

use std::time::Instant;

use tracing::{info, warn};

use tagmill_core::{AnalysisOutcome, AnalysisRequest, ChatBackend};

use crate::audit::AuditLog;
use crate::normalize::normalize;
use crate::prompt::{PromptBuilder, PromptSettings};
use crate::restrict::enforce;

/// Runs analysis calls against one configured backend.
pub struct DocumentAnalyzer {
    backend: Box<dyn ChatBackend>,
    builder: PromptBuilder,
    audit: AuditLog,
}

impl DocumentAnalyzer {
    /// Create an analyzer over the given backend. The backend's model name
    /// doubles as the tokenizer hint.
    pub fn new(backend: Box<dyn ChatBackend>, settings: PromptSettings) -> Self {
        let builder = PromptBuilder::new(settings, backend.model_name());
        Self {
            backend,
            builder,
            audit: AuditLog::default(),
        }
    }

    /// Use a specific audit log instead of the default path.
    pub fn with_audit_log(mut self, audit: AuditLog) -> Self {
        self.audit = audit;
        self
    }

    /// Analyze one document.
    ///
    /// Infallible by contract: budget, backend, and parse failures all
    /// surface through [`AnalysisOutcome::error`] with a degraded document.
    pub async fn analyze(&self, request: &AnalysisRequest) -> AnalysisOutcome {
        let start = Instant::now();

        let bundle = match self.builder.build(request) {
            Ok(bundle) => bundle,
            Err(e) => {
                warn!(
                    subsystem = "analysis",
                    component = "analyzer",
                    document_id = %request.document_id,
                    error = %e,
                    "Prompt assembly failed"
                );
                return AnalysisOutcome::degraded(e.to_string());
            }
        };

        let outcome = match self
            .backend
            .send_chat(&bundle.system_prompt, &bundle.user_prompt)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    subsystem = "analysis",
                    component = "analyzer",
                    document_id = %request.document_id,
                    model = self.backend.model_name(),
                    error = %e,
                    "Backend call failed"
                );
                return AnalysisOutcome {
                    truncated: bundle.truncated,
                    ..AnalysisOutcome::degraded(e.to_string())
                };
            }
        };

        // Side effect only; failures are swallowed inside record().
        self.audit.record(
            &request.document_id,
            &bundle.system_prompt,
            &bundle.user_prompt,
            &outcome.text,
        );

        let metrics = (!outcome.usage.is_empty()).then_some(outcome.usage);

        let (document, error) = match normalize(&outcome.text) {
            Ok(result) => (enforce(result, request), None),
            Err(e) => {
                warn!(
                    subsystem = "analysis",
                    component = "analyzer",
                    document_id = %request.document_id,
                    response_len = outcome.text.len(),
                    error = %e,
                    "Model output unusable, degrading"
                );
                (
                    tagmill_core::AnalysisResult::degraded(),
                    Some(e.to_string()),
                )
            }
        };

        info!(
            subsystem = "analysis",
            component = "analyzer",
            document_id = %request.document_id,
            model = self.backend.model_name(),
            prompt_tokens = bundle.prompt_tokens,
            duration_ms = start.elapsed().as_millis() as u64,
            degraded = error.is_some(),
            "Analysis complete"
        );

        AnalysisOutcome {
            document,
            metrics,
            truncated: bundle.truncated,
            error,
        }
    }

    /// Model the analyzer talks to.
    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }
}
