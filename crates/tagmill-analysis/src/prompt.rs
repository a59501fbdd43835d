//! Prompt assembly.
//!
//! Builds the system prompt for one analysis call in a single pass:
//! base instructions, the custom-fields template, restriction blocks,
//! the optional reference listing, and external context, then checks the
//! token budget and truncates the document content to what remains.
//!
//! Restriction blocks are appended exactly once and no later step rewrites
//! text that is already in the prompt.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use tagmill_core::{
    defaults, estimate_tokens, truncate_to_chars, truncate_to_tokens, AnalysisRequest,
    CustomFieldSpec, Error, PromptBundle, Result,
};

/// Default instructional text when no base prompt is configured.
pub const DEFAULT_BASE_INSTRUCTIONS: &str = "\
You are a document analysis assistant. Read the document provided by the \
user and respond with a single JSON object containing exactly these keys: \
\"title\" (a short descriptive title), \"correspondent\" (the sender or \
issuing party), \"tags\" (an array of topical tags), \"document_type\" (the \
kind of document), \"document_date\" (the document's date in YYYY-MM-DD \
form), and \"language\" (the document's language). Use null for any value \
you cannot determine. Respond with JSON only, no surrounding text.";

/// Prompt-assembly settings, sourced from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    /// Instructional boilerplate the prompt starts from.
    pub base_instructions: String,
    /// Custom fields the model must fill in, rendered as a JSON template.
    pub custom_fields: Vec<CustomFieldSpec>,
    /// Total token limit for prompt plus response.
    pub max_tokens: usize,
    /// Tokens held back for the model's response.
    pub reserved_response_tokens: usize,
    /// Ceiling on appended external context.
    pub external_context_token_ceiling: usize,
    /// Character cap applied to document content before token budgeting.
    pub content_char_ceiling: usize,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            base_instructions: DEFAULT_BASE_INSTRUCTIONS.to_string(),
            custom_fields: Vec::new(),
            max_tokens: defaults::TOKEN_LIMIT,
            reserved_response_tokens: defaults::RESERVED_RESPONSE_TOKENS,
            external_context_token_ceiling: defaults::EXTERNAL_CONTEXT_TOKEN_CEILING,
            content_char_ceiling: defaults::CONTENT_CHAR_CEILING,
        }
    }
}

/// Assembles the prompt pair for one analysis call.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    settings: PromptSettings,
    model_hint: String,
}

impl PromptBuilder {
    /// Create a builder for the given model.
    pub fn new(settings: PromptSettings, model_hint: impl Into<String>) -> Self {
        Self {
            settings,
            model_hint: model_hint.into(),
        }
    }

    /// Settings in effect.
    pub fn settings(&self) -> &PromptSettings {
        &self.settings
    }

    /// Build the prompt bundle for a request.
    ///
    /// Fails with [`Error::BudgetExceeded`] when the assembled system prompt
    /// plus the response reserve leaves no room for document content. The
    /// backend is never called in that case.
    pub fn build(&self, request: &AnalysisRequest) -> Result<PromptBundle> {
        let mut system = match &request.custom_prompt {
            // A custom prompt replaces the built instructional text, but the
            // custom-fields template is still appended below.
            Some(custom) => custom.clone(),
            None => {
                let mut text = self.settings.base_instructions.clone();
                self.append_restrictions(&mut text, request);
                self.append_reference_listing(&mut text, request);
                self.append_external_context(&mut text, request);
                text
            }
        };

        if !self.settings.custom_fields.is_empty() {
            system.push_str("\n\n");
            system.push_str(&render_custom_fields_template(&self.settings.custom_fields));
        }

        let prompt_tokens = estimate_tokens(&system, &self.model_hint);
        let spoken_for = prompt_tokens + self.settings.reserved_response_tokens;
        if spoken_for >= self.settings.max_tokens {
            return Err(Error::BudgetExceeded {
                prompt_tokens,
                max_tokens: self.settings.max_tokens,
                reserved_tokens: self.settings.reserved_response_tokens,
            });
        }
        let available_tokens = self.settings.max_tokens - spoken_for;

        let capped = truncate_to_chars(&request.content, self.settings.content_char_ceiling);
        let user_prompt = truncate_to_tokens(&capped, available_tokens, &self.model_hint);
        let truncated = user_prompt.len() < request.content.len();

        debug!(
            subsystem = "analysis",
            component = "prompt",
            document_id = %request.document_id,
            prompt_tokens = prompt_tokens,
            available = available_tokens,
            truncated = truncated,
            "Prompt assembled"
        );

        Ok(PromptBundle {
            system_prompt: system,
            user_prompt,
            prompt_tokens,
            available_tokens,
            truncated,
        })
    }

    /// Append one delimited restriction block per restricted field with a
    /// non-empty allow-list.
    fn append_restrictions(&self, text: &mut String, request: &AnalysisRequest) {
        let opts = &request.options;

        if opts.restrict_to_existing_tags && !request.existing_tags.is_empty() {
            text.push_str("\n\n--- IMPORTANT RESTRICTIONS ---\n");
            text.push_str(
                "You may ONLY assign tags from the following list. \
                 Never invent a tag that is not on this list:\n",
            );
            text.push_str(&request.existing_tags.join(", "));
            text.push_str(
                "\nPrefer the general category over the literal object name. \
                 For example: a washing machine manual is tagged \"Appliance\", \
                 not the manufacturer's model name; an invoice from a phone \
                 carrier is tagged \"Telecommunications\", not the product name \
                 printed on the invoice.\n",
            );
            text.push_str("--- END RESTRICTIONS ---");
        }

        if opts.restrict_to_existing_correspondents && !request.existing_correspondents.is_empty()
        {
            text.push_str("\n\n--- IMPORTANT RESTRICTIONS ---\n");
            text.push_str(
                "The correspondent MUST be one of the following existing \
                 correspondents, or null if none of them matches. Never invent \
                 a new correspondent:\n",
            );
            text.push_str(&request.existing_correspondents.join(", "));
            text.push_str("\n--- END RESTRICTIONS ---");
        }

        if opts.restrict_to_existing_document_types && !request.existing_document_types.is_empty()
        {
            text.push_str("\n\n--- IMPORTANT RESTRICTIONS ---\n");
            text.push_str(
                "The document_type MUST be one of the following existing \
                 types, or null if none of them matches. Never invent a new \
                 type:\n",
            );
            text.push_str(&request.existing_document_types.join(", "));
            text.push_str("\n--- END RESTRICTIONS ---");
        }
    }

    /// When nothing is restricted and reference mode is on, list existing
    /// names as non-binding material.
    fn append_reference_listing(&self, text: &mut String, request: &AnalysisRequest) {
        let opts = &request.options;
        let any_restriction = opts.restrict_to_existing_tags
            || opts.restrict_to_existing_correspondents
            || opts.restrict_to_existing_document_types;
        if any_restriction || !opts.use_existing_data {
            return;
        }

        text.push_str(
            "\n\nFor reference, the archive already contains the following \
             names. You may reuse them when they fit, but you are not limited \
             to them:\n",
        );
        if !request.existing_tags.is_empty() {
            text.push_str("Pre-existing tags: ");
            text.push_str(&request.existing_tags.join(", "));
            text.push('\n');
        }
        if !request.existing_correspondents.is_empty() {
            text.push_str("Pre-existing correspondents: ");
            text.push_str(&request.existing_correspondents.join(", "));
            text.push('\n');
        }
        if !request.existing_document_types.is_empty() {
            text.push_str("Pre-existing document types: ");
            text.push_str(&request.existing_document_types.join(", "));
            text.push('\n');
        }
    }

    /// Append caller-supplied external context, capped at the token ceiling.
    /// Context that cannot be rendered is omitted, never fatal.
    fn append_external_context(&self, text: &mut String, request: &AnalysisRequest) {
        let Some(data) = &request.options.external_api_data else {
            return;
        };

        let rendered = match render_external_context(data) {
            Ok(rendered) => rendered,
            Err(e) => {
                warn!(
                    subsystem = "analysis",
                    component = "prompt",
                    document_id = %request.document_id,
                    error = %e,
                    "External context could not be rendered, omitting it"
                );
                return;
            }
        };
        if rendered.is_empty() {
            return;
        }

        let ceiling = self.settings.external_context_token_ceiling;
        let sized = if estimate_tokens(&rendered, &self.model_hint) > ceiling {
            warn!(
                subsystem = "analysis",
                component = "prompt",
                document_id = %request.document_id,
                ceiling = ceiling,
                "External context exceeds the token ceiling, truncating"
            );
            truncate_to_tokens(&rendered, ceiling, &self.model_hint)
        } else {
            rendered
        };

        text.push_str("\n\nAdditional context:\n");
        text.push_str(&sized);
    }
}

/// Render external context to plain text. String values are used as-is,
/// anything else is serialized.
fn render_external_context(data: &JsonValue) -> Result<String> {
    match data {
        JsonValue::String(s) => Ok(s.clone()),
        JsonValue::Null => Ok(String::new()),
        other => serde_json::to_string_pretty(other)
            .map_err(|e| Error::ExternalData(format!("Failed to serialize external context: {}", e))),
    }
}

/// Render the custom-fields template block.
fn render_custom_fields_template(specs: &[CustomFieldSpec]) -> String {
    let mut block = String::from(
        "Additionally fill in a \"custom_fields\" object with exactly these \
         keys, using null for values you cannot determine:\n{\n",
    );
    for (i, spec) in specs.iter().enumerate() {
        block.push_str(&format!("  \"{}\": \"<{}>\"", spec.name, spec.value_hint));
        if i + 1 < specs.len() {
            block.push(',');
        }
        block.push('\n');
    }
    block.push('}');
    block
}
