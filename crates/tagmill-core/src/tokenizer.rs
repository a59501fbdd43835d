//! Token counting and truncation utilities for LLM budget management.
//!
//! Uses the tiktoken library for exact counts when the target model maps to
//! a known BPE (OpenAI-family models), and a fast character heuristic for
//! everything else (local Ollama models, custom endpoints). Estimation never
//! fails; unknown models silently use the heuristic.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use once_cell::sync::Lazy;
use tiktoken_rs::CoreBPE;
use tracing::debug;

use crate::defaults::HEURISTIC_CHARS_PER_TOKEN;

/// Trait for tokenization operations.
///
/// Implementations should be thread-safe and support the counting operations
/// needed for prompt budget management.
pub trait Tokenizer: Send + Sync {
    /// Count the number of tokens in the given text.
    fn count_tokens(&self, text: &str) -> usize;

    /// Get the name/identifier of this tokenizer.
    fn name(&self) -> &str;
}

/// Tiktoken-based tokenizer implementation.
///
/// Provides accurate token counting compatible with OpenAI's tokenization
/// schemes.
pub struct TiktokenTokenizer {
    bpe: Arc<CoreBPE>,
    name: String,
}

impl TiktokenTokenizer {
    /// Create a new tokenizer for the specified model.
    ///
    /// Returns `None` if the model does not map to a known BPE.
    pub fn for_model(model: &str) -> Option<Self> {
        bpe_for_model(model).map(|bpe| Self {
            bpe,
            name: model.to_string(),
        })
    }
}

impl Tokenizer for TiktokenTokenizer {
    fn count_tokens(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// Per-model BPE cache. Constructing a CoreBPE is expensive, and the same
// model hint repeats for every document in a batch. `None` entries record
// models with no exact tokenizer so the lookup is not retried per call.
static BPE_CACHE: Lazy<Mutex<HashMap<String, Option<Arc<CoreBPE>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn cache_guard() -> MutexGuard<'static, HashMap<String, Option<Arc<CoreBPE>>>> {
    match BPE_CACHE.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn bpe_for_model(model: &str) -> Option<Arc<CoreBPE>> {
    if model.is_empty() {
        return None;
    }

    let mut cache = cache_guard();
    if let Some(entry) = cache.get(model) {
        return entry.clone();
    }

    let entry = match tiktoken_rs::get_bpe_from_model(model) {
        Ok(bpe) => Some(Arc::new(bpe)),
        Err(_) => {
            debug!(model = model, "No exact tokenizer, using heuristic");
            None
        }
    };
    cache.insert(model.to_string(), entry.clone());
    entry
}

/// Estimate token count using the character heuristic.
///
/// Counts characters (not bytes) so multi-byte text is not over-billed, and
/// rounds up so non-empty text never estimates to zero.
pub fn heuristic_tokens(text: &str) -> usize {
    let chars = text.chars().count();
    chars.div_ceil(HEURISTIC_CHARS_PER_TOKEN)
}

/// Estimate the token count of `text` for the given target model.
///
/// Uses the model's exact tokenizer when one is available, otherwise the
/// character heuristic. Returns 0 for empty text and never fails. The
/// estimate is monotonic in text length.
pub fn estimate_tokens(text: &str, model_hint: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    match bpe_for_model(model_hint) {
        Some(bpe) => bpe.encode_ordinary(text).len(),
        None => heuristic_tokens(text),
    }
}

/// Truncate `text` to a prefix whose estimated token count fits `max_units`.
///
/// Returns the longest prefix (on a char boundary) satisfying
/// `estimate_tokens(prefix, model_hint) <= max_units`. Deterministic: the
/// same input and budget always yield the same output. A budget of zero
/// returns the empty string; callers must treat that as a fatal
/// budget-exceeded condition rather than proceeding with empty content.
pub fn truncate_to_tokens(text: &str, max_units: usize, model_hint: &str) -> String {
    if max_units == 0 || text.is_empty() {
        return String::new();
    }
    if estimate_tokens(text, model_hint) <= max_units {
        return text.to_string();
    }

    let chars: Vec<char> = text.chars().collect();

    // Binary search for the largest fitting prefix length.
    let mut lo = 0usize;
    let mut hi = chars.len();
    while lo < hi {
        let mid = (lo + hi + 1) / 2;
        let prefix: String = chars[..mid].iter().collect();
        if estimate_tokens(&prefix, model_hint) <= max_units {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }

    // BPE counts are not perfectly monotonic at token-merge boundaries;
    // walk back until the postcondition holds.
    let mut end = lo;
    let mut prefix: String = chars[..end].iter().collect();
    while end > 0 && estimate_tokens(&prefix, model_hint) > max_units {
        end -= 1;
        prefix = chars[..end].iter().collect();
    }
    prefix
}

/// Truncate `text` to at most `max_chars` characters (not bytes).
///
/// Used to cap document content before token budgeting; see
/// [`crate::defaults::CONTENT_CHAR_CEILING`].
pub fn truncate_to_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).collect()
}
