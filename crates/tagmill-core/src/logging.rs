//! Structured logging schema and field name constants for tagmill.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized field names across
//! every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events, operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "inference", "analysis", "client"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "openai", "azure", "ollama", "prompt", "normalize", "restrict"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "send_chat", "analyze", "enforce", "fetch_thumbnail"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Document identifier being analyzed.
pub const DOCUMENT_ID: &str = "document_id";

/// Model name handling the request.
pub const MODEL: &str = "model";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Byte length of a prompt.
pub const PROMPT_LEN: &str = "prompt_len";

/// Byte length of a model response.
pub const RESPONSE_LEN: &str = "response_len";

/// Estimated token count of the assembled prompt.
pub const PROMPT_TOKENS: &str = "prompt_tokens";

/// Number of items dropped by restriction enforcement.
pub const DROPPED_COUNT: &str = "dropped_count";
