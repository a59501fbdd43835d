//! # tagmill-analysis
//!
//! The analysis pipeline: prompt assembly, response normalization,
//! restriction enforcement, and the never-failing [`DocumentAnalyzer`]
//! entry point.
//!
//! Data flow for one document:
//!
//! ```text
//! AnalysisRequest -> PromptBuilder -> ChatBackend -> normalize -> enforce
//!                                                 -> AnalysisOutcome
//! ```
//!
//! Every stage degrades instead of escalating: malformed model output
//! becomes an empty result with an error string, a failed audit write is a
//! warning, and `analyze` itself never returns `Err`.

pub mod analyzer;
pub mod audit;
pub mod normalize;
pub mod prompt;
pub mod restrict;

pub use analyzer::DocumentAnalyzer;
pub use audit::AuditLog;
pub use normalize::normalize;
pub use prompt::{PromptBuilder, PromptSettings};
pub use restrict::enforce;
