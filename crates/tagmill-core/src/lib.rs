//! # tagmill-core
//!
//! Core types, traits, and abstractions for the tagmill library.
//!
//! This crate provides the foundational data structures and trait definitions
//! that other tagmill crates depend on: the error taxonomy, shared default
//! constants, the structured logging schema, token estimation/truncation,
//! and the analysis data model.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod tokenizer;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use tokenizer::*;
pub use traits::*;
