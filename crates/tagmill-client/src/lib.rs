//! # tagmill-client
//!
//! Client surface toward the document-management system:
//!
//! - [`DocumentApiClient`] — token-authenticated REST client for document
//!   content, name listings, thumbnails, and metadata write-back
//! - [`ThumbnailCache`] — on-disk read-through cache for thumbnail bytes
//!
//! The analysis pipeline never talks to the document API directly; callers
//! fetch inputs through this crate, run `tagmill-analysis`, and write the
//! outcome back through this crate.

pub mod api;
pub mod thumbnail;

pub use api::{ApiConfig, DocumentApiClient};
pub use thumbnail::ThumbnailCache;
