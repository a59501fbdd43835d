//! On-disk thumbnail cache.
//!
//! Read-through cache keyed by document id. A cache hit short-circuits the
//! API fetch; a miss fetches, sniffs the image type from magic bytes, and
//! writes `{id}.{ext}` into the cache directory. Concurrent writers for the
//! same id overwrite each other with identical bytes, which is harmless.
//! Every failure path returns `None` rather than an error; a missing
//! thumbnail never blocks analysis.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use tagmill_core::defaults;

use crate::api::DocumentApiClient;

/// Extensions the cache probes for on lookup.
const KNOWN_EXTENSIONS: &[&str] = &["webp", "png", "jpg", "jpeg", "gif"];

/// Read-through cache for document thumbnails.
#[derive(Debug, Clone)]
pub struct ThumbnailCache {
    dir: PathBuf,
}

impl ThumbnailCache {
    /// Create a cache over the given directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache directory in use.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the cached thumbnail for a document, when one exists.
    pub fn cached_path(&self, document_id: &str) -> Option<PathBuf> {
        KNOWN_EXTENSIONS
            .iter()
            .map(|ext| self.dir.join(format!("{}.{}", document_id, ext)))
            .find(|path| path.exists())
    }

    /// Get the thumbnail path for a document, fetching and caching it on a
    /// miss. Returns `None` when the document has no thumbnail or the fetch
    /// or write fails; failures are logged, never raised.
    pub async fn get_or_fetch(
        &self,
        client: &DocumentApiClient,
        document_id: &str,
    ) -> Option<PathBuf> {
        if let Some(path) = self.cached_path(document_id) {
            debug!(
                subsystem = "client",
                component = "thumbnail",
                document_id = %document_id,
                "Thumbnail cache hit"
            );
            return Some(path);
        }

        let bytes = match client.thumbnail(document_id).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!(
                    subsystem = "client",
                    component = "thumbnail",
                    document_id = %document_id,
                    error = %e,
                    "Thumbnail fetch failed"
                );
                return None;
            }
        };

        self.store(document_id, &bytes)
    }

    /// Write thumbnail bytes into the cache. Extension comes from magic-byte
    /// sniffing, falling back to `bin` for unrecognized content.
    pub fn store(&self, document_id: &str, bytes: &[u8]) -> Option<PathBuf> {
        let ext = infer::get(bytes)
            .map(|kind| kind.extension())
            .unwrap_or("bin");
        let path = self.dir.join(format!("{}.{}", document_id, ext));

        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            warn!(
                subsystem = "client",
                component = "thumbnail",
                error = %e,
                "Failed to create thumbnail cache directory"
            );
            return None;
        }
        if let Err(e) = std::fs::write(&path, bytes) {
            warn!(
                subsystem = "client",
                component = "thumbnail",
                document_id = %document_id,
                error = %e,
                "Failed to write cached thumbnail"
            );
            return None;
        }

        debug!(
            subsystem = "client",
            component = "thumbnail",
            document_id = %document_id,
            path = %path.display(),
            "Thumbnail cached"
        );
        Some(path)
    }
}

impl Default for ThumbnailCache {
    fn default() -> Self {
        Self::new(defaults::THUMBNAIL_CACHE_DIR)
    }
}
