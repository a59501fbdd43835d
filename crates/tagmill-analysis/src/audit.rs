//! Append-only prompt/response audit log.
//!
//! Every analysis call records the exact prompt pair it sent and the raw
//! text it got back, so surprising model behavior can be replayed later.
//! Writes are best-effort: a failed append warns and the analysis proceeds.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::warn;

use tagmill_core::{defaults, Result};

/// Append-only plaintext log of prompt/response pairs.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    /// Create a log writing to the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Log path in use.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record one exchange. Failures are logged and swallowed; an audit
    /// problem must never fail an analysis.
    pub fn record(&self, document_id: &str, system: &str, user: &str, response: &str) {
        if let Err(e) = self.append(document_id, system, user, response) {
            warn!(
                subsystem = "analysis",
                component = "audit",
                document_id = %document_id,
                error = %e,
                "Failed to append to audit log"
            );
        }
    }

    fn append(&self, document_id: &str, system: &str, user: &str, response: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        writeln!(
            file,
            "=== {} document={} ===\n--- system ---\n{}\n--- user ---\n{}\n--- response ---\n{}\n",
            Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            document_id,
            system,
            user,
            response
        )?;
        Ok(())
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(defaults::AUDIT_LOG_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_appends_entries() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("prompts.log"));

        log.record("1", "system text", "user text", "{\"tags\": []}");
        log.record("2", "s2", "u2", "r2");

        let content = std::fs::read_to_string(log.path()).unwrap();
        assert!(content.contains("document=1"));
        assert!(content.contains("--- system ---\nsystem text"));
        assert!(content.contains("--- response ---\n{\"tags\": []}"));
        assert!(content.contains("document=2"));
        let first = content.find("document=1").unwrap();
        let second = content.find("document=2").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_record_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("nested/logs/prompts.log"));
        log.record("1", "s", "u", "r");
        assert!(log.path().exists());
    }

    #[test]
    fn test_unwritable_path_does_not_panic() {
        // A directory path cannot be opened as a file; record must swallow it.
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path());
        log.record("1", "s", "u", "r");
    }
}
