// error.rs — Error types for the audit subsystem.
//
// Audit failures are advisory: the engine surfaces them through tracing
// and keeps returning decisions. They still get precise types so callers
// that DO care (compliance tooling, replay verification) can react.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while recording or replaying decisions.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Failed to open or create the decision log file.
    #[error("failed to open decision log at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write a record to the log.
    #[error("failed to append decision record: {0}")]
    WriteFailed(#[from] std::io::Error),

    /// Failed to serialize or deserialize a record (malformed JSON).
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The decision log has been tampered with — hash chain is broken.
    #[error("integrity check failed at line {line}: expected hash {expected}, got {actual}")]
    IntegrityViolation {
        line: usize,
        expected: String,
        actual: String,
    },
}
