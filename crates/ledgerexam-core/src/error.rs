//! Error types for the session state machine and the result store.
//!
//! Grading never fails: malformed answers and degenerate rubrics are scored,
//! not raised. These errors only cover misuse of a session and persistence I/O.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from driving an [`ExamSession`](crate::session::ExamSession) out of order.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// `start()` was called on a session that is already running.
    #[error("session already started")]
    AlreadyStarted,

    /// The session has been graded; no further transitions are possible.
    #[error("session already finished")]
    AlreadyFinished,
}

/// Errors that can occur when reading or writing exam results.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing file could not be read or written.
    #[error("result store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The stored history is not valid JSON.
    #[error("result store contains malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A lock guarding an in-memory store was poisoned.
    #[error("result store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_error_messages() {
        assert_eq!(
            SessionError::AlreadyStarted.to_string(),
            "session already started"
        );
        assert_eq!(
            SessionError::AlreadyFinished.to_string(),
            "session already finished"
        );
    }

    #[test]
    fn store_io_error_mentions_path() {
        let err = StoreError::io(
            "/tmp/history.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/tmp/history.json"));
        assert!(msg.contains("denied"));
    }
}
