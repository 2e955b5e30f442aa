//! Store error types

use std::io;

use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors from the master and day stores.
///
/// Persistence failures never halt polling: the scheduler logs them and
/// moves on, and the next pass writes fresh data.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from the underlying store
    #[error("database error: {0}")]
    Database(#[from] turso::Error),

    /// Filesystem error creating or locating store files
    #[error("store io error at '{path}': {source}")]
    Io {
        /// Offending path
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// The write gate stayed busy through every retry; the batch was dropped
    #[error("store busy, write abandoned after {attempts} attempts")]
    WriteBusy { attempts: u32 },

    /// A row held a value of an unexpected type
    #[error("unexpected value in {context}")]
    UnexpectedValue { context: &'static str },

    /// A connection type has no row in the master store
    #[error("connection type '{kind}' is not registered")]
    MissingConnectionType { kind: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::WriteBusy { attempts: 10 };
        assert!(err.to_string().contains("10 attempts"));

        let err = StoreError::UnexpectedValue {
            context: "Sample.TagValue",
        };
        assert!(err.to_string().contains("Sample.TagValue"));
    }
}
