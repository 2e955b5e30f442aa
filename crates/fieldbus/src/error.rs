//! Field-bus error types

use std::time::Duration;

use thiserror::Error;

use tagbridge_config::ConnectionKind;
use tagbridge_registry::SourceId;

/// Result type for field-bus operations
pub type Result<T> = std::result::Result<T, FieldBusError>;

/// Errors from source connections and batch reads.
///
/// All of these are connection-scoped: the scheduler logs them and retries
/// the source on the next cycle without affecting other sources. The field
/// is `source_id` rather than `source` so thiserror does not treat it as
/// an error cause.
#[derive(Debug, Error)]
pub enum FieldBusError {
    /// Read or open attempt against a source the pool doesn't know
    #[error("source {source_id} is not configured")]
    UnknownSource { source_id: SourceId },

    /// Connection open failed
    #[error("failed to open source {source_id}: {message}")]
    Open { source_id: SourceId, message: String },

    /// Connection open did not complete within the bounded timeout
    #[error("opening source {source_id} timed out after {timeout:?}")]
    OpenTimeout {
        source_id: SourceId,
        timeout: Duration,
    },

    /// Batch read failed mid-cycle
    #[error("read failed on source {source_id}: {message}")]
    Read { source_id: SourceId, message: String },

    /// The client returned a malformed response
    #[error("protocol error on source {source_id}: {message}")]
    Protocol { source_id: SourceId, message: String },

    /// No client backend is linked for this connection kind
    #[error("no client backend available for {kind} source {source_id}")]
    Unsupported {
        source_id: SourceId,
        kind: ConnectionKind,
    },
}
