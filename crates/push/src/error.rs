//! Push session error types

use thiserror::Error;

/// Result type for push operations
pub type Result<T> = std::result::Result<T, PushError>;

/// Errors from viewer sessions.
#[derive(Debug, Error)]
pub enum PushError {
    /// The subscription message was not a JSON array of strings
    #[error("bad subscription: {0}")]
    BadSubscription(serde_json::Error),

    /// The subscription named no tags
    #[error("subscription names no tags")]
    EmptySubscription,

    /// The underlying connection failed
    #[error("transport error: {0}")]
    Transport(String),

    /// Delta serialization failed
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}
