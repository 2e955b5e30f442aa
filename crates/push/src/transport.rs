//! Transport abstraction for viewer connections

use async_trait::async_trait;

use crate::error::Result;

/// One viewer's connection, message-oriented.
///
/// Implementations frame messages however the wire demands; the session
/// only sees whole messages.
#[async_trait]
pub trait Transport: Send {
    /// Await the next inbound message. `Ok(None)` means the peer closed
    /// the connection cleanly.
    async fn receive(&mut self) -> Result<Option<String>>;

    /// Send one outbound message.
    async fn send(&mut self, message: &str) -> Result<()>;

    /// Close the connection. Best-effort; errors are the caller's to
    /// ignore.
    async fn close(&mut self) -> Result<()>;
}
