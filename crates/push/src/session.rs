//! Viewer session lifecycle
//!
//! A session moves through four states:
//!
//! ```text
//! AwaitingSubscription -> Streaming -> Closing -> Closed
//! ```
//!
//! It waits for the subscription message, registers the named tags so
//! polling picks them up, then streams deltas on a fixed cadence until
//! the viewer disconnects, the subscription turns out bad, or the bridge
//! shuts down.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use tagbridge_registry::{TagRegistry, DEFAULT_EPSILON};

use crate::detector::ChangeDetector;
use crate::error::Result;
use crate::protocol::{encode_deltas, parse_subscription};
use crate::transport::Transport;

/// Default streaming cadence.
pub const DEFAULT_CADENCE: Duration = Duration::from_secs(1);

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingSubscription,
    Streaming,
    Closing,
    Closed,
}

/// Session tuning.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Tick interval for outbound deltas.
    pub cadence: Duration,
    /// Significance threshold for per-viewer change detection.
    pub epsilon: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cadence: DEFAULT_CADENCE,
            epsilon: DEFAULT_EPSILON,
        }
    }
}

/// One viewer's streaming session.
pub struct PushSession {
    registry: Arc<TagRegistry>,
    transport: Box<dyn Transport>,
    config: SessionConfig,
    state: SessionState,
    /// Peer label for logs.
    peer: String,
}

impl PushSession {
    pub fn new(
        registry: Arc<TagRegistry>,
        transport: Box<dyn Transport>,
        config: SessionConfig,
        peer: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            transport,
            config,
            state: SessionState::AwaitingSubscription,
            peer: peer.into(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Drive the session to completion.
    ///
    /// Always closes the transport on the way out, whatever ended the
    /// session.
    pub async fn run(mut self, cancel: CancellationToken) {
        let outcome = self.drive(&cancel).await;
        match outcome {
            Ok(()) => debug!(peer = %self.peer, "Session ended"),
            Err(e) => info!(peer = %self.peer, error = %e, "Session ended with error"),
        }
        self.shutdown().await;
    }

    async fn drive(&mut self, cancel: &CancellationToken) -> Result<()> {
        let message = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            received = self.transport.receive() => match received? {
                Some(message) => message,
                None => return Ok(()),
            },
        };

        let names = parse_subscription(&message)?;
        info!(peer = %self.peer, tags = names.len(), "Viewer subscribed");

        // Registering keeps the tags alive and visible to the poller.
        for name in &names {
            self.registry.add_or_refresh(name);
        }

        let mut detector = ChangeDetector::new(names, self.config.epsilon);
        self.state = SessionState::Streaming;

        let mut ticks = tokio::time::interval(self.config.cadence);
        ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticks.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                received = self.transport.receive() => match received? {
                    // Extra inbound messages are ignored; a clean close
                    // or transport error ends the session.
                    Some(_) => {
                        debug!(peer = %self.peer, "Ignoring message after subscription");
                    }
                    None => return Ok(()),
                },
                _ = ticks.tick() => {
                    self.tick(&mut detector).await?;
                }
            }
        }
    }

    async fn tick(&mut self, detector: &mut ChangeDetector) -> Result<()> {
        // A streaming viewer keeps its tags from expiring.
        for name in detector.requested() {
            self.registry.add_or_refresh(name);
        }

        let registry = &self.registry;
        let deltas = detector.diff(|name| registry.value_of(name), chrono::Utc::now());
        if deltas.is_empty() {
            return Ok(());
        }

        let message = encode_deltas(&deltas)?;
        self.transport.send(&message).await?;
        debug!(peer = %self.peer, count = deltas.len(), "Sent deltas");
        Ok(())
    }

    async fn shutdown(&mut self) {
        self.state = SessionState::Closing;
        if let Err(e) = self.transport.close().await {
            debug!(peer = %self.peer, error = %e, "Close failed");
        }
        self.state = SessionState::Closed;
    }
}
