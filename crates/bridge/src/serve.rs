//! Service wiring and lifecycle
//!
//! Builds every component from the config file, starts the poll scheduler
//! and the viewer listener, and tears both down on Ctrl-C. All wiring is
//! explicit: the registry, pool, store, and sessions share state only
//! through the handles constructed here.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use tagbridge_config::Config;
use tagbridge_fieldbus::{
    ClientFactory, FieldBusError, PollScheduler, PollerConfig, SimClientFactory, SourcePool,
};
use tagbridge_push::{PushSession, SessionConfig};
use tagbridge_registry::TagRegistry;
use tagbridge_store::StoreManager;

use crate::tcp::LineTransport;

/// Run the bridge until Ctrl-C.
pub async fn run(config: Config) -> Result<()> {
    let store = Arc::new(
        StoreManager::open(&config.global.data_dir)
            .await
            .context("opening data stores")?,
    );
    store.insert_log("Service", "Bridge starting").await?;

    let registry = Arc::new(TagRegistry::with_ttl(config.poll.ttl()));

    let pool = build_pool(&config, &store).await?;
    let scheduler = PollScheduler::new(
        Arc::clone(&registry),
        Arc::new(pool),
        Arc::clone(&store) as Arc<dyn tagbridge_fieldbus::SampleSink>,
        PollerConfig {
            interval: config.poll.interval(),
            epsilon: config.poll.epsilon,
            sweep_every: config.poll.ttl_secs,
            static_tags: config.poll.static_tags.clone(),
        },
    );

    let cancel = CancellationToken::new();
    let scheduler_handle = tokio::spawn(scheduler.run(cancel.clone()));

    let listener = TcpListener::bind(&config.global.listen)
        .await
        .with_context(|| format!("binding viewer listener on {}", config.global.listen))?;
    info!(address = %config.global.listen, "Viewer listener ready");

    let session_config = SessionConfig {
        cadence: config.push.cadence(),
        epsilon: config.poll.epsilon,
    };

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested");
                break;
            }
            result = listener.accept() => match result {
                Ok((stream, peer)) => {
                    let session = PushSession::new(
                        Arc::clone(&registry),
                        Box::new(LineTransport::new(stream)),
                        session_config.clone(),
                        peer.to_string(),
                    );
                    tokio::spawn(session.run(cancel.clone()));
                }
                Err(e) => {
                    // Transient accept errors - log and continue
                    warn!(error = %e, "accept error");
                }
            },
        }
    }

    cancel.cancel();
    if let Err(e) = scheduler_handle.await {
        warn!(error = %e, "poll scheduler task failed");
    }
    if let Err(e) = store.insert_log("Service", "Bridge stopped").await {
        warn!(error = %e, "could not record shutdown");
    }
    info!("Bridge stopped");

    Ok(())
}

/// Assemble the source pool from configured and stored sources.
///
/// Sources from the config file win over rows in the master store with the
/// same name, and are written back so the store reflects the running
/// config. Sources whose protocol this build cannot serve are skipped.
async fn build_pool(config: &Config, store: &StoreManager) -> Result<SourcePool> {
    let mut merged: BTreeMap<String, _> = BTreeMap::new();
    for source in store.load_sources().await? {
        merged.insert(source.name.clone(), source);
    }
    for source in config.list_sources() {
        if let Err(e) = store.upsert_source(&source).await {
            warn!(source = %source.name, error = %e, "could not persist source");
        }
        merged.insert(source.name.clone(), source);
    }

    let factory = SimClientFactory;
    let mut pool = SourcePool::with_limits(config.poll.open_timeout(), config.poll.read_batch_size);
    for (name, conn) in merged {
        match factory.make_client(&conn) {
            Ok(client) => {
                info!(source = %name, kind = %conn.kind, "Source configured");
                pool.add_source(conn, client);
            }
            Err(FieldBusError::Unsupported { kind, .. }) => {
                warn!(source = %name, %kind, "No client backend for source, skipping");
            }
            Err(e) => return Err(e).context("building field-bus client"),
        }
    }

    if pool.is_empty() {
        warn!("No usable sources configured; polling will idle");
    }
    Ok(pool)
}
