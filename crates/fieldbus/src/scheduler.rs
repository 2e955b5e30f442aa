//! Poll scheduler - the single background poll/sweep cycle
//!
//! Drives `Idle -> Polling -> (conditionally) Sweeping -> Idle` on a fixed
//! tick. Each polling phase reads all configured sources in parallel
//! (bounded by source count); within one source, batches stay sequential.
//! Every TTL-seconds worth of ticks a sweeping phase evicts expired tags.
//!
//! Readings that cross the significance threshold against the registry's
//! last-stored value update the registry and are queued; at the end of the
//! pass the queued samples go to the [`SampleSink`] as one batched append.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::task::JoinSet;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tagbridge_registry::{exceeds_threshold, Sample, SourceId, TagRegistry, DEFAULT_EPSILON};

use crate::pool::SourcePool;

/// Where one poll pass's changed samples go.
///
/// Implemented by the day-partitioned store; tests substitute a recorder.
/// Append failures are reported back so the scheduler can log them, but
/// they never stop the cycle.
#[async_trait]
pub trait SampleSink: Send + Sync {
    async fn append(
        &self,
        samples: Vec<Sample>,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Scheduler settings, typically mapped from the `[poll]` config section.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Time between poll passes.
    pub interval: Duration,

    /// Significance threshold for registry updates and persistence.
    pub epsilon: f64,

    /// Sweep cadence in ticks; with a 1s interval this equals the TTL in
    /// seconds, matching one sweep per TTL window.
    pub sweep_every: u64,

    /// Tags registered up front and re-refreshed at every sweep so they
    /// never expire.
    pub static_tags: Vec<String>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            epsilon: DEFAULT_EPSILON,
            sweep_every: 90,
            static_tags: Vec::new(),
        }
    }
}

/// The background poll/sweep cycle.
pub struct PollScheduler {
    registry: Arc<TagRegistry>,
    pool: Arc<SourcePool>,
    sink: Arc<dyn SampleSink>,
    config: PollerConfig,
}

impl PollScheduler {
    pub fn new(
        registry: Arc<TagRegistry>,
        pool: Arc<SourcePool>,
        sink: Arc<dyn SampleSink>,
        config: PollerConfig,
    ) -> Self {
        for name in &config.static_tags {
            registry.add_or_refresh(name);
        }
        Self {
            registry,
            pool,
            sink,
            config,
        }
    }

    /// Run until `cancel` fires. Cancellation is honored between ticks;
    /// in-flight reads of the current tick are allowed to finish.
    pub async fn run(self, cancel: CancellationToken) {
        let mut tick = interval(self.config.interval);
        let mut ticks: u64 = 0;
        info!(
            sources = self.pool.len(),
            interval = ?self.config.interval,
            "poll scheduler started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tick.tick() => {}
            }

            self.poll_pass().await;
            ticks += 1;
            if self.config.sweep_every > 0 && ticks % self.config.sweep_every == 0 {
                self.sweep_pass();
            }
        }

        self.pool.close_all().await;
        info!("poll scheduler stopped");
    }

    /// One polling phase: read every source in parallel, then hand the
    /// accumulated changed samples to the sink as a single append.
    pub async fn poll_pass(&self) {
        let mut passes = JoinSet::new();
        for source in self.pool.source_ids() {
            let registry = Arc::clone(&self.registry);
            let pool = Arc::clone(&self.pool);
            let epsilon = self.config.epsilon;
            passes.spawn(async move { poll_source(registry, pool, source, epsilon).await });
        }

        let mut samples = Vec::new();
        while let Some(result) = passes.join_next().await {
            match result {
                Ok(mut changed) => samples.append(&mut changed),
                Err(e) => warn!(error = %e, "poll task failed"),
            }
        }

        if samples.is_empty() {
            return;
        }
        debug!(samples = samples.len(), "persisting changed samples");
        if let Err(e) = self.sink.append(samples).await {
            warn!(error = %e, "failed to persist poll samples");
        }
    }

    /// One sweeping phase: keep static tags alive, then evict everything
    /// past its TTL.
    pub(crate) fn sweep_pass(&self) {
        for name in &self.config.static_tags {
            self.registry.add_or_refresh(name);
        }
        let evicted = self.registry.sweep(Instant::now());
        info!(
            evicted,
            remaining = self.registry.len(),
            "registry sweep complete"
        );
    }
}

/// Poll one source: read its registered addresses in batches and apply the
/// significance rule against the registry baseline.
///
/// Failures are contained here; the source's tags keep their stale values
/// and the next cycle retries.
async fn poll_source(
    registry: Arc<TagRegistry>,
    pool: Arc<SourcePool>,
    source: SourceId,
    epsilon: f64,
) -> Vec<Sample> {
    let items = registry.addresses_for_source(&source);
    if items.is_empty() {
        return Vec::new();
    }

    let readings = match pool.read_all(&source, &items).await {
        Ok(readings) => readings,
        Err(e) => {
            warn!(source = %source, error = %e, "poll failed, tags keep stale values");
            return Vec::new();
        }
    };

    let mut changed = Vec::new();
    for (name, value) in readings {
        let previous = registry.value_of(&name);
        if !exceeds_threshold(previous, value, epsilon) {
            continue;
        }
        registry.update_value(&name, value);
        let logged = registry.get(&name).is_some_and(|tag| tag.logged);
        if logged {
            changed.push(Sample::now(&name, value));
        }
    }
    changed
}
