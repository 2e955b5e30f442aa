//! Concurrent tag registry with TTL eviction

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use crate::tag::{BusAddress, SourceId, Tag};

/// Default time a tag stays registered without a refresh.
pub const DEFAULT_TTL: Duration = Duration::from_secs(90);

/// Concurrent map of tag name to live entry.
///
/// Shared between the poll task and every push session. All operations take
/// `&self`; interior synchronization is per-shard, so touching one entry
/// never blocks access to a different one.
pub struct TagRegistry {
    tags: DashMap<String, Tag>,
    ttl: Duration,
    next_seq: AtomicU64,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            tags: DashMap::new(),
            ttl,
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Register a tag, or refresh it if it already exists.
    ///
    /// Idempotent: a second call for the same name only bumps the refresh
    /// timestamp and never disturbs the current value. Returns a snapshot of
    /// the entry.
    pub fn add_or_refresh(&self, name: &str) -> Tag {
        let mut entry = self.tags.entry(name.to_string()).or_insert_with(|| {
            let mut tag = Tag::new(name);
            tag.seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
            debug!(
                tag = name,
                source = %tag.source,
                address = %tag.address,
                "registered tag"
            );
            tag
        });
        entry.last_refresh = Instant::now();
        entry.clone()
    }

    /// Snapshot of one entry, if present.
    pub fn get(&self, name: &str) -> Option<Tag> {
        self.tags.get(name).map(|entry| entry.clone())
    }

    /// Current value of one tag, if present and already polled.
    pub fn value_of(&self, name: &str) -> Option<f64> {
        self.tags.get(name).and_then(|entry| entry.value)
    }

    /// Store a new value for a tag (poll path). The refresh timestamp is not
    /// touched: value updates keep a tag alive only through re-subscription.
    pub fn update_value(&self, name: &str, value: f64) {
        if let Some(mut entry) = self.tags.get_mut(name) {
            entry.value = Some(value);
        }
    }

    /// Remove every entry whose last refresh is strictly older than
    /// `now - TTL`. Returns the number of evicted tags.
    ///
    /// Safe to run concurrently with reads and with value updates; the
    /// per-entry check and removal are atomic with respect to concurrent
    /// refreshes of the same key, so a tag refreshed after this sweep
    /// started is never removed.
    pub fn sweep(&self, now: Instant) -> usize {
        let mut evicted = 0;
        self.tags.retain(|name, tag| {
            let keep = now.saturating_duration_since(tag.last_refresh) <= self.ttl;
            if !keep {
                evicted += 1;
                debug!(tag = %name, "evicting expired tag");
            }
            keep
        });
        evicted
    }

    /// All pollable entries of one source as `(name, address)` pairs, in
    /// registration order. Entries with an empty (malformed) address are
    /// skipped.
    pub fn addresses_for_source(&self, source: &SourceId) -> Vec<(String, BusAddress)> {
        let mut entries: Vec<(u64, String, BusAddress)> = self
            .tags
            .iter()
            .filter(|entry| entry.source == *source && !entry.address.is_empty())
            .map(|entry| (entry.seq, entry.name.clone(), entry.address.clone()))
            .collect();
        entries.sort_by_key(|(seq, _, _)| *seq);
        entries
            .into_iter()
            .map(|(_, name, address)| (name, address))
            .collect()
    }

    /// Snapshot of every live entry (diagnostics).
    pub fn snapshot(&self) -> Vec<Tag> {
        self.tags.iter().map(|entry| entry.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self::new()
    }
}
