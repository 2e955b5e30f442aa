//! Tests for the concurrent registry and TTL sweep

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::{exceeds_threshold, SourceId, TagRegistry, DEFAULT_EPSILON};

// =============================================================================
// add_or_refresh
// =============================================================================

#[test]
fn test_add_or_refresh_is_idempotent() {
    let registry = TagRegistry::new();

    let first = registry.add_or_refresh("A02_DB10_DBW2");
    std::thread::sleep(Duration::from_millis(2));
    let second = registry.add_or_refresh("A02_DB10_DBW2");

    assert_eq!(registry.len(), 1);
    assert_eq!(first.name, second.name);
    assert_eq!(first.source, second.source);
    assert_eq!(first.address, second.address);
    assert!(second.last_refresh > first.last_refresh);
}

#[test]
fn test_refresh_does_not_disturb_value() {
    let registry = TagRegistry::new();
    registry.add_or_refresh("A02_DB10_DBW2");
    registry.update_value("A02_DB10_DBW2", 42.5);

    let refreshed = registry.add_or_refresh("A02_DB10_DBW2");
    assert_eq!(refreshed.value, Some(42.5));
}

#[test]
fn test_subscription_scenario_creates_parsed_tag() {
    let registry = TagRegistry::new();
    let tag = registry.add_or_refresh("A02_DB10_DBW2");
    assert_eq!(tag.source.as_str(), "A02");
    assert_eq!(tag.address.as_str(), "DB10.DBW2");
}

#[test]
fn test_get_absent_tag() {
    let registry = TagRegistry::new();
    assert!(registry.get("A02_DB10_DBW2").is_none());
    assert!(registry.value_of("A02_DB10_DBW2").is_none());
}

#[test]
fn test_update_value_ignores_unknown_tag() {
    let registry = TagRegistry::new();
    registry.update_value("A02_DB10_DBW2", 1.0);
    assert!(registry.is_empty());
}

// =============================================================================
// Sweep
// =============================================================================

#[test]
fn test_sweep_removes_only_expired_tags() {
    let ttl = Duration::from_secs(90);
    let registry = TagRegistry::with_ttl(ttl);

    let before = Instant::now();
    registry.add_or_refresh("A02_DB10_DBW2");

    // At the TTL boundary the tag survives (strict inequality): the entry
    // was refreshed at or after `before`, so its age here is at most TTL.
    assert_eq!(registry.sweep(before + ttl), 0);
    assert_eq!(registry.len(), 1);

    // Well past the boundary it is removed.
    assert_eq!(registry.sweep(before + ttl + Duration::from_secs(1)), 1);
    assert!(registry.is_empty());
}

#[test]
fn test_refreshed_tag_survives_sweep() {
    let ttl = Duration::from_millis(100);
    let registry = TagRegistry::with_ttl(ttl);
    registry.add_or_refresh("A02_DB10_DBW2");

    std::thread::sleep(Duration::from_millis(60));
    registry.add_or_refresh("A02_DB10_DBW2");
    std::thread::sleep(Duration::from_millis(60));

    // Without the refresh this would be past the TTL.
    assert_eq!(registry.sweep(Instant::now()), 0);
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_sweep_concurrent_with_refresh_never_drops_live_tag() {
    let registry = Arc::new(TagRegistry::with_ttl(Duration::from_secs(5)));
    registry.add_or_refresh("A02_DB10_DBW2");

    let refresher = {
        let registry = Arc::clone(&registry);
        std::thread::spawn(move || {
            for _ in 0..200 {
                registry.add_or_refresh("A02_DB10_DBW2");
                std::thread::sleep(Duration::from_micros(200));
            }
        })
    };
    let sweeper = {
        let registry = Arc::clone(&registry);
        std::thread::spawn(move || {
            for _ in 0..200 {
                registry.sweep(Instant::now());
                std::thread::sleep(Duration::from_micros(200));
            }
        })
    };

    refresher.join().unwrap();
    sweeper.join().unwrap();

    // The tag was refreshed continuously, so no sweep may have dropped it.
    assert!(registry.get("A02_DB10_DBW2").is_some());
}

// =============================================================================
// Per-source listing
// =============================================================================

#[test]
fn test_addresses_for_source_in_registration_order() {
    let registry = TagRegistry::new();
    registry.add_or_refresh("A02_DB10_DBW2");
    registry.add_or_refresh("A03_DB1_DBD0");
    registry.add_or_refresh("A02_DB10_DBW4");
    registry.add_or_refresh("A02_DB20_DBX0_1");

    let items = registry.addresses_for_source(&SourceId::new("A02"));
    let names: Vec<&str> = items.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, ["A02_DB10_DBW2", "A02_DB10_DBW4", "A02_DB20_DBX0_1"]);
}

#[test]
fn test_addresses_for_source_skips_malformed_names() {
    let registry = TagRegistry::new();
    registry.add_or_refresh("A02_DB10_DBW2");
    registry.add_or_refresh("A02");

    let items = registry.addresses_for_source(&SourceId::new("A02"));
    assert_eq!(items.len(), 1);
}

#[test]
fn test_refresh_keeps_registration_order() {
    let registry = TagRegistry::new();
    registry.add_or_refresh("A02_DB10_DBW2");
    registry.add_or_refresh("A02_DB10_DBW4");
    registry.add_or_refresh("A02_DB10_DBW2");

    let items = registry.addresses_for_source(&SourceId::new("A02"));
    let names: Vec<&str> = items.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, ["A02_DB10_DBW2", "A02_DB10_DBW4"]);
}

// =============================================================================
// Significance rule
// =============================================================================

#[test]
fn test_threshold_is_strict() {
    assert!(!exceeds_threshold(Some(10.0), 10.09, DEFAULT_EPSILON));
    assert!(exceeds_threshold(Some(10.0), 10.1, DEFAULT_EPSILON));
    assert!(exceeds_threshold(Some(10.0), 9.89, DEFAULT_EPSILON));
}

#[test]
fn test_missing_baseline_is_always_significant() {
    assert!(exceeds_threshold(None, 0.0, DEFAULT_EPSILON));
}

#[test]
fn test_threshold_scenario() {
    // Two successive polls 10.00 -> 10.05: no change. Third poll 10.20: change.
    assert!(!exceeds_threshold(Some(10.00), 10.05, DEFAULT_EPSILON));
    assert!(exceeds_threshold(Some(10.00), 10.20, DEFAULT_EPSILON));
}
