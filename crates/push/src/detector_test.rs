//! Tests for per-viewer change detection

use std::collections::HashMap;

use chrono::Utc;

use tagbridge_registry::DEFAULT_EPSILON;

use crate::detector::ChangeDetector;
use crate::protocol::TagDelta;

fn detector(names: &[&str]) -> ChangeDetector {
    ChangeDetector::new(
        names.iter().map(|n| n.to_string()).collect(),
        DEFAULT_EPSILON,
    )
}

fn diff(det: &mut ChangeDetector, values: &HashMap<String, f64>) -> Vec<TagDelta> {
    det.diff(|n| values.get(n).copied(), Utc::now())
}

#[test]
fn test_first_value_always_emits() {
    let mut det = detector(&["A02_DB10_DBW2"]);
    let values = HashMap::from([("A02_DB10_DBW2".to_string(), 10.0)]);

    let deltas = diff(&mut det, &values);
    assert_eq!(deltas.len(), 1);
    assert_eq!(deltas[0].value, 10.0);
}

#[test]
fn test_small_move_is_suppressed() {
    let mut det = detector(&["A02_DB10_DBW2"]);
    let mut values = HashMap::from([("A02_DB10_DBW2".to_string(), 10.0)]);

    assert_eq!(diff(&mut det, &values).len(), 1);

    // 0.05 below the threshold, 0.09 exactly at it: both suppressed.
    values.insert("A02_DB10_DBW2".to_string(), 10.05);
    assert!(diff(&mut det, &values).is_empty());
    values.insert("A02_DB10_DBW2".to_string(), 10.09);
    assert!(diff(&mut det, &values).is_empty());

    values.insert("A02_DB10_DBW2".to_string(), 10.20);
    let deltas = diff(&mut det, &values);
    assert_eq!(deltas.len(), 1);
    assert_eq!(deltas[0].value, 10.20);
}

#[test]
fn test_baseline_moves_only_on_emit() {
    let mut det = detector(&["A02_DB10_DBW2"]);
    let mut values = HashMap::from([("A02_DB10_DBW2".to_string(), 10.0)]);
    diff(&mut det, &values);

    // Two sub-threshold steps that add up past it still emit, because the
    // baseline stayed at 10.0.
    values.insert("A02_DB10_DBW2".to_string(), 10.06);
    assert!(diff(&mut det, &values).is_empty());
    values.insert("A02_DB10_DBW2".to_string(), 10.12);
    let deltas = diff(&mut det, &values);
    assert_eq!(deltas.len(), 1);
    assert_eq!(deltas[0].value, 10.12);
}

#[test]
fn test_absent_value_is_skipped_without_baseline_change() {
    let mut det = detector(&["A02_DB10_DBW2"]);
    let mut values: HashMap<String, f64> = HashMap::new();

    // Never polled: nothing to say.
    assert!(diff(&mut det, &values).is_empty());

    // First real value emits.
    values.insert("A02_DB10_DBW2".to_string(), 10.0);
    assert_eq!(diff(&mut det, &values).len(), 1);

    // Value disappears (tag expired): silence, baseline intact.
    values.clear();
    assert!(diff(&mut det, &values).is_empty());

    // It comes back unchanged: still silence.
    values.insert("A02_DB10_DBW2".to_string(), 10.0);
    assert!(diff(&mut det, &values).is_empty());
}

#[test]
fn test_deltas_follow_subscription_order() {
    let mut det = detector(&["B01_DB1_DBW0", "A02_DB10_DBW2"]);
    let values = HashMap::from([
        ("A02_DB10_DBW2".to_string(), 1.0),
        ("B01_DB1_DBW0".to_string(), 2.0),
    ]);

    let deltas = diff(&mut det, &values);
    assert_eq!(deltas[0].name, "B01_DB1_DBW0");
    assert_eq!(deltas[1].name, "A02_DB10_DBW2");
}

#[test]
fn test_viewers_are_independent() {
    let values = HashMap::from([("A02_DB10_DBW2".to_string(), 10.0)]);

    let mut first = detector(&["A02_DB10_DBW2"]);
    let mut second = detector(&["A02_DB10_DBW2"]);

    assert_eq!(diff(&mut first, &values).len(), 1);
    // A late-joining viewer gets the current value even though another
    // viewer already saw it.
    assert_eq!(diff(&mut second, &values).len(), 1);
}
