//! Unit tests for buffered window-state writes.

use std::time::{Duration, Instant};

use rstest::rstest;
use serde_json::{Map, Value, json};
use ytmd_config::Config;

use super::*;
use crate::services::WatchDog;
use crate::tests::support::IntegrationHarness;

fn partial(entries: Value) -> Map<String, Value> {
    match entries {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

fn harness_with_threshold(threshold: u32) -> IntegrationHarness {
    let config = Config {
        state_write_threshold: threshold,
        state_flush_interval_secs: 30,
        ..Config::default()
    };
    IntegrationHarness::with_config(&config, json!({}))
}

#[test]
fn loads_the_stored_state_on_post_initialisation() {
    let harness = IntegrationHarness::with_settings(json!({
        "state": { "lastVideoId": "abc123" }
    }));
    let manager = harness.service::<StateManager>();

    assert_eq!(
        manager.current_state().get("lastVideoId"),
        Some(&json!("abc123"))
    );
    assert!(!manager.is_stale());
}

#[test]
fn identical_updates_do_not_mark_the_state_stale() {
    let harness = IntegrationHarness::ready();
    let manager = harness.service::<StateManager>();

    assert!(!manager.update_state(partial(json!({ "windowMaximized": false }))));
    assert!(!manager.is_stale());
}

#[test]
fn reaching_the_threshold_writes_immediately() {
    let harness = harness_with_threshold(2);
    let manager = harness.service::<StateManager>();

    assert!(manager.update_state(partial(json!({ "lastVideoId": "one" }))));
    assert!(manager.is_stale());
    assert_eq!(harness.config().get("state.lastVideoId"), Some(json!("")));

    assert!(manager.update_state(partial(json!({ "lastVideoId": "two" }))));

    assert!(!manager.is_stale());
    assert_eq!(harness.config().get("state.lastVideoId"), Some(json!("two")));
}

#[rstest]
#[case::before_interval(Duration::from_secs(5), false)]
#[case::after_interval(Duration::from_secs(31), true)]
fn flushes_once_the_interval_elapses(#[case] elapsed: Duration, #[case] written: bool) {
    let harness = IntegrationHarness::ready();
    let manager = harness.service::<StateManager>();
    manager.update_state(partial(json!({ "windowMaximized": true })));

    assert_eq!(manager.flush_if_due(Instant::now() + elapsed), written);
    assert_eq!(
        harness.config().get("state.windowMaximized"),
        Some(json!(written))
    );
}

#[test]
fn force_write_flushes_pending_state() {
    let harness = IntegrationHarness::ready();
    let manager = harness.service::<StateManager>();
    manager.update_state(partial(json!({ "lastUrl": "https://music.youtube.com/explore" })));

    assert!(manager.force_write());
    assert!(!manager.force_write(), "nothing left to write");
    assert_eq!(
        harness.config().get("state.lastUrl"),
        Some(json!("https://music.youtube.com/explore"))
    );
}

#[test]
fn crash_reports_stop_all_writes() {
    let harness = IntegrationHarness::ready();
    let manager = harness.service::<StateManager>();

    harness.service::<WatchDog>().report_crash("renderer gone");

    assert!(manager.is_panicked());
    assert!(!manager.update_state(partial(json!({ "windowMaximized": true }))));
    assert!(!manager.force_write());
    assert_eq!(
        harness.config().get("state.windowMaximized"),
        Some(json!(false))
    );
}

#[test]
fn updates_before_initialisation_are_ignored() {
    let manager = StateManager::default();

    assert!(!manager.update_state(partial(json!({ "windowMaximized": true }))));
    assert!(!manager.force_write());
}
