//! Integration test: one capture session per station at a time.
//!
//! Carriers arrive faster than the classifier answers. Those that dwell at
//! the capture point while a session is pending are not captured and reach
//! the sorting point without a verdict.

use std::sync::atomic::Ordering;
use std::time::Duration;

use sortline_common::prelude::*;

use super::{DEFECTIVE, ScriptedClassifier, lane, runner};

#[tokio::test(start_paused = true)]
async fn slow_classifier_serializes_captures() {
    let config = lane(|c| {
        c.simulation.spawn_interval_ms = 300;
        c.simulation.carrier_count = 5;
    });
    let classifier = ScriptedClassifier::replying(DEFECTIVE).after(Duration::from_millis(1000));
    let mut line = runner(&config, &classifier);
    let stats = line.run(std::future::pending()).await;

    assert_eq!(classifier.probe.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(classifier.probe.calls.load(Ordering::SeqCst) as u64, stats.sessions_total());
    assert!(stats.sessions_total() < stats.spawned);
    assert_eq!(stats.spawned, 5);
    assert_eq!(stats.accepted + stats.rejected, 5);
}

#[tokio::test(start_paused = true)]
async fn pending_station_ignores_next_carrier() {
    let config = lane(|c| {
        c.simulation.spawn_interval_ms = 50;
        c.simulation.carrier_count = 2;
    });
    let classifier = ScriptedClassifier::replying(DEFECTIVE).after(Duration::from_secs(2));
    let mut line = runner(&config, &classifier);

    line.tick(Duration::ZERO);
    assert!(line.is_station_pending(StationId(1)));

    // Second carrier lands on the capture point while #1 is pending.
    line.tick(Duration::from_millis(50));
    let second = line.carrier(CarrierId(2)).expect("second carrier");
    assert_eq!(second.state(), MotionState::Dwelling);
    assert_eq!(line.active_sessions(), 1);

    let dt = Duration::from_millis(10);
    for _ in 0..100 {
        tokio::task::yield_now().await;
        line.tick(dt);
        if line.carrier(CarrierId(2)).is_some_and(|c| c.state() == MotionState::Routed) {
            break;
        }
    }
    let second = line.carrier(CarrierId(2)).unwrap();
    assert_eq!(second.state(), MotionState::Routed);
    assert_eq!(second.defect_flag(), DefectFlag::Unknown);
    assert_eq!(second.target(), WaypointKind::Accepted);
    assert_eq!(classifier.probe.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn station_is_released_after_verdict() {
    let config = lane(|c| {
        c.simulation.spawn_interval_ms = 300;
        c.simulation.carrier_count = 2;
    });
    let classifier = ScriptedClassifier::replying(DEFECTIVE).after(Duration::from_millis(50));
    let stats = super::run_lane(&config, &classifier).await;

    assert_eq!(stats.sessions_succeeded, 2);
    assert_eq!(stats.rejected, 2);
    assert_eq!(classifier.probe.max_in_flight.load(Ordering::SeqCst), 1);
}
