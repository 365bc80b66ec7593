//! Integration test: carriers flow through capture, classification and
//! routing on a single lane.

use std::path::{Path, PathBuf};
use std::time::Duration;

use sortline_common::prelude::*;
use sortline_control::acquisition::{SampleRequest, SampleSource};
use sortline_control::classifier::Classifier;
use sortline_control::cycle::LineRunner;
use sortline_control::config::StationConfig;
use sortline_control::error::InspectionError;

use super::{CLEAN, DEFECTIVE, ScriptedClassifier, lane, point, run_lane, runner};

// ── Verdict by carrier identity ─────────────────────────────────────

/// Names the sample after the carrier so the classifier can tell them apart.
struct NamedSource;

impl SampleSource for NamedSource {
    async fn acquire(&self, request: &SampleRequest) -> Result<PathBuf, InspectionError> {
        Ok(PathBuf::from(request.subject.0.to_string()))
    }
}

/// Odd carriers are defective.
struct ParityClassifier;

impl Classifier for ParityClassifier {
    async fn classify(&self, sample: &Path) -> Result<String, InspectionError> {
        let id: u64 = sample.to_string_lossy().parse().unwrap_or(0);
        Ok(if id % 2 == 1 { DEFECTIVE } else { CLEAN }.to_string())
    }
}

#[tokio::test(start_paused = true)]
async fn defective_carriers_are_rejected() {
    let config = lane(|c| c.simulation.carrier_count = 2);
    let stats = run_lane(&config, &ScriptedClassifier::replying(DEFECTIVE)).await;

    assert_eq!(stats.spawned, 2);
    assert_eq!(stats.rejected, 2);
    assert_eq!(stats.accepted, 0);
    assert_eq!(stats.sessions_succeeded, 2);
    assert_eq!(stats.verdicts_applied, 2);
    assert_eq!(stats.late_verdicts + stats.dropped_verdicts, 0);
}

#[tokio::test(start_paused = true)]
async fn clean_carriers_are_accepted() {
    let config = lane(|c| c.simulation.carrier_count = 3);
    let stats = run_lane(&config, &ScriptedClassifier::replying(CLEAN)).await;

    assert_eq!(stats.accepted, 3);
    assert_eq!(stats.rejected, 0);
    assert_eq!(stats.sessions_succeeded, 3);
}

#[tokio::test(start_paused = true)]
async fn verdict_reaches_its_own_carrier() {
    let config = lane(|c| c.simulation.carrier_count = 4);
    let mut line = LineRunner::new(&config, |_| Ok((NamedSource, ParityClassifier))).unwrap();
    let stats = line.run(std::future::pending()).await;

    assert_eq!(stats.rejected, 2);
    assert_eq!(stats.accepted, 2);
    assert_eq!(stats.verdicts_applied, 4);
}

#[tokio::test(start_paused = true)]
async fn verdict_is_held_until_sorting_point() {
    let config = lane(|c| c.motion.inspection_pause_ms = 500);
    let mut line = runner(&config, &ScriptedClassifier::replying(DEFECTIVE));
    let dt = Duration::from_millis(10);

    line.tick(Duration::ZERO);
    tokio::task::yield_now().await;
    line.tick(dt);

    let carrier = line.carrier(CarrierId(1)).unwrap();
    assert_eq!(carrier.defect_flag(), DefectFlag::Defective);
    assert_eq!(carrier.state(), MotionState::Dwelling);
    assert_eq!(carrier.target(), WaypointKind::Inspection);

    // Dwell, then travel to the sorting point.
    for _ in 0..100 {
        line.tick(dt);
        if line.carrier(CarrierId(1)).is_none_or(|c| c.state() == MotionState::Routed) {
            break;
        }
    }
    let carrier = line.carrier(CarrierId(1)).unwrap();
    assert_eq!(carrier.state(), MotionState::Routed);
    assert_eq!(carrier.target(), WaypointKind::Rejected);
}

#[tokio::test(start_paused = true)]
async fn stations_capture_independently() {
    let config = lane(|c| {
        let mut second: StationConfig = c.stations[0].clone();
        second.id = 2;
        second.position = Some(point(0.0, 0.0, 0.0));
        c.stations.push(second);
        c.simulation.carrier_count = 2;
    });
    let classifier = ScriptedClassifier::replying(DEFECTIVE).after(Duration::from_millis(50));
    let stats = run_lane(&config, &classifier).await;

    assert_eq!(stats.sessions_succeeded, 4);
    assert_eq!(stats.rejected, 2);
    assert_eq!(classifier.probe.max_in_flight.load(std::sync::atomic::Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn carriers_enter_at_configured_entry() {
    let config = lane(|c| c.simulation.entry = Some(point(-1.0, 0.0, 0.0)));
    let mut line = runner(&config, &ScriptedClassifier::replying(CLEAN));

    line.tick(Duration::ZERO);
    let carrier = line.carrier(CarrierId(1)).unwrap();
    assert_eq!(carrier.position(), point(-1.0, 0.0, 0.0));
    assert_eq!(carrier.state(), MotionState::Traveling);
    assert_eq!(line.active_sessions(), 0);

    let stats = line.run(std::future::pending()).await;
    assert_eq!(stats.accepted, 1);
    assert_eq!(stats.sessions_succeeded, 1);
}
