//! Integration test: fallback and unknown-verdict policies.
//!
//! Failed sessions deliver the station's fallback verdict; carriers that
//! reach the sorting point with no verdict follow the lane's unknown-verdict
//! policy. Verdicts that miss their carrier are counted, not applied.

use std::time::Duration;

use sortline_common::prelude::*;
use sortline_control::cycle::LineStats;

use super::{DEFECTIVE, ScriptedClassifier, lane, point, run_lane};

/// Lane whose classifier deadline expires during the dwell.
fn short_deadline(fallback: FallbackPolicy) -> sortline_control::config::LineConfig {
    lane(|c| {
        c.motion.inspection_pause_ms = 500;
        c.stations[0].processing_timeout_ms = 200;
        c.stations[0].fallback = fallback;
    })
}

#[tokio::test(start_paused = true)]
async fn timeout_fails_open_by_default() {
    let stats = run_lane(&short_deadline(FallbackPolicy::default()), &ScriptedClassifier::hanging()).await;

    assert_eq!(stats.sessions_timed_out, 1);
    assert_eq!(stats.verdicts_applied, 1);
    assert_eq!(stats.accepted, 1);
    assert_eq!(stats.rejected, 0);
}

#[tokio::test(start_paused = true)]
async fn timeout_fails_closed_when_configured() {
    let stats = run_lane(&short_deadline(FallbackPolicy::FailClosed), &ScriptedClassifier::hanging()).await;

    assert_eq!(stats.sessions_timed_out, 1);
    assert_eq!(stats.rejected, 1);
    assert_eq!(stats.accepted, 0);
}

#[tokio::test(start_paused = true)]
async fn timeout_after_classifier_reply_is_not_hit() {
    let classifier = ScriptedClassifier::replying(DEFECTIVE).after(Duration::from_millis(150));
    let stats = run_lane(&short_deadline(FallbackPolicy::FailOpen), &classifier).await;

    assert_eq!(stats.sessions_succeeded, 1);
    assert_eq!(stats.sessions_timed_out, 0);
    assert_eq!(stats.rejected, 1);
}

#[tokio::test(start_paused = true)]
async fn malformed_output_uses_fallback() {
    for (reply, fallback, expected_rejected) in [
        ("", FallbackPolicy::FailOpen, 0),
        ("not json", FallbackPolicy::FailOpen, 0),
        (r#"{"has_defects": true}"#, FallbackPolicy::FailOpen, 0),
        ("not json", FallbackPolicy::FailClosed, 1),
    ] {
        let config = lane(|c| c.stations[0].fallback = fallback);
        let stats = run_lane(&config, &ScriptedClassifier::replying(reply)).await;

        assert_eq!(stats.sessions_malformed, 1, "reply {reply:?}");
        assert_eq!(stats.rejected, expected_rejected, "reply {reply:?}");
        assert_eq!(stats.accepted + stats.rejected, 1);
    }
}

#[tokio::test(start_paused = true)]
async fn unknown_verdict_follows_lane_policy() {
    async fn run_with(policy: UnknownVerdictPolicy) -> LineStats {
        let config = lane(|c| {
            c.motion.unknown_verdict = policy;
            c.stations[0].processing_timeout_ms = 10_000;
        });
        let classifier = ScriptedClassifier::replying(DEFECTIVE).after(Duration::from_secs(2));
        run_lane(&config, &classifier).await
    }

    let open = run_with(UnknownVerdictPolicy::Accept).await;
    assert_eq!(open.accepted, 1);
    // The carrier left before the verdict came back.
    assert_eq!(open.dropped_verdicts, 1);
    assert_eq!(open.sessions_succeeded, 1);

    let closed = run_with(UnknownVerdictPolicy::Reject).await;
    assert_eq!(closed.rejected, 1);
    assert_eq!(closed.dropped_verdicts, 1);
}

#[tokio::test(start_paused = true)]
async fn verdict_after_routing_is_late() {
    let config = lane(|c| {
        c.route = WaypointRoute::new(
            point(0.0, 0.0, 0.0),
            point(1.0, 0.0, 0.0),
            point(1.0, 0.0, 10.0),
            point(1.0, 0.0, -10.0),
        )
        .unwrap();
    });
    let classifier = ScriptedClassifier::replying(DEFECTIVE).after(Duration::from_millis(500));
    let stats = run_lane(&config, &classifier).await;

    assert_eq!(stats.late_verdicts, 1);
    assert_eq!(stats.verdicts_applied, 0);
    assert_eq!(stats.accepted, 1);
    assert_eq!(stats.rejected, 0);
}
