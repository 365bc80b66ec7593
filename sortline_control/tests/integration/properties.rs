//! Property tests for carrier motion: tolerance-based arrival and liveness.

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use sortline_common::prelude::*;
use sortline_control::motion::{CarrierMotionController, CarrierTransition, MotionParams};

fn route() -> Arc<WaypointRoute> {
    Arc::new(
        WaypointRoute::new(
            Vec3::ZERO,
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::new(7.0, 0.0, 2.0),
            Vec3::new(7.0, 0.0, -2.0),
        )
        .unwrap(),
    )
}

fn params(speed: f64, stop_precision: f64) -> MotionParams {
    MotionParams {
        speed,
        stop_precision,
        inspection_pause: Duration::from_millis(300),
        unknown_verdict: UnknownVerdictPolicy::Accept,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn arrival_at_exact_precision(precision in 1e-4f64..2.0) {
        let mut c = CarrierMotionController::new(
            CarrierId(1), route(), params(1.0, precision), Vec3::new(-precision, 0.0, 0.0));
        prop_assert_eq!(c.tick(Duration::ZERO), Some(CarrierTransition::DwellStarted));
    }

    #[test]
    fn no_arrival_beyond_precision(precision in 1e-4f64..2.0) {
        let start = Vec3::new(-precision * (1.0 + 1e-6), 0.0, 0.0);
        let mut c = CarrierMotionController::new(CarrierId(1), route(), params(1.0, precision), start);
        prop_assert_eq!(c.tick(Duration::ZERO), None);
        prop_assert_eq!(c.state(), MotionState::Traveling);
    }

    #[test]
    fn carrier_at_inspection_always_finishes(
        speed in 0.5f64..50.0,
        precision in 1e-4f64..0.5,
        dt_ms in 1u64..100,
        defective in proptest::option::of(any::<bool>()),
    ) {
        let dt = Duration::from_millis(dt_ms);
        let mut c = CarrierMotionController::new(CarrierId(1), route(), params(speed, precision), Vec3::ZERO);
        if let Some(d) = defective {
            c.set_defect_status(d);
        }

        let travel_ticks = (8.0 / (speed * dt.as_secs_f64())).ceil() as u64;
        let bound = travel_ticks + 300 / dt_ms + 10;

        let mut seen = Vec::new();
        for _ in 0..bound {
            if let Some(t) = c.tick(dt) {
                seen.push(t);
            }
            if c.is_finished() {
                break;
            }
        }

        prop_assert!(c.is_finished());
        prop_assert_eq!(seen.len(), 4);
        prop_assert_eq!(seen[0], CarrierTransition::DwellStarted);
        prop_assert_eq!(seen[1], CarrierTransition::DwellElapsed);
        let expected = if defective == Some(true) { WaypointKind::Rejected } else { WaypointKind::Accepted };
        prop_assert_eq!(seen[3], CarrierTransition::Finished { terminal: expected });
    }
}
