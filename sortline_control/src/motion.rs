//! Carrier motion state machine.
//!
//! Per-carrier waypoint sequencing: Traveling → Dwelling → Traveling →
//! Routed → Finished.
//!
//! - Arrival at the inspection point starts a dwell of `inspection_pause`.
//! - When the dwell elapses the carrier heads for the sorting point.
//! - Arrival at the sorting point consumes the defect flag and selects the
//!   accepted or rejected terminal.
//! - Arrival at a terminal finishes the carrier; further ticks are ignored.
//!
//! Arrival is tolerance-based: `distance <= stop_precision`. The current
//! target is held as a [`WaypointKind`] tag, so routing never depends on
//! comparing floating-point coordinates.

use std::sync::Arc;
use std::time::Duration;

use sortline_common::geometry::Vec3;
use sortline_common::route::{WaypointKind, WaypointRoute};
use sortline_common::state::{CarrierId, DefectFlag, MotionState, UnknownVerdictPolicy};
use tracing::{debug, trace};

/// Kinematic and routing parameters shared by all carriers on a lane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionParams {
    /// Travel speed [units/s].
    pub speed: f64,
    /// Arrival tolerance [units].
    pub stop_precision: f64,
    /// Dwell at the inspection point.
    pub inspection_pause: Duration,
    /// Routing when no verdict arrived before the sorting point.
    pub unknown_verdict: UnknownVerdictPolicy,
}

/// Transition reported by [`CarrierMotionController::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarrierTransition {
    /// Reached the inspection point; dwell started.
    DwellStarted,
    /// Dwell elapsed; heading for the sorting point.
    DwellElapsed,
    /// Reached the sorting point; verdict consumed.
    Routed {
        flag: DefectFlag,
        terminal: WaypointKind,
    },
    /// Reached a terminal.
    Finished { terminal: WaypointKind },
}

/// Motion state machine for one carrier.
#[derive(Debug, Clone)]
pub struct CarrierMotionController {
    id: CarrierId,
    route: Arc<WaypointRoute>,
    params: MotionParams,
    position: Vec3,
    target: WaypointKind,
    state: MotionState,
    defect: DefectFlag,
    flag_consumed: bool,
    dwell_remaining: Duration,
}

impl CarrierMotionController {
    /// New carrier at `position`, heading for the inspection point.
    pub fn new(id: CarrierId, route: Arc<WaypointRoute>, params: MotionParams, position: Vec3) -> Self {
        Self {
            id,
            route,
            params,
            position,
            target: WaypointKind::Inspection,
            state: MotionState::Traveling,
            defect: DefectFlag::Unknown,
            flag_consumed: false,
            dwell_remaining: Duration::ZERO,
        }
    }

    #[inline]
    pub fn id(&self) -> CarrierId {
        self.id
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    pub fn target(&self) -> WaypointKind {
        self.target
    }

    #[inline]
    pub fn state(&self) -> MotionState {
        self.state
    }

    #[inline]
    pub fn defect_flag(&self) -> DefectFlag {
        self.defect
    }

    /// Remaining dwell time (zero unless Dwelling).
    #[inline]
    pub fn dwell_remaining(&self) -> Duration {
        self.dwell_remaining
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.state == MotionState::Finished
    }

    /// Record the latest classification result. Last write wins.
    ///
    /// Returns `false` when the verdict came too late: the flag was already
    /// consumed at the sorting point, so the write has no effect.
    pub fn set_defect_status(&mut self, defective: bool) -> bool {
        if self.flag_consumed {
            debug!(carrier = %self.id, defective, "verdict arrived after routing; ignored");
            return false;
        }
        self.defect = DefectFlag::from_verdict(defective);
        true
    }

    /// Advance the carrier by `dt`.
    ///
    /// Moves toward the current target while Traveling or Routed, counts the
    /// dwell down while Dwelling, and does nothing once Finished.
    pub fn tick(&mut self, dt: Duration) -> Option<CarrierTransition> {
        match self.state {
            MotionState::Finished => None,
            MotionState::Dwelling => {
                self.dwell_remaining = self.dwell_remaining.saturating_sub(dt);
                if !self.dwell_remaining.is_zero() {
                    return None;
                }
                self.state = MotionState::Traveling;
                self.target = WaypointKind::Sorting;
                Some(CarrierTransition::DwellElapsed)
            }
            MotionState::Traveling | MotionState::Routed => {
                let goal = self.route.position(self.target);
                let step = self.params.speed * dt.as_secs_f64();
                self.position = self.position.move_towards(goal, step);
                trace!(carrier = %self.id, position = %self.position, target = ?self.target, "tick");

                if self.position.distance(goal) <= self.params.stop_precision {
                    Some(self.on_arrival())
                } else {
                    None
                }
            }
        }
    }

    fn on_arrival(&mut self) -> CarrierTransition {
        match self.target {
            WaypointKind::Inspection => {
                self.state = MotionState::Dwelling;
                self.dwell_remaining = self.params.inspection_pause;
                CarrierTransition::DwellStarted
            }
            WaypointKind::Sorting => {
                let flag = self.defect;
                let terminal = route_for(flag, self.params.unknown_verdict);
                self.flag_consumed = true;
                self.state = MotionState::Routed;
                self.target = terminal;
                CarrierTransition::Routed { flag, terminal }
            }
            terminal @ (WaypointKind::Accepted | WaypointKind::Rejected) => {
                self.state = MotionState::Finished;
                CarrierTransition::Finished { terminal }
            }
        }
    }
}

/// Terminal selected at the sorting point for a given defect flag.
#[inline]
pub const fn route_for(flag: DefectFlag, unknown: UnknownVerdictPolicy) -> WaypointKind {
    match (flag, unknown) {
        (DefectFlag::Defective, _) => WaypointKind::Rejected,
        (DefectFlag::Clean, _) => WaypointKind::Accepted,
        (DefectFlag::Unknown, UnknownVerdictPolicy::Accept) => WaypointKind::Accepted,
        (DefectFlag::Unknown, UnknownVerdictPolicy::Reject) => WaypointKind::Rejected,
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
