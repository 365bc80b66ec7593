//! Waypoint route of the inspection lane.
//!
//! The route is fixed: Inspection → Sorting → (Accepted | Rejected).
//! Waypoints are addressed by [`WaypointKind`], so the motion controller
//! identifies its current target by tag and never by comparing coordinates.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::Vec3;

/// Identity of a route waypoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum WaypointKind {
    /// Capture point in front of the inspection station.
    Inspection = 0,
    /// Diverter where the verdict is consumed.
    Sorting = 1,
    /// Terminal for clean items.
    Accepted = 2,
    /// Terminal for defective items.
    Rejected = 3,
}

impl WaypointKind {
    pub const ALL: [Self; 4] = [
        Self::Inspection,
        Self::Sorting,
        Self::Accepted,
        Self::Rejected,
    ];
}

/// Route construction error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    /// Two waypoints share the same position.
    #[error("waypoints {a:?} and {b:?} coincide")]
    Coincident { a: WaypointKind, b: WaypointKind },

    /// A waypoint has a NaN or infinite component.
    #[error("waypoint {0:?} has a non-finite coordinate")]
    NonFinite(WaypointKind),
}

/// Static description of the lane.
///
/// # TOML Example
///
/// ```toml
/// [route]
/// inspection = [0.0, 0.0, 0.0]
/// sorting = [4.0, 0.0, 0.0]
/// accepted = [7.0, 0.0, 2.0]
/// rejected = [7.0, 0.0, -2.0]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRoute", into = "RawRoute")]
pub struct WaypointRoute {
    points: [Vec3; 4],
}

impl WaypointRoute {
    /// Build a route, rejecting coincident or non-finite waypoints.
    pub fn new(
        inspection: Vec3,
        sorting: Vec3,
        accepted: Vec3,
        rejected: Vec3,
    ) -> Result<Self, RouteError> {
        let points = [inspection, sorting, accepted, rejected];

        for kind in WaypointKind::ALL {
            if !points[kind as usize].is_finite() {
                return Err(RouteError::NonFinite(kind));
            }
        }

        for (i, a) in WaypointKind::ALL.iter().enumerate() {
            for b in &WaypointKind::ALL[i + 1..] {
                if points[*a as usize] == points[*b as usize] {
                    return Err(RouteError::Coincident { a: *a, b: *b });
                }
            }
        }

        Ok(Self { points })
    }

    /// Position of a waypoint.
    #[inline]
    pub fn position(&self, kind: WaypointKind) -> Vec3 {
        self.points[kind as usize]
    }

    /// Total path length for a given terminal, starting at the inspection point.
    pub fn length_via(&self, terminal: WaypointKind) -> f64 {
        let inspection = self.position(WaypointKind::Inspection);
        let sorting = self.position(WaypointKind::Sorting);
        inspection.distance(sorting) + sorting.distance(self.position(terminal))
    }
}

#[derive(Serialize, Deserialize)]
struct RawRoute {
    inspection: Vec3,
    sorting: Vec3,
    accepted: Vec3,
    rejected: Vec3,
}

impl TryFrom<RawRoute> for WaypointRoute {
    type Error = RouteError;

    fn try_from(raw: RawRoute) -> Result<Self, Self::Error> {
        Self::new(raw.inspection, raw.sorting, raw.accepted, raw.rejected)
    }
}

impl From<WaypointRoute> for RawRoute {
    fn from(route: WaypointRoute) -> Self {
        Self {
            inspection: route.position(WaypointKind::Inspection),
            sorting: route.position(WaypointKind::Sorting),
            accepted: route.position(WaypointKind::Accepted),
            rejected: route.position(WaypointKind::Rejected),
        }
    }
}
