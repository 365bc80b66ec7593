//! Capture trigger: per-station single-flight proximity detector.
//!
//! The scene reports every carrier inside a station's trigger volume once
//! per tick. The trigger starts a [`CaptureSession`] for the first carrier
//! within `capture_precision` while no other session is pending at this
//! station. The pending state is a one-permit semaphore owned by the
//! station; the session holds the permit, so dropping the session is what
//! releases the station.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use sortline_common::geometry::Vec3;
use sortline_common::state::{CarrierId, SessionOutcome, StationId};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;
use tracing::{debug, info};

/// Monotonic per-station session number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One acquire → classify → deliver cycle for one carrier.
///
/// Holds the station's single-flight permit for its whole lifetime.
#[derive(Debug)]
pub struct CaptureSession {
    pub id: SessionId,
    pub station: StationId,
    /// Carrier under inspection, by identity only.
    pub subject: CarrierId,
    pub started: Instant,
    /// Path of the persisted sample, once acquired.
    pub sample: Option<PathBuf>,
    pub outcome: SessionOutcome,
    _permit: OwnedSemaphorePermit,
}

/// Proximity detector bound to one station.
#[derive(Debug)]
pub struct CaptureTrigger {
    station: StationId,
    position: Vec3,
    capture_precision: f64,
    trigger_radius: f64,
    gate: Arc<Semaphore>,
    next_session: u64,
    inspected: HashSet<CarrierId>,
}

impl CaptureTrigger {
    pub fn new(station: StationId, position: Vec3, capture_precision: f64, trigger_radius: f64) -> Self {
        Self {
            station,
            position,
            capture_precision,
            trigger_radius,
            gate: Arc::new(Semaphore::new(1)),
            next_session: 1,
            inspected: HashSet::new(),
        }
    }

    #[inline]
    pub fn station(&self) -> StationId {
        self.station
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Radius of the volume in which the scene reports proximity.
    #[inline]
    pub fn trigger_radius(&self) -> f64 {
        self.trigger_radius
    }

    /// Whether a session is currently in flight at this station.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.gate.available_permits() == 0
    }

    /// Handle one proximity report.
    ///
    /// Starts a session when `distance <= capture_precision`, the station is
    /// idle, and this carrier has not already been captured here.
    pub fn on_proximity(&mut self, carrier: CarrierId, distance: f64) -> Option<CaptureSession> {
        if distance.is_nan() || distance > self.capture_precision {
            return None;
        }
        if self.inspected.contains(&carrier) {
            return None;
        }

        let permit = match Arc::clone(&self.gate).try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                debug!(station = %self.station, carrier = %carrier, "capture already in flight; ignored");
                return None;
            }
        };

        let id = SessionId(self.next_session);
        self.next_session += 1;
        self.inspected.insert(carrier);

        info!(station = %self.station, carrier = %carrier, session = %id, distance, "capture triggered");

        Some(CaptureSession {
            id,
            station: self.station,
            subject: carrier,
            started: Instant::now(),
            sample: None,
            outcome: SessionOutcome::Pending,
            _permit: permit,
        })
    }

    /// Forget a carrier that has left the lane.
    pub fn retire(&mut self, carrier: CarrierId) {
        self.inspected.remove(&carrier);
    }
}
