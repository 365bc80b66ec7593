//! Simulated lane scene.
//!
//! Stands in for the physical conveyor: feeds new carriers at a fixed
//! interval and reports, per station, which carriers are inside its
//! trigger volume and how far from the station they are.

use std::time::Duration;

use sortline_common::geometry::Vec3;
use sortline_common::state::CarrierId;

use crate::motion::CarrierMotionController;

/// Carrier feed for the simulated lane.
#[derive(Debug, Clone)]
pub struct SimulatedScene {
    entry: Vec3,
    spawn_interval: Duration,
    /// 0 = unbounded.
    carrier_count: u64,
    spawned: u64,
    since_last: Duration,
    next_id: u64,
}

impl SimulatedScene {
    pub fn new(entry: Vec3, spawn_interval: Duration, carrier_count: u64) -> Self {
        Self {
            entry,
            spawn_interval,
            carrier_count,
            spawned: 0,
            since_last: Duration::ZERO,
            next_id: 1,
        }
    }

    #[inline]
    pub fn spawned(&self) -> u64 {
        self.spawned
    }

    /// Whether every configured carrier has been spawned.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.carrier_count != 0 && self.spawned >= self.carrier_count
    }

    /// Advance the feed by `dt`, returning a new carrier when one is due.
    ///
    /// The first carrier appears on the first call. At most one carrier is
    /// spawned per call.
    pub fn advance(&mut self, dt: Duration) -> Option<(CarrierId, Vec3)> {
        if self.is_exhausted() {
            return None;
        }
        if self.spawned > 0 {
            self.since_last += dt;
            if self.since_last < self.spawn_interval {
                return None;
            }
            self.since_last -= self.spawn_interval;
        }

        let id = CarrierId(self.next_id);
        self.next_id += 1;
        self.spawned += 1;
        Some((id, self.entry))
    }
}

/// Carriers inside `radius` of `station`, with their distance, in id order.
pub fn proximity<'a>(
    station: Vec3,
    radius: f64,
    carriers: impl IntoIterator<Item = &'a CarrierMotionController>,
) -> Vec<(CarrierId, f64)> {
    let mut inside: Vec<_> = carriers
        .into_iter()
        .filter(|c| !c.is_finished())
        .map(|c| (c.id(), c.position().distance(station)))
        .filter(|&(_, d)| d <= radius)
        .collect();
    inside.sort_unstable_by_key(|&(id, _)| id);
    inside
}
