//! Line scheduler: fixed-rate tick driving every carrier and station.
//!
//! ## Tick Body
//! 1. Apply verdicts delivered since the previous tick.
//! 2. Feed a new carrier from the scene when one is due.
//! 3. Advance every carrier controller by `dt`.
//! 4. Retire finished carriers.
//! 5. Report proximity to each station; spawn a pipeline task per new session.
//! 6. Reap finished session tasks.
//!
//! Sessions run as tasks on the same current-thread runtime and never block
//! the tick. They reach the scheduler only through the verdict channel.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use sortline_common::config::ConfigError;
use sortline_common::route::{WaypointKind, WaypointRoute};
use sortline_common::state::{CarrierId, SessionOutcome, StationId};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::acquisition::{SampleSource, SyntheticCamera};
use crate::classifier::{Classifier, ProcessClassifier};
use crate::config::{LineConfig, StationConfig};
use crate::error::LineError;
use crate::motion::{CarrierMotionController, CarrierTransition, MotionParams};
use crate::pipeline::{CaptureClassifyPipeline, SessionReport, Verdict};
use crate::scene::{SimulatedScene, proximity};
use crate::trigger::CaptureTrigger;

// ─── Line Statistics ────────────────────────────────────────────────

/// Per-run counters, logged at shutdown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LineStats {
    /// Ticks executed.
    pub ticks: u64,
    /// Longest tick body [µs].
    pub max_tick_us: u64,
    pub spawned: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub sessions_succeeded: u64,
    pub sessions_timed_out: u64,
    pub sessions_malformed: u64,
    /// Sessions still running at shutdown.
    pub sessions_abandoned: u64,
    pub verdicts_applied: u64,
    /// Verdicts that reached a carrier after it was routed.
    pub late_verdicts: u64,
    /// Verdicts for carriers no longer on the lane.
    pub dropped_verdicts: u64,
}

impl LineStats {
    #[inline]
    pub fn record_tick(&mut self, body: Duration) {
        self.ticks += 1;
        let us = u64::try_from(body.as_micros()).unwrap_or(u64::MAX);
        self.max_tick_us = self.max_tick_us.max(us);
    }

    pub fn record_session(&mut self, outcome: SessionOutcome) {
        match outcome {
            SessionOutcome::Success { .. } => self.sessions_succeeded += 1,
            SessionOutcome::TimedOut => self.sessions_timed_out += 1,
            SessionOutcome::Malformed => self.sessions_malformed += 1,
            SessionOutcome::Pending => {}
        }
    }

    pub fn record_finished(&mut self, terminal: WaypointKind) {
        match terminal {
            WaypointKind::Accepted => self.accepted += 1,
            WaypointKind::Rejected => self.rejected += 1,
            WaypointKind::Inspection | WaypointKind::Sorting => {}
        }
    }

    /// Sessions that produced a final outcome.
    pub fn sessions_total(&self) -> u64 {
        self.sessions_succeeded + self.sessions_timed_out + self.sessions_malformed
    }

    pub fn log_summary(&self) {
        info!(
            ticks = self.ticks,
            max_tick_us = self.max_tick_us,
            spawned = self.spawned,
            accepted = self.accepted,
            rejected = self.rejected,
            sessions = self.sessions_total(),
            succeeded = self.sessions_succeeded,
            timed_out = self.sessions_timed_out,
            malformed = self.sessions_malformed,
            abandoned = self.sessions_abandoned,
            late_verdicts = self.late_verdicts,
            dropped_verdicts = self.dropped_verdicts,
            "line summary"
        );
    }
}

// ─── Line Runner ────────────────────────────────────────────────────

/// One inspection station: trigger plus its pipeline.
#[derive(Debug)]
struct Station<S, C> {
    trigger: CaptureTrigger,
    pipeline: Arc<CaptureClassifyPipeline<S, C>>,
}

/// Scheduler for one simulated lane.
#[derive(Debug)]
pub struct LineRunner<S, C> {
    route: Arc<WaypointRoute>,
    params: MotionParams,
    period: Duration,
    run_for: Option<Duration>,
    scene: SimulatedScene,
    stations: Vec<Station<S, C>>,
    carriers: BTreeMap<CarrierId, CarrierMotionController>,
    sessions: JoinSet<SessionReport>,
    verdicts: UnboundedReceiver<Verdict>,
    stats: LineStats,
}

impl LineRunner<SyntheticCamera, ProcessClassifier> {
    /// Lane with a synthetic camera and a process classifier per station.
    ///
    /// Creates every station's sample folder.
    pub fn from_config(config: &LineConfig) -> Result<Self, LineError> {
        Self::new(config, |station| {
            std::fs::create_dir_all(&station.save_folder).map_err(|source| LineError::SampleFolder {
                path: station.save_folder.clone(),
                source,
            })?;
            let classifier = ProcessClassifier::from_command(&station.classifier).ok_or_else(|| {
                ConfigError::ValidationError(format!("station {}: classifier command is empty", station.id))
            })?;
            Ok((SyntheticCamera, classifier))
        })
    }
}

impl<S: SampleSource, C: Classifier> LineRunner<S, C> {
    /// Build a lane, asking `backends` for each station's source and classifier.
    pub fn new<F>(config: &LineConfig, mut backends: F) -> Result<Self, LineError>
    where
        F: FnMut(&StationConfig) -> Result<(S, C), LineError>,
    {
        let route = Arc::new(config.route.clone());
        let (tx, rx) = mpsc::unbounded_channel();

        let mut stations = Vec::with_capacity(config.stations.len());
        for sc in &config.stations {
            let (source, classifier) = backends(sc)?;
            let trigger = CaptureTrigger::new(
                sc.station_id(),
                sc.position_on(&route),
                sc.capture_precision,
                sc.trigger_radius,
            );
            let pipeline = CaptureClassifyPipeline::new(sc.pipeline_settings(&route), source, classifier, tx.clone());
            stations.push(Station {
                trigger,
                pipeline: Arc::new(pipeline),
            });
        }

        let sim = &config.simulation;
        Ok(Self {
            scene: SimulatedScene::new(
                sim.entry_on(&route),
                Duration::from_millis(sim.spawn_interval_ms),
                sim.carrier_count,
            ),
            route,
            params: config.motion.params(),
            period: config.scheduler.period(),
            run_for: sim.run_for(),
            stations,
            carriers: BTreeMap::new(),
            sessions: JoinSet::new(),
            verdicts: rx,
            stats: LineStats::default(),
        })
    }

    #[inline]
    pub fn stats(&self) -> &LineStats {
        &self.stats
    }

    pub fn carrier(&self, id: CarrierId) -> Option<&CarrierMotionController> {
        self.carriers.get(&id)
    }

    /// Carriers currently on the lane, in id order.
    pub fn carriers(&self) -> impl Iterator<Item = &CarrierMotionController> {
        self.carriers.values()
    }

    /// Session tasks not yet reaped.
    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Whether `station` has a session in flight.
    pub fn is_station_pending(&self, station: StationId) -> bool {
        self.stations
            .iter()
            .any(|s| s.trigger.station() == station && s.trigger.is_pending())
    }

    /// Every carrier has been fed, has finished and has no session left.
    pub fn is_complete(&self) -> bool {
        self.scene.is_exhausted() && self.carriers.is_empty() && self.sessions.is_empty()
    }

    /// Run one tick. Must be called inside a tokio runtime.
    pub fn tick(&mut self, dt: Duration) {
        self.apply_verdicts();

        if let Some((id, entry)) = self.scene.advance(dt) {
            info!(carrier = %id, position = %entry, "carrier entered lane");
            self.carriers.insert(
                id,
                CarrierMotionController::new(id, Arc::clone(&self.route), self.params, entry),
            );
            self.stats.spawned += 1;
        }

        let mut finished = Vec::new();
        for carrier in self.carriers.values_mut() {
            let Some(transition) = carrier.tick(dt) else {
                continue;
            };
            let id = carrier.id();
            match transition {
                CarrierTransition::DwellStarted => {
                    debug!(carrier = %id, "dwelling at inspection point")
                }
                CarrierTransition::DwellElapsed => {
                    debug!(carrier = %id, "heading for sorting point")
                }
                CarrierTransition::Routed { flag, terminal } => {
                    info!(carrier = %id, flag = ?flag, terminal = ?terminal, "routed")
                }
                CarrierTransition::Finished { terminal } => {
                    info!(carrier = %id, terminal = ?terminal, "carrier left lane");
                    finished.push((id, terminal));
                }
            }
        }
        for (id, terminal) in finished {
            self.carriers.remove(&id);
            self.stats.record_finished(terminal);
            for station in &mut self.stations {
                station.trigger.retire(id);
            }
        }

        for station in &mut self.stations {
            let near = proximity(
                station.trigger.position(),
                station.trigger.trigger_radius(),
                self.carriers.values(),
            );
            for (id, distance) in near {
                if let Some(session) = station.trigger.on_proximity(id, distance) {
                    let pipeline = Arc::clone(&station.pipeline);
                    self.sessions
                        .spawn(async move { pipeline.run(session).await });
                }
            }
        }

        self.reap_sessions();
    }

    /// Drive the lane at the configured rate until `shutdown` resolves,
    /// `run_for` elapses, or a bounded feed completes.
    pub async fn run(&mut self, shutdown: impl Future<Output = ()>) -> LineStats {
        tokio::pin!(shutdown);

        let started = Instant::now();
        let mut last = started;
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            period_us = self.period.as_micros() as u64,
            stations = self.stations.len(),
            route_length = self.route.length_via(WaypointKind::Accepted),
            "line started"
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    break;
                }
                now = interval.tick() => {
                    let dt = now.saturating_duration_since(last);
                    last = now;

                    let body = std::time::Instant::now();
                    self.tick(dt);
                    self.stats.record_tick(body.elapsed());

                    if self.is_complete() {
                        info!("all carriers finished");
                        break;
                    }
                    if self.run_for.is_some_and(|limit| now.duration_since(started) >= limit) {
                        info!("run time elapsed");
                        break;
                    }
                }
            }
        }

        self.abandon_sessions().await;
        self.stats.clone()
    }

    fn apply_verdicts(&mut self) {
        while let Ok(verdict) = self.verdicts.try_recv() {
            match self.carriers.get_mut(&verdict.carrier) {
                Some(carrier) => {
                    if carrier.set_defect_status(verdict.defective) {
                        self.stats.verdicts_applied += 1;
                        debug!(
                            carrier = %verdict.carrier,
                            station = %verdict.station,
                            session = %verdict.session,
                            defective = verdict.defective,
                            "verdict applied"
                        );
                    } else {
                        self.stats.late_verdicts += 1;
                    }
                }
                None => {
                    self.stats.dropped_verdicts += 1;
                    warn!(
                        carrier = %verdict.carrier,
                        station = %verdict.station,
                        session = %verdict.session,
                        "carrier no longer on lane; verdict dropped"
                    );
                }
            }
        }
    }

    fn reap_sessions(&mut self) {
        while let Some(joined) = self.sessions.try_join_next() {
            match joined {
                Ok(report) => {
                    debug!(
                        station = %report.station,
                        session = %report.session,
                        outcome = report.outcome.label(),
                        elapsed_ms = report.elapsed.as_millis() as u64,
                        "session finished"
                    );
                    self.stats.record_session(report.outcome);
                }
                Err(e) => error!("session task failed: {e}"),
            }
        }
    }

    async fn abandon_sessions(&mut self) {
        self.reap_sessions();
        let open = self.sessions.len();
        if open > 0 {
            warn!(sessions = open, "abandoning sessions still in flight");
            self.stats.sessions_abandoned += open as u64;
            self.sessions.shutdown().await;
        }
        self.apply_verdicts();
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
