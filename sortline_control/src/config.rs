//! Line configuration: TOML loading and validation.
//!
//! One file describes the whole lane: motion parameters, the waypoint
//! route, the scheduler rate, the inspection stations and the simulated
//! carrier feed. Route geometry is checked while deserializing; everything
//! else is checked by [`LineConfig::validate`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sortline_common::config::{ConfigError, ConfigLoader, SharedConfig};
use sortline_common::consts::*;
use sortline_common::geometry::Vec3;
use sortline_common::route::{WaypointKind, WaypointRoute};
use sortline_common::state::{FallbackPolicy, StationId, UnknownVerdictPolicy};

use crate::motion::MotionParams;
use crate::pipeline::PipelineSettings;

// ─── Sections ───────────────────────────────────────────────────────

/// Complete lane configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineConfig {
    pub shared: SharedConfig,
    #[serde(default)]
    pub motion: MotionConfig,
    pub route: WaypointRoute,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    pub stations: Vec<StationConfig>,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// `[motion]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Carrier speed [units/s].
    pub speed: f64,
    /// Arrival tolerance [units].
    pub stop_precision: f64,
    /// Dwell at the inspection point [ms].
    pub inspection_pause_ms: u64,
    /// Routing of carriers that reach the sorting point without a verdict.
    pub unknown_verdict: UnknownVerdictPolicy,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SPEED,
            stop_precision: DEFAULT_STOP_PRECISION,
            inspection_pause_ms: DEFAULT_INSPECTION_PAUSE_MS,
            unknown_verdict: UnknownVerdictPolicy::default(),
        }
    }
}

impl MotionConfig {
    pub fn params(&self) -> MotionParams {
        MotionParams {
            speed: self.speed,
            stop_precision: self.stop_precision,
            inspection_pause: Duration::from_millis(self.inspection_pause_ms),
            unknown_verdict: self.unknown_verdict,
        }
    }
}

/// `[scheduler]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Fixed tick rate [Hz].
    pub tick_hz: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_hz: DEFAULT_TICK_HZ,
        }
    }
}

impl SchedulerConfig {
    /// Nominal tick period.
    pub fn period(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.tick_hz.max(1)))
    }
}

/// One `[[stations]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationConfig {
    pub id: u16,
    /// Station position; defaults to the route's inspection point.
    #[serde(default)]
    pub position: Option<Vec3>,
    #[serde(default = "default_capture_precision")]
    pub capture_precision: f64,
    #[serde(default = "default_trigger_radius")]
    pub trigger_radius: f64,
    /// `[width, height]` in pixels.
    #[serde(default = "default_resolution")]
    pub resolution: [u32; 2],
    #[serde(default = "default_save_folder")]
    pub save_folder: PathBuf,
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
    #[serde(default = "default_processing_timeout_ms")]
    pub processing_timeout_ms: u64,
    /// Program and leading arguments; `--image <path>` is appended.
    pub classifier: Vec<String>,
    #[serde(default)]
    pub fallback: FallbackPolicy,
}

fn default_capture_precision() -> f64 {
    DEFAULT_CAPTURE_PRECISION
}
fn default_trigger_radius() -> f64 {
    DEFAULT_TRIGGER_RADIUS
}
fn default_resolution() -> [u32; 2] {
    DEFAULT_RESOLUTION
}
fn default_save_folder() -> PathBuf {
    PathBuf::from(DEFAULT_SAVE_FOLDER)
}
fn default_file_prefix() -> String {
    DEFAULT_FILE_PREFIX.to_string()
}
fn default_processing_timeout_ms() -> u64 {
    DEFAULT_PROCESSING_TIMEOUT_MS
}

impl StationConfig {
    #[inline]
    pub fn station_id(&self) -> StationId {
        StationId(self.id)
    }

    /// Effective station position on `route`.
    pub fn position_on(&self, route: &WaypointRoute) -> Vec3 {
        self.position
            .unwrap_or_else(|| route.position(WaypointKind::Inspection))
    }

    pub fn pipeline_settings(&self, route: &WaypointRoute) -> PipelineSettings {
        PipelineSettings {
            station: self.station_id(),
            viewpoint: self.position_on(route),
            resolution: (self.resolution[0], self.resolution[1]),
            save_folder: self.save_folder.clone(),
            file_prefix: self.file_prefix.clone(),
            processing_timeout: Duration::from_millis(self.processing_timeout_ms),
            fallback: self.fallback,
        }
    }
}

/// `[simulation]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Spawn point; defaults to the route's inspection point.
    pub entry: Option<Vec3>,
    pub spawn_interval_ms: u64,
    /// Carriers to spawn; 0 spawns forever.
    pub carrier_count: u64,
    /// Stop after this long, if set.
    pub run_for_ms: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            entry: None,
            spawn_interval_ms: DEFAULT_SPAWN_INTERVAL_MS,
            carrier_count: 0,
            run_for_ms: None,
        }
    }
}

impl SimulationConfig {
    pub fn entry_on(&self, route: &WaypointRoute) -> Vec3 {
        self.entry
            .unwrap_or_else(|| route.position(WaypointKind::Inspection))
    }

    pub fn run_for(&self) -> Option<Duration> {
        self.run_for_ms.map(Duration::from_millis)
    }
}

// ─── Loading ────────────────────────────────────────────────────────

/// Load and validate the line configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<LineConfig, ConfigError> {
    let config = LineConfig::load(path)?;
    config.validate()?;
    Ok(config)
}

/// Load and validate the line configuration from TOML text (for testing).
pub fn load_config_from_str(content: &str) -> Result<LineConfig, ConfigError> {
    let config = LineConfig::load_str(content)?;
    config.validate()?;
    Ok(config)
}

// ─── Validation ─────────────────────────────────────────────────────

impl LineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        validate_motion(&self.motion)?;

        let hz = self.scheduler.tick_hz;
        if hz == 0 || hz > MAX_TICK_HZ {
            return Err(ConfigError::ValidationError(format!(
                "scheduler.tick_hz {hz} out of range [1, {MAX_TICK_HZ}]"
            )));
        }

        if self.stations.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one station is required".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for station in &self.stations {
            if !seen.insert(station.id) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate station id {}",
                    station.id
                )));
            }
            validate_station(station)?;
        }

        if let Some(entry) = self.simulation.entry
            && !entry.is_finite()
        {
            return Err(ConfigError::ValidationError(
                "simulation.entry must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

fn validate_motion(motion: &MotionConfig) -> Result<(), ConfigError> {
    if !(motion.speed.is_finite() && motion.speed > 0.0) {
        return Err(ConfigError::ValidationError(format!(
            "motion.speed must be > 0, got {}",
            motion.speed
        )));
    }
    if !(motion.stop_precision.is_finite() && motion.stop_precision > 0.0) {
        return Err(ConfigError::ValidationError(format!(
            "motion.stop_precision must be > 0, got {}",
            motion.stop_precision
        )));
    }
    Ok(())
}

fn validate_station(station: &StationConfig) -> Result<(), ConfigError> {
    let id = StationId(station.id);
    if !(station.capture_precision.is_finite() && station.capture_precision > 0.0) {
        return Err(ConfigError::ValidationError(format!(
            "station {id}: capture_precision must be > 0"
        )));
    }
    if !(station.trigger_radius.is_finite() && station.trigger_radius >= station.capture_precision) {
        return Err(ConfigError::ValidationError(format!(
            "station {id}: trigger_radius must be >= capture_precision"
        )));
    }
    if station.resolution.contains(&0) {
        return Err(ConfigError::ValidationError(format!(
            "station {id}: resolution must be non-zero"
        )));
    }
    if station.processing_timeout_ms == 0 {
        return Err(ConfigError::ValidationError(format!(
            "station {id}: processing_timeout_ms must be > 0"
        )));
    }
    if station.classifier.first().is_none_or(|p| p.trim().is_empty()) {
        return Err(ConfigError::ValidationError(format!(
            "station {id}: classifier command is empty"
        )));
    }
    if let Some(position) = station.position
        && !position.is_finite()
    {
        return Err(ConfigError::ValidationError(format!(
            "station {id}: position must be finite"
        )));
    }
    Ok(())
}

// ─── Tests ──────────────────────────────────────────────────────────
