//! Workspace-wide defaults for the SORTLINE inspection lane.
//!
//! Single source of truth for numeric defaults used by configuration
//! `#[serde(default)]` functions and by tests.

/// Carrier travel speed [units/s].
pub const DEFAULT_SPEED: f64 = 3.0;

/// Arrival tolerance around a waypoint [units].
pub const DEFAULT_STOP_PRECISION: f64 = 0.001;

/// Dwell time at the inspection point [ms].
pub const DEFAULT_INSPECTION_PAUSE_MS: u64 = 2000;

/// Capture tolerance around a station [units].
pub const DEFAULT_CAPTURE_PRECISION: f64 = 0.001;

/// Radius inside which the scene reports proximity to a station [units].
pub const DEFAULT_TRIGGER_RADIUS: f64 = 0.5;

/// Sample resolution [px].
pub const DEFAULT_RESOLUTION: [u32; 2] = [1280, 720];

/// Classifier deadline [ms].
pub const DEFAULT_PROCESSING_TIMEOUT_MS: u64 = 5000;

/// Sample file name prefix.
pub const DEFAULT_FILE_PREFIX: &str = "Blister_";

/// Sample folder.
pub const DEFAULT_SAVE_FOLDER: &str = "captures";

/// Scheduler tick rate [Hz].
pub const DEFAULT_TICK_HZ: u32 = 60;

/// Maximum scheduler tick rate [Hz].
pub const MAX_TICK_HZ: u32 = 10_000;

/// Interval between simulated carrier arrivals [ms].
pub const DEFAULT_SPAWN_INTERVAL_MS: u64 = 4000;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/line.toml";
