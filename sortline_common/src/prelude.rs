//! Prelude module for common re-exports.
//!
//! ```rust
//! use sortline_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};

// ─── Geometry / Route ───────────────────────────────────────────────
pub use crate::geometry::Vec3;
pub use crate::route::{RouteError, WaypointKind, WaypointRoute};

// ─── State ──────────────────────────────────────────────────────────
pub use crate::state::{
    CarrierId, DefectFlag, FallbackPolicy, MotionState, SessionOutcome, StationId,
    UnknownVerdictPolicy,
};

// ─── Classifier Report ──────────────────────────────────────────────
pub use crate::report::{ClassifierReport, ReportError};
