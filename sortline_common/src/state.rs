//! State enums shared by the motion controller and the inspection pipeline.
//!
//! Includes carrier motion state, the tri-state defect flag, capture session
//! outcomes and the two verdict policies that decide how uncertainty is
//! routed.

use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Identities ─────────────────────────────────────────────────────

/// Identity of one carrier on the lane.
///
/// Sessions hold a `CarrierId` rather than a reference to the carrier: the
/// pipeline identifies its subject but never owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CarrierId(pub u64);

impl fmt::Display for CarrierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{:04}", self.0)
    }
}

/// Identity of one inspection station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(pub u16);

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{:02}", self.0)
    }
}

// ─── Carrier Motion ─────────────────────────────────────────────────

/// Per-carrier motion lifecycle.
///
/// Traveling → Dwelling → Traveling → Routed → Finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum MotionState {
    /// Moving toward the inspection or sorting waypoint.
    #[default]
    Traveling = 0,
    /// Paused at the inspection waypoint.
    Dwelling = 1,
    /// Verdict consumed; moving toward a terminal.
    Routed = 2,
    /// Terminal reached; controller is inert.
    Finished = 3,
}

/// Latest classification result recorded for a carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum DefectFlag {
    /// No verdict delivered yet.
    #[default]
    Unknown = 0,
    Clean = 1,
    Defective = 2,
}

impl DefectFlag {
    #[inline]
    pub const fn from_verdict(defective: bool) -> Self {
        if defective { Self::Defective } else { Self::Clean }
    }
}

// ─── Capture Session ────────────────────────────────────────────────

/// Outcome of one capture/classify session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SessionOutcome {
    /// Session still in flight.
    #[default]
    Pending,
    /// Classifier produced a valid report.
    Success { defective: bool, count: u32 },
    /// Classifier did not exit in time, or could not be launched.
    TimedOut,
    /// Sample could not be acquired, or the report could not be decoded.
    Malformed,
}

impl SessionOutcome {
    /// Short label for logs and counters.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success { .. } => "success",
            Self::TimedOut => "timed_out",
            Self::Malformed => "malformed",
        }
    }
}

// ─── Verdict Policies ───────────────────────────────────────────────

/// Verdict applied when a session fails (acquisition, launch, timeout, parse).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Treat the item as clean and keep the lane moving.
    #[default]
    FailOpen,
    /// Treat the item as defective.
    FailClosed,
}

impl FallbackPolicy {
    /// The `defective` value delivered to the carrier on failure.
    #[inline]
    pub const fn fallback_verdict(self) -> bool {
        matches!(self, Self::FailClosed)
    }
}

/// Routing applied when a carrier reaches the sorting point with no verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnknownVerdictPolicy {
    /// Route to the accepted terminal.
    #[default]
    Accept,
    /// Route to the rejected terminal.
    Reject,
}
