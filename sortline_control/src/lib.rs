//! # SORTLINE Control Library
//!
//! Control loop for a two-stage inspection lane: carriers travel between
//! fixed waypoints, an inspection station captures a sample when a carrier
//! dwells at its capture point, an external classifier judges the sample,
//! and the verdict steers the carrier to the accepted or rejected terminal.
//!
//! ## Components
//!
//! 1. **CarrierMotionController** ([`motion`]) - per-carrier waypoint state machine
//! 2. **CaptureTrigger** ([`trigger`]) - per-station single-flight proximity detector
//! 3. **CaptureClassifyPipeline** ([`pipeline`]) - acquire → classify → parse → deliver
//! 4. **LineRunner** ([`cycle`]) - fixed-rate cooperative scheduler tying them together
//!
//! ## Scheduling
//!
//! A single-threaded tokio runtime drives every carrier tick. Capture
//! sessions are tasks on the same runtime and suspend on sample readback,
//! on the classifier process and on the timeout timer without stalling
//! motion. Verdicts return to the scheduler over a channel.

pub mod acquisition;
pub mod classifier;
pub mod config;
pub mod cycle;
pub mod error;
pub mod motion;
pub mod pipeline;
pub mod scene;
pub mod trigger;
