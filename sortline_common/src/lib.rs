//! SORTLINE Common Library
//!
//! This crate provides the shared leaf types, constants and configuration
//! loading utilities for all SORTLINE workspace crates.
//!
//! # Module Structure
//!
//! - [`geometry`] - 3-D positions and distance helpers
//! - [`route`] - Waypoint route of the inspection lane
//! - [`state`] - Carrier, verdict and session state enums
//! - [`report`] - Classifier report schema and validation
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - Workspace-wide defaults
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use sortline_common::prelude::*;
//!
//! let route = WaypointRoute::new(
//!     Vec3::new(0.0, 0.0, 0.0),
//!     Vec3::new(5.0, 0.0, 0.0),
//!     Vec3::new(8.0, 0.0, 2.0),
//!     Vec3::new(8.0, 0.0, -2.0),
//! )
//! .unwrap();
//! assert_eq!(route.position(WaypointKind::Sorting), Vec3::new(5.0, 0.0, 0.0));
//! ```

pub mod config;
pub mod consts;
pub mod geometry;
pub mod prelude;
pub mod report;
pub mod route;
pub mod state;
