//! Error taxonomy.
//!
//! [`InspectionError`] covers everything that can go wrong inside one capture
//! session. Every variant is contained by the pipeline: it is logged, mapped
//! to a [`SessionOutcome`] and replaced by the station's fallback verdict.
//! [`LineError`] covers startup failures of the binary.

use std::path::PathBuf;
use std::time::Duration;

use sortline_common::config::ConfigError;
use sortline_common::report::ReportError;
use sortline_common::state::SessionOutcome;
use thiserror::Error;

/// Failure inside one capture/classify session.
#[derive(Debug, Error)]
pub enum InspectionError {
    /// Sample could not be rendered, encoded or written.
    #[error("sample acquisition failed for {path}: {reason}")]
    SampleAcquisition { path: PathBuf, reason: String },

    /// Classifier process could not be started.
    #[error("failed to launch classifier `{program}`: {source}")]
    ClassifierLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Classifier process did not exit before the deadline.
    #[error("classifier did not finish within {timeout:?}")]
    ClassifierTimeout { timeout: Duration },

    /// Classifier output could not be read or decoded.
    #[error("malformed classifier output: {reason}")]
    ClassifierMalformedOutput { reason: String, raw: String },
}

impl InspectionError {
    /// Session outcome recorded for this failure.
    ///
    /// A launch failure is recorded like a timeout: no verdict was ever
    /// produced by the classifier.
    pub const fn outcome(&self) -> SessionOutcome {
        match self {
            Self::SampleAcquisition { .. } | Self::ClassifierMalformedOutput { .. } => {
                SessionOutcome::Malformed
            }
            Self::ClassifierLaunch { .. } | Self::ClassifierTimeout { .. } => {
                SessionOutcome::TimedOut
            }
        }
    }

    /// Short label for logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SampleAcquisition { .. } => "sample_acquisition",
            Self::ClassifierLaunch { .. } => "classifier_launch",
            Self::ClassifierTimeout { .. } => "classifier_timeout",
            Self::ClassifierMalformedOutput { .. } => "classifier_malformed_output",
        }
    }

    pub(crate) fn malformed(report: ReportError, raw: String) -> Self {
        Self::ClassifierMalformedOutput {
            reason: report.to_string(),
            raw,
        }
    }
}

/// Startup / runtime failure of the line binary.
#[derive(Debug, Error)]
pub enum LineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Sample folder could not be created.
    #[error("cannot create sample folder {path}: {source}")]
    SampleFolder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Async runtime could not be built.
    #[error("failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),
}
