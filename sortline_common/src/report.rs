//! Classifier report schema.
//!
//! The external classifier writes one JSON object to stdout:
//!
//! ```json
//! { "has_defects": true, "defect_count": 3, "blister_id": "B1", "status": "ok" }
//! ```
//!
//! Decoding is two-step: serde maps the text onto an all-optional raw record
//! (wrong types fail here), then [`ClassifierReport::parse`] checks that every
//! required field is present and sane. Unknown extra fields are ignored.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Highest report schema version this build understands.
pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// Reasons a classifier report is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    /// Stdout was empty or whitespace only.
    #[error("classifier output is empty")]
    Empty,

    /// Text is not a JSON object of the expected shape.
    #[error("classifier output is not valid JSON: {0}")]
    Decode(String),

    /// A required field is absent.
    #[error("classifier report is missing `{0}`")]
    MissingField(&'static str),

    /// A required string field is empty.
    #[error("classifier report field `{0}` is empty")]
    EmptyField(&'static str),

    /// `defect_count` is negative or does not fit a u32.
    #[error("classifier report has invalid defect_count {0}")]
    InvalidCount(i64),

    /// `schema_version` is newer than this build.
    #[error("unsupported classifier report schema_version {0}")]
    UnsupportedVersion(u32),
}

/// A validated classifier report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifierReport {
    pub schema_version: u32,
    pub has_defects: bool,
    pub defect_count: u32,
    pub blister_id: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
struct RawReport {
    schema_version: Option<u32>,
    has_defects: Option<bool>,
    defect_count: Option<i64>,
    blister_id: Option<String>,
    status: Option<String>,
}

impl ClassifierReport {
    /// Decode and validate classifier stdout.
    ///
    /// Leading and trailing whitespace is ignored; anything else around the
    /// JSON object makes the report invalid.
    pub fn parse(text: &str) -> Result<Self, ReportError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ReportError::Empty);
        }

        let raw: RawReport =
            serde_json::from_str(text).map_err(|e| ReportError::Decode(e.to_string()))?;

        let schema_version = raw.schema_version.unwrap_or(REPORT_SCHEMA_VERSION);
        if schema_version == 0 || schema_version > REPORT_SCHEMA_VERSION {
            return Err(ReportError::UnsupportedVersion(schema_version));
        }

        let has_defects = raw
            .has_defects
            .ok_or(ReportError::MissingField("has_defects"))?;
        let count = raw
            .defect_count
            .ok_or(ReportError::MissingField("defect_count"))?;
        let defect_count = u32::try_from(count).map_err(|_| ReportError::InvalidCount(count))?;
        let blister_id = required_string(raw.blister_id, "blister_id")?;
        let status = required_string(raw.status, "status")?;

        if has_defects != (defect_count > 0) {
            warn!(
                has_defects,
                defect_count, "classifier report is inconsistent; using has_defects"
            );
        }

        Ok(Self {
            schema_version,
            has_defects,
            defect_count,
            blister_id,
            status,
        })
    }
}

fn required_string(value: Option<String>, field: &'static str) -> Result<String, ReportError> {
    let value = value.ok_or(ReportError::MissingField(field))?;
    if value.trim().is_empty() {
        return Err(ReportError::EmptyField(field));
    }
    Ok(value)
}
