//! Capture/classify pipeline.
//!
//! One task per [`CaptureSession`]:
//!
//! 1. Acquire a sample through the station's [`SampleSource`].
//! 2. Run the [`Classifier`] on it, bounded by `processing_timeout`.
//! 3. Decode and validate the report.
//! 4. Deliver exactly one [`Verdict`] for the subject carrier: the parsed
//!    result, or the station's fallback on any failure.
//! 5. Release the station by dropping the session.
//!
//! No failure escapes a session. The scheduler only ever receives the
//! binary verdict; diagnostic detail goes to the log.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;
use sortline_common::geometry::Vec3;
use sortline_common::report::ClassifierReport;
use sortline_common::state::{CarrierId, FallbackPolicy, SessionOutcome, StationId};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::acquisition::{SampleRequest, SampleSource, sample_file_name};
use crate::classifier::Classifier;
use crate::error::InspectionError;
use crate::trigger::{CaptureSession, SessionId};

/// Per-station pipeline settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub station: StationId,
    /// Camera viewpoint.
    pub viewpoint: Vec3,
    /// Width × height [px].
    pub resolution: (u32, u32),
    pub save_folder: PathBuf,
    pub file_prefix: String,
    pub processing_timeout: Duration,
    pub fallback: FallbackPolicy,
}

/// Classification result delivered to the scheduler for one carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub station: StationId,
    pub session: SessionId,
    pub carrier: CarrierId,
    pub defective: bool,
    pub outcome: SessionOutcome,
}

/// Summary of one finished session.
#[derive(Debug)]
pub struct SessionReport {
    pub session: SessionId,
    pub station: StationId,
    pub carrier: CarrierId,
    pub sample: Option<PathBuf>,
    pub outcome: SessionOutcome,
    /// Verdict actually delivered (parsed or fallback).
    pub defective: bool,
    pub elapsed: Duration,
    /// Failure that forced the fallback, if any.
    pub error: Option<InspectionError>,
}

/// Acquire → classify → deliver for one station.
#[derive(Debug)]
pub struct CaptureClassifyPipeline<S, C> {
    settings: PipelineSettings,
    source: S,
    classifier: C,
    verdicts: UnboundedSender<Verdict>,
}

impl<S: SampleSource, C: Classifier> CaptureClassifyPipeline<S, C> {
    pub fn new(settings: PipelineSettings, source: S, classifier: C, verdicts: UnboundedSender<Verdict>) -> Self {
        Self {
            settings,
            source,
            classifier,
            verdicts,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Run one session to completion and release the station.
    pub async fn run(&self, mut session: CaptureSession) -> SessionReport {
        let station = session.station;
        let carrier = session.subject;

        let (defective, error) = match self.inspect(&mut session).await {
            Ok(report) => {
                session.outcome = SessionOutcome::Success {
                    defective: report.has_defects,
                    count: report.defect_count,
                };
                info!(
                    station = %station,
                    carrier = %carrier,
                    session = %session.id,
                    defective = report.has_defects,
                    count = report.defect_count,
                    blister_id = %report.blister_id,
                    status = %report.status,
                    "classification complete"
                );
                (report.has_defects, None)
            }
            Err(e) => {
                session.outcome = e.outcome();
                let fallback = self.settings.fallback.fallback_verdict();
                match &e {
                    InspectionError::ClassifierMalformedOutput { raw, .. } => warn!(
                        station = %station,
                        carrier = %carrier,
                        session = %session.id,
                        kind = e.kind(),
                        raw = %raw,
                        fallback,
                        "{e}"
                    ),
                    _ => warn!(
                        station = %station,
                        carrier = %carrier,
                        session = %session.id,
                        kind = e.kind(),
                        fallback,
                        "{e}"
                    ),
                }
                (fallback, Some(e))
            }
        };

        let verdict = Verdict {
            station,
            session: session.id,
            carrier,
            defective,
            outcome: session.outcome,
        };
        if self.verdicts.send(verdict).is_err() {
            debug!(station = %station, session = %session.id, "scheduler gone; verdict discarded");
        }

        let report = SessionReport {
            session: session.id,
            station,
            carrier,
            sample: session.sample.take(),
            outcome: session.outcome,
            defective,
            elapsed: session.started.elapsed(),
            error,
        };

        // Releases the station permit.
        drop(session);
        report
    }

    async fn inspect(&self, session: &mut CaptureSession) -> Result<ClassifierReport, InspectionError> {
        let name = sample_file_name(&self.settings.file_prefix, session.station, session.id, Local::now());
        let request = SampleRequest {
            station: session.station,
            subject: session.subject,
            viewpoint: self.settings.viewpoint,
            resolution: self.settings.resolution,
            path: self.settings.save_folder.join(name),
        };

        let sample = self.source.acquire(&request).await?;
        info!(station = %session.station, session = %session.id, path = %sample.display(), "sample saved");
        session.sample = Some(sample.clone());

        let limit = self.settings.processing_timeout;
        let raw = match timeout(limit, self.classifier.classify(&sample)).await {
            Ok(result) => result?,
            Err(_) => return Err(InspectionError::ClassifierTimeout { timeout: limit }),
        };
        debug!(station = %session.station, session = %session.id, raw = %raw, "raw classifier output");

        ClassifierReport::parse(&raw).map_err(|e| InspectionError::malformed(e, raw))
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
