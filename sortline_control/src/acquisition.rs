//! Sample acquisition seam.
//!
//! The optical sensor is an external collaborator: given a viewpoint and a
//! resolution it produces an encoded image at a given path, or reports an
//! I/O failure. [`SampleSource`] is that contract; [`SyntheticCamera`]
//! implements it for the simulated lane by rendering a test frame and
//! writing it as PNG.

use std::fmt::Display;
use std::future::Future;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage};
use sortline_common::geometry::Vec3;
use sortline_common::state::{CarrierId, StationId};

use crate::error::InspectionError;
use crate::trigger::SessionId;

/// What to capture and where to persist it.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRequest {
    pub station: StationId,
    pub subject: CarrierId,
    /// Fixed viewpoint of the station camera, in lane coordinates.
    pub viewpoint: Vec3,
    /// Width × height [px].
    pub resolution: (u32, u32),
    /// Destination of the encoded sample.
    pub path: PathBuf,
}

/// Produces an encoded still image for a capture session.
pub trait SampleSource: Send + Sync + 'static {
    /// Capture and persist a sample, returning its path.
    fn acquire(
        &self,
        request: &SampleRequest,
    ) -> impl Future<Output = Result<PathBuf, InspectionError>> + Send;
}

/// Unique, timestamped sample file name.
///
/// `<prefix><yyyyMMdd_HHmmssfff>_<station>_<session>.png`, e.g.
/// `Blister_20250114_093015123_S01_0007.png`.
pub fn sample_file_name(prefix: &str, station: StationId, session: SessionId, at: DateTime<Local>) -> String {
    format!(
        "{prefix}{}_{station}_{:04}.png",
        at.format("%Y%m%d_%H%M%S%3f"),
        session.0
    )
}

/// Renders a synthetic frame for the simulated lane.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticCamera;

impl SampleSource for SyntheticCamera {
    async fn acquire(&self, request: &SampleRequest) -> Result<PathBuf, InspectionError> {
        // Readback is only available after the next render pass.
        tokio::task::yield_now().await;

        let (width, height) = request.resolution;
        let subject = request.subject;
        let encoded = tokio::task::spawn_blocking(move || encode_png(&render_frame(width, height, subject)))
            .await
            .map_err(|e| acquisition_error(&request.path, e))?
            .map_err(|e| acquisition_error(&request.path, e))?;

        tokio::fs::write(&request.path, &encoded)
            .await
            .map_err(|e| acquisition_error(&request.path, e))?;

        Ok(request.path.clone())
    }
}

/// Grey lane background with a carrier-specific band across the centre.
pub fn render_frame(width: u32, height: u32, subject: CarrierId) -> RgbImage {
    let band = [
        (subject.0.wrapping_mul(97) % 256) as u8,
        (subject.0.wrapping_mul(57) % 256) as u8,
        (subject.0.wrapping_mul(23) % 256) as u8,
    ];
    let (top, bottom) = (height / 3, height - height / 3);

    RgbImage::from_fn(width, height, |x, y| {
        if y >= top && y < bottom {
            Rgb(band)
        } else {
            let shade = (64 + (x * 128) / width.max(1)) as u8;
            Rgb([shade, shade, shade])
        }
    })
}

/// PNG-encode an RGB frame in memory.
pub fn encode_png(frame: &RgbImage) -> Result<Vec<u8>, image::ImageError> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out).write_image(
        frame.as_raw(),
        frame.width(),
        frame.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(out)
}

fn acquisition_error(path: &Path, e: impl Display) -> InspectionError {
    InspectionError::SampleAcquisition {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}
