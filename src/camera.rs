//! Webcam acquisition via nokhwa
//!
//! Opened once at startup; a failed open is fatal to the program, a failed
//! read ends the main loop gracefully. Reads have no timeout - a wedged
//! driver wedges the frame loop with it.

use anyhow::{Context, Result};
use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType};

pub struct Camera {
    inner: nokhwa::Camera,
}

impl Camera {
    pub fn open(index: u32) -> Result<Self> {
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
        let mut inner = nokhwa::Camera::new(CameraIndex::Index(index), requested)
            .with_context(|| format!("Could not open webcam {index}"))?;
        inner
            .open_stream()
            .with_context(|| format!("Could not start webcam {index} stream"))?;
        Ok(Self { inner })
    }

    pub fn name(&self) -> String {
        self.inner.info().human_name()
    }

    pub fn width(&self) -> u32 {
        self.inner.resolution().width()
    }

    pub fn height(&self) -> u32 {
        self.inner.resolution().height()
    }

    /// Blocking read of the next frame, decoded to RGB
    pub fn frame(&mut self) -> Result<RgbImage> {
        let buffer = self.inner.frame().context("Camera read failed")?;
        buffer
            .decode_image::<RgbFormat>()
            .context("Camera frame decode failed")
    }
}

impl Drop for Camera {
    fn drop(&mut self) {
        let _ = self.inner.stop_stream();
    }
}

/// Enumerate attached cameras for the `devices` subcommand
pub fn list() -> Result<Vec<(u32, String)>> {
    let cameras = nokhwa::query(ApiBackend::Auto)?;
    Ok(cameras
        .into_iter()
        .enumerate()
        .map(|(i, info)| (i as u32, info.human_name()))
        .collect())
}
