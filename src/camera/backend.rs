use std::sync::Arc;

use async_trait::async_trait;

use crate::camera::error::{AcquisitionError, Result};
use crate::camera::surface::RenderTarget;
use crate::camera::types::{Dimensions, EncodedFrame, ImageFormat, MediaConstraints, RasterFrame};

/// Platform media acquisition capability.
///
/// Given constraints, asynchronously yields a live video source or fails.
/// A request completes exactly once and is never retried by the caller:
/// permission prompts are a one-shot user decision.
#[async_trait]
pub trait MediaAcquisition: Send + Sync {
    async fn request(
        &self,
        constraints: &MediaConstraints,
    ) -> std::result::Result<Arc<dyn LiveSource>, AcquisitionError>;
}

/// An active handle to camera video, owning one or more tracks.
pub trait LiveSource: Send + Sync {
    /// Human-readable label of the underlying device.
    fn label(&self) -> &str;

    /// Resolution the device actually delivers.
    fn native_dimensions(&self) -> Dimensions;

    /// The most recent frame, or `None` once the tracks are stopped.
    fn current_frame(&self) -> Option<RasterFrame>;

    /// Halt every underlying track. Tracks cannot be restarted.
    fn stop_tracks(&self);

    /// Whether any track is still delivering frames.
    fn is_active(&self) -> bool;
}

/// Draws render-target frames onto an internal surface and encodes them.
pub trait FrameEncoder: Send + Sync {
    /// Sample the target's current frame, scaled to `dimensions`.
    fn draw_from(&self, target: &RenderTarget, dimensions: Dimensions) -> Result<RasterFrame>;

    /// Encode a drawn frame. `quality` is in `0.0..=1.0` and is ignored by
    /// formats that do not use it.
    fn encode(
        &self,
        raster: &RasterFrame,
        format: ImageFormat,
        quality: Option<f32>,
    ) -> Result<EncodedFrame>;
}
