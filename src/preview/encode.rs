use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ImageBuffer, Rgb};

use crate::camera::backend::FrameEncoder;
use crate::camera::error::{CaptureError, Result};
use crate::camera::surface::RenderTarget;
use crate::camera::types::{Dimensions, EncodedFrame, ImageFormat, RasterFrame};

/// Quality used when JPEG is requested without one.
pub const DEFAULT_JPEG_QUALITY: f32 = 0.4;

/// Map a `0.0..=1.0` quality to the encoder's 1-100 scale.
///
/// A missing, zero, or non-finite quality means "unset" and selects
/// `DEFAULT_JPEG_QUALITY`.
pub fn jpeg_quality(quality: Option<f32>) -> u8 {
    let q = quality
        .filter(|q| q.is_finite() && *q > 0.0)
        .unwrap_or(DEFAULT_JPEG_QUALITY)
        .clamp(0.0, 1.0);
    ((q * 100.0).round() as u8).max(1)
}

/// Compress raw RGB pixel data to JPEG at the given quality (1-100).
pub fn compress_jpeg(data: &[u8], width: u32, height: u32, quality: u8) -> Result<Vec<u8>> {
    let img: ImageBuffer<Rgb<u8>, _> = ImageBuffer::from_raw(width, height, data)
        .ok_or_else(|| CaptureError::Encode("invalid buffer dimensions".to_string()))?;

    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    img.write_with_encoder(encoder)
        .map_err(|e| CaptureError::Encode(format!("JPEG encoding failed: {e}")))?;
    Ok(buf)
}

/// Compress raw RGB pixel data to PNG.
pub fn compress_png(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let img: ImageBuffer<Rgb<u8>, _> = ImageBuffer::from_raw(width, height, data)
        .ok_or_else(|| CaptureError::Encode("invalid buffer dimensions".to_string()))?;

    let mut buf = Vec::new();
    img.write_with_encoder(PngEncoder::new(&mut buf))
        .map_err(|e| CaptureError::Encode(format!("PNG encoding failed: {e}")))?;
    Ok(buf)
}

/// Scale an RGB frame to `target` dimensions.
///
/// Uses `fast_image_resize` for SIMD-accelerated resizing. Frames already
/// at the target size are returned unchanged.
pub fn scale_frame(frame: RasterFrame, target: Dimensions) -> Result<RasterFrame> {
    use fast_image_resize as fr;
    use fr::images::Image;

    if frame.dimensions == target {
        return Ok(frame);
    }
    if target.is_empty() || frame.dimensions.is_empty() {
        return Err(CaptureError::Encode(format!(
            "cannot scale {} to {target}",
            frame.dimensions
        )));
    }

    let src_image = Image::from_vec_u8(
        frame.dimensions.width,
        frame.dimensions.height,
        frame.data,
        fr::PixelType::U8x3,
    )
    .map_err(|e| CaptureError::Encode(format!("invalid source frame: {e}")))?;

    let mut dst_image = Image::new(target.width, target.height, fr::PixelType::U8x3);

    let mut resizer = fr::Resizer::new();
    resizer
        .resize(&src_image, &mut dst_image, None)
        .map_err(|e| CaptureError::Encode(format!("resize failed: {e}")))?;

    Ok(RasterFrame {
        data: dst_image.into_vec(),
        dimensions: target,
    })
}

/// Draws render-target frames onto an RGB canvas and encodes them with
/// the `image` codecs.
#[derive(Debug, Default, Clone, Copy)]
pub struct CanvasEncoder;

impl CanvasEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl FrameEncoder for CanvasEncoder {
    fn draw_from(&self, target: &RenderTarget, dimensions: Dimensions) -> Result<RasterFrame> {
        if !target.is_valid() {
            return Err(CaptureError::SourceLost);
        }
        let frame = target.current_frame().ok_or(CaptureError::SourceLost)?;
        scale_frame(frame, dimensions)
    }

    fn encode(
        &self,
        raster: &RasterFrame,
        format: ImageFormat,
        quality: Option<f32>,
    ) -> Result<EncodedFrame> {
        let Dimensions { width, height } = raster.dimensions;
        let bytes = match format {
            ImageFormat::Jpeg => compress_jpeg(&raster.data, width, height, jpeg_quality(quality))?,
            ImageFormat::Png => compress_png(&raster.data, width, height)?,
        };
        Ok(EncodedFrame {
            format,
            dimensions: raster.dimensions,
            bytes,
        })
    }
}
