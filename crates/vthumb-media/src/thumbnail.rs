//! Thumbnail rendering.
//!
//! A frame becomes a thumbnail in three steps:
//! 1. aspect-fill resize + center crop to the exact target size,
//! 2. [`enhance_thumbnail`],
//! 3. bottom-half gradient overlay.
//!
//! The result is always opaque RGB and is saved as JPEG.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{ColorType, RgbImage};
use rayon::prelude::*;
use tracing::debug;
use vthumb_models::TargetSize;

use crate::enhance::{apply_gradient_overlay, enhance_thumbnail};
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::write_atomic;
use crate::sampler::Frame;

/// Opacity of the bottom gradient at the bottom edge.
pub const DEFAULT_OVERLAY_OPACITY: f64 = 0.3;
/// JPEG quality (0-100).
pub const THUMBNAIL_JPEG_QUALITY: u8 = 95;

/// File name for the thumbnail of frame `index` at `size`.
pub fn thumbnail_filename(index: usize, size: TargetSize) -> String {
    format!("thumbnail_frame{}_{}x{}.jpg", index, size.width, size.height)
}

/// Resize so the image covers `width` x `height`, then center-crop the overflow.
///
/// Ratios are compared and scaled with integer arithmetic so the scaled
/// side can never fall one pixel short of the target.
pub fn resize_to_fill(image: &RgbImage, width: u32, height: u32) -> MediaResult<RgbImage> {
    let (src_w, src_h) = image.dimensions();
    if src_w == 0 || src_h == 0 {
        return Err(MediaError::invalid_dimensions(format!(
            "frame is {}x{}",
            src_w, src_h
        )));
    }
    if width == 0 || height == 0 {
        return Err(MediaError::invalid_dimensions(format!(
            "target is {}x{}",
            width, height
        )));
    }

    // src_h / src_w < height / width
    let wider_than_target = (src_h as u64) * (width as u64) < (height as u64) * (src_w as u64);

    let cropped = if wider_than_target {
        let new_w = ((height as u64 * src_w as u64) / src_h as u64).max(width as u64) as u32;
        let resized = imageops::resize(image, new_w, height, FilterType::Lanczos3);
        let left = (new_w - width) / 2;
        imageops::crop_imm(&resized, left, 0, width, height).to_image()
    } else {
        let new_h = ((width as u64 * src_h as u64) / src_w as u64).max(height as u64) as u32;
        let resized = imageops::resize(image, width, new_h, FilterType::Lanczos3);
        let top = (new_h - height) / 2;
        imageops::crop_imm(&resized, 0, top, width, height).to_image()
    };

    Ok(cropped)
}

/// Renders frames into polished vertical thumbnails.
#[derive(Debug, Clone)]
pub struct ThumbnailRenderer {
    overlay_opacity: f64,
}

impl Default for ThumbnailRenderer {
    fn default() -> Self {
        Self {
            overlay_opacity: DEFAULT_OVERLAY_OPACITY,
        }
    }
}

impl ThumbnailRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gradient strength at the bottom edge, clamped to `[0, 1]`.
    pub fn with_overlay_opacity(mut self, opacity: f64) -> Self {
        self.overlay_opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Render one frame in memory. Deterministic for a given input and size.
    pub fn render(&self, frame: &RgbImage, size: TargetSize) -> MediaResult<RgbImage> {
        let fitted = resize_to_fill(frame, size.width, size.height)?;
        let mut enhanced = enhance_thumbnail(&fitted);
        apply_gradient_overlay(&mut enhanced, self.overlay_opacity);
        Ok(enhanced)
    }

    /// Encode as JPEG at [`THUMBNAIL_JPEG_QUALITY`].
    pub fn encode_jpeg(&self, image: &RgbImage) -> MediaResult<Vec<u8>> {
        let mut buf = Cursor::new(Vec::new());
        let mut encoder = JpegEncoder::new_with_quality(&mut buf, THUMBNAIL_JPEG_QUALITY);
        encoder.encode(image.as_raw(), image.width(), image.height(), ColorType::Rgb8)?;
        Ok(buf.into_inner())
    }

    /// Render `frame` and save it under `output_dir`, returning the path.
    pub fn render_to_file(
        &self,
        frame: &Frame,
        size: TargetSize,
        output_dir: &Path,
    ) -> MediaResult<PathBuf> {
        let thumbnail = self.render(&frame.image, size)?;
        let path = output_dir.join(thumbnail_filename(frame.index, size));
        write_atomic(&path, &self.encode_jpeg(&thumbnail)?)?;

        debug!(
            index = frame.index,
            timestamp = frame.timestamp,
            path = %path.display(),
            "Rendered thumbnail"
        );
        Ok(path)
    }

    /// Render every frame in parallel; paths come back in frame order.
    ///
    /// Any failure fails the whole batch.
    pub fn render_all(
        &self,
        frames: &[Frame],
        size: TargetSize,
        output_dir: &Path,
    ) -> MediaResult<Vec<PathBuf>> {
        frames
            .par_iter()
            .map(|frame| self.render_to_file(frame, size, output_dir))
            .collect()
    }
}
