//! Thumbnail enhancement and overlay.
//!
//! Every enhancement blends the image with a "degenerate" version of itself:
//! `out = degenerate + factor * (image - degenerate)`, clamped to `[0, 255]`
//! and truncated. A factor above 1.0 pushes pixels away from the degenerate
//! image, which is what makes the thumbnail punchier.
//!
//! | Enhancement | Degenerate image                          |
//! |-------------|-------------------------------------------|
//! | contrast    | uniform gray at the mean luminance        |
//! | brightness  | black                                     |
//! | color       | grayscale version of the image            |
//! | sharpness   | 3x3 smoothed image (borders unchanged)    |

use image::{Rgb, RgbImage};

/// Contrast multiplier.
pub const CONTRAST_FACTOR: f32 = 1.2;
/// Brightness multiplier.
pub const BRIGHTNESS_FACTOR: f32 = 1.1;
/// Color saturation multiplier.
pub const COLOR_FACTOR: f32 = 1.3;
/// Sharpness multiplier.
pub const SHARPNESS_FACTOR: f32 = 1.5;

/// Smoothing kernel used as the degenerate image for sharpness.
const SMOOTH_KERNEL: [[u32; 3]; 3] = [[1, 1, 1], [1, 5, 1], [1, 1, 1]];
const SMOOTH_SCALE: f32 = 13.0;

/// Apply contrast, brightness, color and sharpness in that order, each step
/// working on the output of the previous one.
pub fn enhance_thumbnail(image: &RgbImage) -> RgbImage {
    let image = adjust_contrast(image, CONTRAST_FACTOR);
    let image = adjust_brightness(&image, BRIGHTNESS_FACTOR);
    let image = adjust_color(&image, COLOR_FACTOR);
    adjust_sharpness(&image, SHARPNESS_FACTOR)
}

/// ITU-R 601-2 luma in 16-bit fixed point, rounded.
#[inline]
pub fn luma(px: &Rgb<u8>) -> u8 {
    let [r, g, b] = px.0;
    ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
}

#[inline]
fn blend_channel(degenerate: u8, value: u8, factor: f32) -> u8 {
    let d = degenerate as f32;
    (d + factor * (value as f32 - d)).clamp(0.0, 255.0) as u8
}

fn blend(degenerate: &RgbImage, image: &RgbImage, factor: f32) -> RgbImage {
    let mut out = image.clone();
    for (o, d) in out.pixels_mut().zip(degenerate.pixels()) {
        for c in 0..3 {
            o.0[c] = blend_channel(d.0[c], o.0[c], factor);
        }
    }
    out
}

pub fn adjust_contrast(image: &RgbImage, factor: f32) -> RgbImage {
    let count = (image.width() as u64 * image.height() as u64).max(1);
    let sum: u64 = image.pixels().map(|p| luma(p) as u64).sum();
    let mean = (sum as f64 / count as f64 + 0.5).floor() as u8;

    let mut out = image.clone();
    for px in out.pixels_mut() {
        for c in 0..3 {
            px.0[c] = blend_channel(mean, px.0[c], factor);
        }
    }
    out
}

pub fn adjust_brightness(image: &RgbImage, factor: f32) -> RgbImage {
    let mut out = image.clone();
    for px in out.pixels_mut() {
        for c in 0..3 {
            px.0[c] = blend_channel(0, px.0[c], factor);
        }
    }
    out
}

pub fn adjust_color(image: &RgbImage, factor: f32) -> RgbImage {
    let mut out = image.clone();
    for px in out.pixels_mut() {
        let l = luma(px);
        for c in 0..3 {
            px.0[c] = blend_channel(l, px.0[c], factor);
        }
    }
    out
}

pub fn adjust_sharpness(image: &RgbImage, factor: f32) -> RgbImage {
    blend(&smooth(image), image, factor)
}

/// 3x3 smoothing; the outermost rows and columns are copied unchanged.
fn smooth(image: &RgbImage) -> RgbImage {
    let (w, h) = image.dimensions();
    let mut out = image.clone();
    if w < 3 || h < 3 {
        return out;
    }

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let mut acc = [0u32; 3];
            for (ky, row) in SMOOTH_KERNEL.iter().enumerate() {
                for (kx, weight) in row.iter().enumerate() {
                    let px = image.get_pixel(x + kx as u32 - 1, y + ky as u32 - 1);
                    for c in 0..3 {
                        acc[c] += px.0[c] as u32 * weight;
                    }
                }
            }
            let px = out.get_pixel_mut(x, y);
            for c in 0..3 {
                px.0[c] = (acc[c] as f32 / SMOOTH_SCALE + 0.5).min(255.0) as u8;
            }
        }
    }
    out
}

/// Darken the bottom half with a vertical gradient towards black.
///
/// Row `y` in `[h/2, h)` is blended with black at
/// `alpha = floor(255 * opacity * (y - h/2) / (h/2))`, so the overlay starts
/// fully transparent at the vertical midpoint.
pub fn apply_gradient_overlay(image: &mut RgbImage, opacity: f64) {
    let (_, height) = image.dimensions();
    let half = height / 2;
    if half == 0 {
        return;
    }

    let opacity = opacity.clamp(0.0, 1.0);
    for y in half..height {
        let alpha = (255.0 * opacity * ((y - half) as f64 / half as f64)) as u32;
        if alpha == 0 {
            continue;
        }
        let keep = 255 - alpha.min(255);
        for x in 0..image.width() {
            let px = image.get_pixel_mut(x, y);
            for c in 0..3 {
                px.0[c] = ((px.0[c] as u32 * keep + 127) / 255) as u8;
            }
        }
    }
}
