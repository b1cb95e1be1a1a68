//! CLIP image preprocessing.
//!
//! - Resize the shortest side to 224 (bicubic)
//! - Center crop 224x224
//! - Scale to [0, 1] and normalize with the CLIP mean/std
//! - Lay out as NCHW `[1, 3, 224, 224]`

use image::imageops::{self, FilterType};
use image::RgbImage;

/// CLIP vision input resolution.
pub const CLIP_INPUT_SIZE: u32 = 224;

pub const CLIP_MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];
pub const CLIP_STD: [f32; 3] = [0.268_629_54, 0.261_302_58, 0.275_777_11];

/// Tensor shape of [`preprocess_image`]'s output.
pub fn pixel_shape() -> Vec<usize> {
    let side = CLIP_INPUT_SIZE as usize;
    vec![1, 3, side, side]
}

/// Size after scaling the shortest side to `target`, aspect preserved.
fn shortest_side_size(width: u32, height: u32, target: u32) -> (u32, u32) {
    if width <= height {
        let long = (target as u64 * height as u64 / width.max(1) as u64) as u32;
        (target, long.max(target))
    } else {
        let long = (target as u64 * width as u64 / height.max(1) as u64) as u32;
        (long.max(target), target)
    }
}

/// Convert an RGB image into normalized NCHW pixel values.
pub fn preprocess_image(image: &RgbImage) -> Vec<f32> {
    let (w, h) = shortest_side_size(image.width(), image.height(), CLIP_INPUT_SIZE);
    let resized = imageops::resize(image, w, h, FilterType::CatmullRom);

    let left = (w - CLIP_INPUT_SIZE) / 2;
    let top = (h - CLIP_INPUT_SIZE) / 2;
    let cropped =
        imageops::crop_imm(&resized, left, top, CLIP_INPUT_SIZE, CLIP_INPUT_SIZE).to_image();

    let side = CLIP_INPUT_SIZE as usize;
    let mut chw = vec![0f32; 3 * side * side];
    for (x, y, px) in cropped.enumerate_pixels() {
        let offset = y as usize * side + x as usize;
        for c in 0..3 {
            chw[c * side * side + offset] = (px[c] as f32 / 255.0 - CLIP_MEAN[c]) / CLIP_STD[c];
        }
    }
    chw
}
