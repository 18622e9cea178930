//! Grayscale reduction
//!
//! Fixed-point luma, `(77*R + 150*G + 29*B) >> 8`. Integer arithmetic keeps results
//! bit-identical across platforms; alpha is ignored.
use super::types::{Image, IntensityField};

const WEIGHT_R: u32 = 77;
const WEIGHT_G: u32 = 150;
const WEIGHT_B: u32 = 29;

/// Luma of a single color
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    // Weights sum to 256, so the shifted value never exceeds 255
    ((WEIGHT_R * r as u32 + WEIGHT_G * g as u32 + WEIGHT_B * b as u32) >> 8) as u8
}

/// Reduce an image to one intensity sample per pixel
pub fn reduce(image: &Image) -> IntensityField {
    let samples: Vec<u8> = image
        .as_rgba()
        .chunks_exact(4)
        .map(|px| luma(px[0], px[1], px[2]))
        .collect();

    // RgbaImage holds exactly width*height*4 bytes
    IntensityField::from_reduced(image.width(), image.height(), samples)
}
