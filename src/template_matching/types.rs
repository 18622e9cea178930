//! Template matching data types
use image::{DynamicImage, ImageError, RgbaImage};
use serde::Serialize;
use std::path::Path;

/// A decoded raster image (screen capture or template)
///
/// Immutable once built. Raster buffers are large, so whoever owns one drops it as
/// soon as it has been reduced to an [`IntensityField`].
#[derive(Clone, Debug)]
pub struct Image {
    pixels: RgbaImage,
}

impl Image {
    /// Build from raw RGBA bytes; `None` when the buffer length does not match
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Option<Self> {
        RgbaImage::from_raw(width, height, rgba).map(|pixels| Self { pixels })
    }

    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self {
            pixels: image.into_rgba8(),
        }
    }

    /// Decode an encoded image (PNG, JPEG) from memory
    pub fn decode(bytes: &[u8]) -> Result<Self, ImageError> {
        image::load_from_memory(bytes).map(Self::from_dynamic)
    }

    /// Decode an image file
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ImageError> {
        image::open(path).map(Self::from_dynamic)
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// RGBA value at `(x, y)`. Panics when out of bounds, like `RgbaImage::get_pixel`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels.get_pixel(x, y).0
    }

    /// Color channels at `(x, y)`, alpha dropped
    pub fn rgb(&self, x: u32, y: u32) -> [u8; 3] {
        let [r, g, b, _] = self.pixel(x, y);
        [r, g, b]
    }

    /// Row-major RGBA samples
    pub(crate) fn as_rgba(&self) -> &[u8] {
        self.pixels.as_raw()
    }
}

/// Single-channel intensity samples derived from an [`Image`]
///
/// Always holds exactly `width * height` samples, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntensityField {
    width: u32,
    height: u32,
    samples: Vec<u8>,
}

impl IntensityField {
    /// Wrap precomputed samples; `None` when the length does not equal `width * height`
    pub fn from_samples(width: u32, height: u32, samples: Vec<u8>) -> Option<Self> {
        if samples.len() != width as usize * height as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            samples,
        })
    }

    /// Caller guarantees `samples.len() == width * height`
    pub(crate) fn from_reduced(width: u32, height: u32, samples: Vec<u8>) -> Self {
        debug_assert_eq!(samples.len(), width as usize * height as usize);
        Self {
            width,
            height,
            samples,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample at `(x, y)`
    pub fn at(&self, x: u32, y: u32) -> u8 {
        self.samples[y as usize * self.width as usize + x as usize]
    }
}

/// Outcome of a single template search
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MatchResult {
    /// True iff `score >= min_confidence`
    pub found: bool,
    /// Center of the best candidate, screen pixels
    pub x: u32,
    pub y: u32,
    /// Normalized correlation in [-1, 1]; `None` when no scan took place
    pub score: Option<f64>,
}

impl MatchResult {
    /// Result for a search that never scored anything
    pub fn not_found() -> Self {
        Self {
            found: false,
            x: 0,
            y: 0,
            score: None,
        }
    }

    /// Center result for a scanned candidate; `found` iff the score clears `min_confidence`
    pub fn from_candidate(
        best: Candidate,
        template_width: u32,
        template_height: u32,
        min_confidence: f64,
    ) -> Self {
        Self {
            found: best.score >= min_confidence,
            x: best.x + template_width / 2,
            y: best.y + template_height / 2,
            score: Some(best.score),
        }
    }

    /// Tap target, only when the match cleared the confidence bar
    pub fn tap_point(&self) -> Option<(u32, u32)> {
        self.found.then_some((self.x, self.y))
    }

    /// Format as string with correlation percentage
    pub fn describe(&self) -> String {
        match self.score {
            Some(score) if self.found => {
                format!("match at ({},{}) - {:.1}%", self.x, self.y, score * 100.0)
            }
            Some(score) => format!(
                "best candidate at ({},{}) - {:.1}% (below threshold)",
                self.x,
                self.y,
                score * 100.0
            ),
            None => "no candidate scored".to_string(),
        }
    }
}

/// Best top-left offset found by a full scan
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub x: u32,
    pub y: u32,
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgba_rejects_bad_length() {
        assert!(Image::from_rgba(2, 2, vec![0; 15]).is_none());
        let img = Image::from_rgba(2, 2, vec![0; 16]).unwrap();
        assert_eq!((img.width(), img.height()), (2, 2));
    }

    #[test]
    fn test_pixel_accessors() {
        let mut rgba = vec![0u8; 8];
        rgba[4..8].copy_from_slice(&[10, 20, 30, 255]);
        let img = Image::from_rgba(2, 1, rgba).unwrap();
        assert_eq!(img.pixel(1, 0), [10, 20, 30, 255]);
        assert_eq!(img.rgb(1, 0), [10, 20, 30]);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(Image::decode(b"not an image").is_err());
    }

    #[test]
    fn test_intensity_field_length_invariant() {
        assert!(IntensityField::from_samples(3, 2, vec![0; 5]).is_none());
        let field = IntensityField::from_samples(3, 2, vec![1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(field.len(), 6);
        assert_eq!(field.at(2, 1), 6);
        assert_eq!(field.at(0, 1), 4);
    }

    #[test]
    fn test_tap_point_only_when_found() {
        let miss = MatchResult {
            found: false,
            x: 5,
            y: 5,
            score: Some(0.4),
        };
        assert_eq!(miss.tap_point(), None);
        let hit = MatchResult { found: true, ..miss };
        assert_eq!(hit.tap_point(), Some((5, 5)));
    }
}
