//! Synthetic image builders for testing.

use emolens_core::domain::ImageInfo;
use image::{Rgba, RgbaImage};

/// Builder for creating synthetic RGBA test images.
pub struct SyntheticImageBuilder;

impl SyntheticImageBuilder {
    /// A single flat color.
    #[must_use]
    pub fn uniform(width: u32, height: u32, rgba: [u8; 4]) -> ImageInfo {
        let img = RgbaImage::from_pixel(width, height, Rgba(rgba));
        ImageInfo::new("synthetic://uniform", img)
    }

    /// Flat mid-gray, the canonical "well-behaved" input.
    #[must_use]
    pub fn gray(width: u32, height: u32, value: u8) -> ImageInfo {
        Self::uniform(width, height, [value, value, value, 255])
    }

    /// A smooth horizontal luminance gradient.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn horizontal_gradient(width: u32, height: u32) -> ImageInfo {
        let img = RgbaImage::from_fn(width, height, |x, _| {
            let v = ((u32::from(u8::MAX) * x) / width.max(1)) as u8;
            Rgba([v, v, v, 255])
        });
        ImageInfo::new("synthetic://horizontal_gradient", img)
    }

    /// A light background with a darker, skin-toned center block roughly
    /// where a portrait would put a face.
    ///
    /// Detection in tests is mocked, so the block only needs to look
    /// plausible in saved annotation output, not to be detectable.
    #[must_use]
    pub fn portrait(width: u32, height: u32) -> ImageInfo {
        let face_w = width / 3;
        let face_h = height / 3;
        let left = (width - face_w) / 2;
        let top = (height - face_h) / 2;

        let img = RgbaImage::from_fn(width, height, |x, y| {
            if x >= left && x < left + face_w && y >= top && y < top + face_h {
                Rgba([210, 170, 140, 255])
            } else {
                Rgba([230, 230, 235, 255])
            }
        });
        ImageInfo::new("synthetic://portrait", img)
    }

    /// A 1x1 image (edge case).
    #[must_use]
    pub fn single_pixel(rgba: [u8; 4]) -> ImageInfo {
        Self::uniform(1, 1, rgba)
    }
}
