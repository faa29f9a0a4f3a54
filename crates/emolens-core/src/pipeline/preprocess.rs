//! Tensor preprocessing stage.
//!
//! Turns a face crop into the classifier's planar input tensor. Every step
//! is deterministic and leaves the input untouched.

use anyhow::{bail, Result};
use image::{imageops, RgbaImage};

use crate::domain::{InputTensor, MODEL_INPUT_SIZE};

/// Per-channel normalization mean.
const CHANNEL_MEAN: f32 = 0.5;
/// Per-channel normalization standard deviation.
const CHANNEL_STD: f32 = 0.5;

/// Center-crops the image to a `min(width, height)` square.
///
/// Offsets use truncating integer division, matching the classifier's
/// training-time crop.
#[must_use]
pub fn center_crop_square(image: &RgbaImage) -> RgbaImage {
    let (width, height) = image.dimensions();
    let side = width.min(height);
    let x_offset = (width - side) / 2;
    let y_offset = (height - side) / 2;
    imageops::crop_imm(image, x_offset, y_offset, side, side).to_image()
}

/// Converts a face crop into the normalized `[1, 3, 224, 224]` tensor.
///
/// Steps: center-crop to square, Lanczos resize to 224x224, per-channel
/// normalize `(v/255 - 0.5) / 0.5` (alpha dropped), pack planar R then G
/// then B, each plane row-major. The resize filter is quality-sensitive —
/// the classifier was trained on Lanczos-resampled crops and cheaper
/// filters measurably degrade accuracy.
///
/// # Errors
///
/// Returns an error for an empty (zero-dimension) input image.
pub fn preprocess(face: &RgbaImage) -> Result<InputTensor> {
    if face.width() == 0 || face.height() == 0 {
        bail!("cannot preprocess an empty {}x{} image", face.width(), face.height());
    }

    let square = center_crop_square(face);
    #[allow(clippy::cast_possible_truncation)]
    let side = MODEL_INPUT_SIZE as u32;
    let resized = imageops::resize(&square, side, side, imageops::FilterType::Lanczos3);

    let plane = MODEL_INPUT_SIZE * MODEL_INPUT_SIZE;
    let mut data = vec![0.0f32; InputTensor::LEN];
    for (i, pixel) in resized.pixels().enumerate() {
        for channel in 0..3 {
            let value = f32::from(pixel[channel]) / 255.0;
            data[channel * plane + i] = (value - CHANNEL_MEAN) / CHANNEL_STD;
        }
    }

    Ok(InputTensor::from_planes(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(rgba))
    }

    #[test]
    fn test_center_crop_side_is_min_dimension() {
        for (w, h) in [(1, 1), (5, 3), (3, 5), (640, 480), (224, 224), (2, 1000)] {
            let cropped = center_crop_square(&solid(w, h, [0, 0, 0, 255]));
            let side = w.min(h);
            assert_eq!(cropped.dimensions(), (side, side), "{w}x{h}");
        }
    }

    #[test]
    fn test_crop_offsets_truncate() {
        // 5x3 -> 3x3 with x offset (5-3)/2 = 1; mark the expected region.
        let mut image = solid(5, 3, [0, 0, 0, 255]);
        for y in 0..3 {
            for x in 1..4 {
                image.put_pixel(x, y, Rgba([255, 0, 0, 255]));
            }
        }
        let cropped = center_crop_square(&image);
        assert!(cropped.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_output_length_is_fixed() {
        for (w, h) in [(10, 10), (50, 400), (1000, 30)] {
            let tensor = preprocess(&solid(w, h, [10, 200, 77, 255])).unwrap();
            assert_eq!(tensor.as_slice().len(), 3 * 224 * 224);
        }
    }

    #[test]
    fn test_mid_gray_normalizes_near_zero() {
        let tensor = preprocess(&solid(64, 64, [128, 128, 128, 255])).unwrap();
        let expected = (128.0 / 255.0 - 0.5) / 0.5; // ~0.0039
        for channel in 0..3 {
            for &v in tensor.plane(channel) {
                assert!((v - expected).abs() < 1e-6, "channel {channel}: {v}");
            }
        }
    }

    #[test]
    fn test_planar_channel_order() {
        // Pure red input: R plane saturates to 1.0, G and B planes to -1.0.
        let tensor = preprocess(&solid(32, 32, [255, 0, 0, 255])).unwrap();
        assert!(tensor.plane(0).iter().all(|&v| (v - 1.0).abs() < 1e-6));
        assert!(tensor.plane(1).iter().all(|&v| (v + 1.0).abs() < 1e-6));
        assert!(tensor.plane(2).iter().all(|&v| (v + 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_alpha_is_ignored() {
        let opaque = preprocess(&solid(32, 32, [90, 120, 30, 255])).unwrap();
        let transparent = preprocess(&solid(32, 32, [90, 120, 30, 0])).unwrap();
        assert_eq!(opaque, transparent);
    }

    #[test]
    fn test_empty_image_is_error() {
        let empty = RgbaImage::new(0, 0);
        assert!(preprocess(&empty).is_err());
    }
}
