//! Face extraction stage: pick the largest face, crop it with padding.

use anyhow::{bail, Result};
use image::RgbaImage;

use crate::domain::DetectedFace;

/// Fixed crop padding around the selected face box, in pixels per side.
pub const CROP_PADDING: i32 = 20;

/// Picks the face with the largest box area; first-seen wins ties.
#[must_use]
pub fn select_largest(faces: &[DetectedFace]) -> Option<&DetectedFace> {
    let mut best: Option<&DetectedFace> = None;
    for face in faces {
        match best {
            Some(current) if face.bbox.area() <= current.bbox.area() => {}
            _ => best = Some(face),
        }
    }
    best
}

/// Crops the largest detected face out of the image, expanded by `padding`
/// on each side and clipped to the image bounds.
///
/// # Errors
///
/// Returns an error if no face is given or the clipped crop has no area
/// (a degenerate bounding box).
pub fn extract_largest(
    image: &RgbaImage,
    faces: &[DetectedFace],
    padding: i32,
) -> Result<RgbaImage> {
    let Some(face) = select_largest(faces) else {
        bail!("no face to extract");
    };

    let crop = face
        .bbox
        .expanded(padding)
        .clipped_to(image.width(), image.height());

    if crop.width() <= 0 || crop.height() <= 0 {
        bail!(
            "degenerate face bounding box {:?} in {}x{} image",
            face.bbox,
            image.width(),
            image.height()
        );
    }

    #[allow(clippy::cast_sign_loss)]
    let cropped = image::imageops::crop_imm(
        image,
        crop.left as u32,
        crop.top as u32,
        crop.width() as u32,
        crop.height() as u32,
    )
    .to_image();

    Ok(cropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BoundingBox;

    fn face(left: i32, top: i32, right: i32, bottom: i32) -> DetectedFace {
        DetectedFace::new(BoundingBox::new(left, top, right, bottom), 0.9)
    }

    #[test]
    fn test_largest_face_wins() {
        let faces = vec![face(0, 0, 10, 10), face(20, 20, 80, 80), face(0, 0, 30, 30)];
        let selected = select_largest(&faces).unwrap();
        assert_eq!(selected.bbox, BoundingBox::new(20, 20, 80, 80));
    }

    #[test]
    fn test_tie_breaks_first_seen() {
        let faces = vec![face(0, 0, 10, 10), face(50, 50, 60, 60)];
        let selected = select_largest(&faces).unwrap();
        assert_eq!(selected.bbox, BoundingBox::new(0, 0, 10, 10));
    }

    #[test]
    fn test_padding_clipped_to_image() {
        let image = RgbaImage::new(100, 100);
        // Box touching the corner: padding would go negative without clipping.
        let cropped = extract_largest(&image, &[face(0, 0, 50, 50)], CROP_PADDING).unwrap();
        assert_eq!(cropped.dimensions(), (70, 70));
    }

    #[test]
    fn test_interior_box_gets_full_padding() {
        let image = RgbaImage::new(200, 200);
        let cropped = extract_largest(&image, &[face(60, 60, 120, 120)], CROP_PADDING).unwrap();
        assert_eq!(cropped.dimensions(), (100, 100));
    }

    #[test]
    fn test_degenerate_box_is_error_not_panic() {
        let image = RgbaImage::new(100, 100);
        // Inverted box: clipping produces a non-positive extent.
        let result = extract_largest(&image, &[face(80, 80, -10, -10)], 0);
        assert!(result.is_err());
    }

    #[test]
    fn test_box_fully_outside_image_is_error() {
        let image = RgbaImage::new(100, 100);
        let result = extract_largest(&image, &[face(300, 300, 400, 400)], CROP_PADDING);
        assert!(result.is_err());
    }

    #[test]
    fn test_no_faces_is_error() {
        let image = RgbaImage::new(100, 100);
        assert!(extract_largest(&image, &[], CROP_PADDING).is_err());
    }
}
