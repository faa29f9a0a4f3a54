//! Bounding-box visualization on a copy of the source image.

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::domain::DetectedFace;

/// Box outline color.
const BOX_COLOR: Rgba<u8> = Rgba([80, 220, 120, 255]);

/// Height of the marker tag above each box, in pixels.
const TAG_HEIGHT: u32 = 6;

/// Draws every detected face onto an independent copy of the image.
///
/// Each face gets a double hollow rectangle for visibility plus a filled
/// tag above the box whose width scales with detection confidence. The
/// returned copy is unrelated to the crop used for classification.
#[must_use]
#[allow(clippy::cast_sign_loss, clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn annotate_faces(image: &RgbaImage, faces: &[DetectedFace]) -> RgbaImage {
    let mut canvas = image.clone();

    for face in faces {
        let bbox = face.bbox.clipped_to(canvas.width(), canvas.height());
        if bbox.width() <= 0 || bbox.height() <= 0 {
            continue;
        }

        let (x, y) = (bbox.left, bbox.top);
        let (w, h) = (bbox.width() as u32, bbox.height() as u32);

        draw_hollow_rect_mut(&mut canvas, Rect::at(x, y).of_size(w, h), BOX_COLOR);
        if w > 2 && h > 2 {
            // Second outline one pixel in, for visibility at full resolution
            draw_hollow_rect_mut(
                &mut canvas,
                Rect::at(x + 1, y + 1).of_size(w - 2, h - 2),
                BOX_COLOR,
            );
        }

        // Confidence tag above the box (below the top edge when clipped)
        let tag_width = ((w as f32) * face.confidence.clamp(0.0, 1.0)).max(1.0) as u32;
        let tag_y = if y >= TAG_HEIGHT as i32 + 1 {
            y - TAG_HEIGHT as i32 - 1
        } else {
            y + 1
        };
        draw_filled_rect_mut(
            &mut canvas,
            Rect::at(x, tag_y).of_size(tag_width, TAG_HEIGHT),
            BOX_COLOR,
        );
    }

    canvas
}
