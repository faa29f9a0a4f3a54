//! Face bounding boxes in source-image pixel coordinates.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle delimiting a detected face.
///
/// Coordinates are pixels in the source image. A box is well-formed when
/// `left < right` and `top < bottom`; boxes straight from a detector may
/// violate this and must pass through [`BoundingBox::clipped_to`] before a
/// crop is taken from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl BoundingBox {
    #[must_use]
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    #[must_use]
    pub const fn width(&self) -> i32 {
        self.right - self.left
    }

    #[must_use]
    pub const fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Box area in pixels; degenerate boxes count as zero.
    #[must_use]
    pub fn area(&self) -> i64 {
        i64::from(self.width().max(0)) * i64::from(self.height().max(0))
    }

    /// The shorter of width and height, used for relative-size filtering.
    #[must_use]
    pub fn shorter_side(&self) -> i32 {
        self.width().min(self.height())
    }

    /// Grows the box by `padding` pixels on every side.
    #[must_use]
    pub const fn expanded(&self, padding: i32) -> Self {
        Self {
            left: self.left - padding,
            top: self.top - padding,
            right: self.right + padding,
            bottom: self.bottom + padding,
        }
    }

    /// Clips the box to a `width` x `height` image extent.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn clipped_to(&self, width: u32, height: u32) -> Self {
        let w = width.min(i32::MAX as u32) as i32;
        let h = height.min(i32::MAX as u32) as i32;
        Self {
            left: self.left.max(0),
            top: self.top.max(0),
            right: self.right.min(w),
            bottom: self.bottom.min(h),
        }
    }
}

/// A face reported by the detector: box plus detection confidence.
///
/// The confidence is used for selection and visualization only, never for
/// classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectedFace {
    pub bbox: BoundingBox,
    pub confidence: f32,
}

impl DetectedFace {
    #[must_use]
    pub const fn new(bbox: BoundingBox, confidence: f32) -> Self {
        Self { bbox, confidence }
    }
}
