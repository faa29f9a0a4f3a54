//! Face detection port.

use image::RgbaImage;

use crate::domain::DetectedFace;

/// Port wrapping an external face-detection capability.
pub trait FaceDetector: Send {
    /// Returns every face found in the image, in detector priority order.
    ///
    /// An empty vector is the normal "no faces" answer. Downstream code
    /// treats a returned error the same way, since face absence and
    /// detector failure are operationally indistinguishable to the user.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying detection backend fails.
    fn detect(&self, image: &RgbaImage) -> anyhow::Result<Vec<DetectedFace>>;
}
