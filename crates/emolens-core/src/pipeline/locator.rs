//! Face location stage.

use image::RgbaImage;
use tracing::{debug, warn};

use crate::domain::DetectedFace;
use crate::ports::FaceDetector;

/// Configuration for the face location stage.
#[derive(Debug, Clone, Copy)]
pub struct LocatorConfig {
    /// Faces whose shorter box side is below this fraction of the shorter
    /// image dimension are ignored.
    pub min_relative_face_size: f32,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            min_relative_face_size: 0.10,
        }
    }
}

/// Wraps the face-detection backend behind a total, non-failing interface.
///
/// Face absence and detector failure are operationally indistinguishable
/// to the user, so backend errors are logged and mapped to "zero faces"
/// instead of propagating.
pub struct FaceLocator {
    detector: Box<dyn FaceDetector>,
    config: LocatorConfig,
}

impl FaceLocator {
    #[must_use]
    pub fn new(detector: Box<dyn FaceDetector>, config: LocatorConfig) -> Self {
        Self { detector, config }
    }

    /// Returns the usable faces in the image, possibly none.
    #[allow(clippy::cast_precision_loss)]
    pub fn detect(&self, image: &RgbaImage) -> Vec<DetectedFace> {
        let faces = match self.detector.detect(image) {
            Ok(faces) => faces,
            Err(e) => {
                warn!("face detection failed, treating as zero faces: {e:#}");
                return Vec::new();
            }
        };

        let min_side = image.width().min(image.height()) as f32 * self.config.min_relative_face_size;
        let total = faces.len();
        let faces: Vec<DetectedFace> = faces
            .into_iter()
            .filter(|f| f.bbox.shorter_side() as f32 >= min_side)
            .collect();

        debug!("detected {} faces ({} above size filter)", total, faces.len());
        faces
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BoundingBox;

    struct FixedDetector(Vec<DetectedFace>);
    impl FaceDetector for FixedDetector {
        fn detect(&self, _: &RgbaImage) -> anyhow::Result<Vec<DetectedFace>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenDetector;
    impl FaceDetector for BrokenDetector {
        fn detect(&self, _: &RgbaImage) -> anyhow::Result<Vec<DetectedFace>> {
            anyhow::bail!("backend exploded")
        }
    }

    #[test]
    fn test_detector_failure_is_zero_faces() {
        let locator = FaceLocator::new(Box::new(BrokenDetector), LocatorConfig::default());
        let image = RgbaImage::new(100, 100);
        assert!(locator.detect(&image).is_empty());
    }

    #[test]
    fn test_small_faces_filtered() {
        // Shorter image dimension 200 at 10% -> faces under 20 px dropped.
        let tiny = DetectedFace::new(BoundingBox::new(0, 0, 10, 10), 0.9);
        let big = DetectedFace::new(BoundingBox::new(50, 50, 150, 150), 0.9);
        let locator = FaceLocator::new(
            Box::new(FixedDetector(vec![tiny, big])),
            LocatorConfig::default(),
        );

        let image = RgbaImage::new(300, 200);
        let faces = locator.detect(&image);
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].bbox, big.bbox);
    }

    #[test]
    fn test_empty_detection_is_not_an_error() {
        let locator = FaceLocator::new(Box::new(FixedDetector(Vec::new())), LocatorConfig::default());
        let image = RgbaImage::new(64, 64);
        assert!(locator.detect(&image).is_empty());
    }
}
