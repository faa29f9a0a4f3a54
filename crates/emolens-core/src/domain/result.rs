//! Terminal pipeline results and the decoded-image carrier type.

use image::RgbaImage;

use super::{Emotion, PipelineError};

/// The one value the pipeline hands back to its caller.
///
/// Whatever image the variant carries is owned by the caller from the
/// moment this is returned; the pipeline keeps no reference to it.
#[derive(Debug)]
pub enum EmotionResult {
    /// The largest face was classified.
    Success {
        emotion: Emotion,
        /// Softmax probability of `emotion`, clamped to `[0, 1]`.
        confidence: f32,
        /// Copy of the source image with face boxes drawn on it.
        annotated: RgbaImage,
    },
    /// Zero faces found. Not an error — carries the original image back
    /// unchanged.
    NoFacesDetected { image: RgbaImage },
    /// A stage failed; see [`PipelineError`] for the taxonomy.
    Error(PipelineError),
}

impl EmotionResult {
    /// True for the `Error` variant only — `NoFacesDetected` is a success.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// The stage-specific message, when this is an error.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        match self {
            Self::Error(e) => Some(e.to_string()),
            _ => None,
        }
    }
}

/// A decoded image together with where it came from.
///
/// This is what the acquisition boundary (filesystem adapter, host
/// application) hands to the pipeline driver.
#[derive(Debug, Clone)]
pub struct ImageInfo {
    /// Source path or synthetic identifier.
    pub path: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Decoded RGBA pixel data.
    pub image: RgbaImage,
}

impl ImageInfo {
    #[must_use]
    pub fn new(path: impl Into<String>, image: RgbaImage) -> Self {
        Self {
            path: path.into(),
            width: image.width(),
            height: image.height(),
            image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_faces_is_not_an_error() {
        let result = EmotionResult::NoFacesDetected {
            image: RgbaImage::new(4, 4),
        };
        assert!(!result.is_error());
        assert!(result.error_message().is_none());
    }

    #[test]
    fn test_error_message_is_stage_specific() {
        let result = EmotionResult::Error(PipelineError::InputMissing);
        assert!(result.is_error());
        assert_eq!(result.error_message().as_deref(), Some("unable to capture image"));
    }
}
