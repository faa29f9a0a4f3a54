//! Serializable classification records.

use serde::{Deserialize, Serialize};

use super::Emotion;

/// Flat, serializable projection of one classification outcome.
///
/// This is what the output adapters persist; the in-memory
/// [`EmotionResult`](super::EmotionResult) additionally owns image buffers
/// that never leave the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyRecord {
    /// Path to the classified image.
    pub path: String,
    /// Timestamp of classification (RFC 3339).
    pub timestamp: String,
    /// Source image dimensions.
    pub dimensions: ImageDimensions,
    /// How the request ended.
    pub outcome: Outcome,
    /// Winning label, present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotion: Option<Emotion>,
    /// Softmax probability of the winning label, present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    /// Stage-specific message, present on error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Where the annotated visualization was written, if anywhere.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotated_path: Option<String>,
}

/// Terminal state of a classification request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// A face was found and classified.
    Success,
    /// No face in frame — a successful outcome with no classification.
    NoFaces,
    /// A pipeline stage failed.
    Error,
}

/// Image dimensions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl ImageDimensions {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_record_omits_error_field() {
        let record = ClassifyRecord {
            path: "portrait.jpg".into(),
            timestamp: "2025-01-01T00:00:00Z".into(),
            dimensions: ImageDimensions::new(640, 480),
            outcome: Outcome::Success,
            emotion: Some(Emotion::Happiness),
            confidence: Some(0.93),
            error: None,
            annotated_path: None,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"outcome\":\"success\""));
        assert!(json.contains("\"emotion\":\"happiness\""));
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn test_no_faces_outcome_spelling() {
        let json = serde_json::to_string(&Outcome::NoFaces).unwrap();
        assert_eq!(json, "\"no_faces\"");
    }
}
