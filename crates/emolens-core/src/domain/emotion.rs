//! Emotion label table and raw classifier output.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of classes the classifier distinguishes.
pub const EMOTION_CLASSES: usize = 8;

/// A facial emotion class.
///
/// The discriminant order is the model-output contract: class `i` of the
/// classifier's logit vector maps to `Emotion::ALL[i]`. Any model update
/// must preserve this exact ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    Neutral,
    Happiness,
    Surprise,
    Sadness,
    Anger,
    Disgust,
    Fear,
    Contempt,
}

impl Emotion {
    /// All emotions in model-output index order.
    pub const ALL: [Self; EMOTION_CLASSES] = [
        Self::Neutral,
        Self::Happiness,
        Self::Surprise,
        Self::Sadness,
        Self::Anger,
        Self::Disgust,
        Self::Fear,
        Self::Contempt,
    ];

    /// Maps a classifier output index to its emotion.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// The classifier output index bound to this emotion.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Neutral => 0,
            Self::Happiness => 1,
            Self::Surprise => 2,
            Self::Sadness => 3,
            Self::Anger => 4,
            Self::Disgust => 5,
            Self::Fear => 6,
            Self::Contempt => 7,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Neutral => "Neutral",
            Self::Happiness => "Happiness",
            Self::Surprise => "Surprise",
            Self::Sadness => "Sadness",
            Self::Anger => "Anger",
            Self::Disgust => "Disgust",
            Self::Fear => "Fear",
            Self::Contempt => "Contempt",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw, unnormalized class scores straight from the classifier.
///
/// Positionally bound to [`Emotion::ALL`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Logits(pub [f32; EMOTION_CLASSES]);

impl Logits {
    /// Scores as a slice, in label-table order.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}
