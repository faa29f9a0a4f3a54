//! Core domain types for emotion classification.

mod emotion;
mod error;
mod geometry;
mod record;
mod result;
mod tensor;

pub use emotion::{Emotion, Logits, EMOTION_CLASSES};
pub use error::PipelineError;
pub use geometry::{BoundingBox, DetectedFace};
pub use record::{ClassifyRecord, ImageDimensions, Outcome};
pub use result::{EmotionResult, ImageInfo};
pub use tensor::{InputTensor, MODEL_INPUT_SIZE};
