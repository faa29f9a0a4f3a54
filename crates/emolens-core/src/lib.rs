//! emolens core — on-device facial emotion classification.
//!
//! This crate contains the whole inference pipeline: locating the most
//! relevant face in a decoded image, turning it into the classifier's
//! planar input tensor, running inference with optional accelerator
//! offload and CPU fallback, and synthesizing a labeled,
//! confidence-scored result with an annotated visualization.
//!
//! The hosting application talks to exactly one type:
//! [`EmotionPipeline`], via `process` and `close`.

pub mod domain;
pub mod inference;
pub mod pipeline;
pub mod ports;

pub use domain::{
    BoundingBox, ClassifyRecord, DetectedFace, Emotion, EmotionResult, ImageDimensions, ImageInfo,
    InputTensor, Logits, Outcome, PipelineError, EMOTION_CLASSES, MODEL_INPUT_SIZE,
};
pub use inference::{CandleModelLoader, EngineStatus, InferenceEngine};
pub use pipeline::{DetectorFactory, EmotionPipeline, PipelineConfig};
pub use ports::{
    EmotionModel, FaceDetector, ImageSource, ModelLoader, ProgressEvent, ProgressSink,
    ResultOutput,
};
