//! Stage-level pipeline failures.

use thiserror::Error;

/// Everything that can go wrong between receiving an image and returning a
/// classification.
///
/// Every variant maps to exactly one pipeline stage, and every one is
/// terminal for the current request: the caller gets an
/// [`EmotionResult::Error`](super::EmotionResult::Error) and may simply
/// retry. An [`Accelerator`](PipelineError::Accelerator) fault additionally
/// leaves the inference engine degraded so the next request reloads it
/// before running.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No image was handed to the pipeline.
    #[error("unable to capture image")]
    InputMissing,

    /// The model asset could not be parsed or the interpreter could not be
    /// brought up.
    #[error("cannot load model")]
    ModelLoad(#[source] anyhow::Error),

    /// The selected face produced a degenerate crop.
    #[error("failed to extract face")]
    FaceExtraction(#[source] anyhow::Error),

    /// Crop, resize or tensor conversion failed.
    #[error("face preprocessing failed")]
    Preprocessing(#[source] anyhow::Error),

    /// The interpreter rejected or aborted the inference call.
    #[error("model inference failed")]
    Inference(#[source] anyhow::Error),

    /// Recoverable sub-case of an inference failure: the accelerator
    /// context died. The engine is degraded and reloads on the next call.
    #[error("model inference failed")]
    Accelerator(#[source] anyhow::Error),
}

impl PipelineError {
    /// Short machine-friendly stage tag, for logs and result records.
    #[must_use]
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::InputMissing => "input",
            Self::ModelLoad(_) => "model_load",
            Self::FaceExtraction(_) => "face_extraction",
            Self::Preprocessing(_) => "preprocessing",
            Self::Inference(_) => "inference",
            Self::Accelerator(_) => "accelerator",
        }
    }
}
