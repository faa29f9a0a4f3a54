//! The emotion classification pipeline.
//!
//! Stages, leaf to root: face location, face extraction, tensor
//! preprocessing, inference, result synthesis. [`EmotionPipeline`] sequences
//! them, owns error propagation and component lifecycle, and is the single
//! entry point the hosting application sees.

mod annotate;
mod extractor;
mod locator;
mod preprocess;
mod synthesize;

pub use annotate::annotate_faces;
pub use extractor::{extract_largest, select_largest, CROP_PADDING};
pub use locator::{FaceLocator, LocatorConfig};
pub use preprocess::{center_crop_square, preprocess};
pub use synthesize::{softmax, synthesize};

use image::RgbaImage;
use tracing::{debug, info, warn};

use crate::domain::{EmotionResult, PipelineError};
use crate::inference::{
    best_device, var_builder_from_bytes, CandleModelLoader, EngineStatus, FaceDetectorNet,
    InferenceEngine,
};
use crate::ports::{FaceDetector, ModelLoader};

/// Builds (and rebuilds, after escalated failures) the detection backend.
pub type DetectorFactory = Box<dyn Fn() -> anyhow::Result<Box<dyn FaceDetector>> + Send>;

/// Pipeline tuning knobs.
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    /// Padding added around the selected face box before cropping.
    pub crop_padding: i32,
    /// Minimum face size relative to the shorter image dimension.
    pub min_relative_face_size: f32,
    /// Consecutive failed requests before every component is reloaded.
    pub max_consecutive_failures: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            crop_padding: CROP_PADDING,
            min_relative_face_size: 0.10,
            max_consecutive_failures: 2,
        }
    }
}

/// Sequences the classification stages over one long-lived engine and
/// detector.
///
/// `process` takes `&mut self`: the engine's interpreter state is mutable
/// and calls must be serialized, so overlapping requests on one instance
/// are rejected by the borrow checker rather than interleaved. Run it off
/// the interaction thread — a call blocks for the full detection plus
/// inference time.
pub struct EmotionPipeline {
    detector_factory: DetectorFactory,
    locator: FaceLocator,
    engine: InferenceEngine,
    model_asset: Vec<u8>,
    config: PipelineConfig,
    consecutive_failures: u32,
}

impl EmotionPipeline {
    /// Builds a pipeline from a detection backend factory, a classifier
    /// loader and the classifier asset.
    ///
    /// The classifier itself loads lazily on the first `process` call.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial detection backend cannot be built.
    pub fn new(
        detector_factory: DetectorFactory,
        loader: Box<dyn ModelLoader>,
        model_asset: Vec<u8>,
        config: PipelineConfig,
    ) -> anyhow::Result<Self> {
        let detector = detector_factory()?;
        let locator = FaceLocator::new(
            detector,
            LocatorConfig {
                min_relative_face_size: config.min_relative_face_size,
            },
        );

        Ok(Self {
            detector_factory,
            locator,
            engine: InferenceEngine::new(loader),
            model_asset,
            config,
            consecutive_failures: 0,
        })
    }

    /// Builds a pipeline with the candle-backed detector and classifier.
    ///
    /// `face_asset` and `emotion_asset` are safetensors weight blobs.
    ///
    /// # Errors
    ///
    /// Returns an error if the detector asset cannot be parsed.
    pub fn with_candle(
        face_asset: Vec<u8>,
        emotion_asset: Vec<u8>,
        config: PipelineConfig,
    ) -> anyhow::Result<Self> {
        let factory: DetectorFactory = Box::new(move || {
            let device = best_device();
            let vb = var_builder_from_bytes(&face_asset, &device)?;
            let net = FaceDetectorNet::new(vb)?;
            Ok(Box::new(net) as Box<dyn FaceDetector>)
        });

        Self::new(factory, Box::new(CandleModelLoader), emotion_asset, config)
    }

    /// Classifies the most relevant face in the image.
    ///
    /// This is the whole external contract: every failure comes back as
    /// [`EmotionResult::Error`], zero faces come back as
    /// [`EmotionResult::NoFacesDetected`] carrying the unchanged input, and
    /// nothing panics out of here.
    pub fn process(&mut self, image: Option<RgbaImage>) -> EmotionResult {
        let Some(image) = image else {
            return self.fail(PipelineError::InputMissing);
        };

        // A degraded or never-loaded engine reloads transparently here; a
        // single accelerator fault costs at most the one call that hit it.
        if self.engine.needs_reload() {
            if let Err(e) = self.engine.load(&self.model_asset) {
                return self.fail(e);
            }
        }

        let faces = self.locator.detect(&image);
        if faces.is_empty() {
            debug!("no faces detected");
            self.consecutive_failures = 0;
            return EmotionResult::NoFacesDetected { image };
        }

        let face = match extract_largest(&image, &faces, self.config.crop_padding) {
            Ok(face) => face,
            Err(e) => return self.fail(PipelineError::FaceExtraction(e)),
        };

        let tensor = match preprocess(&face) {
            Ok(tensor) => tensor,
            Err(e) => return self.fail(PipelineError::Preprocessing(e)),
        };
        drop(face);

        let annotated = annotate_faces(&image, &faces);
        drop(image);

        let logits = match self.engine.infer(&tensor) {
            Ok(logits) => logits,
            Err(e) => return self.fail(e),
        };

        let (emotion, confidence) = synthesize(&logits);
        debug!(%emotion, confidence, "classified face");
        self.consecutive_failures = 0;

        EmotionResult::Success {
            emotion,
            confidence,
            annotated,
        }
    }

    /// Whether the loaded classifier runs on the accelerator.
    #[must_use]
    pub fn is_using_accelerator(&self) -> bool {
        self.engine.is_using_accelerator()
    }

    /// Current engine state, for observability and tests.
    #[must_use]
    pub fn engine_status(&self) -> EngineStatus {
        self.engine.status()
    }

    /// Failed requests since the last success, for observability and tests.
    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Releases the engine and detector. Safe to call more than once.
    pub fn close(&mut self) {
        self.engine.close();
        info!("pipeline closed");
    }

    fn fail(&mut self, error: PipelineError) -> EmotionResult {
        self.consecutive_failures += 1;
        warn!(
            stage = error.stage(),
            consecutive = self.consecutive_failures,
            "pipeline stage failed: {error}"
        );

        if self.consecutive_failures >= self.config.max_consecutive_failures {
            self.reload_components();
        }

        EmotionResult::Error(error)
    }

    /// Escalation path: repeated failures may mean compounding resource
    /// corruption beyond the engine, so everything is rebuilt.
    fn reload_components(&mut self) {
        info!(
            threshold = self.config.max_consecutive_failures,
            "failure threshold reached, reloading all pipeline components"
        );

        self.engine.close();
        if let Err(e) = self.engine.load(&self.model_asset) {
            warn!("engine reload failed, will retry on next request: {e}");
        }

        match (self.detector_factory)() {
            Ok(detector) => {
                self.locator = FaceLocator::new(
                    detector,
                    LocatorConfig {
                        min_relative_face_size: self.config.min_relative_face_size,
                    },
                );
            }
            Err(e) => warn!("detector rebuild failed, keeping previous instance: {e:#}"),
        }

        self.consecutive_failures = 0;
    }
}
