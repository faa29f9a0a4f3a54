//! Mock implementations of the detection and classifier ports.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use emolens_core::domain::{DetectedFace, InputTensor, Logits, EMOTION_CLASSES};
use emolens_core::ports::{EmotionModel, FaceDetector, ModelLoader};
use image::RgbaImage;

/// Mock `FaceDetector` returning a fixed answer and counting calls.
pub struct MockFaceDetector {
    faces: Vec<DetectedFace>,
    failure: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl MockFaceDetector {
    /// Always reports the given faces.
    #[must_use]
    pub fn with_faces(faces: Vec<DetectedFace>) -> Self {
        Self {
            faces,
            failure: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always reports zero faces.
    #[must_use]
    pub fn none() -> Self {
        Self::with_faces(Vec::new())
    }

    /// Always fails with the given message.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            faces: Vec::new(),
            failure: Some(message.into()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Handle observing how often `detect` ran.
    #[must_use]
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl FaceDetector for MockFaceDetector {
    fn detect(&self, _image: &RgbaImage) -> anyhow::Result<Vec<DetectedFace>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(message) => anyhow::bail!("{message}"),
            None => Ok(self.faces.clone()),
        }
    }
}

/// Shared, inspectable state behind [`ScriptedLoader`].
#[derive(Debug)]
pub struct ScriptState {
    /// What `accelerator_supported` reports.
    pub accelerator_supported: bool,
    /// Make accelerated load attempts fail (CPU loads still succeed).
    pub fail_accelerated_load: bool,
    /// Make every load attempt fail.
    pub fail_all_loads: bool,
    /// While set, every inference fails with this message (including
    /// warm-up, whose failure the engine only logs).
    pub infer_failure: Option<String>,
    /// Logits returned by successful inference.
    pub logits: [f32; EMOTION_CLASSES],
    /// What `health_check` reports.
    pub healthy: bool,
    /// Successful model builds.
    pub load_count: usize,
    /// Accelerated build attempts, successful or not.
    pub accelerated_load_attempts: usize,
    /// Inference calls, successful or not (warm-ups included).
    pub infer_count: usize,
}

impl Default for ScriptState {
    fn default() -> Self {
        Self {
            accelerator_supported: false,
            fail_accelerated_load: false,
            fail_all_loads: false,
            infer_failure: None,
            logits: [0.0; EMOTION_CLASSES],
            healthy: true,
            load_count: 0,
            accelerated_load_attempts: 0,
            infer_count: 0,
        }
    }
}

/// Scriptable `ModelLoader` for exercising the engine state machine
/// without real model weights.
#[derive(Clone, Default)]
pub struct ScriptedLoader {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports accelerator support.
    #[must_use]
    pub fn with_accelerator(self) -> Self {
        self.state_mut(|s| s.accelerator_supported = true);
        self
    }

    /// Reports accelerator support but fails every accelerated build.
    #[must_use]
    pub fn with_broken_accelerator(self) -> Self {
        self.state_mut(|s| {
            s.accelerator_supported = true;
            s.fail_accelerated_load = true;
        });
        self
    }

    /// Successful inferences return these logits.
    #[must_use]
    pub fn with_logits(self, logits: [f32; EMOTION_CLASSES]) -> Self {
        self.state_mut(|s| s.logits = logits);
        self
    }

    /// Handle for inspecting and mutating the script mid-test.
    #[must_use]
    pub fn state(&self) -> Arc<Mutex<ScriptState>> {
        Arc::clone(&self.state)
    }

    /// Runs `f` against the locked state.
    pub fn state_mut(&self, f: impl FnOnce(&mut ScriptState)) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state);
    }
}

impl ModelLoader for ScriptedLoader {
    fn accelerator_supported(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .accelerator_supported
    }

    fn load(&self, _asset: &[u8], accelerated: bool) -> anyhow::Result<Box<dyn EmotionModel>> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if accelerated {
            state.accelerated_load_attempts += 1;
            if state.fail_accelerated_load {
                anyhow::bail!("accelerator delegate rejected the model graph");
            }
        }
        if state.fail_all_loads {
            anyhow::bail!("model asset rejected");
        }

        state.load_count += 1;
        Ok(Box::new(ScriptedModel {
            state: Arc::clone(&self.state),
        }))
    }
}

struct ScriptedModel {
    state: Arc<Mutex<ScriptState>>,
}

impl EmotionModel for ScriptedModel {
    fn infer(&self, _input: &InputTensor) -> anyhow::Result<Logits> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.infer_count += 1;
        if let Some(message) = &state.infer_failure {
            anyhow::bail!("{message}");
        }
        Ok(Logits(state.logits))
    }

    fn health_check(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .healthy
    }
}
