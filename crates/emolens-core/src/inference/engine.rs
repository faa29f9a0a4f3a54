//! Inference engine lifecycle and fault handling.

use anyhow::anyhow;
use tracing::{debug, info, warn};

use crate::domain::{InputTensor, Logits, PipelineError};
use crate::ports::{EmotionModel, ModelLoader};

/// Externally observable engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    /// No model loaded yet, or a health check failed.
    Unloaded,
    /// Ready for inference.
    Loaded,
    /// An accelerator fault released the interpreter; a reload is required
    /// before the next inference.
    Degraded,
    /// Explicitly torn down. Loading again is permitted.
    Closed,
}

enum EngineState {
    Unloaded,
    Loaded {
        model: Box<dyn EmotionModel>,
        accelerated: bool,
    },
    Degraded,
    Closed,
}

/// Owns the loaded classifier and its optional accelerator context.
///
/// State machine: `Unloaded -> Loaded -> (Degraded -> reloaded | Closed)`.
/// All methods take `&mut self`; overlapping use of one engine from two
/// requests is a compile error, which is the single-flight guarantee the
/// pipeline relies on.
pub struct InferenceEngine {
    loader: Box<dyn ModelLoader>,
    state: EngineState,
}

impl InferenceEngine {
    #[must_use]
    pub fn new(loader: Box<dyn ModelLoader>) -> Self {
        Self {
            loader,
            state: EngineState::Unloaded,
        }
    }

    /// Parses the asset and brings up the interpreter.
    ///
    /// Attempts an accelerated build only when the runtime compatibility
    /// check passes; an accelerator attach failure falls back to CPU and is
    /// never surfaced to the caller. A warm-up inference pre-pays first-call
    /// latency; warm-up failure is logged, not fatal. A contract-violating
    /// asset (wrong shapes) is a fatal load error.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ModelLoad`] if no usable model could be
    /// built.
    pub fn load(&mut self, asset: &[u8]) -> Result<(), PipelineError> {
        // Drop whatever was loaded before; reload is legal from any state.
        self.state = EngineState::Unloaded;

        let (model, accelerated) = if self.loader.accelerator_supported() {
            match self.loader.load(asset, true) {
                Ok(model) => (model, true),
                Err(e) => {
                    warn!("accelerator attach failed, falling back to CPU: {e:#}");
                    let model = self
                        .loader
                        .load(asset, false)
                        .map_err(PipelineError::ModelLoad)?;
                    (model, false)
                }
            }
        } else {
            let model = self
                .loader
                .load(asset, false)
                .map_err(PipelineError::ModelLoad)?;
            (model, false)
        };

        if let Err(e) = model.infer(&InputTensor::zeros()) {
            warn!("warm-up inference failed: {e:#}");
        }

        info!(accelerated, "inference engine loaded");
        self.state = EngineState::Loaded { model, accelerated };
        Ok(())
    }

    /// Runs one synchronous inference.
    ///
    /// A failure whose cause implicates the accelerator releases the
    /// interpreter and transitions to `Degraded` — no in-call retry; the
    /// caller decides when to reload. Other failures leave the engine
    /// loaded.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Inference`] or, for accelerator faults,
    /// [`PipelineError::Accelerator`].
    pub fn infer(&mut self, input: &InputTensor) -> Result<Logits, PipelineError> {
        let EngineState::Loaded { model, accelerated } = &self.state else {
            return Err(PipelineError::Inference(anyhow!(
                "inference engine is not loaded"
            )));
        };
        let accelerated = *accelerated;

        match model.infer(input) {
            Ok(logits) => Ok(logits),
            Err(e) => {
                if accelerated && is_accelerator_fault(&e) {
                    warn!("accelerator fault, engine degraded pending reload: {e:#}");
                    self.state = EngineState::Degraded;
                    Err(PipelineError::Accelerator(e))
                } else {
                    Err(PipelineError::Inference(e))
                }
            }
        }
    }

    /// Verifies a loaded interpreter still responds.
    ///
    /// A failed probe demotes the engine to `Unloaded` so the next caller
    /// reloads instead of trusting a dead interpreter.
    pub fn health_check(&mut self) -> bool {
        match &self.state {
            EngineState::Loaded { model, .. } => {
                if model.health_check() {
                    true
                } else {
                    warn!("engine health check failed, treating as unloaded");
                    self.state = EngineState::Unloaded;
                    false
                }
            }
            _ => false,
        }
    }

    /// Whether the next `infer` call can run without a reload.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        matches!(self.state, EngineState::Loaded { .. })
    }

    /// True in every state that requires `load` before inference.
    #[must_use]
    pub fn needs_reload(&self) -> bool {
        !self.is_loaded()
    }

    /// Whether the loaded model runs on the accelerator.
    #[must_use]
    pub fn is_using_accelerator(&self) -> bool {
        matches!(
            self.state,
            EngineState::Loaded {
                accelerated: true,
                ..
            }
        )
    }

    #[must_use]
    pub fn status(&self) -> EngineStatus {
        match self.state {
            EngineState::Unloaded => EngineStatus::Unloaded,
            EngineState::Loaded { .. } => EngineStatus::Loaded,
            EngineState::Degraded => EngineStatus::Degraded,
            EngineState::Closed => EngineStatus::Closed,
        }
    }

    /// Releases interpreter and accelerator resources unconditionally.
    ///
    /// Idempotent; closing an already-closed engine does nothing.
    pub fn close(&mut self) {
        if matches!(self.state, EngineState::Loaded { .. }) {
            debug!("releasing interpreter resources");
        }
        self.state = EngineState::Closed;
    }
}

/// Heuristic: does this failure implicate the accelerator context?
fn is_accelerator_fault(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        let text = cause.to_string().to_lowercase();
        ["metal", "cuda", "gpu", "accelerator"]
            .iter()
            .any(|marker| text.contains(marker))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accelerator_fault_markers() {
        assert!(is_accelerator_fault(&anyhow!("Metal command buffer aborted")));
        assert!(is_accelerator_fault(&anyhow!("CUDA_ERROR_ILLEGAL_ADDRESS")));
        assert!(!is_accelerator_fault(&anyhow!("tensor shape mismatch")));
    }

    #[test]
    fn test_fault_marker_found_in_cause_chain() {
        let inner = anyhow!("gpu context lost");
        let outer = inner.context("forward pass failed");
        assert!(is_accelerator_fault(&outer));
    }

    #[test]
    fn test_infer_before_load_is_an_error() {
        struct NeverLoader;
        impl ModelLoader for NeverLoader {
            fn accelerator_supported(&self) -> bool {
                false
            }
            fn load(&self, _: &[u8], _: bool) -> anyhow::Result<Box<dyn EmotionModel>> {
                anyhow::bail!("unused")
            }
        }

        let mut engine = InferenceEngine::new(Box::new(NeverLoader));
        assert!(engine.needs_reload());
        assert!(engine.infer(&InputTensor::zeros()).is_err());
    }

    #[test]
    fn test_close_is_idempotent() {
        struct NeverLoader;
        impl ModelLoader for NeverLoader {
            fn accelerator_supported(&self) -> bool {
                false
            }
            fn load(&self, _: &[u8], _: bool) -> anyhow::Result<Box<dyn EmotionModel>> {
                anyhow::bail!("unused")
            }
        }

        let mut engine = InferenceEngine::new(Box::new(NeverLoader));
        engine.close();
        engine.close();
        assert_eq!(engine.status(), EngineStatus::Closed);
    }
}
