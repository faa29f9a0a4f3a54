//! The 8-class emotion classifier network.
//!
//! A compact CNN over 224x224 RGB face crops. The architecture is fixed in
//! code; the model asset supplies the trained weights. Builds refuse any
//! asset whose tensor shapes disagree with the layer dimensions below, so a
//! successfully constructed net always satisfies the `[1,3,224,224] ->
//! [1,8]` contract.

// Allow common ML code patterns
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

use anyhow::{Context, Result};
use candle_core::{Device, Module, Tensor};
use candle_nn::{conv2d, linear, Conv2d, Conv2dConfig, Linear, VarBuilder};

use crate::domain::{InputTensor, Logits, EMOTION_CLASSES, MODEL_INPUT_SIZE};
use crate::ports::{EmotionModel, ModelLoader};

use super::device::{accelerator_available, accelerator_device};
use super::loader::var_builder_from_bytes;

/// Channel widths of the five conv stages.
const STAGE_CHANNELS: [usize; 6] = [3, 32, 64, 128, 128, 256];

/// Spatial side after five 2x2 max pools: 224 -> 7.
const POOLED_SIDE: usize = MODEL_INPUT_SIZE / 32;

/// Width of the hidden fully-connected layer.
const HIDDEN_FEATURES: usize = 256;

/// Emotion classifier model.
///
/// Five conv+pool stages followed by two FC layers ending in one logit per
/// entry of the label table.
pub struct EmotionNet {
    stages: Vec<Conv2d>,
    fc1: Linear,
    fc2: Linear,
    device: Device,
}

impl EmotionNet {
    /// Builds the network from loaded weights.
    ///
    /// # Errors
    ///
    /// Returns an error if any weight tensor is missing or its shape does
    /// not match the fixed architecture.
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(vb: VarBuilder) -> Result<Self> {
        let device = vb.device().clone();

        let mut stages = Vec::with_capacity(STAGE_CHANNELS.len() - 1);
        for (i, pair) in STAGE_CHANNELS.windows(2).enumerate() {
            let stage = conv2d(
                pair[0],
                pair[1],
                3,
                Conv2dConfig {
                    padding: 1,
                    ..Conv2dConfig::default()
                },
                vb.pp(format!("conv{i}")),
            )
            .with_context(|| format!("conv stage {i}"))?;
            stages.push(stage);
        }

        let flat = STAGE_CHANNELS[STAGE_CHANNELS.len() - 1] * POOLED_SIDE * POOLED_SIDE;
        let fc1 = linear(flat, HIDDEN_FEATURES, vb.pp("fc1")).context("hidden FC layer")?;
        let fc2 = linear(HIDDEN_FEATURES, EMOTION_CLASSES, vb.pp("fc2"))
            .context("classification head")?;

        Ok(Self {
            stages,
            fc1,
            fc2,
            device,
        })
    }

    /// Runs one synchronous inference, returning the raw class scores.
    ///
    /// # Errors
    ///
    /// Returns an error if the interpreter fails or the output is not the
    /// expected 8-vector.
    pub fn infer_logits(&self, input: &InputTensor) -> Result<Logits> {
        let x = Tensor::from_slice(
            input.as_slice(),
            (1, 3, MODEL_INPUT_SIZE, MODEL_INPUT_SIZE),
            &self.device,
        )
        .context("Failed to stage input tensor")?;

        let out = self.forward(&x).context("Classifier forward pass failed")?;
        let scores = out
            .squeeze(0)
            .and_then(|t| t.to_vec1::<f32>())
            .context("Failed to read classifier output")?;

        let scores: [f32; EMOTION_CLASSES] = scores
            .try_into()
            .map_err(|v: Vec<f32>| anyhow::anyhow!("expected 8 class scores, got {}", v.len()))?;

        Ok(Logits(scores))
    }
}

impl Module for EmotionNet {
    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        let mut h = x.clone();
        for stage in &self.stages {
            h = stage.forward(&h)?;
            h = h.relu()?;
            h = h.max_pool2d(2)?;
        }

        let h = h.flatten_from(1)?;
        let h = self.fc1.forward(&h)?;
        let h = h.relu()?;
        self.fc2.forward(&h)
    }
}

impl EmotionModel for EmotionNet {
    fn infer(&self, input: &InputTensor) -> Result<Logits> {
        self.infer_logits(input)
    }

    fn health_check(&self) -> bool {
        // A trivial device round trip; failure means the interpreter or its
        // device context is gone.
        Tensor::zeros((1,), candle_core::DType::F32, &self.device)
            .and_then(|t| t.to_vec1::<f32>())
            .is_ok()
    }
}

/// Candle-backed [`ModelLoader`].
///
/// CPU-only and accelerated models are the same type built on different
/// devices; the accelerator is an optional capability picked at load time,
/// not a separate model variant.
#[derive(Debug, Default, Clone, Copy)]
pub struct CandleModelLoader;

impl ModelLoader for CandleModelLoader {
    fn accelerator_supported(&self) -> bool {
        accelerator_available()
    }

    fn load(&self, asset: &[u8], accelerated: bool) -> Result<Box<dyn EmotionModel>> {
        let device = if accelerated {
            accelerator_device().context("accelerator device unavailable")?
        } else {
            Device::Cpu
        };

        let vb = var_builder_from_bytes(asset, &device)?;
        let net = EmotionNet::new(vb).context("model asset violates classifier contract")?;
        Ok(Box::new(net))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pooled_dimensions() {
        // Five 2x2 pools: 224 -> 112 -> 56 -> 28 -> 14 -> 7.
        assert_eq!(POOLED_SIDE, 7);
        assert_eq!(STAGE_CHANNELS[5] * POOLED_SIDE * POOLED_SIDE, 12544);
    }

    #[test]
    fn test_loader_rejects_garbage_asset() {
        let loader = CandleModelLoader;
        assert!(loader.load(b"not a model", false).is_err());
    }
}
