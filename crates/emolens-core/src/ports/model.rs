//! Classifier runtime ports.

use crate::domain::{InputTensor, Logits};

/// A loaded classifier ready for synchronous inference.
///
/// Dropping the model releases the interpreter and any accelerator context
/// attached to it.
pub trait EmotionModel: Send {
    /// Runs the classifier on one input tensor, returning raw logits.
    ///
    /// Blocks the calling thread for the duration of the inference.
    ///
    /// # Errors
    ///
    /// Returns an error if the interpreter rejects or aborts the call.
    fn infer(&self, input: &InputTensor) -> anyhow::Result<Logits>;

    /// Cheap probe that the interpreter still responds.
    fn health_check(&self) -> bool {
        true
    }
}

/// Builds classifier instances from a serialized model asset.
pub trait ModelLoader: Send {
    /// Whether this host can attach the accelerator at all.
    ///
    /// A `false` here means the engine never even attempts an accelerated
    /// load; a `true` only means it is worth trying.
    fn accelerator_supported(&self) -> bool;

    /// Parses the asset and builds a model, on the accelerator when
    /// `accelerated` is set.
    ///
    /// Implementations must verify the 8-class / 224x224x3 model contract
    /// before returning: a structurally mismatched asset is a load error,
    /// never a silently misbehaving model.
    ///
    /// # Errors
    ///
    /// Returns an error if the asset cannot be parsed, violates the shape
    /// contract, or (for accelerated loads) the accelerator context cannot
    /// be attached.
    fn load(&self, asset: &[u8], accelerated: bool) -> anyhow::Result<Box<dyn EmotionModel>>;
}
