//! The classifier input tensor.

/// Side length of the square model input, in pixels.
pub const MODEL_INPUT_SIZE: usize = 224;

/// Color channels the model consumes (R, G, B — alpha is dropped).
const CHANNELS: usize = 3;

/// A normalized, planar `[1, 3, 224, 224]` float tensor.
///
/// Values are channel-normalized pixel intensities, packed channel-major:
/// the full R plane (row-major), then the G plane, then the B plane. This
/// layout is a bit-for-bit model-input contract — an interleaved or
/// channel-swapped buffer produces plausible but wrong classifications
/// without any shape error, so construction is restricted to
/// [`InputTensor::zeros`] and the preprocessor.
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
    data: Vec<f32>,
}

impl InputTensor {
    /// Exact element count: `3 * 224 * 224`.
    pub const LEN: usize = CHANNELS * MODEL_INPUT_SIZE * MODEL_INPUT_SIZE;

    /// An all-zero tensor, used for warm-up inference.
    #[must_use]
    pub fn zeros() -> Self {
        Self {
            data: vec![0.0; Self::LEN],
        }
    }

    /// Wraps an already-packed planar buffer.
    ///
    /// Only the preprocessor builds these; the length invariant is enforced
    /// here so no malformed tensor can reach the interpreter.
    pub(crate) fn from_planes(data: Vec<f32>) -> Self {
        assert_eq!(data.len(), Self::LEN, "planar tensor length mismatch");
        Self { data }
    }

    /// The flat buffer in planar order.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// One channel plane (0 = R, 1 = G, 2 = B), row-major.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= 3`.
    #[must_use]
    pub fn plane(&self, channel: usize) -> &[f32] {
        assert!(channel < CHANNELS, "channel out of range");
        let plane_len = MODEL_INPUT_SIZE * MODEL_INPUT_SIZE;
        &self.data[channel * plane_len..(channel + 1) * plane_len]
    }
}
