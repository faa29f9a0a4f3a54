//! Result synthesis: logits to a labeled, confidence-scored emotion.

use crate::domain::{Emotion, Logits};

/// Numerically stable softmax.
///
/// Subtracts the maximum before exponentiating so large logits cannot
/// overflow; the result is invariant to adding any constant to every input.
#[must_use]
pub fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|&s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Selects the winning emotion and its probability from raw logits.
///
/// The confidence clamp guards float rounding at the distribution edges
/// only — probabilities already live in `[0, 1]`.
#[must_use]
pub fn synthesize(logits: &Logits) -> (Emotion, f32) {
    let probabilities = softmax(logits.as_slice());

    let (index, probability) = probabilities
        .iter()
        .copied()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .unwrap_or((0, 0.0));

    let emotion = Emotion::from_index(index).unwrap_or(Emotion::Neutral);
    (emotion, probability.clamp(0.0, 1.0))
}
