//! Face detection network.
//!
//! A BlazeFace-family detector: depthwise-separable conv trunk over a
//! 128x128 input, two anchor grids (16x16 and 8x8), score + box regression
//! heads, and non-maximum suppression. Follows the architecture described
//! in "BlazeFace: Sub-millisecond Neural Face Detection on Mobile GPUs",
//! with BatchNorm folded into convolution biases.
//!
//! Detections come back in source-image pixel coordinates, ready for the
//! extraction stage.

// Allow common ML code patterns
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

use anyhow::{Context, Result};
use candle_core::{Device, Module, Tensor};
use candle_nn::{conv2d, Conv2d, Conv2dConfig, VarBuilder};
use image::RgbaImage;

use crate::domain::{BoundingBox, DetectedFace};
use crate::ports::FaceDetector;

/// Input resolution of the detection network.
const DETECT_INPUT: usize = 128;

/// Total anchors across both grids: 16*16*2 + 8*8*6.
const ANCHOR_COUNT: usize = 896;

/// Detections below this score are discarded.
const SCORE_THRESHOLD: f32 = 0.75;

/// NMS overlap threshold.
const IOU_THRESHOLD: f32 = 0.3;

/// Conv stage layout: (in, out, stride) per depthwise-separable block.
const TRUNK_A: [(usize, usize, usize); 11] = [
    (24, 24, 1),
    (24, 28, 1),
    (28, 32, 2), // 64 -> 32
    (32, 36, 1),
    (36, 42, 1),
    (42, 48, 2), // 32 -> 16
    (48, 56, 1),
    (56, 64, 1),
    (64, 72, 1),
    (72, 80, 1),
    (80, 88, 1),
];
const TRUNK_B: [(usize, usize, usize); 5] = [
    (88, 96, 2), // 16 -> 8
    (96, 96, 1),
    (96, 96, 1),
    (96, 96, 1),
    (96, 96, 1),
];

/// Depthwise-separable convolution block with pooled residual.
struct SeparableBlock {
    depthwise: Conv2d,
    pointwise: Conv2d,
    channel_pad: usize,
    stride: usize,
}

impl SeparableBlock {
    fn new(in_ch: usize, out_ch: usize, stride: usize, vb: &VarBuilder) -> Result<Self> {
        let padding = if stride == 2 { 0 } else { 1 };

        let depthwise = conv2d(
            in_ch,
            in_ch,
            3,
            Conv2dConfig {
                stride,
                padding,
                groups: in_ch,
                ..Conv2dConfig::default()
            },
            vb.pp("depthwise"),
        )?;
        let pointwise = conv2d(in_ch, out_ch, 1, Conv2dConfig::default(), vb.pp("pointwise"))?;

        Ok(Self {
            depthwise,
            pointwise,
            channel_pad: out_ch.saturating_sub(in_ch),
            stride,
        })
    }
}

impl Module for SeparableBlock {
    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        // Asymmetric zero padding for the striding case
        let padded = if self.stride == 2 {
            x.pad_with_zeros(2, 0, 2)?.pad_with_zeros(3, 0, 2)?
        } else {
            x.clone()
        };

        let h = self.depthwise.forward(&padded)?.relu()?;
        let h = self.pointwise.forward(&h)?;

        let residual = if self.stride == 2 {
            x.max_pool2d(2)?
        } else {
            x.clone()
        };
        let residual = if self.channel_pad > 0 {
            residual.pad_with_zeros(1, 0, self.channel_pad)?
        } else {
            residual
        };

        (h + residual)?.relu()
    }
}

/// Anchor grid centers in normalized coordinates, `ANCHOR_COUNT` entries.
fn anchor_centers() -> Vec<[f32; 2]> {
    let mut centers = Vec::with_capacity(ANCHOR_COUNT);
    for (grid, per_cell) in [(16u32, 2), (8u32, 6)] {
        for y in 0..grid {
            for x in 0..grid {
                let cx = (x as f32 + 0.5) / grid as f32;
                let cy = (y as f32 + 0.5) / grid as f32;
                for _ in 0..per_cell {
                    centers.push([cx, cy]);
                }
            }
        }
    }
    centers
}

/// BlazeFace-style face detector.
pub struct FaceDetectorNet {
    conv0: Conv2d,
    trunk_a: Vec<SeparableBlock>,
    trunk_b: Vec<SeparableBlock>,
    score_head_16: Conv2d,
    box_head_16: Conv2d,
    score_head_8: Conv2d,
    box_head_8: Conv2d,
    anchors: Vec<[f32; 2]>,
    device: Device,
}

impl FaceDetectorNet {
    /// Builds the detector from loaded weights.
    ///
    /// # Errors
    ///
    /// Returns an error if a weight tensor is missing or shaped wrong.
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(vb: VarBuilder) -> Result<Self> {
        let device = vb.device().clone();

        // 5x5 stem, stride 2: 128 -> 64 spatial, 3 -> 24 channels
        let conv0 = conv2d(
            3,
            24,
            5,
            Conv2dConfig {
                stride: 2,
                padding: 0,
                ..Conv2dConfig::default()
            },
            vb.pp("conv0"),
        )
        .context("detector stem")?;

        let mut trunk_a = Vec::with_capacity(TRUNK_A.len());
        for (i, (in_ch, out_ch, stride)) in TRUNK_A.iter().enumerate() {
            trunk_a.push(
                SeparableBlock::new(*in_ch, *out_ch, *stride, &vb.pp(format!("trunk_a.{i}")))
                    .with_context(|| format!("trunk_a block {i}"))?,
            );
        }

        let mut trunk_b = Vec::with_capacity(TRUNK_B.len());
        for (i, (in_ch, out_ch, stride)) in TRUNK_B.iter().enumerate() {
            trunk_b.push(
                SeparableBlock::new(*in_ch, *out_ch, *stride, &vb.pp(format!("trunk_b.{i}")))
                    .with_context(|| format!("trunk_b block {i}"))?,
            );
        }

        // 2 anchors per 16x16 cell, 6 per 8x8 cell; 16 regression values
        // (box + keypoints, keypoints unused here) per anchor.
        let score_head_16 = conv2d(88, 2, 1, Conv2dConfig::default(), vb.pp("score_head_16"))?;
        let box_head_16 = conv2d(88, 32, 1, Conv2dConfig::default(), vb.pp("box_head_16"))?;
        let score_head_8 = conv2d(96, 6, 1, Conv2dConfig::default(), vb.pp("score_head_8"))?;
        let box_head_8 = conv2d(96, 96, 1, Conv2dConfig::default(), vb.pp("box_head_8"))?;

        Ok(Self {
            conv0,
            trunk_a,
            trunk_b,
            score_head_16,
            box_head_16,
            score_head_8,
            box_head_8,
            anchors: anchor_centers(),
            device,
        })
    }

    /// Resizes and normalizes the image into the detector's planar input.
    fn prepare(&self, image: &RgbaImage) -> Result<Tensor> {
        let side = DETECT_INPUT as u32;
        let resized =
            image::imageops::resize(image, side, side, image::imageops::FilterType::Lanczos3);

        let plane = DETECT_INPUT * DETECT_INPUT;
        let mut data = vec![0.0f32; 3 * plane];
        for (i, pixel) in resized.pixels().enumerate() {
            for c in 0..3 {
                data[c * plane + i] = f32::from(pixel[c]) / 127.5 - 1.0;
            }
        }

        Tensor::from_vec(data, (1, 3, DETECT_INPUT, DETECT_INPUT), &self.device)
            .context("Failed to stage detector input")
    }

    /// Trunk + heads, returning per-anchor scores and box regressions.
    fn forward(&self, x: &Tensor) -> Result<(Tensor, Tensor)> {
        let x = x.pad_with_zeros(2, 1, 2)?.pad_with_zeros(3, 1, 2)?;
        let mut h = self.conv0.forward(&x)?.relu()?;

        for block in &self.trunk_a {
            h = block.forward(&h)?;
        }
        let feat_16 = h.clone();

        for block in &self.trunk_b {
            h = block.forward(&h)?;
        }
        let feat_8 = h;

        let s16 = self
            .score_head_16
            .forward(&feat_16)?
            .permute((0, 2, 3, 1))?
            .reshape((1, 512, 1))?;
        let b16 = self
            .box_head_16
            .forward(&feat_16)?
            .permute((0, 2, 3, 1))?
            .reshape((1, 512, 16))?;
        let s8 = self
            .score_head_8
            .forward(&feat_8)?
            .permute((0, 2, 3, 1))?
            .reshape((1, 384, 1))?;
        let b8 = self
            .box_head_8
            .forward(&feat_8)?
            .permute((0, 2, 3, 1))?
            .reshape((1, 384, 16))?;

        let scores = Tensor::cat(&[s16, s8], 1)?;
        let boxes = Tensor::cat(&[b16, b8], 1)?;
        Ok((scores, boxes))
    }

    /// Decodes network output into pixel-space detections.
    fn decode(
        &self,
        scores: &Tensor,
        boxes: &Tensor,
        img_w: u32,
        img_h: u32,
    ) -> Result<Vec<DetectedFace>> {
        let scores = scores.squeeze(0)?.to_vec2::<f32>()?;
        let boxes = boxes.squeeze(0)?.to_vec2::<f32>()?;

        let scale = DETECT_INPUT as f32;
        let (fw, fh) = (img_w as f32, img_h as f32);

        let mut detections = Vec::new();
        for i in 0..ANCHOR_COUNT {
            let score = sigmoid(scores[i][0]);
            if score < SCORE_THRESHOLD {
                continue;
            }

            let [ax, ay] = self.anchors[i];
            let reg = &boxes[i];
            let cx = ax + reg[0] / scale;
            let cy = ay + reg[1] / scale;
            let w = reg[2] / scale;
            let h = reg[3] / scale;

            let bbox = BoundingBox::new(
                ((cx - w / 2.0) * fw).round() as i32,
                ((cy - h / 2.0) * fh).round() as i32,
                ((cx + w / 2.0) * fw).round() as i32,
                ((cy + h / 2.0) * fh).round() as i32,
            )
            .clipped_to(img_w, img_h);

            if bbox.width() > 0 && bbox.height() > 0 {
                detections.push(DetectedFace::new(bbox, score));
            }
        }

        Ok(nms(detections))
    }
}

impl FaceDetector for FaceDetectorNet {
    fn detect(&self, image: &RgbaImage) -> Result<Vec<DetectedFace>> {
        if image.width() == 0 || image.height() == 0 {
            return Ok(Vec::new());
        }
        let input = self.prepare(image)?;
        let (scores, boxes) = self.forward(&input)?;
        self.decode(&scores, &boxes, image.width(), image.height())
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Greedy non-maximum suppression, highest score first.
fn nms(mut detections: Vec<DetectedFace>) -> Vec<DetectedFace> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<DetectedFace> = Vec::new();
    for det in detections {
        if keep.iter().all(|k| iou(&k.bbox, &det.bbox) < IOU_THRESHOLD) {
            keep.push(det);
        }
    }
    keep
}

/// Intersection over union of two pixel-space boxes.
fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let left = a.left.max(b.left);
    let top = a.top.max(b.top);
    let right = a.right.min(b.right);
    let bottom = a.bottom.min(b.bottom);

    let intersection = ((right - left).max(0) as i64) * ((bottom - top).max(0) as i64);
    let union = a.area() + b.area() - intersection;

    if union > 0 {
        intersection as f32 / union as f32
    } else {
        0.0
    }
}
