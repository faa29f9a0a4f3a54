//! ML inference using Candle.
//!
//! Model loading, device selection, the face detection and emotion
//! classification networks, and the engine that owns their lifecycle.

mod device;
mod emotion_net;
mod engine;
mod face_net;
mod loader;

pub use device::{accelerator_available, accelerator_device, best_device};
pub use emotion_net::{CandleModelLoader, EmotionNet};
pub use engine::{EngineStatus, InferenceEngine};
pub use face_net::FaceDetectorNet;
pub use loader::var_builder_from_bytes;
