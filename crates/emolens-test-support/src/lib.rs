//! Shared test fixtures: synthetic images and port mocks.

pub mod builders;
pub mod mocks;

pub use builders::SyntheticImageBuilder;
pub use mocks::{MockFaceDetector, ScriptState, ScriptedLoader};
