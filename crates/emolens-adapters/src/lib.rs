//! Adapters binding the emolens core to the outside world: filesystem
//! image loading, annotated-image saving, and model asset management.

pub mod fs;
pub mod models;

pub use fs::{save_annotated, FsImageSource};
pub use models::{
    ensure_models, list_models, model_path, models_dir, read_model, set_models_dir, ModelInfo,
    MODELS,
};
