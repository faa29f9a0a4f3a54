//! Model asset resolution, downloading and caching.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;
use tracing::{debug, info};

/// Placeholder checksum indicating verification should be skipped.
const PLACEHOLDER_CHECKSUM: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Model metadata.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Model name/identifier.
    pub name: &'static str,
    /// Download URL (GitHub releases).
    pub url: &'static str,
    /// Expected SHA256 hash. Set to all zeros to skip verification during development.
    pub sha256: &'static str,
    /// Filename in models directory.
    pub filename: &'static str,
}

/// Known models.
pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        name: "face",
        url: "https://github.com/emolens/emolens/releases/download/models-v1/face.safetensors",
        sha256: "0000000000000000000000000000000000000000000000000000000000000000", // TODO: Update with real hash
        filename: "face.safetensors",
    },
    ModelInfo {
        name: "emotion",
        url: "https://github.com/emolens/emolens/releases/download/models-v1/emotion.safetensors",
        sha256: "0000000000000000000000000000000000000000000000000000000000000000", // TODO: Update with real hash
        filename: "emotion.safetensors",
    },
];

/// Process-wide models directory override (CLI flag or config).
static MODELS_DIR_OVERRIDE: Lazy<RwLock<Option<PathBuf>>> = Lazy::new(|| RwLock::new(None));

/// Overrides the models directory for this process.
pub fn set_models_dir(dir: Option<PathBuf>) {
    if let Ok(mut guard) = MODELS_DIR_OVERRIDE.write() {
        *guard = dir;
    }
}

/// Returns the models directory path.
///
/// Uses the process-wide override when set, otherwise
/// `XDG_DATA_HOME/emolens/models` or `~/.local/share/emolens/models`.
#[must_use]
pub fn models_dir() -> PathBuf {
    if let Ok(guard) = MODELS_DIR_OVERRIDE.read() {
        if let Some(dir) = guard.as_ref() {
            return dir.clone();
        }
    }

    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("emolens")
        .join("models")
}

/// Ensures all required models are downloaded.
///
/// # Errors
///
/// Returns an error if:
/// - The models directory cannot be created
/// - A model download fails
/// - A model's checksum doesn't match
pub fn ensure_models() -> Result<()> {
    let dir = models_dir();
    fs::create_dir_all(&dir).context("Failed to create models directory")?;

    for model in MODELS {
        let path = dir.join(model.filename);
        if path.exists() {
            debug!("Model {} already exists", model.name);
        } else {
            download_model(model, &path)?;
        }
    }

    Ok(())
}

/// Downloads a model from its URL.
fn download_model(model: &ModelInfo, path: &PathBuf) -> Result<()> {
    info!("Downloading model: {}", model.name);

    let response = reqwest::blocking::get(model.url)
        .with_context(|| format!("Failed to download {}", model.name))?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed with status: {}", response.status());
    }

    let bytes = response
        .bytes()
        .with_context(|| format!("Failed to read response for {}", model.name))?;

    // Verify checksum (skip if placeholder)
    if model.sha256 == PLACEHOLDER_CHECKSUM {
        debug!(
            "Skipping checksum verification for {} (placeholder checksum)",
            model.name
        );
    } else {
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let hash = format!("{:x}", hasher.finalize());

        if hash != model.sha256 {
            anyhow::bail!(
                "Checksum mismatch for {}: expected {}, got {}. \
                 Try deleting {} and re-running to download a fresh copy.",
                model.name,
                model.sha256,
                hash,
                path.display()
            );
        }
    }

    fs::write(path, &bytes).with_context(|| format!("Failed to write {}", model.name))?;

    info!("Downloaded {} ({} bytes)", model.name, bytes.len());
    Ok(())
}

/// Returns the path to a specific model file.
#[must_use]
pub fn model_path(name: &str) -> Option<PathBuf> {
    MODELS
        .iter()
        .find(|m| m.name == name)
        .map(|m| models_dir().join(m.filename))
}

/// Reads a model asset into memory.
///
/// # Errors
///
/// Returns an error for an unknown model name or a missing/unreadable
/// file; the message points at `emolens models fetch`.
pub fn read_model(name: &str) -> Result<Vec<u8>> {
    let path = model_path(name).with_context(|| format!("Unknown model '{name}'"))?;
    fs::read(&path).with_context(|| {
        format!(
            "Failed to read model {} from {}. Run `emolens models fetch` to download it.",
            name,
            path.display()
        )
    })
}

/// Lists models with their install status.
#[must_use]
pub fn list_models() -> Vec<(String, bool)> {
    let dir = models_dir();
    MODELS
        .iter()
        .map(|m| (m.name.to_string(), dir.join(m.filename).exists()))
        .collect()
}
