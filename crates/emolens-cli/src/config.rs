//! Configuration file support for emolens.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/emolens/config.toml` (lowest priority)
//! - Project-local: `.emolens.toml` (searched up directory tree)
//! - CLI flags (highest priority, applied separately)

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General options.
    pub general: GeneralConfig,
    /// Pipeline tuning.
    pub pipeline: PipelineSection,
    /// Model settings.
    pub models: ModelsConfig,
    /// Output formatting settings.
    pub output: OutputConfig,
}

/// General configuration options.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Recurse into subdirectories by default.
    pub recursive: Option<bool>,
}

/// Pipeline configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineSection {
    /// Minimum face size relative to the shorter image dimension (0.0-1.0).
    pub min_face_size: Option<f32>,
    /// Consecutive failures before a full component reload.
    pub max_consecutive_failures: Option<u32>,
}

/// Model configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Custom models directory path.
    pub dir: Option<PathBuf>,
}

/// Output formatting configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "json" or "jsonl".
    pub format: Option<String>,
    /// Pretty-print JSON output.
    pub pretty: Option<bool>,
    /// Show progress bar.
    pub progress: Option<bool>,
    /// Directory for annotated visualizations.
    pub annotate_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from XDG and project-local files.
    ///
    /// Priority (lowest to highest):
    /// 1. XDG config: `~/.config/emolens/config.toml`
    /// 2. Project-local: `.emolens.toml` (searched up from cwd)
    ///
    /// Missing files are silently ignored. Invalid values are logged as warnings.
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(xdg_path) = xdg_config_path() {
            if xdg_path.exists() {
                info!("Loading XDG config: {}", xdg_path.display());
                if let Some(xdg_config) = load_file(&xdg_path) {
                    config = xdg_config;
                }
            } else {
                debug!("XDG config not found: {}", xdg_path.display());
            }
        }

        if let Some(project_path) = find_project_config() {
            info!("Loading project config: {}", project_path.display());
            if let Some(project_config) = load_file(&project_path) {
                config.merge(project_config);
            }
        }

        if let Err(e) = config.validate() {
            eprintln!("warning: {e}");
        }

        config
    }

    /// Validate configuration values are within acceptable ranges.
    fn validate(&self) -> Result<(), String> {
        if let Some(t) = self.pipeline.min_face_size {
            if !(0.0..=1.0).contains(&t) {
                return Err(format!("pipeline.min_face_size must be 0.0-1.0, got {t}"));
            }
        }
        if let Some(n) = self.pipeline.max_consecutive_failures {
            if n == 0 {
                return Err("pipeline.max_consecutive_failures must be at least 1".into());
            }
        }

        if let Some(ref f) = self.output.format {
            if f != "json" && f != "jsonl" {
                return Err(format!("output.format must be 'json' or 'jsonl', got '{f}'"));
            }
        }

        Ok(())
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    fn merge(&mut self, other: Self) {
        self.general.recursive = other.general.recursive.or(self.general.recursive);

        self.pipeline.min_face_size = other.pipeline.min_face_size.or(self.pipeline.min_face_size);
        self.pipeline.max_consecutive_failures = other
            .pipeline
            .max_consecutive_failures
            .or(self.pipeline.max_consecutive_failures);

        self.models.dir = other.models.dir.or_else(|| self.models.dir.take());

        self.output.format = other.output.format.or_else(|| self.output.format.take());
        self.output.pretty = other.output.pretty.or(self.output.pretty);
        self.output.progress = other.output.progress.or(self.output.progress);
        self.output.annotate_dir = other
            .output
            .annotate_dir
            .or_else(|| self.output.annotate_dir.take());
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("emolens").join("config.toml"))
}

/// Find project-local config by searching up from current directory.
fn find_project_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_in_parents(&cwd)
}

/// Search for `.emolens.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);

    while let Some(dir) = current {
        let config_path = dir.join(".emolens.toml");
        if config_path.exists() {
            return Some(config_path);
        }
        current = dir.parent();
    }

    None
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Failed to read config file {}: {}", path.display(), e);
            return None;
        }
    };

    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!("Failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.pipeline.min_face_size.is_none());
        assert!(config.models.dir.is_none());
        assert!(config.output.format.is_none());
    }

    #[test]
    fn test_parse_empty_config() {
        let config: AppConfig = toml::from_str("").expect("parse empty config");
        assert!(config.general.recursive.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r"
[general]
recursive = true

[pipeline]
min_face_size = 0.15
max_consecutive_failures = 3

[models]
dir = '/opt/models'

[output]
format = 'json'
pretty = true
progress = false
annotate_dir = '/tmp/annotated'
";
        let config: AppConfig = toml::from_str(toml).expect("parse full config");

        assert_eq!(config.general.recursive, Some(true));
        assert_eq!(config.pipeline.min_face_size, Some(0.15));
        assert_eq!(config.pipeline.max_consecutive_failures, Some(3));
        assert_eq!(config.models.dir, Some(PathBuf::from("/opt/models")));
        assert_eq!(config.output.format, Some("json".to_string()));
        assert_eq!(config.output.pretty, Some(true));
    }

    #[test]
    fn test_merge_override_wins_when_present() {
        let mut base: AppConfig = toml::from_str(
            r"
[pipeline]
min_face_size = 0.1
max_consecutive_failures = 2
",
        )
        .expect("parse base");

        let override_config: AppConfig = toml::from_str(
            r"
[pipeline]
min_face_size = 0.2
",
        )
        .expect("parse override");

        base.merge(override_config);

        assert_eq!(base.pipeline.min_face_size, Some(0.2));
        // Untouched values survive the merge.
        assert_eq!(base.pipeline.max_consecutive_failures, Some(2));
    }

    #[test]
    fn test_merge_empty_override_preserves_base() {
        let mut base: AppConfig = toml::from_str(
            r"
[output]
format = 'jsonl'
",
        )
        .expect("parse base");

        base.merge(AppConfig::default());
        assert_eq!(base.output.format, Some("jsonl".to_string()));
    }

    #[test]
    fn test_invalid_toml_syntax_is_an_error() {
        let toml = r"
[pipeline
min_face_size = 0.5
";
        let result: Result<AppConfig, _> = toml::from_str(toml);
        assert!(result.is_err(), "invalid TOML should return error");
    }

    #[test]
    fn test_validate_min_face_size_out_of_range() {
        let mut config = AppConfig::default();
        config.pipeline.min_face_size = Some(1.5);

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("min_face_size"));
    }

    #[test]
    fn test_validate_zero_failure_threshold_rejected() {
        let mut config = AppConfig::default();
        config.pipeline.max_consecutive_failures = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_output_format_invalid() {
        let mut config = AppConfig::default();
        config.output.format = Some("xml".to_string());

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("output.format"));
    }

    #[test]
    fn test_validate_empty_config_passes() {
        assert!(AppConfig::default().validate().is_ok());
    }
}
