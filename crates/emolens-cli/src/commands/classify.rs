//! Classify command - run the emotion pipeline over image files.

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use emolens_adapters::{read_model, save_annotated, set_models_dir, FsImageSource};
use emolens_core::domain::{ClassifyRecord, EmotionResult, ImageDimensions, Outcome};
use emolens_core::pipeline::{EmotionPipeline, PipelineConfig};
use emolens_core::ports::{ImageSource, ProgressEvent, ProgressSink, ResultOutput};
use tracing::{debug, info};

use super::ExitCode;
use crate::config::AppConfig;
use crate::output::{JsonOutput, ProgressBar};

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// JSON Lines (one JSON object per line)
    #[default]
    Jsonl,
    /// Single JSON array
    Json,
}

/// Hardcoded default values.
mod defaults {
    pub const MIN_FACE_SIZE: f32 = 0.10;
    pub const MAX_CONSECUTIVE_FAILURES: u32 = 2;
}

/// Parse and validate a fraction value (0.0-1.0).
fn parse_fraction(s: &str) -> Result<f32, String> {
    let value: f32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is not in 0.0..=1.0"))
    }
}

/// Shared arguments for classification.
#[derive(Args, Clone)]
pub struct ClassifyArgs {
    /// Files or directories to classify
    pub paths: Vec<PathBuf>,

    /// Recurse into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Minimum face size relative to the shorter image dimension (0.0-1.0)
    #[arg(long, value_parser = parse_fraction)]
    pub min_face_size: Option<f32>,

    /// Directory to write annotated visualizations into
    #[arg(long, value_name = "DIR")]
    pub annotate_dir: Option<PathBuf>,

    /// Show progress bar
    #[arg(long)]
    pub progress: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Pretty-print JSON output (only affects --format json)
    #[arg(long)]
    pub pretty: bool,

    /// Custom models directory (overrides default and config)
    #[arg(long, value_name = "DIR")]
    pub models_dir: Option<PathBuf>,

    /// Merged config (populated by `with_config`, not from CLI).
    #[arg(skip)]
    config: Option<AppConfig>,
}

impl ClassifyArgs {
    /// Apply configuration file values, respecting CLI precedence.
    ///
    /// Layering priority (lowest to highest):
    /// 1. Hardcoded defaults (in accessor methods)
    /// 2. Config file values (XDG, then project-local)
    /// 3. CLI arguments (already set on self)
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        if !args.recursive {
            args.recursive = config.general.recursive.unwrap_or(false);
        }

        args.min_face_size = args.min_face_size.or(config.pipeline.min_face_size);

        if args.format.is_none() {
            args.format = config
                .output
                .format
                .as_ref()
                .and_then(|s| match s.as_str() {
                    "json" => Some(OutputFormat::Json),
                    "jsonl" => Some(OutputFormat::Jsonl),
                    _ => None,
                });
        }

        if !args.pretty {
            args.pretty = config.output.pretty.unwrap_or(false);
        }
        if !args.progress {
            args.progress = config.output.progress.unwrap_or(false);
        }
        if args.annotate_dir.is_none() {
            args.annotate_dir.clone_from(&config.output.annotate_dir);
        }
        if args.models_dir.is_none() {
            args.models_dir.clone_from(&config.models.dir);
        }

        args.config = Some(config.clone());
        args
    }

    fn min_face_size(&self) -> f32 {
        self.min_face_size.unwrap_or(defaults::MIN_FACE_SIZE)
    }

    fn max_consecutive_failures(&self) -> u32 {
        self.config
            .as_ref()
            .and_then(|c| c.pipeline.max_consecutive_failures)
            .unwrap_or(defaults::MAX_CONSECUTIVE_FAILURES)
    }

    fn format(&self) -> OutputFormat {
        self.format.unwrap_or(OutputFormat::Jsonl)
    }
}

/// Result of running the classify command.
#[allow(dead_code)] // Fields exposed for programmatic use
pub struct ClassifyResult {
    /// Images that went through the pipeline.
    pub processed: usize,
    /// Images skipped before reaching the pipeline.
    pub skipped: usize,
    /// Images that produced a pipeline error.
    pub with_errors: usize,
    /// Exit code.
    pub exit_code: ExitCode,
}

/// Run the classify command.
///
/// Expects `args` to have been processed through `with_config()` first.
pub fn run(args: &ClassifyArgs) -> Result<ClassifyResult> {
    info!("Classifying {} paths", args.paths.len());

    if args.paths.is_empty() {
        anyhow::bail!("No paths specified");
    }

    if let Some(ref models_dir) = args.models_dir {
        debug!("Using custom models directory: {}", models_dir.display());
        set_models_dir(Some(models_dir.clone()));
    }

    let face_asset = read_model("face")?;
    let emotion_asset = read_model("emotion")?;

    let mut pipeline = EmotionPipeline::with_candle(
        face_asset,
        emotion_asset,
        PipelineConfig {
            min_relative_face_size: args.min_face_size(),
            max_consecutive_failures: args.max_consecutive_failures(),
            ..PipelineConfig::default()
        },
    )
    .context("Failed to build classification pipeline")?;

    let source = FsImageSource::new(args.paths.clone(), args.recursive);
    let total = source.count_hint();

    let show_progress = !args.quiet && (args.progress || std::io::stderr().is_terminal());
    let progress_bar = ProgressBar::new(total.map(|t| t as u64), args.quiet, show_progress);

    let output = JsonOutput::stdout();

    let result = process_images(&source, &mut pipeline, &output, &progress_bar, args);
    pipeline.close();
    result
}

/// Process images through the pipeline.
fn process_images(
    source: &FsImageSource,
    pipeline: &mut EmotionPipeline,
    output: &JsonOutput,
    progress: &ProgressBar,
    args: &ClassifyArgs,
) -> Result<ClassifyResult> {
    let total = source.count_hint();
    let mut processed = 0usize;
    let mut skipped = 0usize;
    let mut with_errors = 0usize;
    let mut all_records: Vec<ClassifyRecord> = Vec::new();

    for (index, image_result) in source.images().enumerate() {
        let info = match image_result {
            Ok(info) => info,
            Err(e) => {
                progress.on_event(ProgressEvent::Skipped {
                    path: format!("image {index}"),
                    reason: e.to_string(),
                });
                skipped += 1;
                continue;
            }
        };

        let path = info.path.clone();
        let dimensions = ImageDimensions::new(info.width, info.height);

        progress.on_event(ProgressEvent::Started {
            path: path.clone(),
            index,
            total,
        });

        let result = pipeline.process(Some(info.image));
        let record = build_record(&path, dimensions, &result, args);

        if record.outcome == Outcome::Error {
            with_errors += 1;
        }

        progress.on_event(ProgressEvent::Completed {
            record: record.clone(),
        });

        match args.format() {
            OutputFormat::Jsonl => output.write(&record)?,
            OutputFormat::Json => all_records.push(record),
        }

        processed += 1;
    }

    if matches!(args.format(), OutputFormat::Json) {
        output.write_array(&all_records, args.pretty)?;
    }

    output.flush()?;

    progress.on_event(ProgressEvent::Finished { processed, skipped });

    let exit_code = if with_errors > 0 {
        ExitCode::ClassificationErrors
    } else {
        ExitCode::Success
    };

    Ok(ClassifyResult {
        processed,
        skipped,
        with_errors,
        exit_code,
    })
}

/// Projects a pipeline result into its serializable record, saving the
/// annotated image when requested.
fn build_record(
    path: &str,
    dimensions: ImageDimensions,
    result: &EmotionResult,
    args: &ClassifyArgs,
) -> ClassifyRecord {
    let mut record = ClassifyRecord {
        path: path.to_string(),
        timestamp: iso_timestamp(),
        dimensions,
        outcome: Outcome::Error,
        emotion: None,
        confidence: None,
        error: None,
        annotated_path: None,
    };

    match result {
        EmotionResult::Success {
            emotion,
            confidence,
            annotated,
        } => {
            record.outcome = Outcome::Success;
            record.emotion = Some(*emotion);
            record.confidence = Some(*confidence);

            if let Some(dir) = &args.annotate_dir {
                match save_annotated(dir, path, annotated) {
                    Ok(out) => record.annotated_path = Some(out.to_string_lossy().into_owned()),
                    Err(e) => tracing::warn!("Failed to save annotation for {path}: {e:#}"),
                }
            }
        }
        EmotionResult::NoFacesDetected { .. } => {
            record.outcome = Outcome::NoFaces;
        }
        EmotionResult::Error(e) => {
            record.outcome = Outcome::Error;
            record.error = Some(e.to_string());
        }
    }

    record
}

/// Generate ISO 8601 UTC timestamp (RFC 3339 format).
fn iso_timestamp() -> String {
    match time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339) {
        Ok(ts) => ts,
        Err(e) => {
            debug!("Timestamp format failed: {e}");
            String::from("1970-01-01T00:00:00Z")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fraction_bounds() {
        assert!(parse_fraction("0.0").is_ok());
        assert!(parse_fraction("1.0").is_ok());
        assert!(parse_fraction("0.15").is_ok());
        assert!(parse_fraction("1.5").is_err());
        assert!(parse_fraction("-0.1").is_err());
        assert!(parse_fraction("abc").is_err());
    }

    #[test]
    fn test_timestamp_is_rfc3339ish() {
        let ts = iso_timestamp();
        assert!(ts.contains('T'));
        assert!(ts.len() >= 20);
    }
}
