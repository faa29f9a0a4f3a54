//! CLI command definitions and handlers.

pub mod classify;
pub mod models;

use clap::{Parser, Subcommand};

/// emolens - facial emotion classification
#[derive(Parser)]
#[command(name = "emolens")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Shared classify arguments (paths, thresholds, flags).
    #[command(flatten)]
    pub classify: classify::ClassifyArgs,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Classify the dominant facial emotion in images
    Classify(classify::ClassifyArgs),
    /// Manage ML models
    Models(models::ModelsArgs),
}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Every image classified (or had no face).
    Success,
    /// At least one image produced a pipeline error.
    ClassificationErrors,
    /// Invocation or setup failure.
    Error,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        match code {
            ExitCode::Success => Self::SUCCESS,
            ExitCode::ClassificationErrors => Self::from(1),
            ExitCode::Error => Self::from(2),
        }
    }
}
