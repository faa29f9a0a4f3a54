//! Progress reporting port for UI integration.

use crate::domain::ClassifyRecord;

/// Events emitted while classifying a batch of images.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Classification started for an image.
    Started {
        /// Path to the image.
        path: String,
        /// Index in the batch (0-based).
        index: usize,
        /// Total images in batch, if known.
        total: Option<usize>,
    },
    /// Classification completed for an image.
    Completed {
        /// The classification record.
        record: ClassifyRecord,
    },
    /// An image was skipped due to a load error.
    Skipped {
        /// Path to the image.
        path: String,
        /// Reason for skipping.
        reason: String,
    },
    /// The whole batch has been processed.
    Finished {
        /// Images that went through the pipeline.
        processed: usize,
        /// Images skipped before reaching the pipeline.
        skipped: usize,
    },
}

/// Port for receiving progress events.
pub trait ProgressSink: Send + Sync {
    /// Called when a progress event occurs.
    fn on_event(&self, event: ProgressEvent);
}
