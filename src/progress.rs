//! Progress-callback trait for per-stage and per-page pipeline events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to receive
//! events as the pipeline walks through its stages. The CLI renders these as
//! an `indicatif` bar; library callers can forward them anywhere.
//!
//! # Example
//!
//! ```rust
//! use alto_searchable_pdf::{PipelineConfig, PipelineProgressCallback, Stage};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct PageCounter {
//!     pages: AtomicUsize,
//! }
//!
//! impl PipelineProgressCallback for PageCounter {
//!     fn on_item_complete(&self, stage: Stage, _item: &str) {
//!         if stage == Stage::ConvertImages {
//!             self.pages.fetch_add(1, Ordering::SeqCst);
//!         }
//!     }
//! }
//!
//! let config = PipelineConfig::builder()
//!     .progress_callback(Arc::new(PageCounter { pages: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Walking the object directory for layout/image pairs.
    Discover,
    /// Reading the metadata dump.
    ResolveMetadata,
    /// ALTO → hOCR, one external process per page.
    Transform,
    /// Page scan → JPEG, one conversion per page.
    ConvertImages,
    /// Merging pages into one PDF.
    Assemble,
    /// Stamping the info dictionary and writing the output.
    WriteDocument,
}

impl Stage {
    /// Short human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Discover => "Discovering",
            Stage::ResolveMetadata => "Metadata",
            Stage::Transform => "ALTO → hOCR",
            Stage::ConvertImages => "Images",
            Stage::Assemble => "Assembling",
            Stage::WriteDocument => "Writing",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Called by the pipeline as it moves through each stage.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. The pipeline is sequential, but the trait is
/// `Send + Sync` so implementations can be shared with other threads.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called when a stage begins.
    ///
    /// # Arguments
    /// * `stage`       — the stage starting
    /// * `total_items` — pages this stage will process (1 for whole-object stages)
    fn on_stage_start(&self, stage: Stage, total_items: usize) {
        let _ = (stage, total_items);
    }

    /// Called after each item (usually a page stem) of a stage finishes.
    fn on_item_complete(&self, stage: Stage, item: &str) {
        let _ = (stage, item);
    }

    /// Called when a stage finishes successfully.
    fn on_stage_complete(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called once the final document is written and scratch is cleaned up.
    fn on_run_complete(&self, output_path: &Path) {
        let _ = output_path;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;
