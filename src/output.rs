//! Result types returned by the conversion entry points.

use crate::metadata::{MaterialType, ResolvedMetadata};
use serde::Serialize;
use std::path::PathBuf;

/// Outcome of a successful [`crate::convert`] run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub object_id: String,
    pub material: MaterialType,
    pub title: String,
    /// Number of layout/image pairs merged into the document.
    pub pages: usize,
    /// The written PDF.
    pub output_path: PathBuf,
    /// `false` when the output was written but removing scratch failed.
    pub scratch_cleaned: bool,
    pub timings: StageTimings,
}

/// Wall-clock time per stage, in milliseconds.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StageTimings {
    pub discover_ms: u64,
    pub resolve_ms: u64,
    pub transform_ms: u64,
    pub images_ms: u64,
    pub assemble_ms: u64,
    pub write_ms: u64,
    pub total_ms: u64,
}

/// Outcome of [`crate::resolve_only`]: what a full run would stamp, without
/// running any tool.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvePreview {
    pub pages: usize,
    pub output_file_name: String,
    pub metadata: ResolvedMetadata,
}
