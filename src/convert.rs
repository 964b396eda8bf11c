//! Conversion entry points: one object directory in, one searchable PDF out.
//!
//! The order of work is chosen so that cheap checks fail first. Discovery and
//! metadata resolution only read files, so an incomplete object or a broken
//! dump aborts before any scratch directory exists or any tool runs.

use crate::config::PipelineConfig;
use crate::error::SearchablePdfError;
use crate::metadata::{self, ResolvedMetadata};
use crate::output::{ResolvePreview, RunSummary, StageTimings};
use crate::pipeline::discover::{discover_pages, DiscoveredInputs};
use crate::pipeline::docinfo::{write_document_properties, DocumentProperties};
use crate::pipeline::scratch::ScratchDir;
use crate::pipeline::{assemble, raster, transform};
use crate::progress::{PipelineProgressCallback, Stage};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, warn};

/// Convert one digitised object into a searchable PDF.
///
/// # Arguments
/// * `object_dir` — directory holding the `_alto.xml` / `_access.jp2` pages
/// * `dump_path`  — the shipment metadata dump
/// * `config`     — pipeline configuration
///
/// # Errors
/// Any stage failure is fatal. Use [`SearchablePdfError::exit_code`] to
/// classify it. When the failure happens after the scratch directory was
/// created, the directory is left on disk and its path logged.
pub async fn convert(
    object_dir: impl AsRef<Path>,
    dump_path: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<RunSummary, SearchablePdfError> {
    let total_start = Instant::now();
    let mut timings = StageTimings::default();
    let object_dir = object_dir.as_ref();
    info!("Starting conversion: {}", object_dir.display());

    // ── Step 1: Discover pages ───────────────────────────────────────────
    let started = Instant::now();
    notify(config, |cb| cb.on_stage_start(Stage::Discover, 1));
    let inputs = discover(object_dir, config)?;
    notify(config, |cb| cb.on_stage_complete(Stage::Discover));
    timings.discover_ms = elapsed_ms(started);

    // ── Step 2: Resolve metadata ─────────────────────────────────────────
    let started = Instant::now();
    notify(config, |cb| cb.on_stage_start(Stage::ResolveMetadata, 1));
    let output_file_name = output_file_name(&inputs, config)?;
    let object_id = config.object_id_for(&output_file_name);
    let meta = metadata::resolve_from_file(dump_path.as_ref(), &object_id).await?;
    notify(config, |cb| cb.on_stage_complete(Stage::ResolveMetadata));
    timings.resolve_ms = elapsed_ms(started);
    info!("Resolved {} '{}'", meta.material, meta.title);

    transform::check_stylesheet(config)?;

    // ── Step 3: Scratch + external stages ────────────────────────────────
    let label = output_file_name
        .strip_suffix(crate::config::OUTPUT_SUFFIX)
        .unwrap_or(&output_file_name);
    let scratch = ScratchDir::create(&config.scratch_root, label).await?;

    let output_path = match run_stages(&inputs, &scratch, &meta, &output_file_name, config, &mut timings).await {
        Ok(path) => path,
        Err(e) => {
            error!("Conversion of {} failed: {}", object_dir.display(), e);
            scratch.retain();
            return Err(e);
        }
    };

    // ── Step 4: Clean up ─────────────────────────────────────────────────
    let scratch_cleaned = match scratch.discard().await {
        Ok(()) => true,
        Err(e) => {
            warn!("{}", e);
            false
        }
    };

    timings.total_ms = elapsed_ms(total_start);
    info!(
        "Conversion complete: {} pages → {} ({}ms)",
        inputs.len(),
        output_path.display(),
        timings.total_ms
    );
    notify(config, |cb| cb.on_run_complete(&output_path));

    Ok(RunSummary {
        object_id: meta.object_id,
        material: meta.material,
        title: meta.title,
        pages: inputs.len(),
        output_path,
        scratch_cleaned,
        timings,
    })
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    object_dir: impl AsRef<Path>,
    dump_path: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<RunSummary, SearchablePdfError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| SearchablePdfError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(object_dir, dump_path, config))
}

/// Discover pages and resolve metadata without running any tool or
/// touching the filesystem beyond reads.
pub async fn resolve_only(
    object_dir: impl AsRef<Path>,
    dump_path: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<ResolvePreview, SearchablePdfError> {
    let inputs = discover(object_dir.as_ref(), config)?;
    let output_file_name = output_file_name(&inputs, config)?;
    let object_id = config.object_id_for(&output_file_name);
    let metadata = metadata::resolve_from_file(dump_path.as_ref(), &object_id).await?;
    Ok(ResolvePreview {
        pages: inputs.len(),
        output_file_name,
        metadata,
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn run_stages(
    inputs: &DiscoveredInputs,
    scratch: &ScratchDir,
    meta: &ResolvedMetadata,
    output_file_name: &str,
    config: &PipelineConfig,
    timings: &mut StageTimings,
) -> Result<PathBuf, SearchablePdfError> {
    let pages_dir = scratch.pages_dir();

    let started = Instant::now();
    notify(config, |cb| cb.on_stage_start(Stage::Transform, inputs.len()));
    transform::transform_layouts(inputs, &pages_dir, config).await?;
    notify(config, |cb| cb.on_stage_complete(Stage::Transform));
    timings.transform_ms = elapsed_ms(started);

    let started = Instant::now();
    notify(config, |cb| cb.on_stage_start(Stage::ConvertImages, inputs.len()));
    raster::convert_images(inputs, &pages_dir, config).await?;
    notify(config, |cb| cb.on_stage_complete(Stage::ConvertImages));
    timings.images_ms = elapsed_ms(started);

    let started = Instant::now();
    notify(config, |cb| cb.on_stage_start(Stage::Assemble, 1));
    let assembled = assemble::assemble_pdf(&pages_dir, &scratch.file(output_file_name), config).await?;
    notify(config, |cb| cb.on_stage_complete(Stage::Assemble));
    timings.assemble_ms = elapsed_ms(started);

    let started = Instant::now();
    notify(config, |cb| cb.on_stage_start(Stage::WriteDocument, 1));
    let props = DocumentProperties::new(meta, Utc::now())?;
    let output_path = config.output_dir.join(output_file_name);
    let written = write_document_properties(&assembled, &output_path, &props).await?;
    notify(config, |cb| cb.on_stage_complete(Stage::WriteDocument));
    timings.write_ms = elapsed_ms(started);

    Ok(written)
}

fn discover(object_dir: &Path, config: &PipelineConfig) -> Result<DiscoveredInputs, SearchablePdfError> {
    discover_pages(object_dir, &config.layout_suffix, &config.image_suffix)
}

fn output_file_name(inputs: &DiscoveredInputs, config: &PipelineConfig) -> Result<String, SearchablePdfError> {
    let first = inputs
        .pairs
        .first()
        .ok_or_else(|| SearchablePdfError::NoPages {
            path: inputs.object_dir.clone(),
        })?;
    Ok(config.output_file_name(&inputs.object_dir, &first.image_path))
}

fn notify(config: &PipelineConfig, event: impl FnOnce(&dyn PipelineProgressCallback)) {
    if let Some(ref cb) = config.progress_callback {
        event(cb.as_ref());
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}
