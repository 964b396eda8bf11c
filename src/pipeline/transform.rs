//! ALTO → hOCR: one external XSLT run per page.
//!
//! Each layout file becomes `<pages>/<stem>.hocr`, named by stem so the
//! assembler can match it with `<stem>.jpg`.

use crate::config::PipelineConfig;
use crate::error::SearchablePdfError;
use crate::pipeline::discover::DiscoveredInputs;
use crate::pipeline::tool::{ensure_output, run_tool, ToolInvocation};
use crate::progress::Stage;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const TOOL: &str = "XSLT transform";

/// Fail early if the configured stylesheet is not a readable file.
pub fn check_stylesheet(config: &PipelineConfig) -> Result<(), SearchablePdfError> {
    if config.stylesheet.is_file() {
        Ok(())
    } else {
        Err(SearchablePdfError::InvalidConfig(format!(
            "stylesheet '{}' not found",
            config.stylesheet.display()
        )))
    }
}

/// Transform every layout file into `pages_dir`, in stem order.
///
/// Returns the written hOCR paths.
pub async fn transform_layouts(
    inputs: &DiscoveredInputs,
    pages_dir: &Path,
    config: &PipelineConfig,
) -> Result<Vec<PathBuf>, SearchablePdfError> {
    check_stylesheet(config)?;

    let mut written = Vec::with_capacity(inputs.len());
    for pair in &inputs.pairs {
        let output = pages_dir.join(format!("{}.hocr", pair.stem));
        run_tool(ToolInvocation {
            tool: TOOL,
            command: &config.transform,
            vars: &[
                ("input", pair.layout_path.as_path()),
                ("output", output.as_path()),
                ("stylesheet", config.stylesheet.as_path()),
            ],
            subject: &pair.stem,
            stdout_to: None,
            timeout_secs: config.tool_timeout_secs,
        })
        .await?;
        let bytes = ensure_output(TOOL, &output).await?;
        debug!("{} → {} ({} bytes)", pair.layout_path.display(), output.display(), bytes);

        if let Some(ref cb) = config.progress_callback {
            cb.on_item_complete(Stage::Transform, &pair.stem);
        }
        written.push(output);
    }

    info!("Transformed {} layout files to hOCR", written.len());
    Ok(written)
}
