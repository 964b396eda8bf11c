//! Merge hOCR pages and JPEG scans into one PDF with an invisible text layer.
//!
//! The assembler (`hocr-pdf` by default) is pointed at the pages directory
//! and writes the PDF to stdout. Page order is whatever the tool picks; for
//! `hocr-pdf` that is the lexicographic order of the page files.

use crate::config::PipelineConfig;
use crate::error::SearchablePdfError;
use crate::pipeline::tool::{ensure_output, run_tool, ToolInvocation};
use std::path::{Path, PathBuf};
use tracing::info;

const TOOL: &str = "hocr-pdf";

/// Run the assembler over `pages_dir`, writing the PDF to `output`.
pub async fn assemble_pdf(
    pages_dir: &Path,
    output: &Path,
    config: &PipelineConfig,
) -> Result<PathBuf, SearchablePdfError> {
    run_tool(ToolInvocation {
        tool: TOOL,
        command: &config.assemble,
        vars: &[("dir", pages_dir), ("output", output)],
        subject: &pages_dir.display().to_string(),
        stdout_to: Some(output),
        timeout_secs: config.tool_timeout_secs,
    })
    .await?;
    let bytes = ensure_output(TOOL, output).await?;
    info!("Assembled {} ({} bytes)", output.display(), bytes);
    Ok(output.to_path_buf())
}
