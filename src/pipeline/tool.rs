//! Checked, time-bounded execution of external tools.
//!
//! Every external step (XSLT engine, image converter, hocr-pdf) goes through
//! [`run_tool`]. A run fails with a typed error when the program cannot be
//! started, exits non-zero, exceeds the timeout, or (via [`ensure_output`])
//! leaves no output behind. On timeout the child is killed: the future owning
//! it is dropped and `kill_on_drop` sends SIGKILL.

use crate::config::ToolCommand;
use crate::error::SearchablePdfError;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Lines of stderr kept in [`SearchablePdfError::ToolFailed`].
const STDERR_TAIL_LINES: usize = 20;

/// One external invocation.
#[derive(Debug)]
pub struct ToolInvocation<'a> {
    /// Tool name used in errors and logs, e.g. `"XSLT transform"`.
    pub tool: &'static str,
    pub command: &'a ToolCommand,
    /// Placeholder values for [`ToolCommand::render_args`].
    pub vars: &'a [(&'a str, &'a Path)],
    /// What the tool is working on, for error messages (usually a page stem).
    pub subject: &'a str,
    /// When set, the child's stdout is written to this file.
    pub stdout_to: Option<&'a Path>,
    pub timeout_secs: u64,
}

/// Run an external tool to completion, checking its exit status.
pub async fn run_tool(inv: ToolInvocation<'_>) -> Result<(), SearchablePdfError> {
    let args = inv.command.render_args(inv.vars);
    debug!("{}: {} {:?}", inv.tool, inv.command.program, args);

    let mut cmd = Command::new(&inv.command.program);
    cmd.args(&args)
        .stdin(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    match inv.stdout_to {
        Some(path) => {
            let file = std::fs::File::create(path).map_err(|source| SearchablePdfError::ScratchIo {
                path: path.to_path_buf(),
                source,
            })?;
            cmd.stdout(Stdio::from(file));
        }
        None => {
            cmd.stdout(Stdio::null());
        }
    }

    let child = cmd
        .spawn()
        .map_err(|source| SearchablePdfError::ToolSpawnFailed {
            tool: inv.tool,
            program: inv.command.program.clone(),
            source,
        })?;

    let output = tokio::time::timeout(
        Duration::from_secs(inv.timeout_secs),
        child.wait_with_output(),
    )
    .await
    .map_err(|_| SearchablePdfError::ToolTimeout {
        tool: inv.tool,
        subject: inv.subject.to_string(),
        secs: inv.timeout_secs,
    })?
    .map_err(|e| SearchablePdfError::Internal(format!("waiting for {}: {e}", inv.tool)))?;

    if !output.status.success() {
        return Err(SearchablePdfError::ToolFailed {
            tool: inv.tool,
            subject: inv.subject.to_string(),
            status: output.status.to_string(),
            stderr: stderr_tail(&output.stderr),
        });
    }

    Ok(())
}

/// Fail with [`SearchablePdfError::ToolNoOutput`] unless `path` is a non-empty file.
pub async fn ensure_output(tool: &'static str, path: &Path) -> Result<u64, SearchablePdfError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(meta.len()),
        _ => Err(SearchablePdfError::ToolNoOutput {
            tool,
            path: path.to_path_buf(),
        }),
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.trim_end().lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}
