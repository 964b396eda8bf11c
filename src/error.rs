//! Error types for the alto-searchable-pdf library.
//!
//! Two error types mirror the two places a run can go wrong:
//!
//! * [`SearchablePdfError`] — **Fatal, run-level**: discovery, an external
//!   tool, image conversion, or writing the final PDF failed. Returned from the
//!   top-level `convert*` functions. Every variant belongs to one
//!   [`ErrorClass`], which the CLI maps to a distinct exit code.
//!
//! * [`MetadataError`] — the metadata dump could not be resolved into a
//!   title / keyword set (unknown material, missing node or attribute).
//!   Returned directly by [`crate::metadata::resolve_metadata`] and wrapped
//!   transparently by [`SearchablePdfError::Metadata`] inside a run.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the alto-searchable-pdf library.
#[derive(Debug, Error)]
pub enum SearchablePdfError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Object directory does not exist or is not a directory.
    #[error("Object directory not found: '{path}'\nCheck the path exists and is a directory.")]
    ObjectDirNotFound { path: PathBuf },

    /// Directory could not be listed during discovery.
    #[error("Failed to read directory '{path}': {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Layout and image counts differ; the object is incomplete.
    #[error(
        "Unequal number of layout files ({layouts}) and page images ({images}) in '{path}'.\n\
The object is incomplete; nothing was converted."
    )]
    InputMismatch {
        path: PathBuf,
        layouts: usize,
        images: usize,
    },

    /// A layout file has no scan with the same stem.
    #[error("Page '{stem}' has no matching {missing} file")]
    UnpairedPage { stem: String, missing: &'static str },

    /// The same page stem was found twice for one artifact kind.
    #[error("Page '{stem}' appears more than once ({first} and {second})")]
    DuplicatePage {
        stem: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// No layout/image pairs at all.
    #[error("No pages found in '{path}'")]
    NoPages { path: PathBuf },

    // ── External tool errors ──────────────────────────────────────────────
    /// The program could not be started (not installed, not executable).
    #[error("Failed to start {tool} ('{program}'): {source}\nIs it installed and on PATH?")]
    ToolSpawnFailed {
        tool: &'static str,
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program exited unsuccessfully.
    #[error("{tool} failed on '{subject}' ({status})\n{stderr}")]
    ToolFailed {
        tool: &'static str,
        subject: String,
        status: String,
        stderr: String,
    },

    /// The program did not finish within the configured timeout and was killed.
    #[error("{tool} timed out after {secs}s on '{subject}'\nIncrease --tool-timeout.")]
    ToolTimeout {
        tool: &'static str,
        subject: String,
        secs: u64,
    },

    /// The program reported success but wrote nothing.
    #[error("{tool} produced no output at '{path}'")]
    ToolNoOutput { tool: &'static str, path: PathBuf },

    // ── Image errors ──────────────────────────────────────────────────────
    /// The page scan could not be decoded.
    #[error("Failed to decode image '{path}': {source}")]
    ImageDecodeFailed {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The working copy could not be encoded or written.
    #[error("Failed to encode image '{path}': {source}")]
    ImageEncodeFailed {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    // ── Metadata errors ───────────────────────────────────────────────────
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    // ── Write errors ──────────────────────────────────────────────────────
    /// The assembled PDF could not be parsed for the metadata step.
    #[error("Assembled PDF '{path}' could not be loaded: {detail}")]
    PdfLoadFailed { path: PathBuf, detail: String },

    /// Writing or renaming the final PDF failed.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Scratch errors ────────────────────────────────────────────────────
    /// Creating, writing or removing something under the scratch directory failed.
    #[error("Scratch I/O failed for '{path}': {source}")]
    ScratchIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed or a configured resource is missing.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors raised while resolving bibliographic metadata from the dump.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    /// The dump file could not be read.
    #[error("Failed to read metadata dump '{path}': {detail}")]
    DumpRead { path: PathBuf, detail: String },

    /// The dump is not well-formed XML.
    #[error("Metadata dump is not well-formed XML: {detail}")]
    DumpParse { detail: String },

    /// The root `shipment` element has no `material` attribute.
    #[error("Metadata dump has no /shipment/@material attribute")]
    MissingMaterial,

    /// The `material` attribute names no known material type.
    #[error("Unknown material '{value}' (expected tijdschriften, kranten or boeken)")]
    UnknownMaterial { value: String },

    /// No element with the given name and `ID` exists in the dump.
    #[error("No <{element} ID=\"{id}\"> in metadata dump (object '{object_id}')")]
    MissingElement {
        element: &'static str,
        id: String,
        object_id: String,
    },

    /// A required attribute is absent.
    #[error("Missing required attribute '{attribute}' on <{element}> for object '{object_id}'")]
    MissingAttribute {
        attribute: &'static str,
        element: &'static str,
        object_id: String,
    },
}

/// Coarse failure classes, one per CLI exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Configuration problems and unexpected internal failures.
    Config,
    /// Incomplete or inconsistent object directory.
    InputMismatch,
    /// An external tool or the image conversion failed.
    ExternalTool,
    /// The metadata dump could not be resolved.
    MetadataResolution,
    /// The final document could not be written.
    Write,
}

impl ErrorClass {
    /// Process exit code for this class. `0` is reserved for success.
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorClass::Config => 1,
            ErrorClass::InputMismatch => 2,
            ErrorClass::ExternalTool => 3,
            ErrorClass::MetadataResolution => 4,
            ErrorClass::Write => 5,
        }
    }
}

impl SearchablePdfError {
    /// The failure class of this error.
    pub fn class(&self) -> ErrorClass {
        use SearchablePdfError::*;
        match self {
            ObjectDirNotFound { .. }
            | DirectoryRead { .. }
            | InputMismatch { .. }
            | UnpairedPage { .. }
            | DuplicatePage { .. }
            | NoPages { .. } => ErrorClass::InputMismatch,
            ToolSpawnFailed { .. }
            | ToolFailed { .. }
            | ToolTimeout { .. }
            | ToolNoOutput { .. }
            | ImageDecodeFailed { .. }
            | ImageEncodeFailed { .. } => ErrorClass::ExternalTool,
            Metadata(_) => ErrorClass::MetadataResolution,
            PdfLoadFailed { .. } | OutputWriteFailed { .. } => ErrorClass::Write,
            ScratchIo { .. } | InvalidConfig(_) | Internal(_) => ErrorClass::Config,
        }
    }

    /// Shorthand for `self.class().exit_code()`.
    pub fn exit_code(&self) -> u8 {
        self.class().exit_code()
    }
}
