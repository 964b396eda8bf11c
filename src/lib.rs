//! # alto-searchable-pdf
//!
//! Turn a digitised object (per-page ALTO OCR files plus page scans) into a
//! single searchable PDF carrying bibliographic document properties taken
//! from a shipment metadata dump.
//!
//! ## Pipeline Overview
//!
//! ```text
//! object dir + metadata dump
//!  │
//!  ├─ 1. Discover  pair <stem>_alto.xml with <stem>_access.jp2
//!  ├─ 2. Resolve   material type, title and keywords from the dump
//!  ├─ 3. Transform ALTO → hOCR via an external XSLT engine (Saxon)
//!  ├─ 4. Images    page scans → JPEG (image crate or external converter)
//!  ├─ 5. Assemble  hocr-pdf merges pages with an invisible text layer
//!  └─ 6. Write     info dictionary stamped with lopdf, atomic rename
//! ```
//!
//! Intermediates live in a per-run scratch directory that is removed only
//! after the final PDF is in place.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use alto_searchable_pdf::{convert, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::builder()
//!         .output_dir("output")
//!         .stylesheet("xsl/alto2hocr.xsl")
//!         .build()?;
//!     let summary = convert("objects/MMTUK04_210988001", "dump.xml", &config).await?;
//!     println!("{} → {}", summary.title, summary.output_path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `alto2pdf` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! alto-searchable-pdf = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod metadata;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ImageBackend, OutputNaming, PipelineConfig, PipelineConfigBuilder, ToolCommand};
pub use convert::{convert, convert_sync, resolve_only};
pub use error::{ErrorClass, MetadataError, SearchablePdfError};
pub use metadata::{MaterialType, ResolvedMetadata};
pub use output::{ResolvePreview, RunSummary, StageTimings};
pub use pipeline::docinfo::{read_document_properties, DocumentProperties};
pub use progress::{NoopProgressCallback, PipelineProgressCallback, ProgressCallback, Stage};
