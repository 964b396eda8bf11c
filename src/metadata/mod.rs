//! Bibliographic metadata from the shipment dump.
//!
//! ```text
//! dump.xml ──▶ dump (arena) ──▶ material ──▶ resolve ──▶ ResolvedMetadata
//! ```
//!
//! 1. [`dump`]     — parse the XML into a queryable element arena
//! 2. [`material`] — map `/shipment/@material` to a [`MaterialType`]
//! 3. [`resolve`]  — pull the material's attributes and format the title

pub mod dump;
pub mod material;
pub mod resolve;

pub use dump::{ElementRef, MetadataDump};
pub use material::MaterialType;
pub use resolve::{resolve_metadata, BookFields, NewspaperFields, PeriodicalFields, ResolvedMetadata};

use crate::error::MetadataError;
use std::path::Path;
use tracing::debug;

/// Read and parse a metadata dump from disk.
pub async fn load_dump(path: &Path) -> Result<MetadataDump, MetadataError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| MetadataError::DumpRead {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
    let dump = MetadataDump::parse(&bytes)?;
    debug!("Parsed metadata dump {} ({} elements)", path.display(), dump.len());
    Ok(dump)
}

/// Load the dump at `path` and resolve metadata for `object_id`.
pub async fn resolve_from_file(
    path: &Path,
    object_id: &str,
) -> Result<ResolvedMetadata, MetadataError> {
    let dump = load_dump(path).await?;
    resolve_metadata(&dump, object_id)
}
