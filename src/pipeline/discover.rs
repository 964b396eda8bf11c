//! Input discovery: pair per-page layout files with their page scans.
//!
//! A delivered object is a directory tree holding, per page, one ALTO file
//! (`<stem>_alto.xml`) and one access scan (`<stem>_access.jp2`). Discovery
//! walks the tree, classifies files by suffix, and refuses to continue unless
//! every stem has exactly one of each. It only reads the filesystem, so a
//! mismatch aborts the run before any scratch directory or tool is touched.

use crate::error::SearchablePdfError;
use serde::Serialize;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One page: its layout file and its scan, sharing `stem`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageArtifactPair {
    pub stem: String,
    pub layout_path: PathBuf,
    pub image_path: PathBuf,
}

/// All pages of one object, sorted by stem.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredInputs {
    pub object_dir: PathBuf,
    pub pairs: Vec<PageArtifactPair>,
}

impl DiscoveredInputs {
    /// Layout files, in pair order.
    pub fn layout_files(&self) -> Vec<&Path> {
        self.pairs.iter().map(|p| p.layout_path.as_path()).collect()
    }

    /// Page scans, in pair order.
    pub fn image_files(&self) -> Vec<&Path> {
        self.pairs.iter().map(|p| p.image_path.as_path()).collect()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Walk `object_dir` and pair layout files with scans by filename stem.
///
/// # Errors
/// - [`SearchablePdfError::ObjectDirNotFound`] — path missing or not a directory
/// - [`SearchablePdfError::InputMismatch`] — layout and scan counts differ
/// - [`SearchablePdfError::UnpairedPage`] — equal counts, but stems differ
/// - [`SearchablePdfError::DuplicatePage`] — a stem occurs twice for one kind
/// - [`SearchablePdfError::NoPages`] — nothing found
pub fn discover_pages(
    object_dir: &Path,
    layout_suffix: &str,
    image_suffix: &str,
) -> Result<DiscoveredInputs, SearchablePdfError> {
    // Absolute, so `.` and `..` still yield a directory name for output naming.
    let object_dir = std::fs::canonicalize(object_dir)
        .ok()
        .filter(|p| p.is_dir())
        .ok_or_else(|| SearchablePdfError::ObjectDirNotFound {
            path: object_dir.to_path_buf(),
        })?;
    let object_dir = object_dir.as_path();

    let mut layouts: Vec<(String, PathBuf)> = Vec::new();
    let mut images: Vec<(String, PathBuf)> = Vec::new();
    walk(object_dir, &mut |path| {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            warn!("Skipping file with a non-UTF-8 name: {}", path.display());
            return;
        };
        if let Some(stem) = name.strip_suffix(layout_suffix) {
            layouts.push((stem.to_string(), path.to_path_buf()));
        } else if let Some(stem) = name.strip_suffix(image_suffix) {
            images.push((stem.to_string(), path.to_path_buf()));
        }
    })?;

    debug!(
        "Found {} layout files and {} images under {}",
        layouts.len(),
        images.len(),
        object_dir.display()
    );

    if layouts.len() != images.len() {
        return Err(SearchablePdfError::InputMismatch {
            path: object_dir.to_path_buf(),
            layouts: layouts.len(),
            images: images.len(),
        });
    }
    if layouts.is_empty() {
        return Err(SearchablePdfError::NoPages {
            path: object_dir.to_path_buf(),
        });
    }

    let layouts = index_by_stem(layouts)?;
    let mut images = index_by_stem(images)?;

    // Counts are equal and stems unique, so every image is claimed iff every layout is.
    let mut pairs = Vec::with_capacity(layouts.len());
    for (stem, layout_path) in layouts {
        let image_path = images
            .remove(&stem)
            .ok_or_else(|| SearchablePdfError::UnpairedPage {
                stem: stem.clone(),
                missing: "image",
            })?;
        pairs.push(PageArtifactPair {
            stem,
            layout_path,
            image_path,
        });
    }

    info!("Discovered {} pages in {}", pairs.len(), object_dir.display());
    Ok(DiscoveredInputs {
        object_dir: object_dir.to_path_buf(),
        pairs,
    })
}

fn index_by_stem(
    files: Vec<(String, PathBuf)>,
) -> Result<BTreeMap<String, PathBuf>, SearchablePdfError> {
    let mut map = BTreeMap::new();
    for (stem, path) in files {
        match map.entry(stem) {
            Entry::Vacant(slot) => {
                slot.insert(path);
            }
            Entry::Occupied(slot) => {
                return Err(SearchablePdfError::DuplicatePage {
                    stem: slot.key().clone(),
                    first: slot.get().clone(),
                    second: path,
                });
            }
        }
    }
    Ok(map)
}

fn walk(dir: &Path, visit: &mut dyn FnMut(&Path)) -> Result<(), SearchablePdfError> {
    let read_err = |source| SearchablePdfError::DirectoryRead {
        path: dir.to_path_buf(),
        source,
    };
    for entry in std::fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(read_err)?;
        if file_type.is_dir() {
            walk(&path, visit)?;
        } else if file_type.is_file() {
            visit(&path);
        }
    }
    Ok(())
}
