//! Per-run scratch directory.
//!
//! Intermediates (hOCR pages, JPEG working copies, the assembled PDF) live in
//! `<scratch_root>/<label>-<uuid>/`. The directory has no `Drop` cleanup: it
//! is removed only by an explicit [`ScratchDir::discard`] after the final PDF
//! has been written, so a failed run leaves its intermediates for inspection.

use crate::error::SearchablePdfError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Subdirectory handed to the assembler; holds only page-level files.
const PAGES_DIR: &str = "pages";

/// A run-owned scratch directory.
#[derive(Debug)]
pub struct ScratchDir {
    root: PathBuf,
}

impl ScratchDir {
    /// Create a fresh, uniquely named scratch directory under `scratch_root`.
    pub async fn create(scratch_root: &Path, label: &str) -> Result<Self, SearchablePdfError> {
        let safe_label: String = label
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let root = scratch_root.join(format!("{}-{}", safe_label, Uuid::new_v4().simple()));
        let pages = root.join(PAGES_DIR);
        tokio::fs::create_dir_all(&pages)
            .await
            .map_err(|source| SearchablePdfError::ScratchIo {
                path: pages.clone(),
                source,
            })?;
        debug!("Created scratch directory {}", root.display());
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Directory for per-page intermediates (`<stem>.hocr`, `<stem>.jpg`).
    pub fn pages_dir(&self) -> PathBuf {
        self.root.join(PAGES_DIR)
    }

    /// Path for a whole-object intermediate, outside the pages directory.
    pub fn file(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Remove the directory and everything in it.
    pub async fn discard(self) -> Result<(), SearchablePdfError> {
        tokio::fs::remove_dir_all(&self.root)
            .await
            .map_err(|source| SearchablePdfError::ScratchIo {
                path: self.root.clone(),
                source,
            })?;
        debug!("Removed scratch directory {}", self.root.display());
        Ok(())
    }

    /// Leave the directory on disk, logging where it is.
    pub fn retain(self) -> PathBuf {
        warn!("Keeping intermediate files in {}", self.root.display());
        self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_is_unique_per_call() {
        let root = tempfile::tempdir().unwrap();
        let a = ScratchDir::create(root.path(), "MMTUK04_210988001").await.unwrap();
        let b = ScratchDir::create(root.path(), "MMTUK04_210988001").await.unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a.pages_dir().is_dir());
        assert!(b.pages_dir().is_dir());
    }

    #[tokio::test]
    async fn label_is_sanitised() {
        let root = tempfile::tempdir().unwrap();
        let s = ScratchDir::create(root.path(), "a b/c").await.unwrap();
        let name = s.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("a_b_c-"), "got {name}");
    }

    #[tokio::test]
    async fn discard_removes_everything() {
        let root = tempfile::tempdir().unwrap();
        let s = ScratchDir::create(root.path(), "obj").await.unwrap();
        std::fs::write(s.pages_dir().join("p1.hocr"), b"<html/>").unwrap();
        std::fs::write(s.file("obj_pdf.pdf"), b"%PDF").unwrap();
        let path = s.path().to_path_buf();
        s.discard().await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn retain_keeps_files() {
        let root = tempfile::tempdir().unwrap();
        let s = ScratchDir::create(root.path(), "obj").await.unwrap();
        std::fs::write(s.pages_dir().join("p1.jpg"), b"jpg").unwrap();
        let kept = s.retain();
        assert!(kept.join("pages/p1.jpg").exists());
    }
}
