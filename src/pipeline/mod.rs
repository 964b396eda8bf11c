//! Pipeline stages for ALTO-to-searchable-PDF conversion.
//!
//! Each submodule implements one step; [`crate::convert`] strings them
//! together.
//!
//! ## Data Flow
//!
//! ```text
//! discover ──▶ transform ──▶ raster ──▶ assemble ──▶ docinfo
//! (pairs)      (ALTO→hOCR)   (→JPEG)    (hocr-pdf)   (Info dict)
//! ```
//!
//! 1. [`discover`]  — pair `_alto.xml` and `_access.jp2` files by stem
//! 2. [`transform`] — XSLT run per page into the scratch pages directory
//! 3. [`raster`]    — JPEG working copy per page, in-process or external
//! 4. [`assemble`]  — one assembler run over the pages directory
//! 5. [`docinfo`]   — stamp the info dictionary and write atomically
//!
//! [`tool`] runs every external process with a timeout; [`scratch`] owns the
//! per-run intermediates.

pub mod assemble;
pub mod discover;
pub mod docinfo;
pub mod raster;
pub mod scratch;
pub mod tool;
pub mod transform;
