//! Page scans → JPEG working copies.
//!
//! The `image` crate handles PNG, TIFF and JPEG in-process. JPEG 2000 access
//! scans are out of its reach, so [`ImageBackend::Auto`] hands those to an
//! external converter. Output is always `<pages>/<stem>.jpg` at the scan's
//! native resolution.

use crate::config::{ImageBackend, PipelineConfig, ToolCommand};
use crate::error::SearchablePdfError;
use crate::pipeline::discover::{DiscoveredInputs, PageArtifactPair};
use crate::pipeline::tool::{ensure_output, run_tool, ToolInvocation};
use crate::progress::Stage;
use image::{DynamicImage, ImageFormat};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const TOOL: &str = "image converter";

/// Convert every page scan into `pages_dir`, in stem order.
pub async fn convert_images(
    inputs: &DiscoveredInputs,
    pages_dir: &Path,
    config: &PipelineConfig,
) -> Result<Vec<PathBuf>, SearchablePdfError> {
    let mut written = Vec::with_capacity(inputs.len());
    for pair in &inputs.pairs {
        let output = pages_dir.join(format!("{}.jpg", pair.stem));
        match &config.image_backend {
            ImageBackend::Native => convert_native(&pair.image_path, &output).await?,
            ImageBackend::External(cmd) => {
                convert_external(pair, &output, cmd, config.tool_timeout_secs).await?
            }
            ImageBackend::Auto(cmd) => {
                if natively_readable(&pair.image_path) {
                    convert_native(&pair.image_path, &output).await?
                } else {
                    convert_external(pair, &output, cmd, config.tool_timeout_secs).await?
                }
            }
        }

        if let Some(ref cb) = config.progress_callback {
            cb.on_item_complete(Stage::ConvertImages, &pair.stem);
        }
        written.push(output);
    }

    info!("Converted {} page images to JPEG", written.len());
    Ok(written)
}

/// Whether the `image` crate can decode this file, judged by extension.
pub fn natively_readable(path: &Path) -> bool {
    ImageFormat::from_path(path)
        .map(|f| f.reading_enabled())
        .unwrap_or(false)
}

async fn convert_native(input: &Path, output: &Path) -> Result<(), SearchablePdfError> {
    let input = input.to_path_buf();
    let output = output.to_path_buf();
    tokio::task::spawn_blocking(move || convert_native_blocking(&input, &output))
        .await
        .map_err(|e| SearchablePdfError::Internal(format!("Image task panicked: {}", e)))?
}

fn convert_native_blocking(input: &Path, output: &Path) -> Result<(), SearchablePdfError> {
    let img = image::open(input).map_err(|source| SearchablePdfError::ImageDecodeFailed {
        path: input.to_path_buf(),
        source,
    })?;

    // The JPEG encoder takes 8-bit gray or RGB only.
    let img = match img {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => img,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    };

    img.save_with_format(output, ImageFormat::Jpeg)
        .map_err(|source| SearchablePdfError::ImageEncodeFailed {
            path: output.to_path_buf(),
            source,
        })?;
    debug!(
        "{} → {} ({}x{})",
        input.display(),
        output.display(),
        img.width(),
        img.height()
    );
    Ok(())
}

async fn convert_external(
    pair: &PageArtifactPair,
    output: &Path,
    command: &ToolCommand,
    timeout_secs: u64,
) -> Result<(), SearchablePdfError> {
    run_tool(ToolInvocation {
        tool: TOOL,
        command,
        vars: &[("input", pair.image_path.as_path()), ("output", output)],
        subject: &pair.stem,
        stdout_to: None,
        timeout_secs,
    })
    .await?;
    ensure_output(TOOL, output).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn png_page(dir: &Path, stem: &str) -> PageArtifactPair {
        let image_path = dir.join(format!("{stem}_access.png"));
        RgbaImage::from_pixel(40, 60, Rgba([200, 180, 160, 255]))
            .save(&image_path)
            .unwrap();
        PageArtifactPair {
            stem: stem.to_string(),
            layout_path: dir.join(format!("{stem}_alto.xml")),
            image_path,
        }
    }

    #[test]
    fn jp2_is_not_natively_readable() {
        assert!(!natively_readable(Path::new("p1_access.jp2")));
        assert!(natively_readable(Path::new("p1_access.png")));
        assert!(natively_readable(Path::new("p1_access.tif")));
    }

    #[tokio::test]
    async fn native_conversion_keeps_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let pair = png_page(dir.path(), "p0001");
        let found = DiscoveredInputs {
            object_dir: dir.path().to_path_buf(),
            pairs: vec![pair],
        };
        let config = PipelineConfig::builder()
            .image_backend(ImageBackend::Native)
            .build()
            .unwrap();

        let written = convert_images(&found, dir.path(), &config).await.unwrap();
        let jpg = image::open(&written[0]).unwrap();
        assert_eq!((jpg.width(), jpg.height()), (40, 60));
        assert_eq!(
            ImageFormat::from_path(&written[0]).unwrap(),
            ImageFormat::Jpeg
        );
    }

    #[tokio::test]
    async fn undecodable_scan_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("p1_access.png");
        std::fs::write(&image_path, b"not a png").unwrap();
        let err = convert_native(&image_path, &dir.path().join("p1.jpg"))
            .await
            .unwrap_err();
        match err {
            SearchablePdfError::ImageDecodeFailed { path, .. } => assert_eq!(path, image_path),
            other => panic!("expected ImageDecodeFailed, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn auto_falls_back_to_external_for_jp2() {
        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("p1_access.jp2");
        std::fs::write(&image_path, b"jp2 bytes").unwrap();
        let found = DiscoveredInputs {
            object_dir: dir.path().to_path_buf(),
            pairs: vec![PageArtifactPair {
                stem: "p1".into(),
                layout_path: dir.path().join("p1_alto.xml"),
                image_path,
            }],
        };
        let config = PipelineConfig::builder()
            .image_backend(ImageBackend::Auto(ToolCommand::new(
                "sh",
                ["-c", r#"cp "$0" "$1""#, "{input}", "{output}"],
            )))
            .build()
            .unwrap();

        let written = convert_images(&found, dir.path(), &config).await.unwrap();
        assert_eq!(std::fs::read(&written[0]).unwrap(), b"jp2 bytes");
    }
}
