//! Document information dictionary: stamp bibliographic metadata onto the
//! assembled PDF and write the final file.
//!
//! The assembled PDF is loaded with `lopdf`, its trailer `/Info` dictionary
//! is extended (entries already set by the assembler, such as `/Producer`,
//! survive), and the document is written to `<output>.tmp` and renamed into
//! place. A reader never sees a half-written output file.

use crate::error::SearchablePdfError;
use crate::metadata::ResolvedMetadata;
use chrono::{DateTime, FixedOffset, Utc};
use lopdf::{Dictionary, Document, Object, StringFormat};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Rights statement written to every document.
pub const COPYRIGHT_NOTICE: &str = "Gedigitaliseerd door de Koninklijke Bibliotheek, de Nationale Bibliotheek van Nederland  / Digitised by  the Koninklijke Bibliotheek, the National Library of the Netherlands";

/// Info dictionary key carrying [`COPYRIGHT_NOTICE`].
pub const COPYRIGHT_KEY: &str = "Copyright-information";

/// Offset of the timestamps, in seconds east of UTC (CET, no DST).
const STAMP_OFFSET_SECS: i32 = 3600;

/// The entries written to the PDF info dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentProperties {
    pub title: String,
    pub keywords: String,
    /// Books only.
    pub author: Option<String>,
    pub creation_date: String,
    pub modification_date: String,
    pub copyright: String,
}

impl DocumentProperties {
    /// Properties for `meta`, stamped at `now`.
    pub fn new(meta: &ResolvedMetadata, now: DateTime<Utc>) -> Result<Self, SearchablePdfError> {
        let stamp = pdf_date(now)?;
        Ok(Self {
            title: meta.title.clone(),
            keywords: meta.keywords.clone(),
            author: meta.author.clone(),
            creation_date: stamp.clone(),
            modification_date: stamp,
            copyright: COPYRIGHT_NOTICE.to_string(),
        })
    }

    fn apply_to(&self, info: &mut Dictionary) {
        info.set("Title", text_string(&self.title));
        info.set("Keywords", text_string(&self.keywords));
        info.set("CreationDate", text_string(&self.creation_date));
        info.set("ModDate", text_string(&self.modification_date));
        info.set(COPYRIGHT_KEY, text_string(&self.copyright));
        if let Some(ref author) = self.author {
            info.set("Author", text_string(author));
        }
    }
}

/// Format `at` as a PDF date string in the fixed +01:00 offset,
/// e.g. `D:20240102030405+01'00'`.
pub fn pdf_date(at: DateTime<Utc>) -> Result<String, SearchablePdfError> {
    let offset = FixedOffset::east_opt(STAMP_OFFSET_SECS)
        .ok_or_else(|| SearchablePdfError::Internal("invalid timestamp offset".into()))?;
    Ok(at
        .with_timezone(&offset)
        .format("D:%Y%m%d%H%M%S+01'00'")
        .to_string())
}

/// Encode a PDF text string: a literal when plain ASCII, otherwise
/// UTF-16BE with a byte order mark.
fn text_string(value: &str) -> Object {
    if value.is_ascii() {
        Object::String(value.as_bytes().to_vec(), StringFormat::Literal)
    } else {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in value.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        Object::String(bytes, StringFormat::Hexadecimal)
    }
}

fn decode_text_string(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        // PDFDocEncoding agrees with Latin-1 for everything we write.
        _ => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

/// Stamp `props` onto the PDF at `assembled` and write it to `output_path`.
///
/// The parent directory of `output_path` is created when missing. Runs on
/// the blocking pool.
pub async fn write_document_properties(
    assembled: &Path,
    output_path: &Path,
    props: &DocumentProperties,
) -> Result<PathBuf, SearchablePdfError> {
    let assembled = assembled.to_path_buf();
    let output = output_path.to_path_buf();
    let props = props.clone();
    tokio::task::spawn_blocking(move || write_blocking(&assembled, &output, &props))
        .await
        .map_err(|e| SearchablePdfError::Internal(format!("Write task panicked: {}", e)))?
}

fn write_blocking(
    assembled: &Path,
    output: &Path,
    props: &DocumentProperties,
) -> Result<PathBuf, SearchablePdfError> {
    let mut doc = Document::load(assembled).map_err(|e| SearchablePdfError::PdfLoadFailed {
        path: assembled.to_path_buf(),
        detail: e.to_string(),
    })?;

    let mut info = existing_info(&doc).unwrap_or_default();
    props.apply_to(&mut info);
    let info_id = doc.add_object(Object::Dictionary(info));
    doc.trailer.set("Info", Object::Reference(info_id));

    let write_err = |path: &Path, source: std::io::Error| SearchablePdfError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| write_err(output, std::io::Error::other(e.to_string())))?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| write_err(parent, e))?;
    }

    let mut tmp = output.as_os_str().to_os_string();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, &buf).map_err(|e| write_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, output) {
        let _ = std::fs::remove_file(&tmp);
        return Err(write_err(output, e));
    }

    debug!("Info dictionary: {:?}", props);
    info!("Wrote {} ({} bytes)", output.display(), buf.len());
    Ok(output.to_path_buf())
}

fn existing_info(doc: &Document) -> Option<Dictionary> {
    match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_dictionary(*id).ok().cloned(),
        Object::Dictionary(dict) => Some(dict.clone()),
        _ => None,
    }
}

/// Read the info dictionary entries written by [`write_document_properties`].
///
/// Missing entries come back empty (`author` as `None`).
pub fn read_document_properties(path: &Path) -> Result<DocumentProperties, SearchablePdfError> {
    let doc = Document::load(path).map_err(|e| SearchablePdfError::PdfLoadFailed {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    let info = existing_info(&doc).unwrap_or_default();
    let get = |key: &str| match info.get(key.as_bytes()) {
        Ok(Object::String(bytes, _)) => Some(decode_text_string(bytes)),
        _ => None,
    };
    Ok(DocumentProperties {
        title: get("Title").unwrap_or_default(),
        keywords: get("Keywords").unwrap_or_default(),
        author: get("Author"),
        creation_date: get("CreationDate").unwrap_or_default(),
        modification_date: get("ModDate").unwrap_or_default(),
        copyright: get(COPYRIGHT_KEY).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MaterialType;
    use chrono::TimeZone;
    use lopdf::dictionary;

    fn one_page_pdf(path: &Path) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let producer_id = doc.add_object(dictionary! {
            "Producer" => Object::string_literal("hocr-pdf"),
        });
        doc.trailer.set("Info", producer_id);
        doc.save(path).unwrap();
    }

    fn book() -> ResolvedMetadata {
        ResolvedMetadata {
            object_id: "MMKB08000000001".into(),
            material: MaterialType::Book,
            title: "Het leven van Ruyter, 1, 2, Brandt, Geeraert, 1687, KB, 1 A 12".into(),
            keywords: MaterialType::Book.keywords().to_string(),
            author: Some("Brandt, Geeraert".into()),
        }
    }

    #[test]
    fn pdf_date_uses_plus_one_offset() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(pdf_date(at).unwrap(), "D:20240102040405+01'00'");
    }

    #[test]
    fn pdf_date_rolls_over_midnight() {
        let at = Utc.with_ymd_and_hms(2023, 12, 31, 23, 30, 0).unwrap();
        assert_eq!(pdf_date(at).unwrap(), "D:20240101003000+01'00'");
    }

    #[test]
    fn non_ascii_text_uses_utf16() {
        match text_string("Leeuwarder Courant, ’s-Gravenhage") {
            Object::String(bytes, StringFormat::Hexadecimal) => {
                assert_eq!(&bytes[..2], &[0xFE, 0xFF]);
                assert_eq!(decode_text_string(&bytes), "Leeuwarder Courant, ’s-Gravenhage");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            text_string("plain"),
            Object::String(_, StringFormat::Literal)
        ));
    }

    #[tokio::test]
    async fn properties_round_trip_through_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let assembled = dir.path().join("assembled.pdf");
        one_page_pdf(&assembled);
        let output = dir.path().join("out/MMKB08_000000001_pdf.pdf");
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
        let props = DocumentProperties::new(&book(), now).unwrap();

        let written = write_document_properties(&assembled, &output, &props)
            .await
            .unwrap();
        assert_eq!(written, output);
        assert!(!dir.path().join("out/MMKB08_000000001_pdf.pdf.tmp").exists());

        let back = read_document_properties(&output).unwrap();
        assert_eq!(back, props);
        assert_eq!(back.creation_date, "D:20240601110000+01'00'");
        assert_eq!(back.copyright, COPYRIGHT_NOTICE);

        let doc = Document::load(&output).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
        let info = existing_info(&doc).unwrap();
        assert!(info.get(b"Producer").is_ok(), "existing entries are kept");
    }

    #[tokio::test]
    async fn author_is_absent_for_non_books() {
        let dir = tempfile::tempdir().unwrap();
        let assembled = dir.path().join("assembled.pdf");
        one_page_pdf(&assembled);
        let output = dir.path().join("np_pdf.pdf");
        let meta = ResolvedMetadata {
            material: MaterialType::Newspaper,
            author: None,
            ..book()
        };
        let props = DocumentProperties::new(&meta, Utc::now()).unwrap();
        write_document_properties(&assembled, &output, &props)
            .await
            .unwrap();
        assert_eq!(read_document_properties(&output).unwrap().author, None);
    }

    #[tokio::test]
    async fn garbage_input_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let assembled = dir.path().join("assembled.pdf");
        std::fs::write(&assembled, b"not a pdf").unwrap();
        let props = DocumentProperties::new(&book(), Utc::now()).unwrap();
        let err = write_document_properties(&assembled, &dir.path().join("x.pdf"), &props)
            .await
            .unwrap_err();
        assert!(matches!(err, SearchablePdfError::PdfLoadFailed { .. }));
        assert_eq!(err.exit_code(), 5);
    }
}
