//! In-memory view of a shipment metadata dump.
//!
//! The dump is a tree of `shipment` → `entity` → `issue` elements plus
//! `record` elements, all carrying their data as attributes and addressed by
//! an `ID` attribute. Text content is irrelevant, so the parser keeps only
//! element names, attributes and parent links in a flat arena. Lookups are
//! linear scans in document order, which is what the XPath expressions the
//! dump format was designed around (`//issue[@ID="…"]`) amount to.

use crate::error::MetadataError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

#[derive(Debug, Clone)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    parent: Option<usize>,
}

/// A parsed metadata dump.
#[derive(Debug, Clone)]
pub struct MetadataDump {
    elements: Vec<Element>,
}

/// Borrowed handle to one element of a [`MetadataDump`].
#[derive(Debug, Clone, Copy)]
pub struct ElementRef<'a> {
    dump: &'a MetadataDump,
    index: usize,
}

impl MetadataDump {
    /// Parse a dump from raw XML bytes.
    pub fn parse(xml: &[u8]) -> Result<Self, MetadataError> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut elements: Vec<Element> = Vec::new();
        let mut open: Vec<usize> = Vec::new();

        loop {
            let event = reader.read_event().map_err(|e| MetadataError::DumpParse {
                detail: format!("at byte {}: {e}", reader.buffer_position()),
            })?;
            match event {
                Event::Start(start) => {
                    let idx = push_element(&mut elements, &start, open.last().copied())?;
                    open.push(idx);
                }
                Event::Empty(start) => {
                    push_element(&mut elements, &start, open.last().copied())?;
                }
                Event::End(_) => {
                    open.pop();
                }
                Event::Eof => {
                    if let Some(&idx) = open.last() {
                        return Err(MetadataError::DumpParse {
                            detail: format!("unclosed <{}> at end of input", elements[idx].name),
                        });
                    }
                    break;
                }
                _ => {}
            }
        }

        if elements.is_empty() {
            return Err(MetadataError::DumpParse {
                detail: "document has no elements".into(),
            });
        }
        Ok(Self { elements })
    }

    /// Convenience wrapper over [`MetadataDump::parse`] for string input.
    pub fn parse_str(xml: &str) -> Result<Self, MetadataError> {
        Self::parse(xml.as_bytes())
    }

    /// The document element.
    pub fn root(&self) -> ElementRef<'_> {
        ElementRef {
            dump: self,
            index: 0,
        }
    }

    /// `/shipment/@material`, if the root is a `shipment` carrying one.
    pub fn material_tag(&self) -> Option<&str> {
        let root = self.root();
        if root.name() != "shipment" {
            return None;
        }
        root.attr("material")
    }

    /// First element named `name` whose `ID` attribute equals `id`.
    pub fn find_by_id(&self, name: &str, id: &str) -> Option<ElementRef<'_>> {
        self.elements
            .iter()
            .position(|e| {
                e.name == name && e.attributes.iter().any(|(k, v)| k == "ID" && v == id)
            })
            .map(|index| ElementRef { dump: self, index })
    }

    /// Number of elements in the dump.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl<'a> ElementRef<'a> {
    fn element(&self) -> &'a Element {
        &self.dump.elements[self.index]
    }

    /// Local element name (namespace prefix stripped).
    pub fn name(&self) -> &'a str {
        &self.element().name
    }

    /// Attribute value by local name.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element()
            .attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Enclosing element, `None` for the root.
    pub fn parent(&self) -> Option<ElementRef<'a>> {
        self.element().parent.map(|index| ElementRef {
            dump: self.dump,
            index,
        })
    }
}

fn push_element(
    elements: &mut Vec<Element>,
    start: &BytesStart<'_>,
    parent: Option<usize>,
) -> Result<usize, MetadataError> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| MetadataError::DumpParse {
            detail: format!("bad attribute on <{name}>: {e}"),
        })?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| MetadataError::DumpParse {
                detail: format!("bad value for {name}/@{key}: {e}"),
            })?
            .into_owned();
        attributes.push((key, value));
    }
    elements.push(Element {
        name,
        attributes,
        parent,
    });
    Ok(elements.len() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<shipment material="tijdschriften" ID="MMTUK04">
  <entity ID="E1" sourceProvider="KB" shelfmark="T 123">
    <issue ID="MMTUK04210988001" referredRecordID="R1" volumeNo="3"/>
  </entity>
  <records>
    <record ID="R1" title="De Gids &amp; Co"/>
  </records>
</shipment>"#;

    #[test]
    fn reads_material_from_root() {
        let dump = MetadataDump::parse_str(DUMP).unwrap();
        assert_eq!(dump.material_tag(), Some("tijdschriften"));
        assert_eq!(dump.len(), 5);
    }

    #[test]
    fn finds_by_id_and_walks_to_parent() {
        let dump = MetadataDump::parse_str(DUMP).unwrap();
        let issue = dump.find_by_id("issue", "MMTUK04210988001").unwrap();
        assert_eq!(issue.attr("volumeNo"), Some("3"));
        let entity = issue.parent().unwrap();
        assert_eq!(entity.name(), "entity");
        assert_eq!(entity.attr("shelfmark"), Some("T 123"));
    }

    #[test]
    fn unescapes_attribute_values() {
        let dump = MetadataDump::parse_str(DUMP).unwrap();
        let record = dump.find_by_id("record", "R1").unwrap();
        assert_eq!(record.attr("title"), Some("De Gids & Co"));
    }

    #[test]
    fn id_lookup_is_name_scoped() {
        let dump = MetadataDump::parse_str(DUMP).unwrap();
        assert!(dump.find_by_id("entity", "R1").is_none());
        assert!(dump.find_by_id("record", "missing").is_none());
    }

    #[test]
    fn non_shipment_root_has_no_material() {
        let dump = MetadataDump::parse_str(r#"<delivery material="boeken"/>"#).unwrap();
        assert_eq!(dump.material_tag(), None);
    }

    #[test]
    fn malformed_xml_is_a_parse_error() {
        let err = MetadataDump::parse_str("<shipment><entity></shipment>").unwrap_err();
        assert!(matches!(err, MetadataError::DumpParse { .. }), "got {err:?}");
    }

    #[test]
    fn truncated_dump_is_a_parse_error() {
        let err = MetadataDump::parse_str(
            r#"<shipment material="boeken">
                 <entity ID="B1" referredRecordID="R" sourceProvider="KB" shelfmark="S" sequenceNo="1"/>
                 <record ID="R" title="T" author="A" issued="1"/>"#,
        )
        .unwrap_err();
        match err {
            MetadataError::DumpParse { detail } => {
                assert!(detail.contains("unclosed <shipment>"), "got {detail}")
            }
            other => panic!("expected DumpParse, got {other:?}"),
        }
    }

    #[test]
    fn empty_input_is_a_parse_error() {
        assert!(MetadataDump::parse_str("").is_err());
    }
}
