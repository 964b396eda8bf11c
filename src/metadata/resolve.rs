//! Material-specific field extraction and title formatting.
//!
//! Each material type reads a different set of attributes from different
//! nodes of the dump:
//!
//! | material   | object node       | source / shelfmark     | title (and author) |
//! |------------|-------------------|------------------------|--------------------|
//! | periodical | `issue[@ID]`      | parent `entity`        | `record[@ID=referredRecordID]` |
//! | newspaper  | `issue[@ID]`      | parent `entity`        | `record[@ID=referredRecordID]` |
//! | book       | `entity[@ID]`     | same `entity`          | `record[@ID=referredRecordID]` |
//!
//! A missing required attribute aborts resolution with
//! [`MetadataError::MissingAttribute`]; optional ones become `""`.

use super::dump::{ElementRef, MetadataDump};
use super::material::MaterialType;
use crate::error::MetadataError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Bibliographic metadata resolved for one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedMetadata {
    pub object_id: String,
    pub material: MaterialType,
    pub title: String,
    pub keywords: String,
    /// Set for books only.
    pub author: Option<String>,
}

/// Attributes of a periodical issue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeriodicalFields {
    pub title: String,
    pub volume_no: String,
    pub volume_year: String,
    pub part: String,
    pub publication_day: String,
    pub publication_month: String,
    pub publication_year: String,
    pub publication_type: String,
    pub sequence_no: String,
    pub source_provider: String,
    pub shelfmark: String,
}

impl PeriodicalFields {
    pub fn format_title(&self) -> String {
        format!(
            "{}, jrg. {}, {}, {}, {}, {}, {}, [{}, volgnr. {}], {}, {}",
            self.title,
            self.volume_no,
            self.volume_year,
            self.part,
            self.publication_day,
            self.publication_month,
            self.publication_year,
            self.publication_type,
            self.sequence_no,
            self.source_provider,
            self.shelfmark,
        )
    }
}

/// Attributes of a newspaper issue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewspaperFields {
    pub title: String,
    pub volume_no: String,
    pub issue_no: String,
    pub publication_date: String,
    pub edition: String,
    pub source_provider: String,
    pub shelfmark: String,
}

impl NewspaperFields {
    pub fn format_title(&self) -> String {
        format!(
            "{}, jrg. {}, {}, {}, editie {}, {}, {}",
            self.title,
            self.volume_no,
            self.issue_no,
            self.publication_date,
            self.edition,
            self.source_provider,
            self.shelfmark,
        )
    }
}

/// Attributes of a book volume.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFields {
    pub title: String,
    pub part: String,
    pub sequence_no: String,
    pub author: String,
    pub issued: String,
    pub source_provider: String,
    pub shelfmark: String,
}

impl BookFields {
    pub fn format_title(&self) -> String {
        format!(
            "{}, {}, {}, {}, {}, {}, {}",
            self.title,
            self.part,
            self.sequence_no,
            self.author,
            self.issued,
            self.source_provider,
            self.shelfmark,
        )
    }
}

/// Resolve title, keywords and author for `object_id`.
pub fn resolve_metadata(
    dump: &MetadataDump,
    object_id: &str,
) -> Result<ResolvedMetadata, MetadataError> {
    let tag = dump.material_tag().ok_or(MetadataError::MissingMaterial)?;
    let material: MaterialType = tag.parse()?;
    debug!("Resolving {} metadata for object {}", material, object_id);

    let lookup = Lookup { dump, object_id };
    let (title, author) = match material {
        MaterialType::Periodical => (lookup.periodical()?.format_title(), None),
        MaterialType::Newspaper => (lookup.newspaper()?.format_title(), None),
        MaterialType::Book => {
            let fields = lookup.book()?;
            let author = fields.author.clone();
            (fields.format_title(), Some(author))
        }
    };

    Ok(ResolvedMetadata {
        object_id: object_id.to_string(),
        material,
        title,
        keywords: material.keywords().to_string(),
        author,
    })
}

struct Lookup<'a> {
    dump: &'a MetadataDump,
    object_id: &'a str,
}

impl<'a> Lookup<'a> {
    fn element(&self, name: &'static str, id: &str) -> Result<ElementRef<'a>, MetadataError> {
        self.dump
            .find_by_id(name, id)
            .ok_or_else(|| MetadataError::MissingElement {
                element: name,
                id: id.to_string(),
                object_id: self.object_id.to_string(),
            })
    }

    fn required(
        &self,
        el: ElementRef<'_>,
        element: &'static str,
        attribute: &'static str,
    ) -> Result<String, MetadataError> {
        el.attr(attribute)
            .map(str::to_string)
            .ok_or_else(|| MetadataError::MissingAttribute {
                attribute,
                element,
                object_id: self.object_id.to_string(),
            })
    }

    fn optional(el: ElementRef<'_>, attribute: &str) -> String {
        el.attr(attribute).unwrap_or_default().to_string()
    }

    /// The `issue` for this object and its enclosing `entity`.
    fn issue_and_entity(&self) -> Result<(ElementRef<'a>, ElementRef<'a>), MetadataError> {
        let issue = self.element("issue", self.object_id)?;
        let entity = issue
            .parent()
            .filter(|p| p.name() == "entity")
            .ok_or_else(|| MetadataError::MissingElement {
                element: "entity",
                id: format!("parent of issue {}", self.object_id),
                object_id: self.object_id.to_string(),
            })?;
        Ok((issue, entity))
    }

    fn record_for(&self, el: ElementRef<'_>, element: &'static str) -> Result<ElementRef<'a>, MetadataError> {
        let record_id = self.required(el, element, "referredRecordID")?;
        self.element("record", &record_id)
    }

    fn periodical(&self) -> Result<PeriodicalFields, MetadataError> {
        let (issue, entity) = self.issue_and_entity()?;
        let record = self.record_for(issue, "issue")?;
        Ok(PeriodicalFields {
            source_provider: self.required(entity, "entity", "sourceProvider")?,
            shelfmark: self.required(entity, "entity", "shelfmark")?,
            title: self.required(record, "record", "title")?,
            volume_no: self.required(issue, "issue", "volumeNo")?,
            sequence_no: self.required(issue, "issue", "sequenceNo")?,
            volume_year: self.required(issue, "issue", "volumeYear")?,
            part: Self::optional(issue, "part"),
            publication_year: self.required(issue, "issue", "publicationYear")?,
            publication_month: Self::optional(issue, "publicationMonth"),
            publication_day: Self::optional(issue, "publicationDay"),
            publication_type: self.required(issue, "issue", "publicationType")?,
        })
    }

    fn newspaper(&self) -> Result<NewspaperFields, MetadataError> {
        let (issue, entity) = self.issue_and_entity()?;
        let record = self.record_for(issue, "issue")?;
        Ok(NewspaperFields {
            source_provider: self.required(entity, "entity", "sourceProvider")?,
            shelfmark: self.required(entity, "entity", "shelfmark")?,
            title: self.required(record, "record", "title")?,
            volume_no: self.required(issue, "issue", "volumeNo")?,
            publication_date: self.required(issue, "issue", "publicationDate")?,
            edition: self.required(issue, "issue", "edition")?,
            issue_no: self.required(issue, "issue", "issueNo")?,
        })
    }

    fn book(&self) -> Result<BookFields, MetadataError> {
        let entity = self.element("entity", self.object_id)?;
        let record = self.record_for(entity, "entity")?;
        Ok(BookFields {
            source_provider: self.required(entity, "entity", "sourceProvider")?,
            shelfmark: self.required(entity, "entity", "shelfmark")?,
            title: self.required(record, "record", "title")?,
            author: self.required(record, "record", "author")?,
            issued: self.required(record, "record", "issued")?,
            sequence_no: self.required(entity, "entity", "sequenceNo")?,
            part: Self::optional(entity, "part"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn periodical_dump(issue_attrs: &str) -> MetadataDump {
        MetadataDump::parse_str(&format!(
            r#"<shipment material="tijdschriften">
                 <entity ID="E1" sourceProvider="KB" shelfmark="S1">
                   <issue ID="OBJ1" referredRecordID="R1" {issue_attrs}/>
                 </entity>
                 <record ID="R1" title="X"/>
               </shipment>"#
        ))
        .unwrap()
    }

    #[test]
    fn periodical_title_literal() {
        let dump = periodical_dump(
            r#"volumeNo="3" volumeYear="1990" sequenceNo="7" publicationType="A"
               publicationYear="1990" part="" publicationDay="" publicationMonth="""#,
        );
        let meta = resolve_metadata(&dump, "OBJ1").unwrap();
        assert_eq!(meta.material, MaterialType::Periodical);
        assert_eq!(
            meta.title,
            "X, jrg. 3, 1990, , , , 1990, [A, volgnr. 7], KB, S1"
        );
        assert_eq!(meta.author, None);
        assert_eq!(meta.keywords, MaterialType::Periodical.keywords());
    }

    #[test]
    fn periodical_optional_fields_default_to_empty() {
        let dump = periodical_dump(
            r#"volumeNo="12" volumeYear="1923" sequenceNo="4" publicationType="Weekblad"
               publicationYear="1923""#,
        );
        let meta = resolve_metadata(&dump, "OBJ1").unwrap();
        assert_eq!(
            meta.title,
            "X, jrg. 12, 1923, , , , 1923, [Weekblad, volgnr. 4], KB, S1"
        );
    }

    #[test]
    fn periodical_with_full_date() {
        let fields = PeriodicalFields {
            title: "De Gids".into(),
            volume_no: "97".into(),
            volume_year: "1933".into(),
            part: "II".into(),
            publication_day: "1".into(),
            publication_month: "4".into(),
            publication_year: "1933".into(),
            publication_type: "Maandblad".into(),
            sequence_no: "4".into(),
            source_provider: "KB".into(),
            shelfmark: "T 501".into(),
        };
        assert_eq!(
            fields.format_title(),
            "De Gids, jrg. 97, 1933, II, 1, 4, 1933, [Maandblad, volgnr. 4], KB, T 501"
        );
    }

    #[test]
    fn periodical_missing_required_names_attribute() {
        let dump = periodical_dump(r#"volumeNo="3" sequenceNo="7" publicationType="A" publicationYear="1990""#);
        let err = resolve_metadata(&dump, "OBJ1").unwrap_err();
        assert_eq!(
            err,
            MetadataError::MissingAttribute {
                attribute: "volumeYear",
                element: "issue",
                object_id: "OBJ1".into(),
            }
        );
    }

    #[test]
    fn newspaper_title_literal() {
        let dump = MetadataDump::parse_str(
            r#"<shipment material="kranten">
                 <entity ID="E9" sourceProvider="Stadsarchief" shelfmark="K 77">
                   <issue ID="DDD010" referredRecordID="R7" volumeNo="5"
                          publicationDate="1899-03-01" edition="avond" issueNo="52"/>
                 </entity>
                 <record ID="R7" title="Algemeen Handelsblad"/>
               </shipment>"#,
        )
        .unwrap();
        let meta = resolve_metadata(&dump, "DDD010").unwrap();
        assert_eq!(
            meta.title,
            "Algemeen Handelsblad, jrg. 5, 52, 1899-03-01, editie avond, Stadsarchief, K 77"
        );
        assert_eq!(meta.author, None);
    }

    #[test]
    fn book_title_and_author() {
        let dump = MetadataDump::parse_str(
            r#"<shipment material="boeken">
                 <entity ID="MMKB08000000001" referredRecordID="R2" sourceProvider="KB"
                         shelfmark="1701 B 12" sequenceNo="1"/>
                 <record ID="R2" title="Reize door Holland" author="Jansz, P." issued="1701"/>
               </shipment>"#,
        )
        .unwrap();
        let meta = resolve_metadata(&dump, "MMKB08000000001").unwrap();
        assert_eq!(
            meta.title,
            "Reize door Holland, , 1, Jansz, P., 1701, KB, 1701 B 12"
        );
        assert_eq!(meta.author.as_deref(), Some("Jansz, P."));
        assert_eq!(meta.keywords, MaterialType::Book.keywords());
    }

    #[test]
    fn book_missing_author_is_an_error() {
        let dump = MetadataDump::parse_str(
            r#"<shipment material="boeken">
                 <entity ID="B1" referredRecordID="R2" sourceProvider="KB"
                         shelfmark="S" sequenceNo="1" part="2"/>
                 <record ID="R2" title="T" issued="1701"/>
               </shipment>"#,
        )
        .unwrap();
        let err = resolve_metadata(&dump, "B1").unwrap_err();
        match err {
            MetadataError::MissingAttribute {
                attribute,
                object_id,
                ..
            } => {
                assert_eq!(attribute, "author");
                assert_eq!(object_id, "B1");
            }
            other => panic!("expected MissingAttribute, got {other:?}"),
        }
    }

    #[test]
    fn unknown_material_is_an_error() {
        let dump = MetadataDump::parse_str(r#"<shipment material="kaarten"/>"#).unwrap();
        assert_eq!(
            resolve_metadata(&dump, "X").unwrap_err(),
            MetadataError::UnknownMaterial {
                value: "kaarten".into()
            }
        );
    }

    #[test]
    fn missing_material_is_an_error() {
        let dump = MetadataDump::parse_str(r#"<shipment/>"#).unwrap();
        assert_eq!(
            resolve_metadata(&dump, "X").unwrap_err(),
            MetadataError::MissingMaterial
        );
    }

    #[test]
    fn unknown_object_reports_missing_issue() {
        let dump = periodical_dump(r#"volumeNo="3""#);
        let err = resolve_metadata(&dump, "NOPE").unwrap_err();
        assert!(
            matches!(err, MetadataError::MissingElement { element: "issue", .. }),
            "got {err:?}"
        );
    }

    #[test]
    fn issue_outside_entity_is_an_error() {
        let dump = MetadataDump::parse_str(
            r#"<shipment material="kranten">
                 <issue ID="I1" referredRecordID="R1"/>
                 <record ID="R1" title="T"/>
               </shipment>"#,
        )
        .unwrap();
        let err = resolve_metadata(&dump, "I1").unwrap_err();
        assert!(
            matches!(err, MetadataError::MissingElement { element: "entity", .. }),
            "got {err:?}"
        );
    }
}
