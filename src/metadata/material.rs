//! Material types and their static keyword sets.

use crate::error::MetadataError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Classification of the digitised source item.
///
/// The dump spells these with the Dutch collection names (`tijdschriften`,
/// `kranten`, `boeken`); the English names are accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialType {
    Periodical,
    Newspaper,
    Book,
}

const PERIODICAL_KEYWORDS: &str = "Gedigitaliseerd door de Koninklijke Bibliotheek; \
Nederlandse geschiedenis; tijdschriften, historische tijdschriften, oude tijdschriften, \
archief tijdschriften, tijdschrift online, cultuur, letterkunde, religie, wetenschap, \
politiek, sport, economie";

const NEWSPAPER_KEYWORDS: &str = "Gedigitaliseerd door de Koninklijke Bibliotheek; \
Nederlandse geschiedenis; kranten, historische kranten, oude kranten, archief kranten, \
krantenarchieven, krant online, familieberichten, stamboom familie, dagblad, \
overlijdensberichten, nieuwsberichten, Nederlandstalige kranten, namen familie, \
familie Nederland, oorlogskranten, kranten van toen, Surinaamse kranten, Indische kranten, \
Antilliaanse kranten, databank kranten";

const BOOK_KEYWORDS: &str = "Gedigitaliseerd door de Koninklijke Bibliotheek; \
Nederlandse geschiedenis; boeken, oude drukken, Nederlands taalgebied, geschiedenis, \
politiek, theologie, letterkundige werken, naamlijsten, boeken online, historische teksten, \
oude boeken, bijzondere collecties, cultuur";

impl MaterialType {
    /// Parse the `/shipment/@material` value.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim() {
            "tijdschriften" | "periodical" => Some(MaterialType::Periodical),
            "kranten" | "newspaper" => Some(MaterialType::Newspaper),
            "boeken" | "book" => Some(MaterialType::Book),
            _ => None,
        }
    }

    /// The tag as it appears in the dump.
    pub fn tag(self) -> &'static str {
        match self {
            MaterialType::Periodical => "tijdschriften",
            MaterialType::Newspaper => "kranten",
            MaterialType::Book => "boeken",
        }
    }

    /// English name, shared by `Display` and the serialized form.
    pub fn name(self) -> &'static str {
        match self {
            MaterialType::Periodical => "periodical",
            MaterialType::Newspaper => "newspaper",
            MaterialType::Book => "book",
        }
    }

    /// Fixed keyword string stamped into the PDF for this material.
    pub fn keywords(self) -> &'static str {
        match self {
            MaterialType::Periodical => PERIODICAL_KEYWORDS,
            MaterialType::Newspaper => NEWSPAPER_KEYWORDS,
            MaterialType::Book => BOOK_KEYWORDS,
        }
    }
}

impl FromStr for MaterialType {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| MetadataError::UnknownMaterial {
            value: s.to_string(),
        })
    }
}

impl fmt::Display for MaterialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dutch_tags_and_aliases() {
        assert_eq!("tijdschriften".parse(), Ok(MaterialType::Periodical));
        assert_eq!("kranten".parse(), Ok(MaterialType::Newspaper));
        assert_eq!("boeken".parse(), Ok(MaterialType::Book));
        assert_eq!("book".parse(), Ok(MaterialType::Book));
    }

    #[test]
    fn unknown_tag_is_an_error() {
        assert_eq!(
            "kaarten".parse::<MaterialType>(),
            Err(MetadataError::UnknownMaterial {
                value: "kaarten".into()
            })
        );
    }

    #[test]
    fn display_matches_serialized_name() {
        for m in [MaterialType::Periodical, MaterialType::Newspaper, MaterialType::Book] {
            assert_eq!(serde_json::to_value(m).unwrap(), m.to_string());
            assert_eq!(m.to_string().parse(), Ok(m));
        }
        assert_eq!(MaterialType::Book.to_string(), "book");
        assert_eq!(MaterialType::Book.tag(), "boeken");
    }

    #[test]
    fn keywords_are_material_specific() {
        assert!(MaterialType::Periodical.keywords().contains("oude tijdschriften"));
        assert!(MaterialType::Newspaper.keywords().ends_with("databank kranten"));
        assert!(MaterialType::Book.keywords().contains("oude drukken"));
        for m in [MaterialType::Periodical, MaterialType::Newspaper, MaterialType::Book] {
            assert!(m
                .keywords()
                .starts_with("Gedigitaliseerd door de Koninklijke Bibliotheek; "));
            assert!(!m.keywords().contains("  "));
        }
    }
}
