//! MARCXML deserialization of MARC records.
//!
//! This module reads the standard MARCXML format as defined by the Library of
//! Congress (<https://www.loc.gov/standards/marcxml/>) into [`Record`]s.
//!
//! Both default-namespace (`<record xmlns="...">`) and prefix-namespace
//! (`<marc:record xmlns:marc="...">`) forms are accepted, as well as documents
//! without any namespace.
//!
//! # Examples
//!
//! ```
//! use marcrdf::marcxml;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let xml = r#"<record>
//!   <leader>00000nam a2200000 a 4500</leader>
//!   <controlfield tag="001">123456</controlfield>
//!   <datafield tag="245" ind1="1" ind2="0"><subfield code="a">Title</subfield></datafield>
//! </record>"#;
//! let record = marcxml::marcxml_to_record(xml)?;
//! assert_eq!(record.control_number(), Some("123456"));
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use lazy_static::lazy_static;
use quick_xml::de::from_str as xml_from_str;
use regex::Regex;
use serde::Deserialize;

use crate::error::{MarcRdfError, Result};
use crate::record::{DataField, Record};

/// MARCXML record representation for deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename = "record")]
struct MarcxmlRecord {
    /// Control fields (tags 001-009)
    #[serde(default)]
    controlfield: Vec<MarcxmlControlField>,
    /// Data fields (tags 010+)
    #[serde(default)]
    datafield: Vec<MarcxmlDataField>,
}

#[derive(Debug, Deserialize)]
struct MarcxmlControlField {
    #[serde(rename = "@tag")]
    tag: String,
    #[serde(rename = "$value", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct MarcxmlDataField {
    #[serde(rename = "@tag")]
    tag: String,
    #[serde(rename = "@ind1", default)]
    ind1: String,
    #[serde(rename = "@ind2", default)]
    ind2: String,
    #[serde(default)]
    subfield: Vec<MarcxmlSubfield>,
}

#[derive(Debug, Deserialize)]
struct MarcxmlSubfield {
    #[serde(rename = "@code")]
    code: String,
    #[serde(rename = "$value", default)]
    value: String,
}

/// MARCXML collection wrapper for multiple records.
#[derive(Debug, Deserialize)]
#[serde(rename = "collection")]
struct MarcxmlCollection {
    #[serde(default, rename = "record")]
    records: Vec<MarcxmlRecord>,
}

lazy_static! {
    static ref XMLNS_DECLARATION: Regex =
        Regex::new(r#"\s+xmlns(?::\w+)?="[^"]*""#).expect("static regex");
    static ref ELEMENT_PREFIX: Regex = Regex::new(r"<(/?)(\w+):").expect("static regex");
    static ref ROOT_ELEMENT: Regex =
        Regex::new(r"<(collection|record)[\s>/]").expect("static regex");
}

/// Strip XML namespace prefixes and declarations from MARCXML input.
///
/// Handles both `marc:record` → `record` (prefixed namespace) and
/// `xmlns="..."` / `xmlns:marc="..."` (namespace declarations).
fn strip_marcxml_ns(xml: &str) -> String {
    let stripped = XMLNS_DECLARATION.replace_all(xml, "");
    ELEMENT_PREFIX.replace_all(&stripped, "<$1").to_string()
}

/// Convert a single MARCXML `<record>` string to a record.
///
/// # Errors
///
/// Returns an error if the XML is invalid or a subfield has no code.
pub fn marcxml_to_record(xml: &str) -> Result<Record> {
    let cleaned = strip_marcxml_ns(xml);
    let xml_record: MarcxmlRecord = xml_from_str(&cleaned)
        .map_err(|e| MarcRdfError::ParseError(format!("Failed to parse MARCXML: {e}")))?;

    marcxml_record_to_record(xml_record)
}

/// Convert a MARCXML `<collection>` string to records.
///
/// # Errors
///
/// Returns an error if the XML is invalid or cannot be parsed.
pub fn marcxml_to_records(xml: &str) -> Result<Vec<Record>> {
    let cleaned = strip_marcxml_ns(xml);
    let collection: MarcxmlCollection = xml_from_str(&cleaned).map_err(|e| {
        MarcRdfError::ParseError(format!("Failed to parse MARCXML collection: {e}"))
    })?;

    collection
        .records
        .into_iter()
        .map(marcxml_record_to_record)
        .collect()
}

/// Read every record from a MARCXML document, whether it is a single
/// `<record>` or a `<collection>`.
///
/// # Errors
///
/// Returns an error if the document has neither root element or cannot be parsed.
pub fn read_marcxml(xml: &str) -> Result<Vec<Record>> {
    let cleaned = strip_marcxml_ns(xml);
    let root = ROOT_ELEMENT
        .captures(&cleaned)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str());

    match root {
        Some("collection") => marcxml_to_records(xml),
        Some(_) => Ok(vec![marcxml_to_record(xml)?]),
        None => Err(MarcRdfError::ParseError(
            "MARCXML document has no <collection> or <record> element".into(),
        )),
    }
}

/// Read every record from a MARCXML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn read_marcxml_file(path: impl AsRef<Path>) -> Result<Vec<Record>> {
    let xml = std::fs::read_to_string(path)?;
    read_marcxml(&xml)
}

/// Internal helper: convert a deserialized `MarcxmlRecord` into a `Record`.
fn marcxml_record_to_record(xml_record: MarcxmlRecord) -> Result<Record> {
    let mut record = Record::new();

    for cf in xml_record.controlfield {
        record.add_control_field(cf.tag, cf.value);
    }

    for df in xml_record.datafield {
        let ind1 = df.ind1.chars().next().unwrap_or(' ');
        let ind2 = df.ind2.chars().next().unwrap_or(' ');

        let mut field = DataField::new(df.tag, ind1, ind2);

        for sf in df.subfield {
            let code = sf.code.chars().next().ok_or_else(|| {
                MarcRdfError::ParseError(format!("Missing subfield code in field {}", field.tag))
            })?;
            field.add_subfield(code, sf.value);
        }

        record.add_field(field);
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Field;

    const PREFIXED_COLLECTION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<marc:collection xmlns:marc="http://www.loc.gov/MARC21/slim">
  <marc:record>
    <marc:leader>00000nam a2200000 a 4500</marc:leader>
    <marc:controlfield tag="001">1</marc:controlfield>
  </marc:record>
  <marc:record>
    <marc:leader>00000nam a2200000 a 4500</marc:leader>
    <marc:controlfield tag="001">2</marc:controlfield>
    <marc:datafield tag="650" ind1=" " ind2="0">
      <marc:subfield code="a">Animals</marc:subfield>
      <marc:subfield code="x">Cats</marc:subfield>
      <marc:subfield code="x">Dogs</marc:subfield>
    </marc:datafield>
  </marc:record>
</marc:collection>"#;

    #[test]
    fn test_parse_standard_marcxml_no_namespace() {
        let xml = r#"<record><leader>00000nam a2200000 a 4500</leader><controlfield tag="001">12345</controlfield></record>"#;
        let record = marcxml_to_record(xml).expect("parse failed");
        assert_eq!(record.control_number(), Some("12345"));
    }

    #[test]
    fn test_parse_marcxml_with_default_namespace() {
        let xml = r#"<record xmlns="http://www.loc.gov/MARC21/slim"><leader>00000nam a2200000 a 4500</leader><datafield tag="245" ind1="1" ind2="0"><subfield code="a">Title</subfield></datafield></record>"#;
        let record = marcxml_to_record(xml).expect("parse failed");
        let field = record.fields_by_tag("245")[0].as_data().expect("data field");
        assert_eq!(field.indicator1, '1');
        assert_eq!(field.get_subfield('a'), Some("Title"));
    }

    #[test]
    fn test_parse_prefixed_collection_keeps_repeated_subfields() {
        let records = marcxml_to_records(PREFIXED_COLLECTION).expect("parse failed");
        assert_eq!(records.len(), 2);

        let field = records[1].fields_by_tag("650")[0]
            .as_data()
            .expect("data field");
        assert_eq!(
            field.subfields_by_code('x').collect::<Vec<_>>(),
            vec!["Cats", "Dogs"]
        );
    }

    #[test]
    fn test_read_marcxml_detects_root() {
        assert_eq!(read_marcxml(PREFIXED_COLLECTION).expect("collection").len(), 2);

        let single = r#"<record><controlfield tag="001">7</controlfield></record>"#;
        let records = read_marcxml(single).expect("record");
        assert!(matches!(records[0].fields_by_tag("001")[0], Field::Control(_)));

        assert!(read_marcxml("<foo/>").is_err());
    }
}
