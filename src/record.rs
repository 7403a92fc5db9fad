//! MARC bibliographic record structures.
//!
//! This module provides the record abstraction the converter walks:
//! - [`Record`]: Ordered collection of fields grouped by tag
//! - [`Field`]: Either a [`ControlField`] or a [`DataField`]
//! - [`Subfield`]: Coded data element within a data field
//!
//! Records are built once (by a reader or a builder) and treated as immutable
//! during conversion.
//!
//! # Examples
//!
//! ```
//! use marcrdf::record::{DataField, Record};
//!
//! let record = Record::builder()
//!     .control_field_str("001", "12345")
//!     .field(
//!         DataField::builder("650", ' ', '0')
//!             .subfield_str('a', "Animals")
//!             .subfield_str('x', "Cats")
//!             .build(),
//!     )
//!     .build();
//!
//! assert_eq!(record.control_number(), Some("12345"));
//! assert_eq!(record.tags().collect::<Vec<_>>(), vec!["001", "650"]);
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A MARC bibliographic record
///
/// Fields are stored in insertion order using `IndexMap`, grouped by tag. Tag
/// iteration therefore follows the order in which each tag first appears in
/// the record, and the instances of one tag keep their relative order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Fields by tag, preserves insertion order
    pub fields: IndexMap<String, Vec<Field>>,
}

/// One field instance of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Field {
    /// Control field (001-009): tag and scalar value
    Control(ControlField),
    /// Data field (010+): indicators and subfields
    Data(DataField),
}

/// A control field carrying a single scalar value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlField {
    /// Field tag (3 digits)
    pub tag: String,
    /// Field value
    pub value: String,
}

/// A data field in a MARC record (fields 010 and higher)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataField {
    /// Field tag (3 digits)
    pub tag: String,
    /// First indicator
    pub indicator1: char,
    /// Second indicator
    pub indicator2: char,
    /// Subfields in record order; codes may repeat
    pub subfields: SmallVec<[Subfield; 4]>,
}

/// A subfield within a data field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subfield {
    /// Subfield code (single character)
    pub code: char,
    /// Subfield value
    pub value: String,
}

impl Record {
    /// Create a new empty record
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for fluently constructing records
    #[must_use]
    pub fn builder() -> RecordBuilder {
        RecordBuilder {
            record: Record::new(),
        }
    }

    /// Append a control field
    pub fn add_control_field(&mut self, tag: impl Into<String>, value: impl Into<String>) {
        let tag = tag.into();
        self.fields
            .entry(tag.clone())
            .or_default()
            .push(Field::Control(ControlField {
                tag,
                value: value.into(),
            }));
    }

    /// Append a data field
    pub fn add_field(&mut self, field: DataField) {
        self.fields
            .entry(field.tag.clone())
            .or_default()
            .push(Field::Data(field));
    }

    /// Distinct tags present in the record, in order of first appearance
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// All field instances with the given tag, in record order
    #[must_use]
    pub fn fields_by_tag(&self, tag: &str) -> &[Field] {
        self.fields.get(tag).map(Vec::as_slice).unwrap_or_default()
    }

    /// Iterate over every field of the record
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values().flatten()
    }

    /// Value of the first control field with the given tag
    #[must_use]
    pub fn get_control_field(&self, tag: &str) -> Option<&str> {
        self.fields_by_tag(tag).iter().find_map(|field| match field {
            Field::Control(control) => Some(control.value.as_str()),
            Field::Data(_) => None,
        })
    }

    /// The record's primary identifier
    ///
    /// Field 001 when present, otherwise the first control field of the record.
    #[must_use]
    pub fn control_number(&self) -> Option<&str> {
        self.get_control_field("001").or_else(|| {
            self.fields().find_map(|field| match field {
                Field::Control(control) => Some(control.value.as_str()),
                Field::Data(_) => None,
            })
        })
    }

    /// Returns true if the record has no fields
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Builder for fluently constructing records
#[derive(Debug)]
pub struct RecordBuilder {
    record: Record,
}

impl RecordBuilder {
    /// Add a control field using string slices
    #[must_use]
    pub fn control_field_str(mut self, tag: &str, value: &str) -> Self {
        self.record.add_control_field(tag, value);
        self
    }

    /// Add a data field
    #[must_use]
    pub fn field(mut self, field: DataField) -> Self {
        self.record.add_field(field);
        self
    }

    /// Build the record
    #[must_use]
    pub fn build(self) -> Record {
        self.record
    }
}

impl Field {
    /// Field tag
    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            Field::Control(control) => &control.tag,
            Field::Data(data) => &data.tag,
        }
    }

    /// Scalar value of the field
    ///
    /// A data field yields its subfield values joined with spaces.
    #[must_use]
    pub fn value(&self) -> String {
        match self {
            Field::Control(control) => control.value.clone(),
            Field::Data(data) => data.value(),
        }
    }

    /// The data field, if this is one
    #[must_use]
    pub fn as_data(&self) -> Option<&DataField> {
        match self {
            Field::Data(data) => Some(data),
            Field::Control(_) => None,
        }
    }
}

impl DataField {
    /// Create a new data field without subfields
    #[must_use]
    pub fn new(tag: impl Into<String>, indicator1: char, indicator2: char) -> Self {
        DataField {
            tag: tag.into(),
            indicator1,
            indicator2,
            subfields: SmallVec::new(),
        }
    }

    /// Create a builder for fluently constructing data fields
    #[must_use]
    pub fn builder(tag: impl Into<String>, indicator1: char, indicator2: char) -> DataFieldBuilder {
        DataFieldBuilder {
            field: DataField::new(tag, indicator1, indicator2),
        }
    }

    /// Append a subfield
    pub fn add_subfield(&mut self, code: char, value: impl Into<String>) {
        self.subfields.push(Subfield {
            code,
            value: value.into(),
        });
    }

    /// Value of the first subfield with the given code
    #[must_use]
    pub fn get_subfield(&self, code: char) -> Option<&str> {
        self.subfields
            .iter()
            .find(|sf| sf.code == code)
            .map(|sf| sf.value.as_str())
    }

    /// Values of all subfields with the given code, in field order
    pub fn subfields_by_code(&self, code: char) -> impl Iterator<Item = &str> {
        self.subfields
            .iter()
            .filter(move |sf| sf.code == code)
            .map(|sf| sf.value.as_str())
    }

    /// Subfield values joined with spaces
    #[must_use]
    pub fn value(&self) -> String {
        self.subfields
            .iter()
            .map(|sf| sf.value.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Builder for fluently constructing data fields
#[derive(Debug)]
pub struct DataFieldBuilder {
    field: DataField,
}

impl DataFieldBuilder {
    /// Add a subfield
    #[must_use]
    pub fn subfield(mut self, code: char, value: String) -> Self {
        self.field.add_subfield(code, value);
        self
    }

    /// Add a subfield using a string slice
    #[must_use]
    pub fn subfield_str(mut self, code: char, value: &str) -> Self {
        self.field.add_subfield(code, value);
        self
    }

    /// Build the field
    #[must_use]
    pub fn build(self) -> DataField {
        self.field
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_follow_first_appearance() {
        let mut record = Record::new();
        record.add_control_field("001", "1");
        record.add_field(DataField::new("650", ' ', ' '));
        record.add_field(DataField::new("245", '1', '0'));
        record.add_field(DataField::new("650", ' ', '7'));

        assert_eq!(record.tags().collect::<Vec<_>>(), vec!["001", "650", "245"]);
        assert_eq!(record.fields_by_tag("650").len(), 2);
        assert!(record.fields_by_tag("999").is_empty());
    }

    #[test]
    fn test_control_number_prefers_001() {
        let record = Record::builder()
            .control_field_str("008", "040520s2001")
            .control_field_str("001", "42")
            .build();
        assert_eq!(record.control_number(), Some("42"));

        let record = Record::builder()
            .control_field_str("003", "NO-OsDA")
            .build();
        assert_eq!(record.control_number(), Some("NO-OsDA"));
        assert_eq!(Record::new().control_number(), None);
    }

    #[test]
    fn test_repeated_subfields() {
        let field = DataField::builder("650", ' ', ' ')
            .subfield_str('a', "Animals")
            .subfield_str('x', "Cats")
            .subfield_str('x', "Dogs")
            .build();

        assert_eq!(field.get_subfield('x'), Some("Cats"));
        assert_eq!(
            field.subfields_by_code('x').collect::<Vec<_>>(),
            vec!["Cats", "Dogs"]
        );
        assert_eq!(field.value(), "Animals Cats Dogs");
    }

    #[test]
    fn test_field_accessors() {
        let control = Field::Control(ControlField {
            tag: "001".into(),
            value: "123".into(),
        });
        assert_eq!(control.tag(), "001");
        assert_eq!(control.value(), "123");
        assert!(control.as_data().is_none());

        let data = Field::Data(
            DataField::builder("245", '1', '0')
                .subfield_str('a', "Title")
                .build(),
        );
        assert_eq!(data.tag(), "245");
        assert_eq!(data.as_data().map(|d| d.indicator1), Some('1'));
    }
}
