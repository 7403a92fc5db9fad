//! Common test helpers and utilities shared across test suite.

#![allow(dead_code)]

use std::path::PathBuf;

use marcrdf::mapper::{Converter, ConverterConfig, MappingDocument, StatementSink, Vocabulary};
use marcrdf::{DataField, Record};

/// Subject minted for control number `123456` on the default host.
pub const SUBJECT_123456: &str =
    "http://placeholder.com/publication/pe10adc3949ba59abbe56e057f20f883e";

/// Path of a file under `tests/data`.
pub fn data_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Builds a converter from a YAML mapping with the standard vocabulary.
pub fn converter_from_yaml(yaml: &str) -> Converter {
    let document = MappingDocument::from_yaml_str(yaml).expect("mapping parses");
    let vocabulary = document.vocabulary(&Vocabulary::standard());
    let mapping = document.compile(&vocabulary).expect("mapping compiles");
    Converter::new(mapping, vocabulary, ConverterConfig::default()).expect("converter")
}

/// Builds a converter from the full fixture mapping.
pub fn fixture_converter() -> Converter {
    Converter::from_mapping_path(
        data_path("mapping.yaml"),
        &Vocabulary::standard(),
        ConverterConfig::default(),
    )
    .expect("fixture mapping loads")
}

/// A record with control number `123456` and the given data fields.
pub fn record_with_fields(fields: Vec<DataField>) -> Record {
    fields.into_iter().fold(
        Record::builder().control_field_str("001", "123456"),
        marcrdf::RecordBuilder::field,
    )
    .build()
}

/// The 650 field used by the repeated-subfield tests: `a` Animals, `x` Cats, `x` Dogs.
pub fn animals_field() -> DataField {
    DataField::builder("650", ' ', ' ')
        .subfield_str('a', "Animals")
        .subfield_str('x', "Cats")
        .subfield_str('x', "Dogs")
        .build()
}

/// Statements rendered as N-Triples lines, in assertion order.
pub fn ntriples(statements: &StatementSink) -> Vec<String> {
    statements.iter().map(ToString::to_string).collect()
}
