//! Property tests for the object pipeline and subject minting.

mod common;

use common::{converter_from_yaml, record_with_fields};
use marcrdf::mapper::{
    generate_objects, subject_uri, urlize, Extraction, PipelineConfig, UrlizeOptions,
};
use marcrdf::DataField;
use proptest::prelude::*;

const SLUG_MAPPING: &str = r#"
tags:
  - "650":
      subfields:
        - x:
            predicate: ONTOLOGY.subject
            object: { datatype: uri, prefix: "http://placeholder.com/subject/", urlize: true }
            relation:
              class: ONTOLOGY.Subject
              subfields:
                - x: { predicate: ONTOLOGY.label, object: { datatype: literal } }
"#;

proptest! {
    #[test]
    fn substring_never_panics(value in "\\PC{0,40}", offset in 0usize..50, length in 0usize..50) {
        let config = PipelineConfig {
            extraction: Extraction::Substring { offset, length },
            ..PipelineConfig::default()
        };
        let objects = generate_objects(&value, None, &config).expect("no tables involved");
        prop_assert!(objects.len() <= 1);
        if let Some(object) = objects.first() {
            prop_assert_eq!(object.chars().count(), length);
        }
    }

    #[test]
    fn urlize_yields_slug_characters_only(value in "\\PC{0,40}") {
        let slug = urlize(&value, &UrlizeOptions::default());
        prop_assert!(slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        prop_assert_eq!(urlize(&slug, &UrlizeOptions::default()), slug.clone());
    }

    #[test]
    fn subject_ignores_leading_zeros(n in 0u32..1_000_000, zeros in 0usize..4) {
        let padded = format!("{}{n}", "0".repeat(zeros));
        prop_assert_eq!(
            subject_uri("placeholder.com", &padded),
            subject_uri("placeholder.com", &n.to_string())
        );
    }

    #[test]
    fn conversion_is_idempotent(labels in prop::collection::vec("[A-Za-z ]{1,12}", 0..5)) {
        let converter = converter_from_yaml(SLUG_MAPPING);
        let field = labels.iter().fold(
            DataField::builder("650", ' ', ' '),
            |builder, label| builder.subfield_str('x', label),
        );
        let record = record_with_fields(vec![field.build()]);

        let first = converter.convert(&record).expect("convert");
        let second = converter.convert(&record).expect("convert");
        prop_assert_eq!(&first, &second);

        // Every generated subject node carries exactly its own label.
        for statement in first.iter().filter(|s| s.predicate.ends_with("#label")) {
            let label = statement.object.to_string();
            let slug = urlize(label.trim_matches('"'), &UrlizeOptions::default());
            let suffix = format!("/{slug}");
            prop_assert!(statement.subject.ends_with(&suffix));
        }
    }
}
