//! Relation expansion: statements about a generated object URI.
//!
//! A subfield rule with a relation turns each generated object into a node of
//! its own. The node is typed with the relation class, then the nested rules
//! are applied to the same field instance with the node as subject.
//!
//! Nested rules select their values in one of two ways:
//!
//! * a nested rule with the same code as the rule that produced the node reads
//!   only the subfield at that occurrence's position in the field, so repeated
//!   subfields each get their own subtree;
//! * any other code reads every subfield with that code.
//!
//! Nested rules may carry relations of their own; expansion recurses.

use tracing::debug;

use crate::error::Result;
use crate::record::DataField;

use super::engine::object_term;
use super::mapping::{code_matches, RelationSpec, SubfieldRule};
use super::pipeline::generate_objects;
use super::predicate::resolve_predicate;
use super::rdf::{StatementSink, Term};
use super::uri::build_uri;
use super::vocabulary::{Vocabulary, RDF_TYPE};

/// The subfield occurrence a relation node was generated from.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Occurrence<'a> {
    /// Code of the rule that generated the node.
    pub code: &'a str,
    /// Position of the subfield in the field's subfield list.
    pub index: usize,
}

/// Asserts the relation class of `object_uri` and applies the nested rules.
///
/// Errors from a nested rule carry that rule's tag and subfield.
pub(crate) fn expand_relation(
    vocabulary: &Vocabulary,
    sink: &mut StatementSink,
    object_uri: &str,
    relation: &RelationSpec,
    origin: Occurrence<'_>,
    field: &DataField,
) -> Result<()> {
    let class = vocabulary
        .resolve(&relation.class)
        .map_err(|e| e.in_rule(&field.tag, Some(origin.code)))?;
    sink.add(object_uri, RDF_TYPE, Term::uri(class));

    for nested in &relation.subfields {
        expand_nested(vocabulary, sink, object_uri, nested, origin, field)
            .map_err(|e| e.in_rule(&field.tag, Some(&nested.code)))?;
    }
    Ok(())
}

fn expand_nested(
    vocabulary: &Vocabulary,
    sink: &mut StatementSink,
    object_uri: &str,
    rule: &SubfieldRule,
    origin: Occurrence<'_>,
    field: &DataField,
) -> Result<()> {
    let predicate = vocabulary.resolve(resolve_predicate(&rule.predicate, field)?)?;

    for (index, value) in select_values(rule, origin, field) {
        if value.is_empty() {
            continue;
        }
        for object in generate_objects(value, Some(field), &rule.object.pipeline)? {
            let Some(relation) = &rule.relation else {
                sink.add(object_uri, predicate.as_str(), object_term(object, &rule.object));
                continue;
            };

            let term = build_uri(&object, &rule.object.prefix);
            let nested_uri = term.as_uri().map(str::to_string);
            sink.add(object_uri, predicate.as_str(), term);
            match nested_uri {
                Some(uri) => expand_relation(
                    vocabulary,
                    sink,
                    &uri,
                    relation,
                    Occurrence {
                        code: &rule.code,
                        index,
                    },
                    field,
                )?,
                None => debug!(
                    tag = field.tag.as_str(),
                    code = rule.code.as_str(),
                    "literal object, nested relation not expanded"
                ),
            }
        }
    }
    Ok(())
}

/// Subfield values a nested rule reads, with their positions in the field.
fn select_values<'f>(
    rule: &SubfieldRule,
    origin: Occurrence<'_>,
    field: &'f DataField,
) -> Vec<(usize, &'f str)> {
    if rule.code == origin.code {
        return field
            .subfields
            .get(origin.index)
            .map(|sf| (origin.index, sf.value.as_str()))
            .into_iter()
            .collect();
    }
    field
        .subfields
        .iter()
        .enumerate()
        .filter(|(_, sf)| code_matches(&rule.code, sf.code))
        .map(|(index, sf)| (index, sf.value.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::mapping::{ObjectSpec, PredicateSpec};
    use crate::mapper::vocabulary::VocabTerm;

    fn rule(code: &str, predicate: &str) -> SubfieldRule {
        SubfieldRule {
            code: code.into(),
            predicate: PredicateSpec::Static(VocabTerm::parse(predicate).expect("term")),
            object: ObjectSpec::default(),
            relation: None,
        }
    }

    fn subject_field() -> DataField {
        DataField::builder("650", ' ', '0')
            .subfield_str('a', "Animals")
            .subfield_str('x', "Cats")
            .subfield_str('x', "Dogs")
            .build()
    }

    #[test]
    fn test_same_code_reads_only_its_occurrence() {
        let field = subject_field();
        let origin = Occurrence { code: "x", index: 2 };
        assert_eq!(select_values(&rule("x", "DC.subject"), origin, &field), vec![(2, "Dogs")]);
    }

    #[test]
    fn test_other_code_reads_every_occurrence() {
        let field = subject_field();
        let origin = Occurrence { code: "a", index: 0 };
        assert_eq!(
            select_values(&rule("x", "DC.subject"), origin, &field),
            vec![(1, "Cats"), (2, "Dogs")]
        );
    }

    #[test]
    fn test_expand_types_node_then_nested() {
        let field = subject_field();
        let relation = RelationSpec {
            class: VocabTerm::parse("ONTOLOGY.Subject").expect("term"),
            subfields: vec![rule("x", "ONTOLOGY.subjectLabel"), rule("a", "RDFS.label")],
        };
        let mut sink = StatementSink::new();
        expand_relation(
            &Vocabulary::standard(),
            &mut sink,
            "http://example.com/cats",
            &relation,
            Occurrence { code: "x", index: 1 },
            &field,
        )
        .expect("expand");

        let lines: Vec<String> = sink.iter().map(ToString::to_string).collect();
        assert_eq!(
            lines,
            vec![
                format!(
                    "<http://example.com/cats> <{RDF_TYPE}> <http://placeholder.com/ontology#Subject> ."
                ),
                "<http://example.com/cats> <http://placeholder.com/ontology#subjectLabel> \"Cats\" ."
                    .to_string(),
                "<http://example.com/cats> <http://www.w3.org/2000/01/rdf-schema#label> \"Animals\" ."
                    .to_string(),
            ]
        );
    }

    #[test]
    fn test_unknown_class_names_origin() {
        let relation = RelationSpec {
            class: VocabTerm::parse("NOPE.Thing").expect("term"),
            subfields: Vec::new(),
        };
        let err = expand_relation(
            &Vocabulary::core(),
            &mut StatementSink::new(),
            "http://example.com/x",
            &relation,
            Occurrence { code: "x", index: 1 },
            &subject_field(),
        )
        .expect_err("unknown prefix");
        assert_eq!(err.to_string(), "Mapping for tag 650 subfield x: Unknown vocabulary prefix `nope`");
    }
}
