//! RDF statements and their serialization.
//!
//! The converter produces an ordered list of [`Statement`]s collected in a
//! [`StatementSink`]. Serialization to wire syntaxes goes through the oxrdfio
//! library.

use std::fmt;
use std::io::Write;

use oxrdf::{Literal, LiteralRef, NamedNode, NamedNodeRef, Triple};
use oxrdfio::{JsonLdProfileSet, RdfFormat as OxRdfFormat, RdfSerializer};

use crate::error::{MarcRdfError, Result};

use super::config::RdfFormat;

/// An RDF object term.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// A named node (IRI/URI).
    Uri(String),
    /// A literal value with optional language tag or datatype.
    Literal {
        /// The literal value.
        value: String,
        /// Optional language tag (e.g., "en", "nb").
        language: Option<String>,
        /// Optional datatype URI.
        datatype: Option<String>,
    },
}

impl Term {
    /// Creates a new URI term.
    #[must_use]
    pub fn uri(uri: impl Into<String>) -> Self {
        Self::Uri(uri.into())
    }

    /// Creates a new plain literal.
    #[must_use]
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            language: None,
            datatype: None,
        }
    }

    /// Creates a literal, language-tagged when `lang` is given.
    #[must_use]
    pub fn literal_with_lang(value: impl Into<String>, lang: Option<&str>) -> Self {
        Self::Literal {
            value: value.into(),
            language: lang.map(str::to_string),
            datatype: None,
        }
    }

    /// Creates a new typed literal.
    #[must_use]
    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            language: None,
            datatype: Some(datatype.into()),
        }
    }

    /// Whether this is a literal.
    #[must_use]
    pub const fn is_literal(&self) -> bool {
        matches!(self, Self::Literal { .. })
    }

    /// The URI, if this is a URI term.
    #[must_use]
    pub fn as_uri(&self) -> Option<&str> {
        match self {
            Self::Uri(uri) => Some(uri),
            Self::Literal { .. } => None,
        }
    }
}

impl fmt::Display for Term {
    /// Formats the term in N-Triples syntax.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uri(uri) => write!(f, "<{uri}>"),
            Self::Literal {
                value,
                language: Some(lang),
                ..
            } => write!(
                f,
                "{}",
                LiteralRef::new_language_tagged_literal_unchecked(value, lang)
            ),
            Self::Literal {
                value,
                datatype: Some(dt),
                ..
            } => write!(
                f,
                "{}",
                LiteralRef::new_typed_literal(value, NamedNodeRef::new_unchecked(dt))
            ),
            Self::Literal { value, .. } => write!(f, "{}", LiteralRef::new_simple_literal(value)),
        }
    }
}

/// A single RDF statement (subject, predicate, object).
///
/// Subjects and predicates are always URIs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Statement {
    /// Subject URI.
    pub subject: String,
    /// Predicate URI.
    pub predicate: String,
    /// Object term.
    pub object: Term,
}

impl Statement {
    /// Creates a new statement.
    #[must_use]
    pub fn new(subject: impl Into<String>, predicate: impl Into<String>, object: Term) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object,
        }
    }
}

impl fmt::Display for Statement {
    /// Formats the statement as one N-Triples line (without newline).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}> <{}> {} .", self.subject, self.predicate, self.object)
    }
}

/// Ordered accumulator of statements produced for one record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementSink {
    statements: Vec<Statement>,
}

impl StatementSink {
    /// Creates a new empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a statement.
    pub fn push(&mut self, statement: Statement) {
        self.statements.push(statement);
    }

    /// Appends a statement from components.
    pub fn add(&mut self, subject: impl Into<String>, predicate: impl Into<String>, object: Term) {
        self.push(Statement::new(subject, predicate, object));
    }

    /// Returns the number of statements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Returns true if no statement was asserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Returns an iterator over the statements in assertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Statement> {
        self.statements.iter()
    }

    /// The statements as a slice, in assertion order.
    #[must_use]
    pub fn as_slice(&self) -> &[Statement] {
        &self.statements
    }

    /// Consumes the sink, returning the statements.
    #[must_use]
    pub fn into_statements(self) -> Vec<Statement> {
        self.statements
    }

    /// Serializes the statements to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if a term is not valid RDF or serialization fails.
    pub fn serialize(&self, format: RdfFormat) -> Result<String> {
        let mut output = Vec::new();
        self.serialize_to_writer(&mut output, format)?;
        String::from_utf8(output).map_err(|e| MarcRdfError::Serialization(e.to_string()))
    }

    /// Serializes the statements to a writer in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if a term is not valid RDF or serialization fails.
    pub fn serialize_to_writer<W: Write>(&self, writer: W, format: RdfFormat) -> Result<()> {
        let mut serializer = RdfSerializer::from_format(to_oxrdf_format(format)).for_writer(writer);

        for statement in &self.statements {
            let triple = to_oxrdf_triple(statement)?;
            serializer
                .serialize_triple(&triple)
                .map_err(|e| MarcRdfError::Serialization(e.to_string()))?;
        }

        serializer
            .finish()
            .map_err(|e| MarcRdfError::Serialization(e.to_string()))?;
        Ok(())
    }
}

impl Extend<Statement> for StatementSink {
    fn extend<I: IntoIterator<Item = Statement>>(&mut self, iter: I) {
        self.statements.extend(iter);
    }
}

impl IntoIterator for StatementSink {
    type Item = Statement;
    type IntoIter = std::vec::IntoIter<Statement>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.into_iter()
    }
}

impl<'a> IntoIterator for &'a StatementSink {
    type Item = &'a Statement;
    type IntoIter = std::slice::Iter<'a, Statement>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.iter()
    }
}

/// Converts our [`RdfFormat`] to oxrdfio's format.
fn to_oxrdf_format(format: RdfFormat) -> OxRdfFormat {
    match format {
        RdfFormat::RdfXml => OxRdfFormat::RdfXml,
        RdfFormat::JsonLd => OxRdfFormat::JsonLd {
            profile: JsonLdProfileSet::default(),
        },
        RdfFormat::Turtle => OxRdfFormat::Turtle,
        RdfFormat::NTriples => OxRdfFormat::NTriples,
    }
}

fn named_node(iri: &str, role: &str) -> Result<NamedNode> {
    NamedNode::new(iri)
        .map_err(|e| MarcRdfError::Serialization(format!("Invalid {role} URI <{iri}>: {e}")))
}

/// Converts a [`Statement`] to an oxrdf Triple.
fn to_oxrdf_triple(statement: &Statement) -> Result<Triple> {
    let subject = named_node(&statement.subject, "subject")?;
    let predicate = named_node(&statement.predicate, "predicate")?;

    let object: oxrdf::Term = match &statement.object {
        Term::Uri(uri) => named_node(uri, "object")?.into(),
        Term::Literal {
            value,
            language,
            datatype,
        } => {
            let lit = if let Some(lang) = language {
                Literal::new_language_tagged_literal(value, lang).map_err(|e| {
                    MarcRdfError::Serialization(format!("Invalid language tag `{lang}`: {e}"))
                })?
            } else if let Some(dt) = datatype {
                Literal::new_typed_literal(value, named_node(dt, "datatype")?)
            } else {
                Literal::new_simple_literal(value)
            };
            lit.into()
        },
    };

    Ok(Triple::new(subject, predicate, object))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::vocabulary::{xsd, RDF_TYPE};

    fn sample_sink() -> StatementSink {
        let mut sink = StatementSink::new();
        let subj = "http://placeholder.com/publication/p1";
        sink.add(subj, RDF_TYPE, Term::uri("http://purl.org/ontology/bibo/Book"));
        sink.add(
            subj,
            "http://placeholder.com/ontology#title",
            Term::literal_with_lang("Tittel", Some("nb")),
        );
        sink.add(
            subj,
            "http://placeholder.com/ontology#pagecount",
            Term::typed_literal("309", xsd::INTEGER),
        );
        sink
    }

    #[test]
    fn test_term_construction() {
        assert!(!Term::uri("http://example.org/foo").is_literal());
        assert!(Term::literal("hello").is_literal());
        assert_eq!(Term::literal_with_lang("x", None), Term::literal("x"));
        assert_eq!(Term::uri("http://example.org/").as_uri(), Some("http://example.org/"));
    }

    #[test]
    fn test_statement_display_ntriples() {
        let sink = sample_sink();
        let lines: Vec<String> = sink.iter().map(ToString::to_string).collect();
        assert_eq!(
            lines[0],
            "<http://placeholder.com/publication/p1> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://purl.org/ontology/bibo/Book> ."
        );
        assert!(lines[1].ends_with("\"Tittel\"@nb ."));
        assert!(lines[2].ends_with("\"309\"^^<http://www.w3.org/2001/XMLSchema#integer> ."));
    }

    #[test]
    fn test_literal_display_escapes_quotes() {
        assert_eq!(Term::literal("say \"hi\"").to_string(), r#""say \"hi\"""#);
    }

    #[test]
    fn test_serialize_ntriples() {
        let nt = sample_sink()
            .serialize(RdfFormat::NTriples)
            .expect("serialization failed");
        assert_eq!(nt.lines().count(), 3);
        assert!(nt.contains("<http://placeholder.com/publication/p1>"));
        assert!(nt.contains("\"Tittel\"@nb"));
    }

    #[test]
    fn test_extend_appends_in_order() {
        let mut sink = StatementSink::new();
        sink.add("http://example.org/a", RDF_TYPE, Term::uri("http://example.org/A"));
        sink.extend(sample_sink());
        assert_eq!(sink.len(), 4);
        assert_eq!(sink.as_slice()[0].subject, "http://example.org/a");
        assert_eq!(sink.as_slice()[3].object, Term::typed_literal("309", xsd::INTEGER));
    }

    #[test]
    fn test_serialize_turtle() {
        let ttl = sample_sink()
            .serialize(RdfFormat::Turtle)
            .expect("serialization failed");
        assert!(ttl.contains("Tittel"));
    }

    #[test]
    fn test_serialize_rejects_invalid_iri() {
        let mut sink = StatementSink::new();
        sink.add("not an iri", RDF_TYPE, Term::literal("x"));
        assert!(matches!(
            sink.serialize(RdfFormat::NTriples),
            Err(MarcRdfError::Serialization(_))
        ));
    }
}
