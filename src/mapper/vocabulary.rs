//! Vocabulary prefixes and term resolution.
//!
//! Mapping documents name predicates and classes as `PREFIX.localName`
//! (for example `ONTOLOGY.subject` or `DC.contributor`). Those strings are
//! parsed into [`VocabTerm`]s when the mapping is loaded and expanded through an
//! explicit, immutable [`Vocabulary`] table during conversion.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::error::{MarcRdfError, Result};

/// RDF namespace.
pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

/// RDF Schema namespace.
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";

/// XML Schema namespace.
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";

/// Dublin Core terms namespace.
pub const DC: &str = "http://purl.org/dc/terms/";

/// Bibliographic Ontology namespace.
pub const BIBO: &str = "http://purl.org/ontology/bibo/";

/// `rdf:type`.
pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

/// XSD datatype IRIs used for typed literals.
pub mod xsd {
    /// `xsd:integer`
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
    /// `xsd:float`
    pub const FLOAT: &str = "http://www.w3.org/2001/XMLSchema#float";
    /// `xsd:gYear`
    pub const G_YEAR: &str = "http://www.w3.org/2001/XMLSchema#gYear";
}

/// Namespaces of the catalogue deployment the mapping format was written for.
const STANDARD_PREFIXES: &[(&str, &str)] = &[
    ("duo", "http://data.deichman.no/duo#"),
    ("ontology", "http://placeholder.com/ontology#"),
    ("raw", "http://placeholder.com/raw#"),
    ("placeholder", "http://placeholder.com/"),
    ("lvont", "http://lexvo.org/ontology#"),
    ("itemsubfield", "http://placeholder.com/itemSubfieldCode/"),
    ("role", "http://data.deichman.no/role#"),
    ("migration", "http://migration.deichman.no/"),
];

/// A vocabulary term as written in a mapping document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VocabTerm {
    /// `PREFIX.localName`; the prefix is stored lowercased.
    Prefixed {
        /// Vocabulary prefix
        prefix: String,
        /// Local name appended to the namespace
        local: String,
    },
    /// An absolute IRI used verbatim.
    Iri(String),
}

impl VocabTerm {
    /// Parses a term string.
    ///
    /// Strings containing `://` are absolute IRIs; everything else must be
    /// `PREFIX.localName` with a non-empty prefix and local name.
    ///
    /// # Errors
    ///
    /// Returns [`MarcRdfError::InvalidTerm`] for anything else.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.contains("://") {
            return Ok(Self::Iri(s.to_string()));
        }
        match s.split_once('.') {
            Some((prefix, local))
                if !prefix.is_empty()
                    && !local.is_empty()
                    && prefix
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') =>
            {
                Ok(Self::Prefixed {
                    prefix: prefix.to_ascii_lowercase(),
                    local: local.to_string(),
                })
            },
            _ => Err(MarcRdfError::InvalidTerm(format!(
                "`{s}` is neither PREFIX.localName nor an absolute IRI"
            ))),
        }
    }
}

impl FromStr for VocabTerm {
    type Err = MarcRdfError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for VocabTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prefixed { prefix, local } => write!(f, "{}.{local}", prefix.to_uppercase()),
            Self::Iri(iri) => f.write_str(iri),
        }
    }
}

/// Immutable prefix → namespace table.
///
/// Built once with [`VocabularyBuilder`] before any conversion and then only
/// read. Prefix lookup is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    prefixes: IndexMap<String, String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::core()
    }
}

impl Vocabulary {
    /// Creates a builder seeded with the core namespaces.
    #[must_use]
    pub fn builder() -> VocabularyBuilder {
        VocabularyBuilder {
            prefixes: Self::core().prefixes,
        }
    }

    /// The core namespaces: `rdf`, `rdfs`, `xsd`, `dc` and `bibo`.
    #[must_use]
    pub fn core() -> Self {
        let prefixes = [
            ("rdf", RDF),
            ("rdfs", RDFS),
            ("xsd", XSD),
            ("dc", DC),
            ("bibo", BIBO),
        ]
        .into_iter()
        .map(|(p, ns)| (p.to_string(), ns.to_string()))
        .collect();
        Self { prefixes }
    }

    /// The core namespaces plus the catalogue deployment prefixes
    /// (`ontology`, `raw`, `migration`, ...).
    #[must_use]
    pub fn standard() -> Self {
        Self::builder()
            .with_prefixes(STANDARD_PREFIXES.iter().copied())
            .build()
    }

    /// Namespace bound to `prefix`, if any.
    #[must_use]
    pub fn namespace(&self, prefix: &str) -> Option<&str> {
        self.prefixes
            .get(&prefix.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Expands a term to an IRI string.
    ///
    /// # Errors
    ///
    /// Returns [`MarcRdfError::UnknownPrefix`] if the prefix is not bound.
    pub fn resolve(&self, term: &VocabTerm) -> Result<String> {
        match term {
            VocabTerm::Prefixed { prefix, local } => self
                .namespace(prefix)
                .map(|ns| format!("{ns}{local}"))
                .ok_or_else(|| MarcRdfError::UnknownPrefix(prefix.clone())),
            VocabTerm::Iri(iri) => Ok(iri.clone()),
        }
    }

    /// Checks that a term can be resolved without building the IRI.
    ///
    /// # Errors
    ///
    /// Returns [`MarcRdfError::UnknownPrefix`] if the prefix is not bound.
    pub fn check(&self, term: &VocabTerm) -> Result<()> {
        match term {
            VocabTerm::Prefixed { prefix, .. } if self.namespace(prefix).is_none() => {
                Err(MarcRdfError::UnknownPrefix(prefix.clone()))
            },
            _ => Ok(()),
        }
    }

    /// Iterates over `(prefix, namespace)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes.iter().map(|(p, ns)| (p.as_str(), ns.as_str()))
    }

    /// Number of bound prefixes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    /// Returns true if no prefix is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

/// Builder for [`Vocabulary`].
#[derive(Debug, Clone)]
pub struct VocabularyBuilder {
    prefixes: IndexMap<String, String>,
}

impl VocabularyBuilder {
    /// Binds `prefix` to `namespace`; a later binding replaces an earlier one.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl AsRef<str>, namespace: impl Into<String>) -> Self {
        self.prefixes
            .insert(prefix.as_ref().to_ascii_lowercase(), namespace.into());
        self
    }

    /// Binds every `(prefix, namespace)` pair.
    #[must_use]
    pub fn with_prefixes<P, N>(self, pairs: impl IntoIterator<Item = (P, N)>) -> Self
    where
        P: AsRef<str>,
        N: Into<String>,
    {
        pairs
            .into_iter()
            .fold(self, |builder, (p, ns)| builder.with_prefix(p, ns))
    }

    /// Adds every binding of another vocabulary.
    #[must_use]
    pub fn extend(self, other: &Vocabulary) -> Self {
        self.with_prefixes(other.iter())
    }

    /// Finishes the table.
    #[must_use]
    pub fn build(self) -> Vocabulary {
        Vocabulary {
            prefixes: self.prefixes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prefixed_term() {
        let term = VocabTerm::parse("ONTOLOGY.subject").expect("valid term");
        assert_eq!(
            term,
            VocabTerm::Prefixed {
                prefix: "ontology".into(),
                local: "subject".into()
            }
        );
        assert_eq!(term.to_string(), "ONTOLOGY.subject");
    }

    #[test]
    fn test_parse_iri_term() {
        let term: VocabTerm = "http://example.org/ns#thing".parse().expect("valid term");
        assert_eq!(term, VocabTerm::Iri("http://example.org/ns#thing".into()));
    }

    #[test]
    fn test_parse_rejects_malformed_terms() {
        for bad in ["", "subject", ".subject", "ONTOLOGY.", "RDF::DC.title"] {
            assert!(VocabTerm::parse(bad).is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let vocab = Vocabulary::standard();
        let term = VocabTerm::parse("DC.contributor").expect("valid term");
        assert_eq!(
            vocab.resolve(&term).expect("resolves"),
            "http://purl.org/dc/terms/contributor"
        );
        assert_eq!(vocab.namespace("Ontology"), Some("http://placeholder.com/ontology#"));
    }

    #[test]
    fn test_unknown_prefix() {
        let vocab = Vocabulary::core();
        let term = VocabTerm::parse("ONTOLOGY.subject").expect("valid term");
        assert!(matches!(
            vocab.resolve(&term),
            Err(MarcRdfError::UnknownPrefix(p)) if p == "ontology"
        ));
        assert!(vocab.check(&term).is_err());
    }

    #[test]
    fn test_builder_overrides() {
        let vocab = Vocabulary::builder()
            .extend(&Vocabulary::standard())
            .with_prefix("MIGRATION", "http://placeholder.com/migration#")
            .build();
        assert_eq!(vocab.namespace("migration"), Some("http://placeholder.com/migration#"));
        assert_eq!(vocab.len(), Vocabulary::standard().len());
    }

    #[test]
    fn test_namespace_trailing_delimiter() {
        for (_, ns) in Vocabulary::standard().iter() {
            assert!(ns.ends_with('/') || ns.ends_with('#'), "{ns}");
        }
    }
}
