//! Error types for mapping-driven RDF conversion.
//!
//! This module provides the [`MarcRdfError`] type for all library operations
//! and the [`Result`] convenience type.
//!
//! Errors fall into two groups. Configuration errors (bad regex, missing
//! substitution entry, unknown vocabulary prefix, structurally invalid mapping
//! node) are fatal and indicate a bug in the mapping document. Everything else
//! comes from the outer layers: reading records, serializing graphs, file I/O.
//! Data anomalies inside a record never surface as errors.

use thiserror::Error;

/// Error type for all library operations.
#[derive(Error, Debug)]
pub enum MarcRdfError {
    /// A regular expression in the mapping failed to compile.
    #[error("Invalid regex `{pattern}`: {source}")]
    InvalidRegex {
        /// The offending pattern as written in the mapping.
        pattern: String,
        /// Compilation error reported by the regex engine.
        #[source]
        source: regex::Error,
    },

    /// A pattern captured a key that has no entry in its substitution table.
    #[error("Substitution key `{0}` missing from mapping table")]
    MissingSubstitution(String),

    /// A term used a prefix that is not in the vocabulary table.
    #[error("Unknown vocabulary prefix `{0}`")]
    UnknownPrefix(String),

    /// A term string could not be parsed as `PREFIX.localName` or an absolute IRI.
    #[error("Invalid term: {0}")]
    InvalidTerm(String),

    /// A mapping node is structurally invalid.
    #[error("Invalid mapping: {0}")]
    InvalidMapping(String),

    /// A configuration error raised while applying the rule for a tag/subfield.
    #[error("Mapping for tag {tag}{}: {source}", subfield_suffix(.subfield))]
    Rule {
        /// Tag of the rule being applied.
        tag: String,
        /// Subfield code of the rule being applied, if any.
        subfield: Option<String>,
        /// The underlying configuration error.
        #[source]
        source: Box<MarcRdfError>,
    },

    /// Error while parsing an input document (records or mapping).
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Error while serializing statements.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error from the underlying source/destination.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl MarcRdfError {
    /// Returns true for errors caused by the mapping document itself.
    ///
    /// These abort a batch run; all other errors are local to one input.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        match self {
            Self::InvalidRegex { .. }
            | Self::MissingSubstitution(_)
            | Self::UnknownPrefix(_)
            | Self::InvalidTerm(_)
            | Self::InvalidMapping(_) => true,
            Self::Rule { source, .. } => source.is_configuration_error(),
            Self::ParseError(_) | Self::Serialization(_) | Self::IoError(_) => false,
        }
    }

    /// Wraps this error with the tag (and optional subfield) it was raised for.
    ///
    /// Errors that already carry context are returned unchanged.
    #[must_use]
    pub fn in_rule(self, tag: &str, subfield: Option<&str>) -> Self {
        match self {
            Self::Rule { .. } => self,
            other => Self::Rule {
                tag: tag.to_string(),
                subfield: subfield.map(str::to_string),
                source: Box::new(other),
            },
        }
    }
}

fn subfield_suffix(subfield: &Option<String>) -> String {
    subfield
        .as_ref()
        .map(|code| format!(" subfield {code}"))
        .unwrap_or_default()
}

/// Convenience type alias for [`std::result::Result`] with [`MarcRdfError`].
pub type Result<T> = std::result::Result<T, MarcRdfError>;
