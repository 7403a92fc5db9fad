//! Configuration options for record conversion.
//!
//! This module provides the [`ConverterConfig`] struct which controls how
//! subjects are minted for converted records and how the resulting statements
//! are serialized.

use std::fmt;
use std::str::FromStr;

use crate::error::MarcRdfError;

/// Host used for minted subject URIs unless configured otherwise.
pub const DEFAULT_HOST: &str = "placeholder.com";

/// Output format for RDF serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RdfFormat {
    /// RDF/XML format (application/rdf+xml)
    RdfXml,
    /// JSON-LD format (application/ld+json)
    JsonLd,
    /// Turtle format (text/turtle)
    Turtle,
    /// N-Triples format (application/n-triples) - one statement per line
    #[default]
    NTriples,
}

impl fmt::Display for RdfFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RdfXml => write!(f, "RDF/XML"),
            Self::JsonLd => write!(f, "JSON-LD"),
            Self::Turtle => write!(f, "Turtle"),
            Self::NTriples => write!(f, "N-Triples"),
        }
    }
}

impl FromStr for RdfFormat {
    type Err = MarcRdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rdfxml" | "rdf/xml" | "xml" | "rdf" => Ok(Self::RdfXml),
            "jsonld" | "json-ld" => Ok(Self::JsonLd),
            "turtle" | "ttl" => Ok(Self::Turtle),
            "ntriples" | "n-triples" | "nt" => Ok(Self::NTriples),
            other => Err(MarcRdfError::ParseError(format!(
                "Unknown RDF format `{other}`"
            ))),
        }
    }
}

impl RdfFormat {
    /// Returns the typical file extension for this RDF format.
    #[must_use]
    pub const fn file_extension(&self) -> &'static str {
        match self {
            Self::RdfXml => "rdf",
            Self::JsonLd => "jsonld",
            Self::Turtle => "ttl",
            Self::NTriples => "nt",
        }
    }
}

/// Configuration for record conversion.
///
/// # Examples
///
/// ```
/// use marcrdf::mapper::{ConverterConfig, RdfFormat};
///
/// let config = ConverterConfig::new()
///     .with_host("data.example.org")
///     .with_record_type("ONTOLOGY.Publication")
///     .with_output_format(RdfFormat::Turtle);
///
/// assert_eq!(config.host, "data.example.org");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterConfig {
    /// Host of minted subject URIs: `http://{host}/publication/p{md5}`.
    pub host: String,

    /// Class terms (`PREFIX.localName` or absolute IRIs) asserted as
    /// `rdf:type` of every record subject, before any mapped statement.
    pub record_types: Vec<String>,

    /// Output format for serialization by batch drivers.
    pub output_format: RdfFormat,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            record_types: Vec::new(),
            output_format: RdfFormat::default(),
        }
    }
}

impl ConverterConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the host of minted subject URIs.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Adds a class asserted for every record subject.
    #[must_use]
    pub fn with_record_type(mut self, class: impl Into<String>) -> Self {
        self.record_types.push(class.into());
        self
    }

    /// Sets the output format.
    #[must_use]
    pub const fn with_output_format(mut self, format: RdfFormat) -> Self {
        self.output_format = format;
        self
    }
}
