//! Mapping-driven conversion of MARC records to RDF.
//!
//! A mapping document says, tag by tag and subfield by subfield, which
//! statements a record produces: the predicate (fixed, or chosen from a sibling
//! subfield or the indicators), how raw values become objects (substrings,
//! regex split/match/substitute, combining siblings, slugging, hashing) and
//! which objects become nodes of their own with a nested subgraph.
//!
//! # Quick Start
//!
//! ```ignore
//! use marcrdf::marcxml::read_marcxml_file;
//! use marcrdf::mapper::{Converter, ConverterConfig, RdfFormat, Vocabulary};
//!
//! let converter = Converter::from_mapping_path(
//!     "mapping.yaml",
//!     &Vocabulary::standard(),
//!     ConverterConfig::new().with_record_type("BIBO.Document"),
//! )?;
//!
//! for record in read_marcxml_file("records.marcxml")? {
//!     let statements = converter.convert(&record)?;
//!     println!("{}", statements.serialize(RdfFormat::NTriples)?);
//! }
//! ```
//!
//! # Pieces
//!
//! - `document`: YAML/JSON mapping documents and their compilation
//! - `mapping`: the compiled mapping tree
//! - `vocabulary`: prefix → namespace table and vocabulary terms
//! - `pipeline`: raw value → object strings
//! - `predicate`: static and conditional predicates
//! - `uri`: object URIs with literal fallback
//! - `relation`: nested subgraphs about generated objects
//! - `engine`: the per-record driver
//! - `rdf`: terms, statements and serialization
//! - `config`: converter options and output formats
//!
//! Mapping documents and vocabularies are loaded once and only read
//! afterwards; every record converts independently of the others.

mod config;
mod document;
mod engine;
mod mapping;
mod pipeline;
mod predicate;
mod rdf;
mod relation;
mod uri;
mod vocabulary;

pub use config::{ConverterConfig, RdfFormat, DEFAULT_HOST};
pub use document::MappingDocument;
pub use engine::{subject_uri, Converter};
pub use mapping::{
    code_matches, Combine, ConditionSpec, ControlFieldMapping, Datatype, Extraction,
    MappingSpec, ObjectSpec, PipelineConfig, PredicateSpec, RelationSpec, RuleBody,
    SubfieldRule, Substitution, SubstitutionTable, TagRule, UrlizeOptions,
    DEFAULT_URLIZE_STRIP,
};
pub use pipeline::{generate_objects, urlize};
pub use predicate::resolve_predicate;
pub use rdf::{Statement, StatementSink, Term};
pub use uri::build_uri;
pub use vocabulary::{xsd, VocabTerm, Vocabulary, VocabularyBuilder, BIBO, DC, RDF, RDFS, RDF_TYPE, XSD};

use crate::error::Result;
use crate::record::Record;

/// Converts one record with a compiled mapping.
///
/// Shorthand for building a [`Converter`] and converting a single record.
/// Batch callers should build the converter once instead.
///
/// # Errors
///
/// Returns a configuration error if the mapping refers to unknown prefixes or
/// fails while being applied.
pub fn convert_record(
    record: &Record,
    mapping: &MappingSpec,
    vocabulary: &Vocabulary,
    config: &ConverterConfig,
) -> Result<StatementSink> {
    Converter::new(mapping.clone(), vocabulary.clone(), config.clone())?.convert(record)
}
