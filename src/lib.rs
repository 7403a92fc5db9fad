#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

//! # marcrdf: mapping-driven MARC to RDF
//!
//! Converts MARC bibliographic records to RDF statements according to a
//! declarative mapping document.
//!
//! ## Quick Start
//!
//! ```
//! use marcrdf::mapper::{Converter, ConverterConfig, MappingDocument, Vocabulary};
//! use marcrdf::marcxml::marcxml_to_record;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let doc = MappingDocument::from_yaml_str(r#"
//! tags:
//!   - "650":
//!       subfields:
//!         - x:
//!             predicate: ONTOLOGY.subject
//!             object:
//!               datatype: literal
//! "#)?;
//! let vocabulary = Vocabulary::standard();
//! let converter = Converter::new(doc.compile(&vocabulary)?, vocabulary, ConverterConfig::default())?;
//!
//! let record = marcxml_to_record(r#"<record>
//!   <controlfield tag="001">123456</controlfield>
//!   <datafield tag="650" ind1=" " ind2=" ">
//!     <subfield code="x">Cats</subfield>
//!     <subfield code="x">Dogs</subfield>
//!   </datafield>
//! </record>"#)?;
//!
//! let statements = converter.convert(&record)?;
//! assert_eq!(statements.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`record`]: MARC record structures (`Record`, `Field`, `Subfield`)
//! - [`marcxml`]: Reading records from MARCXML
//! - [`mapper`]: Mapping documents, the conversion engine and RDF output
//! - [`error`]: Error types and result type

pub mod error;
pub mod mapper;
pub mod marcxml;
/// MARC record structures (`Record`, `Field`, `Subfield`)
pub mod record;

pub use error::{MarcRdfError, Result};
pub use mapper::{Converter, ConverterConfig, MappingDocument, StatementSink, Vocabulary};
pub use record::{ControlField, DataField, Field, Record, RecordBuilder, Subfield};
