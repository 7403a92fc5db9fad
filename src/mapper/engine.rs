//! Mapping-driven record conversion.
//!
//! [`Converter`] walks a record's tags in record order, applies every mapping
//! block for the tag to every field instance and collects the statements in
//! assertion order. The converter holds only read-only state, so one instance
//! can convert records from several threads at once.

use std::path::Path;

use md5::{Digest, Md5};
use tracing::{debug, trace};

use crate::error::Result;
use crate::record::{DataField, Field, Record};

use super::config::ConverterConfig;
use super::document::MappingDocument;
use super::mapping::{
    ControlFieldMapping, Datatype, MappingSpec, ObjectSpec, PredicateSpec, RuleBody, SubfieldRule,
};
use super::pipeline::generate_objects;
use super::predicate::resolve_predicate;
use super::rdf::{StatementSink, Term};
use super::relation::{expand_relation, Occurrence};
use super::uri::build_uri;
use super::vocabulary::{xsd, VocabTerm, Vocabulary, RDF_TYPE};

/// Converts records to statements with a compiled mapping.
///
/// # Examples
///
/// ```
/// use marcrdf::mapper::{Converter, ConverterConfig, MappingDocument, Vocabulary};
/// use marcrdf::record::{DataField, Record};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let doc = MappingDocument::from_yaml_str(r#"
/// tags:
///   - "245":
///       subfields:
///         - a:
///             predicate: DC.title
///             object:
///               datatype: literal
///               lang: en
/// "#)?;
/// let vocabulary = Vocabulary::standard();
/// let converter = Converter::new(doc.compile(&vocabulary)?, vocabulary, ConverterConfig::default())?;
///
/// let record = Record::builder()
///     .control_field_str("001", "123456")
///     .field(DataField::builder("245", '1', '0').subfield_str('a', "Sult").build())
///     .build();
///
/// let statements = converter.convert(&record)?;
/// assert_eq!(
///     statements.as_slice()[0].to_string(),
///     "<http://placeholder.com/publication/pe10adc3949ba59abbe56e057f20f883e> \
///      <http://purl.org/dc/terms/title> \"Sult\"@en ."
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Converter {
    mapping: MappingSpec,
    vocabulary: Vocabulary,
    config: ConverterConfig,
    record_types: Vec<String>,
}

impl Converter {
    /// Creates a converter.
    ///
    /// Every term of the mapping and every configured record type is checked
    /// against `vocabulary` here, so unknown prefixes are reported before any
    /// record is converted.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unparsable or unresolvable term.
    pub fn new(
        mapping: MappingSpec,
        vocabulary: Vocabulary,
        config: ConverterConfig,
    ) -> Result<Self> {
        check_mapping(&mapping, &vocabulary)?;
        let record_types = config
            .record_types
            .iter()
            .map(|class| vocabulary.resolve(&VocabTerm::parse(class)?))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            mapping,
            vocabulary,
            config,
            record_types,
        })
    }

    /// Loads a mapping document from `path` and builds a converter.
    ///
    /// Prefixes declared by the document are added to `vocabulary` first.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read, parsed or compiled.
    pub fn from_mapping_path(
        path: impl AsRef<Path>,
        vocabulary: &Vocabulary,
        config: ConverterConfig,
    ) -> Result<Self> {
        let document = MappingDocument::from_path(path)?;
        let vocabulary = document.vocabulary(vocabulary);
        let mapping = document.compile(&vocabulary)?;
        Self::new(mapping, vocabulary, config)
    }

    /// The compiled mapping.
    #[must_use]
    pub fn mapping(&self) -> &MappingSpec {
        &self.mapping
    }

    /// The vocabulary terms are resolved against.
    #[must_use]
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// The converter configuration.
    #[must_use]
    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Subject URI of `record`, minted from its control number.
    #[must_use]
    pub fn subject_uri(&self, record: &Record) -> String {
        subject_uri(&self.config.host, record.control_number().unwrap_or_default())
    }

    /// Converts one record.
    ///
    /// # Errors
    ///
    /// Returns a configuration error, wrapped with the tag and subfield of
    /// the rule that raised it. Data anomalies never fail a conversion.
    pub fn convert(&self, record: &Record) -> Result<StatementSink> {
        RecordConversion::new(self, record).run()
    }
}

/// Mints the subject URI for a record identifier.
///
/// The identifier is read as an integer (leading whitespace skipped, leading
/// zeros dropped, anything non-numeric reads as `0`) and its MD5 digest forms
/// the local name.
///
/// ```
/// use marcrdf::mapper::subject_uri;
///
/// assert_eq!(
///     subject_uri("placeholder.com", "0123456"),
///     "http://placeholder.com/publication/pe10adc3949ba59abbe56e057f20f883e"
/// );
/// ```
#[must_use]
pub fn subject_uri(host: &str, identifier: &str) -> String {
    let digest = Md5::digest(integer_reading(identifier).as_bytes());
    format!("http://{host}/publication/p{digest:x}")
}

fn integer_reading(identifier: &str) -> String {
    let s = identifier.trim_start();
    let (negative, rest) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    let digits = digits.trim_start_matches('0');
    match (digits.is_empty(), negative) {
        (true, _) => "0".to_string(),
        (false, true) => format!("-{digits}"),
        (false, false) => digits.to_string(),
    }
}

/// Object term for a generated value according to its datatype.
///
/// Without a declared datatype the value is a plain literal.
pub(crate) fn object_term(value: String, object: &ObjectSpec) -> Term {
    match object.datatype {
        Some(Datatype::Uri) => build_uri(&value, &object.prefix),
        Some(Datatype::Integer) => Term::typed_literal(value, xsd::INTEGER),
        Some(Datatype::Float) => Term::typed_literal(value, xsd::FLOAT),
        Some(Datatype::GYear) => Term::typed_literal(value, xsd::G_YEAR),
        Some(Datatype::Literal) | None => {
            Term::literal_with_lang(value, object.language.as_deref())
        },
    }
}

fn check_mapping(mapping: &MappingSpec, vocabulary: &Vocabulary) -> Result<()> {
    for rule in &mapping.rules {
        match &rule.body {
            RuleBody::Control(entries) => {
                for entry in entries {
                    vocabulary
                        .check(&entry.predicate)
                        .and_then(|()| {
                            entry
                                .relation_class
                                .as_ref()
                                .map_or(Ok(()), |class| vocabulary.check(class))
                        })
                        .map_err(|e| e.in_rule(&rule.tag, None))?;
                }
            },
            RuleBody::Data(rules) => {
                for subfield_rule in rules {
                    check_subfield_rule(subfield_rule, vocabulary)
                        .map_err(|e| e.in_rule(&rule.tag, Some(&subfield_rule.code)))?;
                }
            },
        }
    }
    Ok(())
}

fn check_subfield_rule(rule: &SubfieldRule, vocabulary: &Vocabulary) -> Result<()> {
    match &rule.predicate {
        PredicateSpec::Static(term) => vocabulary.check(term)?,
        PredicateSpec::Conditional(condition) => {
            for term in condition.terms() {
                vocabulary.check(term)?;
            }
        },
    }
    if let Some(relation) = &rule.relation {
        vocabulary.check(&relation.class)?;
        for nested in &relation.subfields {
            check_subfield_rule(nested, vocabulary)?;
        }
    }
    Ok(())
}

/// Conversion state for one record.
struct RecordConversion<'a> {
    converter: &'a Converter,
    record: &'a Record,
    subject: String,
    sink: StatementSink,
}

impl<'a> RecordConversion<'a> {
    fn new(converter: &'a Converter, record: &'a Record) -> Self {
        Self {
            converter,
            record,
            subject: converter.subject_uri(record),
            sink: StatementSink::new(),
        }
    }

    fn run(mut self) -> Result<StatementSink> {
        for class in &self.converter.record_types {
            self.sink
                .add(self.subject.as_str(), RDF_TYPE, Term::uri(class.as_str()));
        }

        let mapping = &self.converter.mapping;
        for tag in self.record.tags() {
            if !mapping.has_tag(tag) {
                debug!(tag, "no mapping for tag, skipping");
                continue;
            }
            let fields = self.record.fields_by_tag(tag);
            for rule in mapping.rules_for(tag) {
                for field in fields {
                    let before = self.sink.len();
                    match &rule.body {
                        RuleBody::Control(entries) => self
                            .apply_control(entries, field)
                            .map_err(|e| e.in_rule(tag, None))?,
                        RuleBody::Data(rules) => self.apply_data(rules, field)?,
                    }
                    trace!(tag, statements = self.sink.len() - before, "field mapped");
                }
            }
        }

        Ok(self.sink)
    }

    fn apply_control(&mut self, entries: &[ControlFieldMapping], field: &Field) -> Result<()> {
        let value = field.value();
        if value.trim().is_empty() {
            return Ok(());
        }

        for entry in entries {
            let predicate = self.resolve(&entry.predicate)?;
            let objects = generate_objects(&value, field.as_data(), &entry.object.pipeline)?;
            for object in objects {
                if entry.object.datatype == Some(Datatype::Literal) {
                    let term = Term::literal_with_lang(object, entry.object.language.as_deref());
                    self.sink.add(self.subject.as_str(), predicate.as_str(), term);
                    continue;
                }

                let term = build_uri(&object, &entry.object.prefix);
                let object_uri = term.as_uri().map(str::to_string);
                self.sink.add(self.subject.as_str(), predicate.as_str(), term);

                if let Some(class) = &entry.relation_class {
                    match object_uri {
                        Some(uri) => {
                            let class = self.resolve(class)?;
                            self.sink.add(uri, RDF_TYPE, Term::uri(class));
                        },
                        None => debug!(
                            tag = field.tag(),
                            mapping = entry.name.as_str(),
                            "literal object, relation class not asserted"
                        ),
                    }
                }
            }
        }
        Ok(())
    }

    fn apply_data(&mut self, rules: &[SubfieldRule], field: &Field) -> Result<()> {
        let Some(field) = field.as_data() else {
            debug!(tag = field.tag(), "subfield mapping on a control field, skipping");
            return Ok(());
        };

        for rule in rules {
            self.apply_subfield_rule(rule, field)
                .map_err(|e| e.in_rule(&field.tag, Some(&rule.code)))?;
        }
        Ok(())
    }

    fn apply_subfield_rule(&mut self, rule: &SubfieldRule, field: &DataField) -> Result<()> {
        let predicate = self.resolve(resolve_predicate(&rule.predicate, field)?)?;

        for (index, subfield) in field.subfields.iter().enumerate() {
            if !rule.matches(subfield.code) || subfield.value.is_empty() {
                continue;
            }

            let objects = generate_objects(&subfield.value, Some(field), &rule.object.pipeline)?;
            for object in objects {
                let Some(relation) = &rule.relation else {
                    let term = object_term(object, &rule.object);
                    self.sink.add(self.subject.as_str(), predicate.as_str(), term);
                    continue;
                };

                let term = build_uri(&object, &rule.object.prefix);
                let object_uri = term.as_uri().map(str::to_string);
                self.sink.add(self.subject.as_str(), predicate.as_str(), term);

                match object_uri {
                    Some(uri) => expand_relation(
                        &self.converter.vocabulary,
                        &mut self.sink,
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
                        "literal object, relation not expanded"
                    ),
                }
            }
        }
        Ok(())
    }

    fn resolve(&self, term: &VocabTerm) -> Result<String> {
        self.converter.vocabulary.resolve(term)
    }
}
