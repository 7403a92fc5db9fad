//! Mapping documents in YAML or JSON.
//!
//! A document is read into loosely typed serde structures first, then
//! [`MappingDocument::compile`] checks it and produces a [`MappingSpec`]:
//! every regex compiled, every term parsed and checked against the vocabulary.
//! Keys the converter does not know are ignored.
//!
//! ```yaml
//! vocabularies:
//!   audience: "http://data.deichman.no/audience#"
//! tags:
//!   - "008":
//!       language:
//!         predicate: DC.language
//!         object: { substr_offset: 35, substr_length: 3, prefix: "http://lexvo.org/id/iso639-3/" }
//!         relation: { class: LVONT.Language }
//!   - "650":
//!       subfields:
//!         - x:
//!             predicate: ONTOLOGY.subject
//!             object: { datatype: uri, prefix: "http://placeholder.com/subject/", urlize: true }
//!             relation:
//!               class: ONTOLOGY.Subject
//!               subfields:
//!                 - a: { predicate: ONTOLOGY.label, object: { datatype: literal } }
//! ```

use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use regex::Regex;
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;

use crate::error::{MarcRdfError, Result};

use super::mapping::{
    Combine, ConditionSpec, ControlFieldMapping, Datatype, Extraction, MappingSpec, ObjectSpec,
    PipelineConfig, PredicateSpec, RelationSpec, RuleBody, SubfieldRule, Substitution,
    SubstitutionTable, TagRule, UrlizeOptions,
};
use super::vocabulary::{VocabTerm, Vocabulary};

/// A parsed, not yet compiled, mapping document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MappingDocument {
    /// Extra prefix → namespace bindings declared by the document.
    #[serde(default)]
    vocabularies: IndexMap<String, String>,
    /// Tag blocks in document order.
    #[serde(default)]
    tags: Vec<IndexMap<String, RawBlock>>,
}

/// A scalar read as text whatever its YAML/JSON type.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Scalar(String);

impl Scalar {
    fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ScalarVisitor;

        impl Visitor<'_> for ScalarVisitor {
            type Value = Scalar;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string, number or boolean")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Scalar, E> {
                Ok(Scalar(v))
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }
        }

        deserializer.deserialize_any(ScalarVisitor)
    }
}

/// A tag block: data-field blocks have a `subfields` list.
#[derive(Debug, Clone)]
enum RawBlock {
    Data(Vec<IndexMap<String, RawRule>>),
    Control(IndexMap<String, RawControlEntry>),
}

impl<'de> Deserialize<'de> for RawBlock {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        // serde_json is built with `preserve_order`, so entry order survives.
        let mut value = serde_json::Value::deserialize(deserializer)?;
        let block = match value.get_mut("subfields").map(serde_json::Value::take) {
            Some(subfields) => serde_json::from_value(subfields).map(RawBlock::Data),
            None => serde_json::from_value(value).map(RawBlock::Control),
        };
        block.map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawControlEntry {
    predicate: Option<Scalar>,
    #[serde(default)]
    object: RawObject,
    relation: Option<RawRelation>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawRule {
    predicate: Option<Scalar>,
    #[serde(default)]
    object: RawObject,
    conditions: Option<RawConditions>,
    relation: Option<RawRelation>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawRelation {
    class: Option<Scalar>,
    #[serde(default)]
    subfields: Vec<IndexMap<String, RawRule>>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawConditions {
    subfield: Option<IndexMap<String, RawTable>>,
    indicator: Option<RawIndicatorCondition>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawIndicatorCondition {
    default: Option<Scalar>,
    indicator1: Option<RawTable>,
    indicator2: Option<RawTable>,
}

/// `orig`/`subs`/`default` triple shared by conditions and substitutions.
#[derive(Debug, Clone, Deserialize)]
struct RawTable {
    orig: Option<Scalar>,
    #[serde(default)]
    subs: IndexMap<String, Scalar>,
    default: Option<Scalar>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawObject {
    datatype: Option<Scalar>,
    prefix: Option<Scalar>,
    lang: Option<Scalar>,
    substr_offset: Option<usize>,
    substr_length: Option<usize>,
    regex_split: Option<Scalar>,
    regex_match: Option<Scalar>,
    regex_substitute: Option<RawTable>,
    combine: Option<Vec<Scalar>>,
    combinestring: Option<Scalar>,
    regex_strip: Option<Scalar>,
    urlize: Option<bool>,
    no_downcase: Option<bool>,
    no_convert_spaces: Option<bool>,
    regexp: Option<Scalar>,
    md5: Option<bool>,
    lowercase: Option<bool>,
}

impl MappingDocument {
    /// Parses a YAML mapping document.
    ///
    /// # Errors
    ///
    /// Returns [`MarcRdfError::ParseError`] if the text is not a mapping document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| MarcRdfError::ParseError(format!("Failed to parse mapping YAML: {e}")))
    }

    /// Parses a JSON mapping document.
    ///
    /// # Errors
    ///
    /// Returns [`MarcRdfError::ParseError`] if the text is not a mapping document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| MarcRdfError::ParseError(format!("Failed to parse mapping JSON: {e}")))
    }

    /// Reads a mapping document; `.json` files are JSON, anything else YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        }
    }

    /// `base` extended with the prefixes declared by this document.
    #[must_use]
    pub fn vocabulary(&self, base: &Vocabulary) -> Vocabulary {
        Vocabulary::builder()
            .extend(base)
            .with_prefixes(self.vocabularies.iter())
            .build()
    }

    /// Number of tag blocks in the document.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.tags.iter().map(IndexMap::len).sum()
    }

    /// Compiles the document against `vocabulary`.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error found, wrapped with the tag and
    /// subfield of the offending rule.
    pub fn compile(&self, vocabulary: &Vocabulary) -> Result<MappingSpec> {
        let mut rules = Vec::with_capacity(self.block_count());
        for (tag, block) in self.tags.iter().flatten() {
            let body = match block {
                RawBlock::Data(subfields) => {
                    RuleBody::Data(compile_subfield_rules(tag, subfields, vocabulary)?)
                },
                RawBlock::Control(entries) => RuleBody::Control(
                    entries
                        .iter()
                        .map(|(name, entry)| compile_control_entry(name, entry, vocabulary))
                        .collect::<Result<_>>()
                        .map_err(|e| e.in_rule(tag, None))?,
                ),
            };
            rules.push(TagRule {
                tag: tag.clone(),
                body,
            });
        }
        Ok(MappingSpec { rules })
    }
}

fn compile_subfield_rules(
    tag: &str,
    subfields: &[IndexMap<String, RawRule>],
    vocabulary: &Vocabulary,
) -> Result<Vec<SubfieldRule>> {
    subfields
        .iter()
        .flatten()
        .map(|(code, rule)| {
            compile_rule(tag, code, rule, vocabulary).map_err(|e| e.in_rule(tag, Some(code)))
        })
        .collect()
}

fn compile_rule(
    tag: &str,
    code: &str,
    rule: &RawRule,
    vocabulary: &Vocabulary,
) -> Result<SubfieldRule> {
    let condition = match &rule.conditions {
        Some(conditions) => compile_conditions(conditions, vocabulary)?,
        None => None,
    };
    let predicate = match (condition, &rule.predicate) {
        (Some(condition), _) => PredicateSpec::Conditional(condition),
        (None, Some(predicate)) => PredicateSpec::Static(compile_term(predicate, vocabulary)?),
        (None, None) => {
            return Err(MarcRdfError::InvalidMapping(
                "rule has neither `predicate` nor `conditions`".into(),
            ))
        },
    };

    let relation = match &rule.relation {
        Some(relation) => Some(RelationSpec {
            class: compile_class(relation, vocabulary)?,
            subfields: compile_subfield_rules(tag, &relation.subfields, vocabulary)?,
        }),
        None => None,
    };

    Ok(SubfieldRule {
        code: code.to_string(),
        predicate,
        object: compile_object(&rule.object)?,
        relation,
    })
}

fn compile_control_entry(
    name: &str,
    entry: &RawControlEntry,
    vocabulary: &Vocabulary,
) -> Result<ControlFieldMapping> {
    let predicate = entry.predicate.as_ref().ok_or_else(|| {
        MarcRdfError::InvalidMapping(format!("control mapping `{name}` has no `predicate`"))
    })?;
    let relation_class = match &entry.relation {
        Some(relation) => Some(compile_class(relation, vocabulary)?),
        None => None,
    };

    Ok(ControlFieldMapping {
        name: name.to_string(),
        predicate: compile_term(predicate, vocabulary)?,
        object: compile_object(&entry.object)?,
        relation_class,
    })
}

fn compile_class(relation: &RawRelation, vocabulary: &Vocabulary) -> Result<VocabTerm> {
    let class = relation
        .class
        .as_ref()
        .ok_or_else(|| MarcRdfError::InvalidMapping("relation has no `class`".into()))?;
    compile_term(class, vocabulary)
}

/// A subfield condition wins over an indicator condition.
fn compile_conditions(
    conditions: &RawConditions,
    vocabulary: &Vocabulary,
) -> Result<Option<ConditionSpec>> {
    if let Some(by_subfield) = &conditions.subfield {
        let mut entries = by_subfield.iter();
        let (Some((code, table)), None) = (entries.next(), entries.next()) else {
            return Err(MarcRdfError::InvalidMapping(
                "subfield condition must name exactly one subfield".into(),
            ));
        };
        return Ok(Some(ConditionSpec::Subfield {
            code: code.clone(),
            table: compile_term_table(table, vocabulary)?,
            default: compile_default(table.default.as_ref(), vocabulary)?,
        }));
    }

    if let Some(by_indicator) = &conditions.indicator {
        let table = |raw: &Option<RawTable>| {
            raw.as_ref()
                .map(|raw| compile_term_table(raw, vocabulary))
                .transpose()
        };
        return Ok(Some(ConditionSpec::Indicator {
            indicator1: table(&by_indicator.indicator1)?,
            indicator2: table(&by_indicator.indicator2)?,
            default: compile_default(by_indicator.default.as_ref(), vocabulary)?,
        }));
    }

    Ok(None)
}

fn compile_default(default: Option<&Scalar>, vocabulary: &Vocabulary) -> Result<VocabTerm> {
    let default = default
        .ok_or_else(|| MarcRdfError::InvalidMapping("condition has no `default`".into()))?;
    compile_term(default, vocabulary)
}

fn compile_term_table(
    table: &RawTable,
    vocabulary: &Vocabulary,
) -> Result<SubstitutionTable<VocabTerm>> {
    let subs = table
        .subs
        .iter()
        .map(|(key, term)| Ok((key.clone(), compile_term(term, vocabulary)?)))
        .collect::<Result<_>>()?;
    Ok(SubstitutionTable::new(compile_orig(table)?, subs))
}

fn compile_orig(table: &RawTable) -> Result<Regex> {
    let orig = table
        .orig
        .as_ref()
        .ok_or_else(|| MarcRdfError::InvalidMapping("table has no `orig` pattern".into()))?;
    compile_regex(orig.as_str())
}

fn compile_term(term: &Scalar, vocabulary: &Vocabulary) -> Result<VocabTerm> {
    let term = VocabTerm::parse(term.as_str())?;
    vocabulary.check(&term)?;
    Ok(term)
}

fn compile_regex(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| MarcRdfError::InvalidRegex {
        pattern: pattern.to_string(),
        source,
    })
}

fn compile_object(raw: &RawObject) -> Result<ObjectSpec> {
    let extraction = match (raw.substr_offset, raw.substr_length) {
        (Some(offset), Some(length)) => Extraction::Substring { offset, length },
        (Some(_), None) | (None, Some(_)) => {
            return Err(MarcRdfError::InvalidMapping(
                "`substr_offset` and `substr_length` must be given together".into(),
            ))
        },
        (None, None) => match (&raw.regex_split, &raw.regex_match) {
            (Some(split), _) => Extraction::Split(compile_regex(split.as_str())?),
            (None, Some(pattern)) => Extraction::Match(compile_regex(pattern.as_str())?),
            (None, None) => Extraction::Whole,
        },
    };

    let substitute = match &raw.regex_substitute {
        Some(table) => Some(Substitution {
            table: SubstitutionTable::new(
                compile_orig(table)?,
                table
                    .subs
                    .iter()
                    .map(|(key, value)| (key.clone(), value.0.clone()))
                    .collect(),
            ),
            default: table.default.as_ref().map(|d| d.0.clone()),
        }),
        None => None,
    };

    let combine = raw.combine.as_ref().map(|codes| Combine {
        codes: codes.iter().map(|code| code.0.clone()).collect(),
        separator: raw
            .combinestring
            .as_ref()
            .map(|s| s.0.clone())
            .unwrap_or_default(),
    });

    let urlize = if raw.urlize.unwrap_or(false) {
        let strip = match &raw.regexp {
            Some(pattern) => compile_regex(pattern.as_str())?,
            None => UrlizeOptions::default().strip,
        };
        Some(UrlizeOptions {
            downcase: !raw.no_downcase.unwrap_or(false),
            convert_spaces: !raw.no_convert_spaces.unwrap_or(false),
            strip,
        })
    } else {
        None
    };

    Ok(ObjectSpec {
        datatype: raw
            .datatype
            .as_ref()
            .map(|name| Datatype::from_name(name.as_str())),
        prefix: raw.prefix.as_ref().map(|p| p.0.clone()).unwrap_or_default(),
        language: raw.lang.as_ref().map(|l| l.0.clone()),
        pipeline: PipelineConfig {
            extraction,
            substitute,
            combine,
            strip: raw
                .regex_strip
                .as_ref()
                .map(|pattern| compile_regex(pattern.as_str()))
                .transpose()?,
            urlize,
            md5: raw.md5.unwrap_or(false),
            lowercase: raw.lowercase.unwrap_or(false),
        },
    })
}
