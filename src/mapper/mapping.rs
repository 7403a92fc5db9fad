//! Compiled mapping specification.
//!
//! These types are the typed form of a mapping document: every regex is
//! compiled and every term parsed. They are produced by
//! [`MappingDocument::compile`](super::document::MappingDocument::compile) and
//! never change afterwards.

use std::collections::HashMap;

use regex::Regex;

use crate::error::{MarcRdfError, Result};

use super::vocabulary::VocabTerm;

/// Ordered list of tag rules. Several rules may target the same tag.
#[derive(Debug, Clone, Default)]
pub struct MappingSpec {
    /// Rules in document order.
    pub rules: Vec<TagRule>,
}

impl MappingSpec {
    /// Rules for `tag`, in document order.
    pub fn rules_for<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a TagRule> + 'a {
        self.rules.iter().filter(move |rule| rule.tag == tag)
    }

    /// Returns true if any rule targets `tag`.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.rules.iter().any(|rule| rule.tag == tag)
    }
}

/// One mapping block for a tag.
#[derive(Debug, Clone)]
pub struct TagRule {
    /// MARC tag the block applies to.
    pub tag: String,
    /// Control- or data-field mapping.
    pub body: RuleBody,
}

/// What a tag rule maps.
#[derive(Debug, Clone)]
pub enum RuleBody {
    /// Named control-field mappings applied to the field's scalar value.
    Control(Vec<ControlFieldMapping>),
    /// Subfield-by-subfield mapping of a data field.
    Data(Vec<SubfieldRule>),
}

/// Maps a control field's scalar value.
#[derive(Debug, Clone)]
pub struct ControlFieldMapping {
    /// Entry name in the mapping document (informational).
    pub name: String,
    /// Predicate of the asserted statements.
    pub predicate: VocabTerm,
    /// How objects are generated.
    pub object: ObjectSpec,
    /// Class asserted for each generated object URI.
    pub relation_class: Option<VocabTerm>,
}

/// Maps every occurrence of one subfield code.
#[derive(Debug, Clone)]
pub struct SubfieldRule {
    /// Subfield code as written in the mapping.
    pub code: String,
    /// Static or conditional predicate.
    pub predicate: PredicateSpec,
    /// How objects are generated.
    pub object: ObjectSpec,
    /// Nested subgraph about each generated object URI.
    pub relation: Option<RelationSpec>,
}

impl SubfieldRule {
    /// Returns true if this rule applies to subfield `code`.
    #[must_use]
    pub fn matches(&self, code: char) -> bool {
        code_matches(&self.code, code)
    }
}

/// Returns true if a mapping key names the single subfield code `code`.
///
/// Keys longer than one character never match.
#[must_use]
pub fn code_matches(key: &str, code: char) -> bool {
    let mut chars = key.chars();
    chars.next() == Some(code) && chars.next().is_none()
}

/// Predicate of a subfield rule.
#[derive(Debug, Clone)]
pub enum PredicateSpec {
    /// Always the same term.
    Static(VocabTerm),
    /// Chosen per field instance.
    Conditional(ConditionSpec),
}

/// Conditional predicate selection.
#[derive(Debug, Clone)]
pub enum ConditionSpec {
    /// Driven by the value of a sibling subfield.
    Subfield {
        /// Code of the sibling subfield to read.
        code: String,
        /// Pattern and substitutions applied to the normalized value.
        table: SubstitutionTable<VocabTerm>,
        /// Used when the sibling is absent, empty or does not match.
        default: VocabTerm,
    },
    /// Driven by the field indicators; indicator 2 is evaluated last and wins.
    Indicator {
        /// Table for indicator 1.
        indicator1: Option<SubstitutionTable<VocabTerm>>,
        /// Table for indicator 2.
        indicator2: Option<SubstitutionTable<VocabTerm>>,
        /// Used when neither indicator matches.
        default: VocabTerm,
    },
}

impl ConditionSpec {
    /// Every predicate term the condition can resolve to.
    pub fn terms(&self) -> Box<dyn Iterator<Item = &VocabTerm> + '_> {
        match self {
            Self::Subfield { table, default, .. } => {
                Box::new(table.subs.values().chain(std::iter::once(default)))
            },
            Self::Indicator {
                indicator1,
                indicator2,
                default,
            } => Box::new(
                indicator1
                    .iter()
                    .chain(indicator2.iter())
                    .flat_map(|table| table.subs.values())
                    .chain(std::iter::once(default)),
            ),
        }
    }
}

/// A pattern (`orig`) and the table its matches are looked up in (`subs`).
#[derive(Debug, Clone)]
pub struct SubstitutionTable<T> {
    /// Pattern scanned against the input.
    pub pattern: Regex,
    /// Replacement per captured key.
    pub subs: HashMap<String, T>,
}

impl<T> SubstitutionTable<T> {
    /// Creates a table.
    #[must_use]
    pub fn new(pattern: Regex, subs: HashMap<String, T>) -> Self {
        Self { pattern, subs }
    }

    /// Scans `input` and returns the replacement for the last match.
    ///
    /// The key is the first capture group when the pattern has one, the whole
    /// match otherwise. `Ok(None)` means nothing matched.
    ///
    /// # Errors
    ///
    /// Returns [`MarcRdfError::MissingSubstitution`] when a matched key has no
    /// entry in the table.
    pub fn lookup(&self, input: &str) -> Result<Option<&T>> {
        let mut found = None;
        for caps in self.pattern.captures_iter(input) {
            let key = caps
                .get(1)
                .or_else(|| caps.get(0))
                .map_or("", |m| m.as_str());
            let value = self
                .subs
                .get(key)
                .ok_or_else(|| MarcRdfError::MissingSubstitution(key.to_string()))?;
            found = Some(value);
        }
        Ok(found)
    }
}

/// Nested mapping applied with a generated object URI as subject.
#[derive(Debug, Clone)]
pub struct RelationSpec {
    /// Class asserted for the object URI.
    pub class: VocabTerm,
    /// Nested rules, evaluated against the same field instance.
    pub subfields: Vec<SubfieldRule>,
}

/// How a raw value becomes object terms.
#[derive(Debug, Clone, Default)]
pub struct ObjectSpec {
    /// Declared datatype; `None` when the mapping does not say.
    pub datatype: Option<Datatype>,
    /// String prepended before URI construction.
    pub prefix: String,
    /// Language tag for plain literals.
    pub language: Option<String>,
    /// Value transformation.
    pub pipeline: PipelineConfig,
}

/// Object datatype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Datatype {
    /// URI built with the object prefix.
    Uri,
    /// `xsd:integer` literal.
    Integer,
    /// `xsd:float` literal.
    Float,
    /// `xsd:gYear` literal.
    GYear,
    /// Plain (optionally language-tagged) literal.
    Literal,
}

impl Datatype {
    /// Parses a mapping datatype name; unknown names are plain literals.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "uri" => Self::Uri,
            "integer" => Self::Integer,
            "float" => Self::Float,
            "gYear" => Self::GYear,
            _ => Self::Literal,
        }
    }
}

/// Value transformation configuration.
///
/// One extraction mode followed by optional post-stages. The stages always
/// run in the order of the fields below, whatever order the document used.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// How candidate values are taken from the raw value.
    pub extraction: Extraction,
    /// Normalize and map through a substitution table.
    pub substitute: Option<Substitution>,
    /// Replace values by a join of sibling subfields.
    pub combine: Option<Combine>,
    /// Remove every match of this pattern.
    pub strip: Option<Regex>,
    /// Turn values into URL-safe slugs.
    pub urlize: Option<UrlizeOptions>,
    /// Replace values by their hex MD5 digest.
    pub md5: bool,
    /// Unicode lowercase.
    pub lowercase: bool,
}

/// Extraction mode, checked in this priority order.
#[derive(Debug, Clone, Default)]
pub enum Extraction {
    /// Characters `offset..offset + length`, only when the value is long enough.
    Substring {
        /// Start, in characters.
        offset: usize,
        /// Length, in characters.
        length: usize,
    },
    /// Split on a pattern; captured groups of the separator are kept as pieces.
    Split(Regex),
    /// Every match; capture groups when the pattern has them.
    Match(Regex),
    /// The whole value.
    #[default]
    Whole,
}

/// Regex substitution stage.
#[derive(Debug, Clone)]
pub struct Substitution {
    /// Pattern and table.
    pub table: SubstitutionTable<String>,
    /// Value used when the pattern does not match.
    pub default: Option<String>,
}

/// Combine stage: join sibling subfields.
#[derive(Debug, Clone)]
pub struct Combine {
    /// Codes of the subfields to join.
    pub codes: Vec<String>,
    /// Separator placed between values.
    pub separator: String,
}

impl Combine {
    /// Returns true if `code` is one of the combined codes.
    #[must_use]
    pub fn includes(&self, code: char) -> bool {
        self.codes.iter().any(|key| code_matches(key, code))
    }
}

/// Urlize stage options.
#[derive(Debug, Clone)]
pub struct UrlizeOptions {
    /// Lowercase the slug (default on).
    pub downcase: bool,
    /// Turn runs of whitespace into `_` (default on).
    pub convert_spaces: bool,
    /// Characters removed from the slug; default `[^-_A-Za-z0-9]`.
    pub strip: Regex,
}

/// Default pattern of characters removed by urlize.
pub const DEFAULT_URLIZE_STRIP: &str = "[^-_A-Za-z0-9]";

impl Default for UrlizeOptions {
    fn default() -> Self {
        Self {
            downcase: true,
            convert_spaces: true,
            strip: Regex::new(DEFAULT_URLIZE_STRIP).expect("static regex"),
        }
    }
}
