//! Predicate resolution for subfield rules.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::Result;
use crate::record::DataField;

use super::mapping::{code_matches, ConditionSpec, PredicateSpec};
use super::vocabulary::VocabTerm;

lazy_static! {
    static ref CONDITION_NOISE: Regex = Regex::new(r"[.\-]+").expect("static regex");
}

/// Resolves the predicate of a rule for one field instance.
///
/// A subfield condition reads the first sibling subfield with the configured
/// code, strips `.` and `-`, lowercases it and looks it up. An indicator
/// condition looks up indicator 1 and then indicator 2; when both match,
/// indicator 2 wins. Anything that does not match falls back to the default.
///
/// # Errors
///
/// Returns [`MarcRdfError::MissingSubstitution`](crate::MarcRdfError::MissingSubstitution)
/// when a captured key is missing from the condition's table.
pub fn resolve_predicate<'a>(spec: &'a PredicateSpec, field: &DataField) -> Result<&'a VocabTerm> {
    match spec {
        PredicateSpec::Static(term) => Ok(term),
        PredicateSpec::Conditional(ConditionSpec::Subfield {
            code,
            table,
            default,
        }) => {
            let sibling = field
                .subfields
                .iter()
                .find(|sf| code_matches(code, sf.code))
                .map(|sf| sf.value.as_str())
                .filter(|value| !value.is_empty());
            let Some(value) = sibling else {
                return Ok(default);
            };
            let normalized = CONDITION_NOISE.replace_all(value, "").to_lowercase();
            Ok(table.lookup(&normalized)?.unwrap_or(default))
        },
        PredicateSpec::Conditional(ConditionSpec::Indicator {
            indicator1,
            indicator2,
            default,
        }) => {
            let mut resolved = None;
            for (table, indicator) in [
                (indicator1, field.indicator1),
                (indicator2, field.indicator2),
            ] {
                if let Some(table) = table {
                    if let Some(term) = table.lookup(&indicator.to_string())? {
                        resolved = Some(term);
                    }
                }
            }
            Ok(resolved.unwrap_or(default))
        },
    }
}
