//! Object generation pipeline.
//!
//! Turns one raw field or subfield value into zero or more object strings
//! according to a [`PipelineConfig`]: an extraction step followed by the
//! post-stages substitute, combine, strip, urlize, md5 and lowercase, always in
//! that order. Blank values are dropped after every stage.

use lazy_static::lazy_static;
use md5::{Digest, Md5};
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::error::Result;
use crate::record::DataField;

use super::mapping::{Combine, Extraction, PipelineConfig, Substitution, UrlizeOptions};

lazy_static! {
    static ref NON_WORD: Regex = Regex::new("[^A-Za-z0-9_]+").expect("static regex");
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").expect("static regex");
}

/// Generates object strings from a raw value.
///
/// `field` is the data field the value came from; the combine stage reads
/// sibling subfields from it. Control fields pass `None`.
///
/// # Errors
///
/// Returns [`MarcRdfError::MissingSubstitution`](crate::MarcRdfError::MissingSubstitution)
/// when the substitute stage captures a key missing from its table.
///
/// # Examples
///
/// ```
/// use marcrdf::mapper::{generate_objects, Extraction, PipelineConfig};
///
/// let config = PipelineConfig {
///     extraction: Extraction::Substring { offset: 2, length: 4 },
///     ..PipelineConfig::default()
/// };
/// assert_eq!(generate_objects("abcdef", None, &config).unwrap(), vec!["cdef"]);
/// ```
pub fn generate_objects(
    value: &str,
    field: Option<&DataField>,
    config: &PipelineConfig,
) -> Result<Vec<String>> {
    let mut objects = extract(value, &config.extraction);
    drop_blank(&mut objects);

    if let Some(substitution) = &config.substitute {
        objects = objects
            .iter()
            .map(|obj| substitute(obj, substitution))
            .collect::<Result<_>>()?;
        drop_blank(&mut objects);
    }

    if let Some(combine) = &config.combine {
        if !objects.is_empty() {
            let joined = combine_siblings(field, combine);
            objects.iter_mut().for_each(|obj| obj.clone_from(&joined));
        }
    }
    drop_blank(&mut objects);

    if let Some(pattern) = &config.strip {
        map_in_place(&mut objects, |obj| pattern.replace_all(obj, "").into_owned());
    }

    if let Some(options) = &config.urlize {
        map_in_place(&mut objects, |obj| urlize(obj, options));
    }

    if config.md5 {
        map_in_place(&mut objects, |obj| md5_hex(obj));
    }

    if config.lowercase {
        map_in_place(&mut objects, str::to_lowercase);
    }

    Ok(objects)
}

fn extract(value: &str, extraction: &Extraction) -> Vec<String> {
    match extraction {
        Extraction::Substring { offset, length } => {
            let available = value.chars().count();
            if offset.saturating_add(*length) <= available {
                vec![value.chars().skip(*offset).take(*length).collect()]
            } else {
                Vec::new()
            }
        },
        Extraction::Split(pattern) => split_keeping_groups(pattern, value),
        Extraction::Match(pattern) => match_all(pattern, value),
        Extraction::Whole => vec![value.to_string()],
    }
}

/// Splits on `pattern`; text captured by groups of the separator is kept as
/// pieces between the surrounding text.
fn split_keeping_groups(pattern: &Regex, value: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut last = 0;
    for caps in pattern.captures_iter(value) {
        let Some(sep) = caps.get(0) else { continue };
        pieces.push(value[last..sep.start()].to_string());
        pieces.extend(caps.iter().skip(1).flatten().map(|g| g.as_str().to_string()));
        last = sep.end();
    }
    pieces.push(value[last..].to_string());
    pieces
}

/// Every match of `pattern`: its capture groups when it has any, otherwise
/// the whole match.
fn match_all(pattern: &Regex, value: &str) -> Vec<String> {
    if pattern.captures_len() > 1 {
        pattern
            .captures_iter(value)
            .flat_map(|caps| {
                caps.iter()
                    .skip(1)
                    .flatten()
                    .map(|g| g.as_str().to_string())
                    .collect::<Vec<_>>()
            })
            .collect()
    } else {
        pattern
            .find_iter(value)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

fn substitute(value: &str, substitution: &Substitution) -> Result<String> {
    let normalized = NON_WORD.replace_all(value, "").to_lowercase();
    Ok(match substitution.table.lookup(&normalized)? {
        Some(replacement) => replacement.clone(),
        None => substitution.default.clone().unwrap_or(normalized),
    })
}

/// Sibling subfields named by `combine`, in their order on the field.
fn combine_siblings(field: Option<&DataField>, combine: &Combine) -> String {
    field
        .map(|field| {
            field
                .subfields
                .iter()
                .filter(|sf| combine.includes(sf.code))
                .map(|sf| sf.value.as_str())
                .collect::<Vec<_>>()
                .join(&combine.separator)
        })
        .unwrap_or_default()
}

/// Turns text into a URL-safe slug.
///
/// # Examples
///
/// ```
/// use marcrdf::mapper::{urlize, UrlizeOptions};
///
/// assert_eq!(urlize("A Simple String", &UrlizeOptions::default()), "a_simple_string");
/// assert_eq!(urlize("Ægir", &UrlizeOptions::default()), "aegir");
/// ```
#[must_use]
pub fn urlize(value: &str, options: &UrlizeOptions) -> String {
    let mut slug = transliterate(value.trim());
    if options.downcase {
        slug = slug.to_lowercase();
    }
    if options.convert_spaces {
        slug = WHITESPACE_RUN.replace_all(&slug, "_").into_owned();
    }
    options.strip.replace_all(&slug, "").into_owned()
}

/// Replaces Latin letters with diacritics by ASCII.
///
/// Letters that decompose (é, å, ü) lose their combining marks; ligatures and
/// stroked letters use a fixed table. Anything else is left as is.
fn transliterate(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c.is_ascii() {
            out.push(c);
            continue;
        }
        match c {
            'Æ' => out.push_str("AE"),
            'æ' => out.push_str("ae"),
            'Ø' => out.push('O'),
            'ø' => out.push('o'),
            'Œ' => out.push_str("OE"),
            'œ' => out.push_str("oe"),
            'ß' => out.push_str("ss"),
            'Þ' => out.push_str("TH"),
            'þ' => out.push_str("th"),
            'Ð' | 'Đ' => out.push('D'),
            'ð' | 'đ' => out.push('d'),
            'Ł' => out.push('L'),
            'ł' => out.push('l'),
            'ı' => out.push('i'),
            _ => out.extend(std::iter::once(c).nfkd().filter(|d| !is_combining_mark(*d))),
        }
    }
    out
}

fn md5_hex(value: &str) -> String {
    format!("{:x}", Md5::digest(value.as_bytes()))
}

fn drop_blank(objects: &mut Vec<String>) {
    objects.retain(|obj| !obj.trim().is_empty());
}

fn map_in_place(objects: &mut Vec<String>, f: impl Fn(&str) -> String) {
    for obj in objects.iter_mut() {
        *obj = f(obj);
    }
    drop_blank(objects);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::mapping::SubstitutionTable;

    fn re(pattern: &str) -> Regex {
        Regex::new(pattern).expect("valid regex")
    }

    fn run(value: &str, config: &PipelineConfig) -> Vec<String> {
        generate_objects(value, None, config).expect("pipeline failed")
    }

    fn substring(offset: usize, length: usize) -> PipelineConfig {
        PipelineConfig {
            extraction: Extraction::Substring { offset, length },
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_whole_value_by_default() {
        assert_eq!(run("abcdef", &PipelineConfig::default()), vec!["abcdef"]);
        assert!(run("   ", &PipelineConfig::default()).is_empty());
    }

    #[test]
    fn test_substring_offset_and_length() {
        assert_eq!(run("abcdef", &substring(2, 4)), vec!["cdef"]);
    }

    #[test]
    fn test_substring_beyond_value_is_empty() {
        assert!(run("abcdef", &substring(11, 1)).is_empty());
        assert!(run("abcdef", &substring(3, 4)).is_empty());
        assert!(run("abcdef", &substring(usize::MAX, 2)).is_empty());
    }

    #[test]
    fn test_substring_counts_characters() {
        // 008 positions 35-37 after a multibyte character
        let value = "ø".repeat(35) + "nob";
        assert_eq!(run(&value, &substring(35, 3)), vec!["nob"]);
    }

    #[test]
    fn test_substring_blank_slice_dropped() {
        assert!(run("ab    cd", &substring(2, 4)).is_empty());
    }

    #[test]
    fn test_regex_split() {
        let config = PipelineConfig {
            extraction: Extraction::Split(re(", *")),
            ..PipelineConfig::default()
        };
        assert_eq!(run("one, two,,three", &config), vec!["one", "two", "three"]);
    }

    #[test]
    fn test_regex_split_then_substitute() {
        let config = PipelineConfig {
            extraction: Extraction::Split(re(r"(\w{2})")),
            substitute: Some(Substitution {
                table: SubstitutionTable::new(
                    re("ab|cd|ef"),
                    [("ab", "AA"), ("cd", "BB"), ("ef", "CC")]
                        .into_iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                ),
                default: Some("ZERO".into()),
            }),
            ..PipelineConfig::default()
        };
        assert_eq!(run("abcdef", &config), vec!["AA", "BB", "CC"]);
    }

    #[test]
    fn test_substitute_unmatched_uses_default() {
        let config = PipelineConfig {
            substitute: Some(Substitution {
                table: SubstitutionTable::new(re("a|j"), std::iter::empty().collect()),
                default: Some("adult".into()),
            }),
            ..PipelineConfig::default()
        };
        assert_eq!(run("x", &config), vec!["adult"]);
    }

    #[test]
    fn test_substitute_normalizes_before_scan() {
        let config = PipelineConfig {
            substitute: Some(Substitution {
                table: SubstitutionTable::new(
                    re("^red$"),
                    std::iter::once(("red".to_string(), "editor".to_string())).collect(),
                ),
                default: None,
            }),
            ..PipelineConfig::default()
        };
        assert_eq!(run("Red.", &config), vec!["editor"]);
        // no match and no default keeps the normalized value
        assert_eq!(run("Overs.", &config), vec!["overs"]);
    }

    #[test]
    fn test_substitute_missing_key_is_error() {
        let config = PipelineConfig {
            substitute: Some(Substitution {
                table: SubstitutionTable::new(re("ab"), std::iter::empty().collect()),
                default: None,
            }),
            ..PipelineConfig::default()
        };
        assert!(generate_objects("ab", None, &config).is_err());
    }

    #[test]
    fn test_regex_match_groups() {
        let config = PipelineConfig {
            extraction: Extraction::Match(re(r"(\d+)-")),
            ..PipelineConfig::default()
        };
        assert_eq!(run("1945-1999", &config), vec!["1945"]);
    }

    #[test]
    fn test_regex_match_without_groups() {
        let config = PipelineConfig {
            extraction: Extraction::Match(re(r"\d{4}")),
            ..PipelineConfig::default()
        };
        assert_eq!(run("1945-1999", &config), vec!["1945", "1999"]);
    }

    #[test]
    fn test_combine_uses_field_order() {
        let field = DataField::builder("245", ' ', ' ')
            .subfield_str('a', "A Title")
            .subfield_str('b', "A Subtitle")
            .build();
        let config = PipelineConfig {
            combine: Some(Combine {
                codes: vec!["b".into(), "a".into()],
                separator: " : ".into(),
            }),
            ..PipelineConfig::default()
        };
        let objects = generate_objects("abcdef", Some(&field), &config).expect("pipeline");
        assert_eq!(objects, vec!["A Title : A Subtitle"]);
    }

    #[test]
    fn test_combine_without_field_drops_value() {
        let config = PipelineConfig {
            combine: Some(Combine {
                codes: vec!["a".into()],
                separator: " ".into(),
            }),
            ..PipelineConfig::default()
        };
        assert!(run("abc", &config).is_empty());
    }

    #[test]
    fn test_regex_strip() {
        let config = PipelineConfig {
            strip: Some(re(r"[\D]+")),
            ..PipelineConfig::default()
        };
        assert_eq!(run("XV, 309 s.", &config), vec!["309"]);
        assert!(run("ill.", &config).is_empty());
    }

    #[test]
    fn test_urlize_defaults() {
        let options = UrlizeOptions::default();
        assert_eq!(urlize("A Simple String", &options), "a_simple_string");
        assert_eq!(urlize("\u{00C6}gir", &options), "aegir");
        assert_eq!(urlize("  Crème  brûlée ", &options), "creme_brulee");
    }

    #[test]
    fn test_urlize_without_downcase_and_spaces() {
        let options = UrlizeOptions {
            downcase: false,
            convert_spaces: false,
            ..UrlizeOptions::default()
        };
        assert_eq!(urlize("A Simple String", &options), "ASimpleString");
    }

    #[test]
    fn test_urlize_custom_pattern() {
        let options = UrlizeOptions {
            strip: re("[^a-e]"),
            ..UrlizeOptions::default()
        };
        assert_eq!(urlize("abcdef", &options), "abcde");
    }

    #[test]
    fn test_md5() {
        let config = PipelineConfig {
            md5: true,
            ..PipelineConfig::default()
        };
        assert_eq!(
            run("A Simple String", &config),
            vec!["ce74867407f887269af5a32dbbf0b856"]
        );
    }

    #[test]
    fn test_lowercase_keeps_non_ascii() {
        let config = PipelineConfig {
            lowercase: true,
            ..PipelineConfig::default()
        };
        assert_eq!(run("A Simple String", &config), vec!["a simple string"]);
        assert_eq!(run("ÆRØ", &config), vec!["ærø"]);
    }

    #[test]
    fn test_stage_order_is_fixed() {
        // urlize runs before md5 no matter how the options were declared
        let config = PipelineConfig {
            urlize: Some(UrlizeOptions::default()),
            md5: true,
            ..PipelineConfig::default()
        };
        assert_eq!(run("A Simple String", &config), vec![md5_hex("a_simple_string")]);
    }
}
