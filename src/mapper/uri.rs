//! Object URI construction with literal fallback.

use oxrdf::NamedNode;
use tracing::debug;
use url::Url;

use super::rdf::Term;

/// Builds a URI term from `prefix + value`.
///
/// The candidate must parse as an absolute URI with a scheme and a host and be
/// a valid IRI. Anything else becomes a plain literal holding the same string;
/// this never fails.
///
/// # Examples
///
/// ```
/// use marcrdf::mapper::{build_uri, Term};
///
/// assert_eq!(
///     build_uri("subject_1", "http://example.com/"),
///     Term::uri("http://example.com/subject_1")
/// );
/// assert_eq!(build_uri("www.example.com", ""), Term::literal("www.example.com"));
/// ```
#[must_use]
pub fn build_uri(value: &str, prefix: &str) -> Term {
    let candidate = format!("{prefix}{value}");
    if is_absolute_uri(&candidate) {
        Term::Uri(candidate)
    } else {
        debug!(candidate = %candidate, "not an absolute URI, asserting as literal");
        Term::literal(candidate)
    }
}

fn is_absolute_uri(candidate: &str) -> bool {
    match Url::parse(candidate) {
        Ok(url) => {
            !url.scheme().is_empty() && url.has_host() && NamedNode::new(candidate).is_ok()
        },
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_and_value() {
        assert_eq!(
            build_uri("a_simple_string", "http://example.com/"),
            Term::uri("http://example.com/a_simple_string")
        );
    }

    #[test]
    fn test_full_uri_without_prefix() {
        assert_eq!(
            build_uri("http://example.com/", ""),
            Term::uri("http://example.com/")
        );
    }

    #[test]
    fn test_invalid_host_falls_back_to_literal() {
        assert_eq!(
            build_uri("http:||example.com", ""),
            Term::literal("http:||example.com")
        );
    }

    #[test]
    fn test_missing_scheme_falls_back_to_literal() {
        assert_eq!(build_uri("www.example.com", ""), Term::literal("www.example.com"));
        assert!(build_uri("Cats", "").is_literal());
    }

    #[test]
    fn test_uri_without_host_is_literal() {
        assert!(build_uri("urn:isbn:0451450523", "").is_literal());
        assert!(build_uri("mailto:someone@example.com", "").is_literal());
    }

    #[test]
    fn test_invalid_iri_characters_are_literal() {
        assert!(build_uri("two words", "http://example.com/").is_literal());
    }
}
