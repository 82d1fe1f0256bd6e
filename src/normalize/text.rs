use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Canonical text form used for every header/value comparison in the system:
/// trim, lowercase, strip accents (NFD-decompose, drop combining marks),
/// collapse whitespace runs to a single space.
pub fn normalize(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    let stripped: String = lowered
        .nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect();
    WHITESPACE_RUN.replace_all(&stripped, " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_accents_and_case() {
        assert_eq!(normalize("  Facturación   Bruta "), "facturacion bruta");
        assert_eq!(normalize("JOSÉ Núñez"), "jose nunez");
    }

    #[test]
    fn collapses_internal_whitespace() {
        assert_eq!(normalize("a\t b\n  c"), "a b c");
    }

    #[test]
    fn empty_input_is_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }
}
