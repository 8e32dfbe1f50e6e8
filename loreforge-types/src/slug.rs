//! URL-safe slug derivation from display names.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Derives a URL-safe slug from a display name.
///
/// Lowercases, decomposes to NFD and strips combining marks, collapses
/// every run of non-alphanumeric characters to a single hyphen, and trims
/// leading/trailing hyphens. Auto-slug fields in the admin forms depend
/// on this exact sequence, so the steps must not be reordered.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for ch in text.to_lowercase().nfd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(ch);
        } else {
            pending_hyphen = true;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn strips_diacritics() {
        assert_eq!(slugify("Ação"), "acao");
        assert_eq!(slugify("Crônicas de Inverno"), "cronicas-de-inverno");
    }

    #[test]
    fn collapses_punctuation_runs() {
        assert_eq!(slugify("A Queda do Império!!"), "a-queda-do-imperio");
        assert_eq!(slugify("um -- dois   três"), "um-dois-tres");
    }

    #[test]
    fn trims_edge_hyphens() {
        assert_eq!(slugify("  ...bordas...  "), "bordas");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn keeps_digits() {
        assert_eq!(slugify("Capítulo 12, Parte 3"), "capitulo-12-parte-3");
    }

    #[test]
    fn empty_input() {
        assert_eq!(slugify(""), "");
    }

    proptest! {
        #[test]
        fn idempotent(input in ".{0,64}") {
            let once = slugify(&input);
            prop_assert_eq!(slugify(&once), once);
        }

        #[test]
        fn output_is_url_safe(input in ".{0,64}") {
            let slug = slugify(&input);
            prop_assert!(slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
            prop_assert!(!slug.starts_with('-'));
            prop_assert!(!slug.ends_with('-'));
        }
    }
}
