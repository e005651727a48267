//! Text normalization shared by every pipeline stage.
//!
//! [`normalize()`] produces the comparison form of a value (accents stripped,
//! lowercase, whitespace collapsed) and is never written to output.
//! [`clean()`] decides whether a raw cell carries information at all and, if
//! it does, returns the original text trimmed.

use std::borrow::Cow;

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Normalized tokens that spreadsheet exports use in place of an empty cell.
pub const SENTINEL_TOKENS: &[&str] = &["nan", "none", "na", "n/a"];

/// Returns the comparison form of `value`.
///
/// Decomposes accented characters and drops the combining marks, lowercases,
/// collapses whitespace runs into a single space and trims both ends.
pub fn normalize(value: &str) -> String {
    let stripped = value
        .nfkd()
        .filter(|ch| !is_combining_mark(*ch))
        .collect::<String>()
        .to_lowercase();
    collapse_whitespace(&stripped).into_owned()
}

/// Returns the trimmed original value, or an empty string when the value is
/// blank or a sentinel token.
pub fn clean(value: &str) -> String {
    if is_sentinel(value) {
        String::new()
    } else {
        value.trim().to_string()
    }
}

/// Like [`clean()`] but for cells that may be absent altogether.
pub fn clean_cell(value: Option<&str>) -> String {
    value.map(clean).unwrap_or_default()
}

/// True when the value carries no information: blank or one of [`SENTINEL_TOKENS`].
pub fn is_sentinel(value: &str) -> bool {
    let normalized = normalize(value);
    normalized.is_empty() || SENTINEL_TOKENS.contains(&normalized.as_str())
}

/// True when the trimmed value still contains whitespace between words.
pub fn has_internal_whitespace(value: &str) -> bool {
    value.trim().chars().any(char::is_whitespace)
}

fn collapse_whitespace(input: &str) -> Cow<'_, str> {
    let trimmed = input.trim();
    let needs_collapse =
        trimmed.contains("  ") || trimmed.chars().any(|ch| ch.is_whitespace() && ch != ' ');
    if !needs_collapse {
        return Cow::Borrowed(trimmed);
    }
    let mut output = String::with_capacity(trimmed.len());
    let mut pending_space = false;
    for ch in trimmed.chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            output.push(' ');
            pending_space = false;
        }
        output.push(ch);
    }
    Cow::Owned(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_accents_and_case() {
        assert_eq!(normalize("Razão Social"), "razao social");
        assert_eq!(normalize("  MUNICÍPIO  "), "municipio");
        assert_eq!(normalize("Código\tPostal"), "codigo postal");
    }

    #[test]
    fn normalize_collapses_whitespace_runs() {
        assert_eq!(normalize("Nome \n  Completo"), "nome completo");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn clean_blanks_sentinels_and_preserves_original_text() {
        assert_eq!(clean("NaN"), "");
        assert_eq!(clean(" N/A "), "");
        assert_eq!(clean("None"), "");
        assert_eq!(clean("na"), "");
        assert_eq!(clean("  José da Silva "), "José da Silva");
        assert_eq!(clean("Nana"), "Nana");
    }

    #[test]
    fn clean_cell_treats_absent_as_empty() {
        assert_eq!(clean_cell(None), "");
        assert_eq!(clean_cell(Some(" ok ")), "ok");
    }

    #[test]
    fn internal_whitespace_ignores_edges() {
        assert!(!has_internal_whitespace(" Maria "));
        assert!(has_internal_whitespace("Maria Silva"));
    }
}
