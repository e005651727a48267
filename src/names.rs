//! Legal name reconstruction from the name fragments an export may carry.

use crate::text::has_internal_whitespace;

/// Label written when no name fragment is available.
pub const NOT_INFORMED: &str = "NÃO INFORMADO";

/// Builds the finalized legal name for one row. Never returns an empty string.
///
/// A single-word combined name is completed with the last name when one is
/// present; a missing combined name is rebuilt from first and last name.
pub fn reconstruct_name(combined: &str, first: &str, last: &str) -> String {
    let mut name = combined.trim().to_string();
    if !name.is_empty() && !has_internal_whitespace(&name) && !last.trim().is_empty() {
        name = join_trimmed(&name, last);
    }
    if name.is_empty() {
        name = join_trimmed(first, last);
    }
    if name.is_empty() {
        name = NOT_INFORMED.to_string();
    }
    name
}

/// Applies [`reconstruct_name`] row by row. Missing fragment columns count as empty.
pub fn reconstruct_column(
    combined: &[String],
    first: Option<&[String]>,
    last: Option<&[String]>,
) -> Vec<String> {
    combined
        .iter()
        .enumerate()
        .map(|(row, name)| {
            let first = first.and_then(|values| values.get(row)).map_or("", String::as_str);
            let last = last.and_then(|values| values.get(row)).map_or("", String::as_str);
            reconstruct_name(name, first, last)
        })
        .collect()
}

fn join_trimmed(left: &str, right: &str) -> String {
    format!("{left} {right}").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_word_name_is_completed_with_last_name() {
        assert_eq!(reconstruct_name("Ana", "", "Souza"), "Ana Souza");
    }

    #[test]
    fn full_name_is_left_untouched() {
        assert_eq!(reconstruct_name("Maria Silva", "Maria", "Silva"), "Maria Silva");
    }

    #[test]
    fn missing_name_is_built_from_fragments() {
        assert_eq!(reconstruct_name("", "Ana", "Souza"), "Ana Souza");
        assert_eq!(reconstruct_name("", "Ana", ""), "Ana");
        assert_eq!(reconstruct_name("", "", "Souza"), "Souza");
    }

    #[test]
    fn nothing_available_falls_back_to_label() {
        assert_eq!(reconstruct_name("", "", ""), NOT_INFORMED);
    }

    #[test]
    fn column_form_handles_absent_fragment_columns() {
        let combined = vec!["ACME".to_string(), String::new()];
        let names = reconstruct_column(&combined, None, None);
        assert_eq!(names, vec!["ACME".to_string(), NOT_INFORMED.to_string()]);
    }
}
