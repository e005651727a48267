//! Maps source headers onto canonical fields by synonym substring.
//!
//! Every field of the dictionary is resolved in declaration order. For each
//! field the source headers are scanned left to right and the first one whose
//! normalized form contains any of the field's synonyms wins. Whole-header
//! synonyms, used for short tokens, must equal the normalized header instead.
//!
//! Under [`MatchPolicy::Shared`] a header stays available after it matched,
//! so one header may feed several fields (for example `Nome Fantasia` can
//! satisfy both the legal-name and trade-name synonyms).
//! [`MatchPolicy::Exclusive`] claims each header at most once, in field order.

use std::collections::HashSet;

use log::debug;
use serde::Serialize;

use crate::{
    profile::{FieldRoles, SynonymDictionary},
    record::SourceTable,
    text::{clean_cell, normalize},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchPolicy {
    #[default]
    Shared,
    Exclusive,
}

/// The header chosen for one canonical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderMatch {
    pub field: String,
    pub header: Option<String>,
    #[serde(skip)]
    pub column: Option<usize>,
    /// The synonym that matched, in normalized form.
    pub synonym: Option<String>,
}

impl HeaderMatch {
    pub fn is_mapped(&self) -> bool {
        self.column.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
    pub field: String,
    pub header: Option<String>,
    pub values: Vec<String>,
}

impl ResolvedColumn {
    pub fn is_mapped(&self) -> bool {
        self.header.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Resolution {
    columns: Vec<ResolvedColumn>,
    row_count: usize,
}

impl Resolution {
    pub fn columns(&self) -> &[ResolvedColumn] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn get(&self, field: &str) -> Option<&ResolvedColumn> {
        self.columns.iter().find(|column| column.field == field)
    }

    /// Values of `field`, or `None` when the field is not part of the dictionary.
    pub fn values(&self, field: &str) -> Option<&[String]> {
        self.get(field).map(|column| column.values.as_slice())
    }
}

/// Returns the first synonym contained in `normalized_header`.
pub fn matching_synonym<'a>(normalized_header: &str, synonyms: &'a [String]) -> Option<&'a str> {
    synonyms
        .iter()
        .map(String::as_str)
        .find(|synonym| normalized_header.contains(synonym))
}

/// True when `normalized_header` contains any of `synonyms` as a substring.
pub fn header_matches(normalized_header: &str, synonyms: &[String]) -> bool {
    matching_synonym(normalized_header, synonyms).is_some()
}

/// Picks a header for every dictionary field.
pub fn resolve_headers(
    headers: &[String],
    dictionary: &SynonymDictionary,
    policy: MatchPolicy,
) -> Vec<HeaderMatch> {
    let normalized = headers.iter().map(|h| normalize(h)).collect::<Vec<_>>();
    let mut claimed = HashSet::new();
    let mut matches = Vec::with_capacity(dictionary.entries().len());

    for entry in dictionary.entries() {
        let found = normalized.iter().enumerate().find_map(|(idx, header)| {
            if policy == MatchPolicy::Exclusive && claimed.contains(&idx) {
                return None;
            }
            entry.matching(header).map(|synonym| (idx, synonym.to_string()))
        });
        let header_match = match found {
            Some((idx, synonym)) => {
                if policy == MatchPolicy::Exclusive {
                    claimed.insert(idx);
                }
                debug!(
                    "Field '{}' <- header '{}' (synonym '{}')",
                    entry.field, headers[idx], synonym
                );
                HeaderMatch {
                    field: entry.field.clone(),
                    header: Some(headers[idx].clone()),
                    column: Some(idx),
                    synonym: Some(synonym),
                }
            }
            None => {
                debug!("Field '{}' has no matching header", entry.field);
                HeaderMatch {
                    field: entry.field.clone(),
                    header: None,
                    column: None,
                    synonym: None,
                }
            }
        };
        matches.push(header_match);
    }
    matches
}

/// Keeps the legal name off the columns already resolved as first or last name.
///
/// `nome` is a substring of `sobrenome` and `primeiro nome`, so a shared scan
/// can hand a name fragment to the legal-name field. When that happens the
/// legal name moves to the next matching header that is not a fragment, or
/// becomes unmapped so the name is rebuilt from the fragments.
pub fn separate_name_fragments(
    headers: &[String],
    dictionary: &SynonymDictionary,
    roles: &FieldRoles,
    matches: &mut [HeaderMatch],
) {
    let column_of = |matches: &[HeaderMatch], field: &str| {
        matches
            .iter()
            .find(|m| m.field == field)
            .and_then(|m| m.column)
    };
    let fragments = [roles.first_name.as_deref(), roles.last_name.as_deref()]
        .into_iter()
        .flatten()
        .filter_map(|field| column_of(&*matches, field))
        .collect::<Vec<_>>();
    let Some(legal) = column_of(&*matches, &roles.legal_name) else {
        return;
    };
    if !fragments.contains(&legal) {
        return;
    }
    let Some(entry) = dictionary.entry(&roles.legal_name) else {
        return;
    };

    let replacement = headers
        .iter()
        .enumerate()
        .filter(|(idx, _)| !fragments.contains(idx))
        .find_map(|(idx, header)| {
            entry
                .matching(&normalize(header))
                .map(|synonym| (idx, synonym.to_string()))
        });
    let Some(legal_match) = matches.iter_mut().find(|m| m.field == roles.legal_name) else {
        return;
    };
    match replacement {
        Some((idx, synonym)) => {
            debug!(
                "Field '{}' moved from name fragment '{}' to header '{}'",
                roles.legal_name, headers[legal], headers[idx]
            );
            legal_match.header = Some(headers[idx].clone());
            legal_match.column = Some(idx);
            legal_match.synonym = Some(synonym);
        }
        None => {
            debug!(
                "Field '{}' only matched name fragment '{}'; leaving it unmapped",
                roles.legal_name, headers[legal]
            );
            legal_match.header = None;
            legal_match.column = None;
            legal_match.synonym = None;
        }
    }
}

/// Resolves every dictionary field to a column of cleaned values.
pub fn resolve_columns(
    table: &SourceTable,
    dictionary: &SynonymDictionary,
    policy: MatchPolicy,
) -> (Resolution, Vec<HeaderMatch>) {
    let matches = resolve_headers(table.headers(), dictionary, policy);
    (resolve_matched_columns(table, &matches), matches)
}

/// Builds the cleaned columns for an already computed header mapping.
pub fn resolve_matched_columns(table: &SourceTable, matches: &[HeaderMatch]) -> Resolution {
    let row_count = table.row_count();
    let columns = matches
        .iter()
        .map(|header_match| {
            let values = match header_match.column {
                Some(idx) => table.column(idx).map(clean_cell).collect(),
                None => vec![String::new(); row_count],
            };
            ResolvedColumn {
                field: header_match.field.clone(),
                header: header_match.header.clone(),
                values,
            }
        })
        .collect();
    Resolution { columns, row_count }
}
