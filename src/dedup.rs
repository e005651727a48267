//! Collapses canonical records to one per document number.
//!
//! Within a group the record with the most non-empty fields is kept; ties go
//! to the record that appeared first. Groups are emitted in order of first
//! appearance.
//!
//! Records without a document all share the empty key. With
//! [`UnidentifiedPolicy::Collapse`] they are merged into a single record just
//! like any other group, which joins unrelated people. [`UnidentifiedPolicy::Keep`]
//! gives each of them its own key so they pass through untouched.

use std::collections::HashMap;

use log::{debug, warn};
use serde::Serialize;

use crate::{
    error::{FormatError, Result, Stage},
    record::{CanonicalRecord, CanonicalTable, OutputTable},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnidentifiedPolicy {
    #[default]
    Collapse,
    Keep,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DedupKey {
    Identified(String),
    /// Shared key of every record without a document.
    Unidentified,
    /// Record without a document, keyed by its own row position.
    Row(usize),
}

impl DedupKey {
    pub fn for_document(document: &str, row: usize, policy: UnidentifiedPolicy) -> Self {
        if !document.is_empty() {
            return DedupKey::Identified(document.to_string());
        }
        match policy {
            UnidentifiedPolicy::Collapse => DedupKey::Unidentified,
            UnidentifiedPolicy::Keep => DedupKey::Row(row),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DedupReport {
    pub input_rows: usize,
    pub output_rows: usize,
    pub duplicates_removed: usize,
    pub unidentified_rows: usize,
    /// Unidentified rows dropped because they were merged into another one.
    pub unidentified_merged: usize,
}

struct Group {
    best_row: usize,
    best_filled: usize,
    size: usize,
}

pub fn deduplicate(
    table: CanonicalTable,
    document_field: &str,
    policy: UnidentifiedPolicy,
) -> Result<(OutputTable, DedupReport)> {
    let document_index = table.field_index(document_field).ok_or_else(|| {
        FormatError::processing(
            Stage::Deduplication,
            format!("document field '{document_field}' is missing from the assembled table"),
        )
    })?;

    let mut group_index: HashMap<DedupKey, usize> = HashMap::new();
    let mut groups: Vec<Group> = Vec::new();
    let mut unidentified_rows = 0usize;

    for (row, record) in table.records().iter().enumerate() {
        let document = record.get(document_index).unwrap_or("");
        if document.is_empty() {
            unidentified_rows += 1;
        }
        let key = DedupKey::for_document(document, row, policy);
        let filled = record.filled_count();
        match group_index.get(&key) {
            Some(&idx) => {
                let group = &mut groups[idx];
                group.size += 1;
                if filled > group.best_filled {
                    group.best_row = row;
                    group.best_filled = filled;
                }
            }
            None => {
                group_index.insert(key, groups.len());
                groups.push(Group {
                    best_row: row,
                    best_filled: filled,
                    size: 1,
                });
            }
        }
    }

    let unidentified_merged = match group_index.get(&DedupKey::Unidentified) {
        Some(&idx) => groups[idx].size - 1,
        None => 0,
    };
    if unidentified_merged > 0 {
        warn!(
            "{} record(s) without a document were merged into a single record; use the keep policy to preserve them",
            unidentified_merged + 1
        );
    }

    let input_rows = table.len();
    let fields = table.fields().to_vec();
    let mut records = table.into_records().into_iter().map(Some).collect::<Vec<_>>();
    let kept = groups
        .iter()
        .filter_map(|group| records[group.best_row].take())
        .collect::<Vec<CanonicalRecord>>();

    let report = DedupReport {
        input_rows,
        output_rows: kept.len(),
        duplicates_removed: input_rows - kept.len(),
        unidentified_rows,
        unidentified_merged,
    };
    debug!(
        "Deduplicated {} record(s) into {} group(s)",
        report.input_rows, report.output_rows
    );
    Ok((OutputTable::new(fields, kept), report))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[&[&str]]) -> CanonicalTable {
        CanonicalTable::new(
            vec!["cpf".into(), "nome".into(), "email".into(), "cidade".into()],
            rows.iter()
                .map(|row| CanonicalRecord::new(row.iter().map(|v| v.to_string()).collect()))
                .collect(),
        )
    }

    fn names(output: &OutputTable) -> Vec<String> {
        output
            .records()
            .iter()
            .map(|record| record.get(1).unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn most_complete_record_wins() {
        let input = table(&[
            &["111", "a", "", ""],
            &["222", "b", "", ""],
            &["111", "c", "x@y", "Rio"],
        ]);
        let (output, report) = deduplicate(input, "cpf", UnidentifiedPolicy::Collapse).unwrap();
        assert_eq!(names(&output), vec!["c", "b"]);
        assert_eq!(report.duplicates_removed, 1);
    }

    #[test]
    fn ties_keep_the_earliest_record() {
        let input = table(&[&["111", "first", "", ""], &["111", "second", "", ""]]);
        let (output, _) = deduplicate(input, "cpf", UnidentifiedPolicy::Collapse).unwrap();
        assert_eq!(names(&output), vec!["first"]);
    }

    #[test]
    fn unidentified_records_collapse_by_default() {
        let input = table(&[
            &["", "a", "", ""],
            &["111", "b", "", ""],
            &["", "c", "x@y", ""],
        ]);
        let (output, report) = deduplicate(input, "cpf", UnidentifiedPolicy::Collapse).unwrap();
        assert_eq!(names(&output), vec!["c", "b"]);
        assert_eq!(report.unidentified_rows, 2);
        assert_eq!(report.unidentified_merged, 1);
    }

    #[test]
    fn keep_policy_passes_unidentified_records_through() {
        let input = table(&[
            &["", "a", "", ""],
            &["111", "b", "", ""],
            &["", "c", "x@y", ""],
        ]);
        let (output, report) = deduplicate(input, "cpf", UnidentifiedPolicy::Keep).unwrap();
        assert_eq!(names(&output), vec!["a", "b", "c"]);
        assert_eq!(report.unidentified_merged, 0);
        assert_eq!(report.duplicates_removed, 0);
    }

    #[test]
    fn missing_document_field_is_a_processing_error() {
        let input = table(&[&["111", "a", "", ""]]);
        let err = deduplicate(input, "cnpj", UnidentifiedPolicy::Collapse).unwrap_err();
        assert!(matches!(
            err,
            FormatError::Processing {
                stage: Stage::Deduplication,
                ..
            }
        ));
    }
}
