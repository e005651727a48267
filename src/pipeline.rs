//! The normalization pipeline: resolve, classify, rebuild names, assemble,
//! deduplicate.
//!
//! A run owns its tables from start to finish and either returns the complete
//! [`OutputTable`] or an error; nothing partial is ever handed out.

use log::{debug, info};
use serde::Serialize;

use crate::{
    assemble::{DerivedColumns, InvalidDocumentPolicy, assemble},
    dedup::{UnidentifiedPolicy, deduplicate},
    document::{PersonType, classify_column},
    error::{FormatError, Result, Stage},
    names::reconstruct_column,
    profile::{SynonymDictionary, TargetSchema},
    record::{OutputTable, SourceTable},
    resolve::{
        HeaderMatch, MatchPolicy, resolve_headers, resolve_matched_columns,
        separate_name_fragments,
    },
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessOptions {
    pub match_policy: MatchPolicy,
    pub unidentified: UnidentifiedPolicy,
    pub invalid_documents: InvalidDocumentPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub input_rows: usize,
    pub output_rows: usize,
    pub duplicates_removed: usize,
    pub unidentified_rows: usize,
    pub unidentified_merged: usize,
    pub invalid_documents: usize,
    pub persons: usize,
    pub companies: usize,
    pub unknown: usize,
    pub mapped_fields: Vec<String>,
    pub unmapped_fields: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub output: OutputTable,
    pub summary: RunSummary,
    pub mapping: Vec<HeaderMatch>,
}

pub fn process(
    source: &SourceTable,
    dictionary: &SynonymDictionary,
    schema: &TargetSchema,
    options: &ProcessOptions,
) -> Result<OutputTable> {
    process_detailed(source, dictionary, schema, options).map(|outcome| outcome.output)
}

pub fn process_detailed(
    source: &SourceTable,
    dictionary: &SynonymDictionary,
    schema: &TargetSchema,
    options: &ProcessOptions,
) -> Result<ProcessOutcome> {
    if source.is_empty() {
        return Err(FormatError::empty_input("the table has no data rows"));
    }
    if source.usable_column_count() == 0 {
        return Err(FormatError::empty_input("the table has no named columns"));
    }
    schema
        .validate()
        .map_err(|reason| FormatError::processing(Stage::Configuration, reason))?;
    let roles = schema.roles();
    let document_synonyms = dictionary.synonyms_for(&roles.document).ok_or_else(|| {
        FormatError::processing(
            Stage::Configuration,
            format!("no synonyms declared for document field '{}'", roles.document),
        )
    })?;

    let mut mapping = resolve_headers(source.headers(), dictionary, options.match_policy);
    separate_name_fragments(source.headers(), dictionary, roles, &mut mapping);
    let resolution = resolve_matched_columns(source, &mapping);
    let document_column = resolution
        .get(&roles.document)
        .filter(|column| column.is_mapped())
        .ok_or_else(|| FormatError::NoDocumentColumn {
            detail: format!(
                "no header contains any of: {}",
                document_synonyms.join(", ")
            ),
        })?;
    if document_column.values.iter().all(String::is_empty) {
        return Err(FormatError::NoDocumentColumn {
            detail: format!(
                "column '{}' has no values",
                document_column.header.as_deref().unwrap_or_default()
            ),
        });
    }

    let documents = classify_column(&document_column.values);
    let invalid_documents = documents.iter().filter(|doc| doc.is_invalid_length()).count();
    debug!(
        "Classified {} document(s), {} with an unexpected digit count",
        documents.len(),
        invalid_documents
    );

    let blank = vec![String::new(); resolution.row_count()];
    let combined = resolution.values(&roles.legal_name).unwrap_or(&blank);
    let first = roles.first_name.as_deref().and_then(|f| resolution.values(f));
    let last = roles.last_name.as_deref().and_then(|f| resolution.values(f));
    let names = reconstruct_column(combined, first, last);

    let canonical = assemble(
        &resolution,
        DerivedColumns {
            documents: &documents,
            names: &names,
        },
        schema,
        options.invalid_documents,
    )?;
    let (output, report) = deduplicate(canonical, &roles.document, options.unidentified)?;

    let type_index = output.field_index(&roles.person_type);
    let count_type = |person_type: PersonType| {
        output
            .records()
            .iter()
            .filter(|record| type_index.and_then(|idx| record.get(idx)) == Some(person_type.code()))
            .count()
    };
    let persons = count_type(PersonType::Person);
    let companies = count_type(PersonType::Company);
    let (mapped_fields, unmapped_fields): (Vec<_>, Vec<_>) =
        mapping.iter().partition(|m| m.is_mapped());

    let summary = RunSummary {
        input_rows: report.input_rows,
        output_rows: report.output_rows,
        duplicates_removed: report.duplicates_removed,
        unidentified_rows: report.unidentified_rows,
        unidentified_merged: report.unidentified_merged,
        invalid_documents,
        persons,
        companies,
        unknown: report.output_rows - persons - companies,
        mapped_fields: mapped_fields.iter().map(|m| m.field.clone()).collect(),
        unmapped_fields: unmapped_fields.iter().map(|m| m.field.clone()).collect(),
    };
    info!(
        "Formatted {} record(s) from {} row(s): {} person(s), {} company(ies), {} duplicate(s) removed",
        summary.output_rows,
        summary.input_rows,
        summary.persons,
        summary.companies,
        summary.duplicates_removed
    );
    Ok(ProcessOutcome {
        output,
        summary,
        mapping,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{names::NOT_INFORMED, profile};

    fn run(source: &SourceTable) -> Result<ProcessOutcome> {
        let profile = profile::standard();
        process_detailed(
            source,
            &profile.synonyms,
            &profile.schema,
            &ProcessOptions::default(),
        )
    }

    #[test]
    fn empty_table_is_rejected() {
        let source = SourceTable::from_strings(["CPF"], Vec::<Vec<String>>::new());
        assert!(matches!(run(&source), Err(FormatError::EmptyInput { .. })));
    }

    #[test]
    fn nameless_columns_are_rejected() {
        let source = SourceTable::from_strings(["", " "], [["1", "2"]]);
        assert!(matches!(run(&source), Err(FormatError::EmptyInput { .. })));
    }

    #[test]
    fn missing_document_column_is_rejected() {
        let source = SourceTable::from_strings(["Nome", "Email"], [["Ana", "a@b.c"]]);
        let err = run(&source).unwrap_err();
        assert!(matches!(err, FormatError::NoDocumentColumn { .. }));
        assert!(err.to_string().contains("cpf"));
    }

    #[test]
    fn blank_document_column_is_rejected() {
        let source = SourceTable::from_strings(["Nome", "CPF"], [["Ana", "nan"], ["Bia", " "]]);
        assert!(matches!(
            run(&source),
            Err(FormatError::NoDocumentColumn { .. })
        ));
    }

    #[test]
    fn invalid_schema_is_a_configuration_error() {
        let profile = profile::standard();
        let schema = TargetSchema::new(["razao_social"], profile.schema.roles().clone());
        let source = SourceTable::from_strings(["CPF"], [["12345678909"]]);
        let err = process(&source, &profile.synonyms, &schema, &ProcessOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            FormatError::Processing {
                stage: Stage::Configuration,
                ..
            }
        ));
    }

    #[test]
    fn summary_counts_types_and_mapping() {
        let source = SourceTable::from_strings(
            ["Cliente", "Documento"],
            [
                ["Ana Souza", "123.456.789-09"],
                ["ACME", "12.345.678/0001-95"],
                ["", "999"],
            ],
        );
        let outcome = run(&source).expect("process");
        let summary = &outcome.summary;
        assert_eq!(summary.input_rows, 3);
        assert_eq!(summary.output_rows, 3);
        assert_eq!(summary.persons, 1);
        assert_eq!(summary.companies, 1);
        assert_eq!(summary.unknown, 1);
        assert_eq!(summary.invalid_documents, 1);
        assert!(summary.mapped_fields.contains(&"cpf".to_string()));
        assert!(summary.unmapped_fields.contains(&"email".to_string()));
        assert_eq!(outcome.output.value(2, "razao_social"), Some(NOT_INFORMED));
    }
}
