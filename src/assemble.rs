//! Projection of resolved columns into the fixed output layout.

use log::debug;
use serde::Serialize;

use crate::{
    document::{DocumentClassification, PersonType},
    error::{FormatError, Result, Stage},
    profile::TargetSchema,
    record::{CanonicalRecord, CanonicalTable},
    resolve::Resolution,
};

/// What to do with documents whose digit count is neither 11 nor 14.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvalidDocumentPolicy {
    #[default]
    Keep,
    Blank,
}

/// Per-row values produced by the classifier and the name reconstructor.
#[derive(Debug, Clone, Copy)]
pub struct DerivedColumns<'a> {
    pub documents: &'a [DocumentClassification],
    pub names: &'a [String],
}

pub fn assemble(
    resolution: &Resolution,
    derived: DerivedColumns<'_>,
    schema: &TargetSchema,
    policy: InvalidDocumentPolicy,
) -> Result<CanonicalTable> {
    let row_count = resolution.row_count();
    if derived.documents.len() != row_count || derived.names.len() != row_count {
        return Err(FormatError::processing(
            Stage::Assembly,
            format!(
                "expected {row_count} row(s) but received {} document(s) and {} name(s)",
                derived.documents.len(),
                derived.names.len()
            ),
        ));
    }
    if let Some(column) = resolution
        .columns()
        .iter()
        .find(|column| column.values.len() != row_count)
    {
        return Err(FormatError::processing(
            Stage::Assembly,
            format!(
                "column '{}' holds {} value(s) for {row_count} row(s)",
                column.field,
                column.values.len()
            ),
        ));
    }

    let roles = schema.roles();
    let records = (0..row_count)
        .map(|row| {
            let document = &derived.documents[row];
            let legal_name = derived.names[row].as_str();
            let values = schema
                .fields()
                .iter()
                .map(|field| {
                    if *field == roles.document {
                        document_value(document, policy)
                    } else if *field == roles.person_type {
                        document.person_type.code().to_string()
                    } else if *field == roles.legal_name {
                        legal_name.to_string()
                    } else {
                        let raw = resolution
                            .values(field)
                            .map_or("", |values| values[row].as_str());
                        if roles.trade_name.as_deref() == Some(field.as_str()) {
                            trade_name_value(raw, document.person_type, legal_name)
                        } else if roles.state.as_deref() == Some(field.as_str()) {
                            state_code(raw)
                        } else {
                            raw.to_string()
                        }
                    }
                })
                .collect();
            CanonicalRecord::new(values)
        })
        .collect::<Vec<_>>();

    debug!(
        "Assembled {} record(s) across {} field(s)",
        records.len(),
        schema.fields().len()
    );
    Ok(CanonicalTable::new(schema.fields().to_vec(), records))
}

fn document_value(document: &DocumentClassification, policy: InvalidDocumentPolicy) -> String {
    match policy {
        InvalidDocumentPolicy::Blank if document.is_invalid_length() => String::new(),
        _ => document.digits.clone(),
    }
}

/// Trade names only survive for companies, and only when they add information.
pub fn trade_name_value(value: &str, person_type: PersonType, legal_name: &str) -> String {
    if person_type == PersonType::Company && !value.is_empty() && value != legal_name {
        value.to_string()
    } else {
        String::new()
    }
}

/// Uppercases and keeps at most the first two characters.
pub fn state_code(value: &str) -> String {
    value.to_uppercase().chars().take(2).collect()
}
