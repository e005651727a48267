//! Tables flowing through the pipeline.
//!
//! [`SourceTable`] is what the reader hands over: arbitrary headers, raw text
//! cells that may be absent. [`CanonicalTable`] holds records conforming to a
//! [`TargetSchema`](crate::profile::TargetSchema); after deduplication the
//! same shape is emitted as [`OutputTable`].

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceTable {
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl SourceTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { headers, rows }
    }

    /// Builds a table from fully populated string rows.
    pub fn from_strings<H, R, C>(headers: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let headers = headers.into_iter().map(Into::into).collect();
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|cell| Some(cell.into())).collect())
            .collect();
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Headers that carry a name; blank headers cannot be matched to anything.
    pub fn usable_column_count(&self) -> usize {
        self.headers
            .iter()
            .filter(|header| !header.trim().is_empty())
            .count()
    }

    /// Raw cell at `row`/`column`; rows shorter than the header list yield `None`.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .and_then(|cell| cell.as_deref())
    }

    /// Every cell of one column, in row order.
    pub fn column(&self, column: usize) -> impl Iterator<Item = Option<&str>> + '_ {
        (0..self.rows.len()).map(move |row| self.cell(row, column))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CanonicalRecord {
    values: Vec<String>,
}

impl CanonicalRecord {
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    /// Number of fields holding a non-empty value.
    pub fn filled_count(&self) -> usize {
        self.values.iter().filter(|value| !value.is_empty()).count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CanonicalTable {
    fields: Vec<String>,
    records: Vec<CanonicalRecord>,
}

/// A canonical table after deduplication.
pub type OutputTable = CanonicalTable;

impl CanonicalTable {
    pub fn new(fields: Vec<String>, records: Vec<CanonicalRecord>) -> Self {
        Self { fields, records }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn records(&self) -> &[CanonicalRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<CanonicalRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field == name)
    }

    /// Value of `field` in record `row`.
    pub fn value(&self, row: usize, field: &str) -> Option<&str> {
        let index = self.field_index(field)?;
        self.records.get(row).and_then(|record| record.get(index))
    }
}
