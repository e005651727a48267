//! Serializes an [`OutputTable`] for download: an XLSX workbook by default,
//! delimited text when the destination asks for it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use encoding_rs::Encoding;
use log::info;
use rust_xlsxwriter::{Format, Workbook};

use crate::{io_utils, record::OutputTable};

pub const DEFAULT_OUTPUT_NAME: &str = "dados_pessoais_formatados.xlsx";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const SHEET_NAME: &str = "Dados";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Xlsx,
    Delimited,
}

impl OutputFormat {
    /// `-` and `.csv`/`.tsv`/`.txt` destinations get delimited text, everything else XLSX.
    pub fn for_path(path: &Path) -> Self {
        if io_utils::is_dash(path) {
            return OutputFormat::Delimited;
        }
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext)
                if ["csv", "tsv", "txt"]
                    .iter()
                    .any(|candidate| ext.eq_ignore_ascii_case(candidate)) =>
            {
                OutputFormat::Delimited
            }
            _ => OutputFormat::Xlsx,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Xlsx => XLSX_CONTENT_TYPE,
            OutputFormat::Delimited => "text/csv",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WriteOptions {
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: encoding_rs::UTF_8,
        }
    }
}

pub fn resolve_output_path(requested: Option<&Path>) -> PathBuf {
    requested
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_NAME))
}

/// Writes `table` to `path`, choosing the format from the destination.
pub fn write_table(table: &OutputTable, path: &Path, options: &WriteOptions) -> Result<()> {
    let format = OutputFormat::for_path(path);
    match format {
        OutputFormat::Xlsx => {
            let bytes = to_xlsx_bytes(table)?;
            std::fs::write(path, bytes).with_context(|| format!("Writing workbook {path:?}"))?;
        }
        OutputFormat::Delimited => write_delimited(table, path, options)?,
    }
    info!(
        "Wrote {} record(s) to {} ({})",
        table.len(),
        if io_utils::is_dash(path) {
            "stdout".to_string()
        } else {
            format!("{path:?}")
        },
        format.content_type()
    );
    Ok(())
}

/// Builds the workbook in memory; every value is written as text.
pub fn to_xlsx_bytes(table: &OutputTable) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(SHEET_NAME)
        .map_err(|err| anyhow!("Naming worksheet: {err}"))?;

    for (col, field) in table.fields().iter().enumerate() {
        let col = column_number(col)?;
        worksheet
            .write_string_with_format(0, col, field, &header_format)
            .map_err(|err| anyhow!("Writing header '{field}': {err}"))?;
    }
    for (row_idx, record) in table.records().iter().enumerate() {
        let row = u32::try_from(row_idx + 1).context("Too many rows for a worksheet")?;
        for (col, value) in record.values().iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            worksheet
                .write_string(row, column_number(col)?, value)
                .map_err(|err| anyhow!("Writing row {}: {err}", row_idx + 2))?;
        }
    }
    worksheet
        .set_freeze_panes(1, 0)
        .map_err(|err| anyhow!("Freezing header row: {err}"))?;

    workbook
        .save_to_buffer()
        .map_err(|err| anyhow!("Serializing workbook: {err}"))
}

fn column_number(index: usize) -> Result<u16> {
    u16::try_from(index).context("Too many columns for a worksheet")
}

fn write_delimited(table: &OutputTable, path: &Path, options: &WriteOptions) -> Result<()> {
    let delimiter = io_utils::resolve_output_delimiter(Some(path), options.delimiter);
    let mut writer = io_utils::open_csv_writer(Some(path), delimiter, options.encoding)?;
    writer
        .write_record(table.fields())
        .context("Writing output headers")?;
    for (idx, record) in table.records().iter().enumerate() {
        writer
            .write_record(record.values())
            .with_context(|| format!("Writing output row {}", idx + 2))?;
    }
    writer.flush().context("Flushing output writer")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_follows_extension() {
        assert_eq!(OutputFormat::for_path(Path::new("out.xlsx")), OutputFormat::Xlsx);
        assert_eq!(OutputFormat::for_path(Path::new("out")), OutputFormat::Xlsx);
        assert_eq!(OutputFormat::for_path(Path::new("out.CSV")), OutputFormat::Delimited);
        assert_eq!(OutputFormat::for_path(Path::new("-")), OutputFormat::Delimited);
    }

    #[test]
    fn default_output_path_uses_fixed_name() {
        assert_eq!(resolve_output_path(None), PathBuf::from(DEFAULT_OUTPUT_NAME));
        assert_eq!(
            OutputFormat::for_path(&resolve_output_path(None)).content_type(),
            XLSX_CONTENT_TYPE
        );
    }
}
