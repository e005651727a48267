//! Turns an uploaded file into a [`SourceTable`].
//!
//! Spreadsheet containers (`.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`) are read
//! with `calamine` from their first worksheet. Anything else is treated as
//! delimited text. Cell values stay text: numbers coming out of spreadsheets
//! are rendered without a trailing `.0` so document numbers keep their digits,
//! and date cells come out as `dd/mm/yyyy` rather than Excel serials.

use std::{fs, io::Cursor, path::Path};

use calamine::{Data, ExcelDateTime, Reader, open_workbook_auto_from_rs};
use chrono::NaiveTime;
use encoding_rs::Encoding;
use log::{debug, info, warn};

use crate::{
    error::{FormatError, Result},
    io_utils,
    record::SourceTable,
};

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];
const DATE_FORMAT: &str = "%d/%m/%Y";
const DATETIME_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOptions {
    pub delimiter: Option<u8>,
    pub encoding: Option<&'static Encoding>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Delimited,
    Spreadsheet,
}

impl InputFormat {
    pub fn from_file_name(name: &str) -> Self {
        let extension = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        if SPREADSHEET_EXTENSIONS
            .iter()
            .any(|candidate| extension.eq_ignore_ascii_case(candidate))
        {
            InputFormat::Spreadsheet
        } else {
            InputFormat::Delimited
        }
    }
}

pub fn read_path(path: &Path, options: &ReadOptions) -> Result<SourceTable> {
    let name = path.display().to_string();
    let bytes = fs::read(path).map_err(|err| FormatError::read(&name, err))?;
    read_bytes(&bytes, &name, options)
}

/// Reads a table from raw bytes; `file_name` selects the container format.
pub fn read_bytes(bytes: &[u8], file_name: &str, options: &ReadOptions) -> Result<SourceTable> {
    let table = match InputFormat::from_file_name(file_name) {
        InputFormat::Spreadsheet => read_spreadsheet(bytes, file_name)?,
        InputFormat::Delimited => read_delimited(bytes, file_name, options)?,
    };
    info!(
        "Read {} row(s) and {} column(s) from '{}'",
        table.row_count(),
        table.headers().len(),
        file_name
    );
    Ok(table)
}

fn read_delimited(bytes: &[u8], file_name: &str, options: &ReadOptions) -> Result<SourceTable> {
    let text = match options.encoding {
        Some(encoding) => io_utils::decode_bytes(bytes, encoding),
        None => io_utils::decode_detect(bytes).map(|(text, _)| text),
    }
    .map_err(|err| FormatError::read(file_name, err))?;

    let delimiter = options
        .delimiter
        .or_else(|| io_utils::delimiter_for_extension(Path::new(file_name)))
        .or_else(|| io_utils::sniff_delimiter(&text))
        .unwrap_or(io_utils::DEFAULT_CSV_DELIMITER);
    debug!(
        "Reading '{}' with delimiter '{}'",
        file_name,
        io_utils::printable_delimiter(delimiter)
    );

    let mut reader = io_utils::open_csv_reader(text.as_bytes(), delimiter, true);
    let headers = reader
        .headers()
        .map_err(|err| FormatError::read(file_name, err))?
        .iter()
        .map(|header| header.trim().to_string())
        .collect::<Vec<_>>();
    let width = headers.len();

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|err| FormatError::read(file_name, err))?;
        if record.len() > width {
            warn!(
                "Row {} has {} field(s) but the header declares {}; extra values ignored",
                idx + 2,
                record.len(),
                width
            );
        }
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        rows.push(
            record
                .iter()
                .take(width)
                .map(|cell| Some(cell.to_string()))
                .collect(),
        );
    }
    Ok(SourceTable::new(headers, rows))
}

fn read_spreadsheet(bytes: &[u8], file_name: &str) -> Result<SourceTable> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|err| FormatError::read(file_name, err.to_string()))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| FormatError::read(file_name, "workbook contains no sheets"))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|err| FormatError::read(file_name, format!("sheet '{sheet_name}': {err}")))?;
    debug!("Reading sheet '{}' of '{}'", sheet_name, file_name);

    let mut rows_iter = range.rows();
    let headers = rows_iter
        .next()
        .map(|row| {
            row.iter()
                .map(|cell| cell_text(cell).unwrap_or_default().trim().to_string())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    let rows = rows_iter
        .map(|row| row.iter().map(cell_text).collect::<Vec<_>>())
        .filter(|row| {
            row.iter()
                .any(|cell| cell.as_deref().is_some_and(|c| !c.trim().is_empty()))
        })
        .collect();
    Ok(SourceTable::new(headers, rows))
}

/// Text form of a spreadsheet cell; `None` for empty cells.
pub fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(s.clone()),
        Data::Float(n) => Some(format_float(*n)),
        Data::Int(n) => Some(n.to_string()),
        Data::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::Error(e) => Some(format!("#{e:?}")),
        Data::DateTime(dt) => Some(datetime_text(dt)),
        Data::DateTimeIso(s) => Some(s.clone()),
        Data::DurationIso(s) => Some(s.clone()),
    }
}

/// Dates render as `dd/mm/yyyy`, with the time only when it is not midnight.
/// Durations, and serials chrono cannot represent, keep the raw number.
fn datetime_text(value: &ExcelDateTime) -> String {
    if value.is_duration() {
        return format_float(value.as_f64());
    }
    match value.as_datetime() {
        Some(datetime) if datetime.time() == NaiveTime::MIN => {
            datetime.format(DATE_FORMAT).to_string()
        }
        Some(datetime) => datetime.format(DATETIME_FORMAT).to_string(),
        None => format_float(value.as_f64()),
    }
}

fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
