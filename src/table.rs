//! Plain-text table rendering for previews and reports.

use std::borrow::Cow;
use std::fmt::Write as _;

use crate::record::OutputTable;

/// Cells longer than this are cut and marked with an ellipsis.
pub const MAX_CELL_WIDTH: usize = 32;

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let column_count = headers.len();
    let mut widths = headers
        .iter()
        .map(|h| display_width(h).min(MAX_CELL_WIDTH))
        .collect::<Vec<_>>();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(cell).min(MAX_CELL_WIDTH));
        }
    }
    for width in &mut widths {
        *width = (*width).max(1);
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));
    let separator = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator, &widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

/// Renders the first `limit` records of `table`.
pub fn render_preview(table: &OutputTable, limit: usize) -> String {
    let rows = table
        .records()
        .iter()
        .take(limit)
        .map(|record| record.values().to_vec())
        .collect::<Vec<_>>();
    render_table(table.fields(), &rows)
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let mut line = values
        .iter()
        .zip(widths)
        .map(|(value, &width)| {
            let cell = fit_cell(value, width);
            let padding = width.saturating_sub(display_width(&cell));
            format!("{cell}{}", " ".repeat(padding))
        })
        .collect::<Vec<_>>()
        .join("  ");
    let trimmed_len = line.trim_end().len();
    line.truncate(trimmed_len);
    line
}

fn fit_cell(value: &str, width: usize) -> Cow<'_, str> {
    let sanitized = sanitize_cell(value);
    if display_width(&sanitized) <= width {
        return sanitized;
    }
    let mut cut = sanitized
        .chars()
        .take(width.saturating_sub(1))
        .collect::<String>();
    cut.push('…');
    Cow::Owned(cut)
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{CanonicalRecord, CanonicalTable};

    #[test]
    fn columns_are_aligned() {
        let headers = vec!["cpf".to_string(), "razao_social".to_string()];
        let rows = vec![vec!["12345678909".to_string(), "Ana".to_string()]];
        let rendered = render_table(&headers, &rows);
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "cpf          razao_social");
        assert_eq!(lines[1], "-----------  ------------");
        assert_eq!(lines[2], "12345678909  Ana");
    }

    #[test]
    fn long_cells_are_cut() {
        let headers = vec!["observacoes".to_string()];
        let rows = vec![vec!["x".repeat(40)]];
        let rendered = render_table(&headers, &rows);
        let last = rendered.lines().last().unwrap_or_default();
        assert_eq!(last.chars().count(), MAX_CELL_WIDTH);
        assert!(last.ends_with('…'));
    }

    #[test]
    fn preview_honours_limit() {
        let table = CanonicalTable::new(
            vec!["cpf".into()],
            (0..5)
                .map(|i| CanonicalRecord::new(vec![i.to_string()]))
                .collect(),
        );
        assert_eq!(render_preview(&table, 2).lines().count(), 4);
    }
}
