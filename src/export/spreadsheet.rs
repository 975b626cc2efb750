use super::{ExportGrid, Extractors};
use crate::display::table::ColumnSet;
use crate::error::ExportError;
use crate::utils::text::display_width;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use serde_json::Value;

pub const MIN_COLUMN_WIDTH: usize = 10;
pub const MAX_COLUMN_WIDTH: usize = 50;
const SHEET_NAME_MAX_CHARS: usize = 31;

impl From<XlsxError> for ExportError {
    fn from(e: XlsxError) -> Self {
        ExportError::Spreadsheet(e.to_string())
    }
}

/// Width per column: longest header or value plus padding, clamped
pub fn column_widths(grid: &ExportGrid) -> Vec<usize> {
    grid.headers
        .iter()
        .enumerate()
        .map(|(index, header)| {
            let longest = grid
                .rows
                .iter()
                .filter_map(|row| row.get(index))
                .map(|cell| display_width(cell))
                .chain(std::iter::once(display_width(header)))
                .max()
                .unwrap_or(0);
            (longest + 2).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH)
        })
        .collect()
}

/// Excel forbids some characters in sheet names and caps their length
fn sheet_name(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .take(SHEET_NAME_MAX_CHARS)
        .collect();
    if cleaned.trim().is_empty() {
        "Sheet1".to_string()
    } else {
        cleaned
    }
}

fn cell_index<T: TryFrom<usize>>(index: usize, what: &str) -> Result<T, ExportError> {
    T::try_from(index)
        .map_err(|_| ExportError::Spreadsheet(format!("{} {} exceeds sheet limits", what, index)))
}

pub fn build_workbook(title: &str, grid: &ExportGrid) -> Result<Workbook, ExportError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name(title))?;

    for (col, header) in grid.headers.iter().enumerate() {
        let col: u16 = cell_index(col, "column")?;
        worksheet.write_string_with_format(0, col, header.as_str(), &header_format)?;
    }

    for (row_index, row) in grid.rows.iter().enumerate() {
        let row_num: u32 = cell_index(row_index + 1, "row")?;
        for (col, value) in row.iter().enumerate() {
            let col: u16 = cell_index(col, "column")?;
            worksheet.write_string(row_num, col, value.as_str())?;
        }
    }

    for (col, width) in column_widths(grid).into_iter().enumerate() {
        let col: u16 = cell_index(col, "column")?;
        worksheet.set_column_width(col, width as f64)?;
    }

    Ok(workbook)
}

/// Single-sheet xlsx of the visible columns
pub fn to_xlsx_bytes(
    title: &str,
    columns: &ColumnSet,
    rows: &[Value],
    extractors: &Extractors,
) -> Result<Vec<u8>, ExportError> {
    let grid = ExportGrid::build(columns, rows, extractors);
    let mut workbook = build_workbook(title, &grid)?;
    Ok(workbook.save_to_buffer()?)
}
