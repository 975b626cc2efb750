//! Export of a record set to a spreadsheet or a print-ready document.
//!
//! Both formats read the same `(rows, columns)` pair the table renders and
//! honour the same visibility flags. No pagination is applied; callers pass
//! the full filtered set.

pub mod print;
pub mod spreadsheet;

use crate::display::table::{ColumnDescriptor, ColumnSet, EMPTY_CELL, field_value};
use crate::error::ExportError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub use print::render_print_document;
pub use spreadsheet::{column_widths, to_xlsx_bytes};

/// Key-name fragments that mark a field as a date
const DATE_KEY_HINTS: [&str; 3] = ["date", "created_at", "updated_at"];
const LOCALE_DATE_FORMAT: &str = "%-m/%-d/%Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Print,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Print => "html",
        }
    }
}

/// Pulls an export value out of a whole row
pub type Extractor = Box<dyn Fn(&Value) -> String + Send + Sync>;

#[derive(Default)]
pub struct Extractors {
    by_key: HashMap<String, Extractor>,
}

impl Extractors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, extractor: Extractor) -> Self {
        self.by_key.insert(key.into(), extractor);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Extractor> {
        self.by_key.get(key)
    }
}

fn dash_if_empty(text: String) -> String {
    if text.trim().is_empty() {
        EMPTY_CELL.to_string()
    } else {
        text
    }
}

pub fn is_date_key(key: &str) -> bool {
    let key = key.to_lowercase();
    DATE_KEY_HINTS.iter().any(|hint| key.contains(hint))
}

/// Reformat an ISO-ish timestamp or date as `M/D/YYYY`
pub fn format_locale_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let date = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.date()))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()?;
    Some(date.format(LOCALE_DATE_FORMAT).to_string())
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join(", "),
        Value::Object(_) => value.to_string(),
    }
}

/// Export value of one cell.
///
/// Order: caller extractor, then an object's `name`, then the date
/// heuristic, then plain stringification. Empty results become `-`.
pub fn extract_value(row: &Value, column: &ColumnDescriptor, extractors: &Extractors) -> String {
    if let Some(extractor) = extractors.get(&column.key) {
        return dash_if_empty(extractor(row));
    }

    let text = match field_value(row, &column.key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::Object(obj)) if obj.contains_key("name") => {
            obj.get("name").map(stringify).unwrap_or_default()
        }
        Some(Value::String(s)) if is_date_key(&column.key) => {
            format_locale_date(s).unwrap_or_else(|| s.clone())
        }
        Some(other) => stringify(other),
    };
    dash_if_empty(text)
}

/// Visible labels plus extracted rows, the shared input of both formats
#[derive(Debug, Clone, PartialEq)]
pub struct ExportGrid {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExportGrid {
    pub fn build(columns: &ColumnSet, rows: &[Value], extractors: &Extractors) -> Self {
        let visible: Vec<&ColumnDescriptor> = columns.visible().collect();
        Self {
            headers: visible.iter().map(|c| c.label.clone()).collect(),
            rows: rows
                .iter()
                .map(|row| {
                    visible
                        .iter()
                        .map(|column| extract_value(row, column, extractors))
                        .collect()
                })
                .collect(),
        }
    }
}

/// `<resource>_<YYYY-MM-DD>.<ext>`
pub fn export_filename(resource: &str, date: NaiveDate, format: ExportFormat) -> String {
    format!(
        "{}_{}.{}",
        resource,
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

pub fn write_export(path: &Path, bytes: &[u8]) -> Result<PathBuf, ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ExportError::Write {
            path: parent.to_string_lossy().to_string(),
            source,
        })?;
    }
    fs::write(path, bytes).map_err(|source| ExportError::Write {
        path: path.to_string_lossy().to_string(),
        source,
    })?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn columns() -> ColumnSet {
        ColumnSet::new(vec![
            ColumnDescriptor::new("name", "Name"),
            ColumnDescriptor::new("company", "Company"),
            ColumnDescriptor::new("created_at", "Created"),
            ColumnDescriptor::new("notes", "Notes").hidden(),
            ColumnDescriptor::new("amount", "Amount"),
        ])
        .unwrap()
    }

    #[test]
    fn test_extract_value_rules() {
        let row = json!({
            "name": "Deal A",
            "company": {"id": 4, "name": "Acme"},
            "created_at": "2024-03-07T10:15:00Z",
            "amount": null
        });
        let extractors = Extractors::new();
        let columns = columns();
        let get = |key: &str| extract_value(&row, columns.get(key).unwrap(), &extractors);

        assert_eq!(get("name"), "Deal A");
        assert_eq!(get("company"), "Acme");
        assert_eq!(get("created_at"), "3/7/2024");
        assert_eq!(get("amount"), "-");
    }

    #[test]
    fn test_extractor_takes_precedence() {
        let row = json!({"amount": 1250, "currency": "EUR"});
        let extractors = Extractors::new().with(
            "amount",
            Box::new(|row: &Value| format!("{} {}", row["amount"], stringify(&row["currency"]))),
        );
        let column = ColumnDescriptor::new("amount", "Amount");
        assert_eq!(extract_value(&row, &column, &extractors), "1250 EUR");
    }

    #[test]
    fn test_date_heuristic() {
        assert!(is_date_key("close_date"));
        assert!(is_date_key("updated_at"));
        assert!(is_date_key("DateOfBirth"));
        assert!(!is_date_key("name"));

        assert_eq!(format_locale_date("2024-12-25"), Some("12/25/2024".to_string()));
        assert_eq!(
            format_locale_date("2024-01-05 08:00:00"),
            Some("1/5/2024".to_string())
        );
        assert_eq!(format_locale_date("soon"), None);

        let column = ColumnDescriptor::new("due_date", "Due");
        let row = json!({"due_date": "next week"});
        assert_eq!(extract_value(&row, &column, &Extractors::new()), "next week");
    }

    #[test]
    fn test_grid_skips_hidden_columns() {
        let rows = vec![json!({"name": "Deal A", "notes": "private"})];
        let grid = ExportGrid::build(&columns(), &rows, &Extractors::new());

        assert_eq!(grid.headers, vec!["Name", "Company", "Created", "Amount"]);
        assert!(!grid.headers.contains(&"Notes".to_string()));
        assert_eq!(grid.rows[0], vec!["Deal A", "-", "-", "-"]);
    }

    #[test]
    fn test_export_filename() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(
            export_filename("leads", date, ExportFormat::Xlsx),
            "leads_2024-06-01.xlsx"
        );
        assert_eq!(
            export_filename("leads", date, ExportFormat::Print),
            "leads_2024-06-01.html"
        );
    }

    #[test]
    fn test_write_export_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("leads.html");
        let written = write_export(&path, b"<html></html>").unwrap();
        assert_eq!(fs::read_to_string(written).unwrap(), "<html></html>");
    }
}
