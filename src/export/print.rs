use super::{ExportGrid, Extractors};
use crate::display::table::ColumnSet;
use chrono::{DateTime, Local};
use serde_json::Value;
use std::fmt::Write;

const PRINT_STYLES: &str = "\
body { font-family: Arial, Helvetica, sans-serif; margin: 24px; color: #1f2937; }
h1 { font-size: 20px; margin-bottom: 4px; }
.meta { font-size: 12px; color: #6b7280; margin-bottom: 16px; }
table { width: 100%; border-collapse: collapse; font-size: 12px; }
th, td { border: 1px solid #d1d5db; padding: 6px 8px; text-align: left; }
th { background: #f3f4f6; font-weight: 600; }
tr:nth-child(even) td { background: #f9fafb; }
@media print { body { margin: 0; } }";

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Standalone HTML document that opens the print dialog once loaded
pub fn render_print_document(
    title: &str,
    columns: &ColumnSet,
    rows: &[Value],
    extractors: &Extractors,
    generated_at: DateTime<Local>,
) -> String {
    let grid = ExportGrid::build(columns, rows, extractors);
    let title = escape_html(title);

    let mut html = String::new();
    // Writing into a String cannot fail
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n<style>\n{PRINT_STYLES}\n</style>\n</head>\n<body>\n<h1>{title}</h1>\n<div class=\"meta\">Generated {} &middot; {} records</div>\n<table>\n<thead>\n<tr>",
        generated_at.format("%Y-%m-%d %H:%M:%S"),
        grid.rows.len(),
    );

    for header in &grid.headers {
        let _ = write!(html, "<th>{}</th>", escape_html(header));
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n");

    for row in &grid.rows {
        html.push_str("<tr>");
        for cell in row {
            let _ = write!(html, "<td>{}</td>", escape_html(cell));
        }
        html.push_str("</tr>\n");
    }

    html.push_str(
        "</tbody>\n</table>\n<script>window.addEventListener('load', function () { window.print(); });</script>\n</body>\n</html>\n",
    );
    html
}
