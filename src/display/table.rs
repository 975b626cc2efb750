//! Generic list/table runtime.
//!
//! The table renders whatever slice of records it is handed against a
//! caller-owned [`ColumnSet`]. It holds no visibility, paging or filter
//! state of its own.

use crate::error::DisplayError;
use crate::utils::text::{humanize_key, truncate_text_unicode};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table, presets};
use crossterm::terminal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Shown for null, missing and empty values
pub const EMPTY_CELL: &str = "-";
pub const DEFAULT_EMPTY_MESSAGE: &str = "No records found";
const ACTION_TRIGGER: &str = "⋯";
const MAX_CELL_WIDTH: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub key: String,
    pub label: String,
    pub visible: bool,
}

impl ColumnDescriptor {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            visible: true,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// Ordered column model with unique keys
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnSet {
    columns: Vec<ColumnDescriptor>,
}

impl ColumnSet {
    pub fn new(columns: Vec<ColumnDescriptor>) -> Result<Self, DisplayError> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.key.as_str()) {
                return Err(DisplayError::DuplicateColumn(column.key.clone()));
            }
        }
        Ok(Self { columns })
    }

    /// Columns inferred from the keys of the first record
    pub fn infer(rows: &[Value]) -> Self {
        let columns = match rows.first() {
            Some(Value::Object(obj)) => obj
                .keys()
                .map(|key| ColumnDescriptor::new(key.clone(), humanize_key(key)))
                .collect(),
            _ => Vec::new(),
        };
        Self { columns }
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn visible(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter().filter(|c| c.visible)
    }

    pub fn get(&self, key: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.key == key)
    }

    pub fn set_visible(&mut self, key: &str, visible: bool) -> Result<(), DisplayError> {
        let column = self
            .columns
            .iter_mut()
            .find(|c| c.key == key)
            .ok_or_else(|| DisplayError::UnknownColumn(key.to_string()))?;
        column.visible = visible;
        Ok(())
    }

    /// Flip a column's visibility and return the new value
    pub fn toggle(&mut self, key: &str) -> Result<bool, DisplayError> {
        let visible = !self
            .get(key)
            .ok_or_else(|| DisplayError::UnknownColumn(key.to_string()))?
            .visible;
        self.set_visible(key, visible)?;
        Ok(visible)
    }
}

/// Look up a field by key; dotted keys walk into nested objects
pub fn field_value<'a>(row: &'a Value, key: &str) -> Option<&'a Value> {
    if let Some(value) = row.get(key) {
        return Some(value);
    }
    key.split('.')
        .try_fold(row, |current, part| current.get(part))
}

/// Plain stringification used when no renderer is registered
pub fn format_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => EMPTY_CELL.to_string(),
        Some(Value::String(s)) if s.trim().is_empty() => EMPTY_CELL.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Array(items)) if items.is_empty() => EMPTY_CELL.to_string(),
        Some(Value::Array(items)) => format!("[{} items]", items.len()),
        Some(Value::Object(obj)) => match obj.get("name") {
            Some(Value::String(name)) => name.clone(),
            _ => format!("{{{} fields}}", obj.len()),
        },
    }
}

/// Renders one cell from the field value and the whole row
pub type CellRenderer = Box<dyn Fn(Option<&Value>, &Value) -> String + Send + Sync>;
pub type ActionHandler = Box<dyn Fn(&Value) + Send + Sync>;

pub struct RowAction {
    pub label: String,
    pub is_destructive: bool,
    handler: ActionHandler,
}

impl RowAction {
    pub fn new(label: impl Into<String>, handler: ActionHandler) -> Self {
        Self {
            label: label.into(),
            is_destructive: false,
            handler,
        }
    }

    pub fn destructive(mut self) -> Self {
        self.is_destructive = true;
        self
    }
}

pub struct DataTable {
    renderers: HashMap<String, CellRenderer>,
    actions: Vec<RowAction>,
    empty_message: String,
    max_width: Option<usize>,
    use_colors: bool,
}

impl Default for DataTable {
    fn default() -> Self {
        Self::new()
    }
}

impl DataTable {
    pub fn new() -> Self {
        Self {
            renderers: HashMap::new(),
            actions: Vec::new(),
            empty_message: DEFAULT_EMPTY_MESSAGE.to_string(),
            max_width: Self::detect_terminal_width(),
            use_colors: true,
        }
    }

    fn detect_terminal_width() -> Option<usize> {
        match terminal::size() {
            Ok((cols, _rows)) => Some((cols as usize).clamp(40, 200)),
            Err(_) => Some(80),
        }
    }

    pub fn with_max_width(mut self, width: usize) -> Self {
        self.max_width = Some(width);
        self
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn with_empty_message(mut self, message: impl Into<String>) -> Self {
        self.empty_message = message.into();
        self
    }

    pub fn with_renderer(mut self, key: impl Into<String>, renderer: CellRenderer) -> Self {
        self.renderers.insert(key.into(), renderer);
        self
    }

    pub fn with_action(mut self, action: RowAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn actions(&self) -> &[RowAction] {
        &self.actions
    }

    pub fn render_cell(&self, column: &ColumnDescriptor, row: &Value) -> String {
        let value = field_value(row, &column.key);
        match self.renderers.get(&column.key) {
            Some(renderer) => renderer(value, row),
            None => truncate_text_unicode(&format_value(value), MAX_CELL_WIDTH),
        }
    }

    fn configure_table(&self, table: &mut Table) {
        table.load_preset(presets::UTF8_FULL);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        let width = self.max_width.unwrap_or(80);
        table.set_width(width.saturating_sub(6).max(40) as u16);
    }

    fn header_cell(&self, label: &str) -> Cell {
        if self.use_colors {
            Cell::new(label)
                .add_attribute(Attribute::Bold)
                .fg(Color::Cyan)
        } else {
            Cell::new(label)
        }
    }

    pub fn render(&self, columns: &ColumnSet, rows: &[Value]) -> String {
        let mut table = Table::new();
        self.configure_table(&mut table);

        if rows.is_empty() {
            // One full-width placeholder row instead of the header grid
            let cell = if self.use_colors {
                Cell::new(&self.empty_message)
                    .fg(Color::DarkGrey)
                    .add_attribute(Attribute::Italic)
            } else {
                Cell::new(&self.empty_message)
            };
            table.add_row(vec![cell.set_alignment(CellAlignment::Center)]);
            return table.to_string();
        }

        let visible: Vec<&ColumnDescriptor> = columns.visible().collect();
        let mut header: Vec<Cell> = visible.iter().map(|c| self.header_cell(&c.label)).collect();
        if !self.actions.is_empty() {
            header.push(self.header_cell(""));
        }
        table.set_header(header);

        for row in rows {
            let mut cells: Vec<Cell> = visible
                .iter()
                .map(|column| {
                    let text = self.render_cell(column, row);
                    if self.use_colors && text == EMPTY_CELL {
                        Cell::new(text).fg(Color::DarkGrey)
                    } else {
                        Cell::new(text)
                    }
                })
                .collect();
            if !self.actions.is_empty() {
                cells.push(Cell::new(ACTION_TRIGGER).set_alignment(CellAlignment::Center));
            }
            table.add_row(cells);
        }

        table.to_string()
    }

    /// Vertical field/value view of a single record
    pub fn render_detail(&self, columns: &ColumnSet, row: &Value) -> String {
        let mut table = Table::new();
        self.configure_table(&mut table);
        for column in columns.visible() {
            table.add_row(vec![
                self.header_cell(&column.label),
                Cell::new(self.render_cell(column, row)),
            ]);
        }
        table.to_string()
    }

    /// The action list behind a row's trigger
    pub fn render_action_menu(&self) -> String {
        self.actions
            .iter()
            .enumerate()
            .map(|(index, action)| {
                if action.is_destructive {
                    format!("  {}) {} (destructive)", index + 1, action.label)
                } else {
                    format!("  {}) {}", index + 1, action.label)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn trigger_action(&self, index: usize, row: &Value) -> Result<(), DisplayError> {
        let action = self.actions.get(index).ok_or_else(|| {
            DisplayError::TableFormat(format!("No row action at position {}", index + 1))
        })?;
        (action.handler)(row);
        Ok(())
    }
}
