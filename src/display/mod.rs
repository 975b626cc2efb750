pub mod pagination;
pub mod progress;
pub mod table;

pub use pagination::{ListState, PageItem, PageView};
pub use progress::ProgressSpinner;
pub use table::{ColumnDescriptor, ColumnSet, DataTable, RowAction};
