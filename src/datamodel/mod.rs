pub mod columns;
pub mod draft;
pub mod row;

pub use columns::{ColumnError, DEFAULT_COLUMNS, find_column, is_placeholder_name, sanitize_columns, validate_columns};
pub use draft::{DraftError, TableDraft};
pub use row::Row;
