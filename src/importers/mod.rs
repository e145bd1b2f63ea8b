pub mod csv;

pub use csv::{CsvImportError, ImportedTable, import_csv};
