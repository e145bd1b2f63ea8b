use super::columns::is_placeholder_name;
use super::row::Row;
use thiserror::Error;

/// Errors from admin editing operations, surfaced verbatim in the UI.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DraftError {
    #[error("New column name is required.")]
    NameRequired,

    #[error("Column name cannot start with \"Unnamed\".")]
    PlaceholderName,

    #[error("Column already exists: \"{0}\"")]
    ColumnExists(String),

    #[error("Column not found: \"{0}\"")]
    ColumnNotFound(String),
}

/// The admin's in-memory editing session: an explicit draft of the Column
/// Set and Row Set, mutated locally and invisible to storage until an
/// explicit save. A reload discards unsaved edits, no merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableDraft {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl TableDraft {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Append a new column. New columns always go last; the admin reorders
    /// them afterwards with [`TableDraft::move_column`].
    pub fn add_column(&mut self, name: &str) -> Result<(), DraftError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DraftError::NameRequired);
        }
        if is_placeholder_name(name) {
            return Err(DraftError::PlaceholderName);
        }
        if self
            .columns
            .iter()
            .any(|c| c.to_lowercase() == name.to_lowercase())
        {
            return Err(DraftError::ColumnExists(name.to_string()));
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.data.entry(name.to_string()).or_default();
        }
        Ok(())
    }

    /// Remove a column by case-insensitive name and scrub its values from
    /// every row.
    pub fn remove_column(&mut self, name: &str) -> Result<(), DraftError> {
        let target = name.trim().to_lowercase();
        let Some(idx) = self
            .columns
            .iter()
            .position(|c| c.to_lowercase() == target)
        else {
            return Err(DraftError::ColumnNotFound(name.trim().to_string()));
        };
        let column = self.columns.remove(idx);
        for row in &mut self.rows {
            row.data.remove(&column);
        }
        Ok(())
    }

    /// Move a column to a new position, clamping out-of-range indices.
    pub fn move_column(&mut self, from: usize, to: usize) {
        if from >= self.columns.len() {
            return;
        }
        let column = self.columns.remove(from);
        let to = to.min(self.columns.len());
        self.columns.insert(to, column);
    }

    /// Append an empty row and return its identifier.
    pub fn add_row(&mut self) -> String {
        let row = Row::empty(&self.columns);
        let id = row.id.clone();
        self.rows.push(row);
        id
    }

    pub fn delete_row(&mut self, id: &str) -> bool {
        let before = self.rows.len();
        self.rows.retain(|r| r.id != id);
        self.rows.len() != before
    }

    /// Set a cell value. Returns false if the row or column is unknown.
    pub fn set_value(&mut self, id: &str, column: &str, value: &str) -> bool {
        if !self.columns.iter().any(|c| c == column) {
            return false;
        }
        match self.rows.iter_mut().find(|r| r.id == id) {
            Some(row) => {
                row.data.insert(column.to_string(), value.to_string());
                true
            }
            None => false,
        }
    }

    /// Install an imported table, discarding the previous Column Set and
    /// Row Set entirely. CSV import is a full replace.
    pub fn install(&mut self, columns: Vec<String>, rows: Vec<Row>) {
        self.columns = columns;
        self.rows = rows;
    }

    /// The replace-all payload to submit on save: the draft columns plus
    /// every row with its value-map restricted to them.
    pub fn save_payload(&self) -> (Vec<String>, Vec<Row>) {
        let rows = self
            .rows
            .iter()
            .map(|row| Row {
                id: row.id.clone(),
                data: row.restrict_to_columns(&self.columns),
            })
            .collect();
        (self.columns.clone(), rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> TableDraft {
        let columns = vec!["Category".to_string(), "Dose".to_string()];
        let mut d = TableDraft::new(columns, vec![]);
        let id = d.add_row();
        d.set_value(&id, "Category", "Antibiotic");
        d
    }

    #[test]
    fn test_add_column_appends_and_backfills_rows() {
        let mut d = draft();
        d.add_column("Route").unwrap();
        assert_eq!(d.columns.last().unwrap(), "Route");
        assert_eq!(d.rows[0].value("Route"), "");
    }

    #[test]
    fn test_add_column_rejects_duplicates_case_insensitively() {
        let mut d = draft();
        assert_eq!(
            d.add_column("category"),
            Err(DraftError::ColumnExists("category".to_string()))
        );
    }

    #[test]
    fn test_add_column_rejects_placeholder_and_empty_names() {
        let mut d = draft();
        assert_eq!(d.add_column("  "), Err(DraftError::NameRequired));
        assert_eq!(d.add_column("Unnamed: 7"), Err(DraftError::PlaceholderName));
    }

    #[test]
    fn test_remove_column_scrubs_row_values() {
        let mut d = draft();
        d.remove_column("CATEGORY").unwrap();
        assert_eq!(d.columns, vec!["Dose".to_string()]);
        assert!(!d.rows[0].data.contains_key("Category"));

        assert_eq!(
            d.remove_column("Nope"),
            Err(DraftError::ColumnNotFound("Nope".to_string()))
        );
    }

    #[test]
    fn test_move_column_clamps() {
        let mut d = draft();
        d.move_column(0, 99);
        assert_eq!(d.columns, vec!["Dose".to_string(), "Category".to_string()]);
        d.move_column(99, 0); // no-op
        assert_eq!(d.columns.len(), 2);
    }

    #[test]
    fn test_row_lifecycle() {
        let mut d = draft();
        let id = d.add_row();
        assert_eq!(d.rows.len(), 2);
        assert!(d.delete_row(&id));
        assert!(!d.delete_row(&id));
        assert_eq!(d.rows.len(), 1);
    }

    #[test]
    fn test_set_value_unknown_column_or_row() {
        let mut d = draft();
        let id = d.rows[0].id.clone();
        assert!(!d.set_value(&id, "Route", "Oral"));
        assert!(!d.set_value("missing", "Dose", "500mg"));
    }

    #[test]
    fn test_install_replaces_everything() {
        let mut d = draft();
        d.install(vec!["Name".to_string()], vec![]);
        assert_eq!(d.columns, vec!["Name".to_string()]);
        assert!(d.rows.is_empty());
    }

    #[test]
    fn test_save_payload_restricts_rows_to_draft_columns() {
        let mut d = draft();
        let id = d.rows[0].id.clone();
        // A removed column leaves no trace in the payload.
        d.add_column("Route").unwrap();
        d.set_value(&id, "Route", "Oral");
        d.remove_column("Dose").unwrap();

        let (columns, rows) = d.save_payload();
        assert_eq!(columns, vec!["Category".to_string(), "Route".to_string()]);
        assert_eq!(rows[0].value("Route"), "Oral");
        assert!(!rows[0].data.contains_key("Dose"));
    }
}
