use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// One medication record: an opaque identifier plus column-keyed string
/// values. All values are strings; columns carry no type information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub id: String,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

impl Row {
    pub fn new(data: BTreeMap<String, String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            data,
        }
    }

    /// An empty row holding every given column with an empty value.
    pub fn empty(columns: &[String]) -> Self {
        Self::new(
            columns
                .iter()
                .map(|c| (c.clone(), String::new()))
                .collect(),
        )
    }

    /// Restrict the value-map to the given Column Set: keys outside the set
    /// are dropped, missing keys default to the empty string.
    pub fn restrict_to_columns(&self, columns: &[String]) -> BTreeMap<String, String> {
        columns
            .iter()
            .map(|c| (c.clone(), self.data.get(c).cloned().unwrap_or_default()))
            .collect()
    }

    pub fn value(&self, column: &str) -> &str {
        self.data.get(column).map(String::as_str).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_new_rows_get_unique_ids() {
        let a = Row::new(BTreeMap::new());
        let b = Row::new(BTreeMap::new());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_restrict_to_columns_drops_unknown_keys() {
        let mut data = BTreeMap::new();
        data.insert("Category".to_string(), "Antibiotic".to_string());
        data.insert("Junk".to_string(), "oops".to_string());
        let row = Row::new(data);

        let clean = row.restrict_to_columns(&cols(&["Category", "Dose"]));
        assert_eq!(clean.get("Category").unwrap(), "Antibiotic");
        assert_eq!(clean.get("Dose").unwrap(), "");
        assert!(!clean.contains_key("Junk"));
    }

    #[test]
    fn test_empty_row_covers_all_columns() {
        let row = Row::empty(&cols(&["Category", "Dose"]));
        assert_eq!(row.data.len(), 2);
        assert!(row.data.values().all(String::is_empty));
    }
}
