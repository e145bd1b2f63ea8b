use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Column Set seeded on first access when no meta record exists yet.
pub const DEFAULT_COLUMNS: [&str; 6] = [
    "Category",
    "Generic Name",
    "Dose",
    "Route",
    "Indications",
    "Contraindications",
];

// Spreadsheet exports commonly produce blank headers or "Unnamed: 0" style
// placeholders. Those never count as real column names.
static UNNAMED_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^unnamed\b").unwrap());

/// Validation errors for admin-submitted column lists. Messages are surfaced
/// verbatim to the admin UI.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ColumnError {
    #[error("columns is required")]
    Missing,

    #[error(
        "Some column names are empty or invalid (e.g., \"Unnamed\"). Please ensure all columns are named."
    )]
    Invalid,

    #[error("Duplicate column name: \"{0}\"")]
    Duplicate(String),
}

pub fn is_placeholder_name(name: &str) -> bool {
    UNNAMED_PATTERN.is_match(name)
}

/// Trim every name and drop the ones that are empty or placeholders.
/// Used by the self-healing read path, which never rejects.
pub fn sanitize_columns(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .filter(|c| !is_placeholder_name(c))
        .collect()
}

/// Strict validation for the replace-all path. Unlike [`sanitize_columns`],
/// this checks the raw input so the caller gets an explicit error instead of
/// silent stripping.
pub fn validate_columns(raw: &[String]) -> Result<Vec<String>, ColumnError> {
    let trimmed: Vec<String> = raw.iter().map(|c| c.trim().to_string()).collect();
    if trimmed.iter().any(|c| c.is_empty() || is_placeholder_name(c)) {
        return Err(ColumnError::Invalid);
    }

    let mut seen = std::collections::HashSet::new();
    for c in &trimmed {
        if !seen.insert(c.to_lowercase()) {
            return Err(ColumnError::Duplicate(c.clone()));
        }
    }

    if trimmed.is_empty() {
        return Err(ColumnError::Missing);
    }

    Ok(trimmed)
}

/// Two-pass fuzzy column resolver: case-insensitive exact match first, then
/// substring match against the candidate list. Returns the column as spelled
/// in the Column Set.
pub fn find_column<'a>(columns: &'a [String], candidates: &[&str]) -> Option<&'a str> {
    for cand in candidates {
        let key = cand.to_lowercase();
        if let Some(col) = columns.iter().find(|c| c.to_lowercase() == key) {
            return Some(col);
        }
    }
    for col in columns {
        let lc = col.to_lowercase();
        for cand in candidates {
            if lc.contains(&cand.to_lowercase()) {
                return Some(col);
            }
        }
    }
    None
}
