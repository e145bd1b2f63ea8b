use crate::datamodel::Row;

/// Converter for the medication table to CSV format
pub struct CsvConverter;

impl CsvConverter {
    /// Serialize the table to CSV text. The header row is the Column Set in
    /// display order; every record carries exactly those fields, missing
    /// values default to the empty string.
    pub fn to_csv(columns: &[String], rows: &[Row]) -> String {
        let mut csv_output = String::new();

        csv_output.push_str(
            &columns
                .iter()
                .map(|c| escape_field(c))
                .collect::<Vec<_>>()
                .join(","),
        );
        csv_output.push('\n');

        for row in rows {
            let record = columns
                .iter()
                .map(|c| escape_field(row.value(c)))
                .collect::<Vec<_>>()
                .join(",");
            csv_output.push_str(&record);
            csv_output.push('\n');
        }

        csv_output
    }
}

// Quote and double embedded quotes only when the field needs it.
fn escape_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
