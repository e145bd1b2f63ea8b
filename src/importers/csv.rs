use crate::datamodel::{Row, is_placeholder_name};
use csv_async::{AsyncReaderBuilder, ErrorKind};
use futures::{StreamExt, io};
use std::collections::BTreeMap;
use thiserror::Error;

/// A parsed CSV table, ready to replace the caller's draft wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedTable {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

#[derive(Error, Debug)]
pub enum CsvImportError {
    #[error("CSV parse error: {message} (row {row})")]
    Parse { message: String, row: u64 },

    #[error("CSV has no usable column names. Please name all columns before importing.")]
    NoColumns,
}

impl From<csv_async::Error> for CsvImportError {
    fn from(err: csv_async::Error) -> Self {
        let row = match err.kind() {
            ErrorKind::Utf8 { pos, .. } => pos.as_ref().map(|p| p.line()),
            ErrorKind::UnequalLengths { pos, .. } => pos.as_ref().map(|p| p.line()),
            _ => None,
        };
        CsvImportError::Parse {
            message: err.to_string(),
            row: row.unwrap_or(0),
        }
    }
}

/// Parse CSV text into a fresh Column Set and Row Set. The first record is
/// the header; header fields are trimmed, and empty or "Unnamed..."
/// placeholder fields are dropped, mirroring Column Set validation. Every
/// data record becomes a new row with a freshly generated identifier.
pub async fn import_csv<R: io::AsyncRead + Unpin + Send>(
    reader: R,
) -> Result<ImportedTable, CsvImportError> {
    let mut csv_reader = AsyncReaderBuilder::new()
        .has_headers(true)
        .create_reader(reader);

    let headers = csv_reader.headers().await?.clone();

    // Keep the source field index of every surviving column so ragged or
    // reordered records still land in the right place.
    let columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .map(|(idx, field)| (idx, field.trim().to_string()))
        .filter(|(_, name)| !name.is_empty())
        .filter(|(_, name)| !is_placeholder_name(name))
        .collect();

    if columns.is_empty() {
        return Err(CsvImportError::NoColumns);
    }

    let mut rows = Vec::new();
    let mut records = csv_reader.records();
    while let Some(record) = records.next().await {
        let record = record?;
        let data: BTreeMap<String, String> = columns
            .iter()
            .map(|(idx, name)| {
                (
                    name.clone(),
                    record.get(*idx).unwrap_or("").to_string(),
                )
            })
            .collect();
        rows.push(Row::new(data));
    }

    Ok(ImportedTable {
        columns: columns.into_iter().map(|(_, name)| name).collect(),
        rows,
    })
}
