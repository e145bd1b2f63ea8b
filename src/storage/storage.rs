use crate::datamodel::Row;
use anyhow::Result;
use async_trait::async_trait;
use std::fmt::Debug;

/// The current persisted table: the Column Set and all rows in creation
/// order. Column Set and Row Set are always read and replaced together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSnapshot {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

#[async_trait]
pub trait StorageInstance: Send + Sync + Debug {
    /// Lazy, idempotent schema creation. Seeds the default Column Set when
    /// no meta record exists yet.
    async fn create_or_migrate(&self) -> Result<()>;

    /// Read the Column Set and all rows in creation order. Self-healing:
    /// placeholder or empty column names left behind by an old import are
    /// stripped and, when that changes anything, persisted back.
    async fn fetch_table(&self) -> Result<TableSnapshot>;

    /// Full replacement of the persisted table: the meta record is
    /// superseded, every existing row is deleted and the submitted rows are
    /// inserted with their value-maps restricted to the new Column Set.
    /// Runs in a single transaction so readers never observe a transient
    /// empty table.
    async fn replace_table(&self, columns: &[String], rows: &[Row]) -> Result<()>;

    async fn health_check(&self) -> Result<()>;
}
