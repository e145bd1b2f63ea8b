use anyhow::Result;
use medtable::storage::{StorageInstance, storage_factory::create_storage_from_connection_string};
use std::sync::Arc;

pub mod http;

/// Isolated in-memory test database
pub struct TestDb {
    pub storage: Arc<dyn StorageInstance>,
}

impl TestDb {
    /// Create a fresh database with the schema and default columns in place
    pub async fn new() -> Result<Self> {
        let storage = create_storage_from_connection_string("sqlite::memory:").await?;
        storage.create_or_migrate().await?;
        Ok(Self { storage })
    }

    /// Get the storage instance for testing
    pub fn storage(&self) -> Arc<dyn StorageInstance> {
        self.storage.clone()
    }
}
