pub mod error;
#[cfg(feature = "postgres")]
pub mod postgresql;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod storage;
pub mod storage_factory;

pub use error::StorageError;
pub use storage::{StorageInstance, TableSnapshot};
