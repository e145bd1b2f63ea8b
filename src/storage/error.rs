use thiserror::Error;

/// Storage-specific errors that can occur during database operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database connection or query execution error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid data format in database
    #[error("Invalid data format: {message} for {context}")]
    InvalidDataFormat { message: String, context: String },
}

impl StorageError {
    pub fn invalid_data_format(message: impl Into<String>, context: impl Into<String>) -> Self {
        StorageError::InvalidDataFormat {
            message: message.into(),
            context: context.into(),
        }
    }
}
