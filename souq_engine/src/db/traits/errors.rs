use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("The write conflicts with existing data: {0}")]
    Conflict(String),
    #[error("Stored data could not be interpreted: {0}")]
    InvalidData(String),
}
