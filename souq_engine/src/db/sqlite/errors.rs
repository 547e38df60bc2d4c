use sqlx::migrate::MigrateError;

use crate::traits::StorageError;

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => Self::NotFound("The requested row does not exist".into()),
            sqlx::Error::Database(db) if db.is_unique_violation() => Self::Conflict(db.message().to_string()),
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => Self::InvalidData(e.to_string()),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}

impl From<MigrateError> for StorageError {
    fn from(e: MigrateError) -> Self {
        Self::DatabaseError(format!("Migration failed. {e}"))
    }
}
