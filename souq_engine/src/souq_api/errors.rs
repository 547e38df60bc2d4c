use thiserror::Error;

use crate::{db_types::OrderId, traits::{GatewayError, StorageError}};

/// Maps the storage error kinds that every API shares onto the API's own variants.
macro_rules! from_storage_error {
    ($err:ident) => {
        impl From<StorageError> for $err {
            fn from(e: StorageError) -> Self {
                match e {
                    StorageError::NotFound(s) => Self::NotFound(s),
                    StorageError::Conflict(s) => Self::InvalidTransition(s),
                    e => Self::DatabaseError(e.to_string()),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Invalid order: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Order {0} already exists")]
    OrderAlreadyExists(OrderId),
    #[error("Invalid status change: {0}")]
    InvalidTransition(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Could not write the ledger for the order: {0}")]
    LedgerError(#[from] LedgerApiError),
}

from_storage_error!(OrderFlowError);

#[derive(Debug, Clone, Error)]
pub enum BrandApiError {
    #[error("Invalid brand: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid change: {0}")]
    InvalidTransition(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

from_storage_error!(BrandApiError);

#[derive(Debug, Clone, Error)]
pub enum LedgerApiError {
    #[error("Invalid ledger request: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid change: {0}")]
    InvalidTransition(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

from_storage_error!(LedgerApiError);

#[derive(Debug, Clone, Error)]
pub enum PayoutApiError {
    #[error("Invalid payout request: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid payout status change: {0}")]
    InvalidTransition(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

from_storage_error!(PayoutApiError);

#[derive(Debug, Clone, Error)]
pub enum ReturnsApiError {
    #[error("Invalid return request: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid return status change: {0}")]
    InvalidTransition(String),
    #[error("Payment gateway error: {0}")]
    GatewayError(#[from] GatewayError),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

from_storage_error!(ReturnsApiError);

impl ReturnsApiError {
    /// True if the same request could succeed when retried later, with nothing having been changed by this attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::GatewayError(e) if e.is_retryable())
    }
}
