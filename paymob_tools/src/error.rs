use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaymobApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid REST request: {0}")]
    RestRequestError(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("The gateway did not respond in time: {0}")]
    Timeout(String),
    #[error("The gateway could not be reached: {0}")]
    Unavailable(String),
    #[error("The gateway declined the request: {0}")]
    Declined(String),
    #[error("No transaction exists for remote order {0}")]
    NoTransaction(String),
    #[error("No checkout iframe has been configured")]
    MissingIframe,
}

impl PaymobApiError {
    /// Timeouts, connection failures, throttling and 5xx responses may succeed if the call is repeated.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Unavailable(_) => true,
            Self::QueryError { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}
