use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use paymob_tools::PaymobApiError;
use serde_json::json;
use souq_engine::{
    traits::GatewayError,
    BrandApiError,
    LedgerApiError,
    OrderFlowError,
    PayoutApiError,
    ReturnsApiError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("{0}")]
    InvalidTransition(String),
    #[error("The payment gateway is temporarily unavailable. {0}")]
    GatewayUnavailable(String),
    #[error("The payment gateway rejected the request. {0}")]
    GatewayRejected(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ServerError {
    /// True if the client may repeat the request later and expect it to succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::GatewayUnavailable(_))
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidTransition(_) => StatusCode::CONFLICT,
            Self::GatewayUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::GatewayRejected(_) => StatusCode::BAD_GATEWAY,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            error!("💻️ {self}");
        }
        let body = if self.is_retryable() {
            json!({ "error": self.to_string(), "retryable": true })
        } else {
            json!({ "error": self.to_string() })
        };
        HttpResponse::build(self.status_code()).insert_header(ContentType::json()).body(body.to_string())
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::ValidationError(_) => Self::ValidationError(e.to_string()),
            OrderFlowError::NotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderFlowError::OrderAlreadyExists(_) => Self::InvalidTransition(e.to_string()),
            OrderFlowError::InvalidTransition(_) => Self::InvalidTransition(e.to_string()),
            OrderFlowError::DatabaseError(_) => Self::BackendError(e.to_string()),
            OrderFlowError::LedgerError(e) => e.into(),
        }
    }
}

impl From<BrandApiError> for ServerError {
    fn from(e: BrandApiError) -> Self {
        match e {
            BrandApiError::ValidationError(_) => Self::ValidationError(e.to_string()),
            BrandApiError::NotFound(_) => Self::NoRecordFound(e.to_string()),
            BrandApiError::InvalidTransition(_) => Self::InvalidTransition(e.to_string()),
            BrandApiError::DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<LedgerApiError> for ServerError {
    fn from(e: LedgerApiError) -> Self {
        match e {
            LedgerApiError::ValidationError(_) => Self::ValidationError(e.to_string()),
            LedgerApiError::NotFound(_) => Self::NoRecordFound(e.to_string()),
            LedgerApiError::InvalidTransition(_) => Self::InvalidTransition(e.to_string()),
            LedgerApiError::DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<PayoutApiError> for ServerError {
    fn from(e: PayoutApiError) -> Self {
        match e {
            PayoutApiError::ValidationError(_) => Self::ValidationError(e.to_string()),
            PayoutApiError::NotFound(_) => Self::NoRecordFound(e.to_string()),
            PayoutApiError::InvalidTransition(_) => Self::InvalidTransition(e.to_string()),
            PayoutApiError::DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<ReturnsApiError> for ServerError {
    fn from(e: ReturnsApiError) -> Self {
        match e {
            ReturnsApiError::ValidationError(_) => Self::ValidationError(e.to_string()),
            ReturnsApiError::NotFound(_) => Self::NoRecordFound(e.to_string()),
            ReturnsApiError::InvalidTransition(_) => Self::InvalidTransition(e.to_string()),
            ReturnsApiError::GatewayError(e) => e.into(),
            ReturnsApiError::DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<GatewayError> for ServerError {
    fn from(e: GatewayError) -> Self {
        if e.is_retryable() {
            Self::GatewayUnavailable(e.to_string())
        } else {
            Self::GatewayRejected(e.to_string())
        }
    }
}

impl From<PaymobApiError> for ServerError {
    fn from(e: PaymobApiError) -> Self {
        match e {
            PaymobApiError::MissingIframe | PaymobApiError::Initialization(_) => Self::ConfigurationError(e.to_string()),
            e if e.is_retryable() => Self::GatewayUnavailable(e.to_string()),
            e => Self::GatewayRejected(e.to_string()),
        }
    }
}
