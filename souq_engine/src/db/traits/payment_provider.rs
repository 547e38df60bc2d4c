use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("The payment gateway timed out: {0}")]
    Timeout(String),
    #[error("The payment gateway is unavailable: {0}")]
    Unavailable(String),
    #[error("The payment gateway rejected the request: {0}")]
    Rejected(String),
    #[error("The payment gateway returned an unexpected response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Unavailable(_))
    }
}

/// The gateway's acknowledgement of a refund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayRefund {
    /// The gateway's id for the refund transaction
    pub reference: String,
    pub amount_cents: i64,
    /// True if the gateway accepted the refund but has not settled it yet
    pub pending: bool,
}

/// The engine's view of the payment gateway. Implementations must bound every call with a timeout.
#[allow(async_fn_in_trait)]
pub trait PaymentProvider {
    /// Resolves the charge made against a remote gateway order. The remote order id and the transaction id are
    /// different identifiers.
    async fn transaction_id_for(&self, gateway_order_id: &str) -> Result<String, GatewayError>;

    /// Refunds `amount_cents` minor units of the given charge.
    async fn refund(&self, transaction_id: &str, amount_cents: i64) -> Result<GatewayRefund, GatewayError>;
}
