use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthRequest {
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
}

/// A line item as it appears on a Paymob remote order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderItem {
    pub name: String,
    pub amount_cents: i64,
    pub description: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteOrderRequest {
    pub auth_token: String,
    pub delivery_needed: bool,
    pub amount_cents: i64,
    pub currency: String,
    pub merchant_order_id: String,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteOrder {
    pub id: i64,
    #[serde(default)]
    pub merchant_order_id: Option<String>,
    #[serde(default)]
    pub amount_cents: i64,
}

/// Customer details Paymob requires when issuing a payment key. Every field is mandatory on their side, so unknown
/// values are sent as "NA".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BillingData {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub apartment: String,
    pub floor: String,
    pub street: String,
    pub building: String,
    pub city: String,
    pub country: String,
    pub state: String,
    pub postal_code: String,
    pub shipping_method: String,
}

impl Default for BillingData {
    fn default() -> Self {
        let na = || "NA".to_string();
        Self {
            first_name: na(),
            last_name: na(),
            email: na(),
            phone_number: na(),
            apartment: na(),
            floor: na(),
            street: na(),
            building: na(),
            city: na(),
            country: na(),
            state: na(),
            postal_code: na(),
            shipping_method: na(),
        }
    }
}

impl BillingData {
    pub fn new(first_name: &str, last_name: &str, email: &str, phone_number: &str) -> Self {
        Self {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            phone_number: phone_number.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentKeyRequest {
    pub auth_token: String,
    pub amount_cents: i64,
    pub expiration: u64,
    pub order_id: i64,
    pub billing_data: BillingData,
    pub currency: String,
    pub integration_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentKeyResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionInquiry {
    pub auth_token: String,
    pub order_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundRequest {
    pub auth_token: String,
    pub transaction_id: i64,
    pub amount_cents: i64,
}

/// The gateway's record of a processed refund.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefundConfirmation {
    /// The id of the refund transaction (not the id of the refunded charge)
    pub id: i64,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub pending: bool,
    #[serde(default)]
    pub amount_cents: i64,
    #[serde(default)]
    pub is_refund: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallbackOrder {
    pub id: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceData {
    #[serde(default)]
    pub pan: String,
    #[serde(default)]
    pub sub_type: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// The `obj` of a "transaction processed" callback. Only the fields that take part in the HMAC, plus the ones the
/// marketplace acts on, are modelled.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TransactionCallback {
    pub id: i64,
    pub pending: bool,
    pub amount_cents: i64,
    pub success: bool,
    pub is_auth: bool,
    pub is_capture: bool,
    pub is_standalone_payment: bool,
    pub is_voided: bool,
    pub is_refunded: bool,
    pub is_3d_secure: bool,
    pub integration_id: i64,
    pub has_parent_transaction: bool,
    pub error_occured: bool,
    pub owner: i64,
    pub created_at: String,
    pub currency: String,
    pub order: CallbackOrder,
    pub source_data: SourceData,
}

impl TransactionCallback {
    /// A completed, successful charge. Refunds and voids also arrive as callbacks and are not payments.
    pub fn is_successful_payment(&self) -> bool {
        self.success && !self.pending && !self.is_refunded && !self.is_voided && !self.has_parent_transaction
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    pub obj: TransactionCallback,
}
