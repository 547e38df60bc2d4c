use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    config::PaymobConfig,
    data_objects::{
        AuthRequest,
        AuthResponse,
        PaymentKeyRequest,
        PaymentKeyResponse,
        RefundRequest,
        RemoteOrder,
        RemoteOrderRequest,
        TransactionInquiry,
    },
    signature::verify_signature,
    BillingData,
    OrderItem,
    PaymobApiError,
    RefundConfirmation,
    TransactionCallback,
};

/// Payment keys stay valid for an hour
const PAYMENT_KEY_EXPIRY_SECS: u64 = 3600;

#[derive(Clone)]
pub struct PaymobApi {
    config: PaymobConfig,
    client: Arc<Client>,
}

impl PaymobApi {
    pub fn new(config: PaymobConfig) -> Result<Self, PaymobApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| PaymobApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &PaymobConfig {
        &self.config
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, PaymobApiError> {
        let url = self.url(path);
        trace!("💳️ Sending REST query: {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                PaymobApiError::Timeout(e.to_string())
            } else if e.is_connect() {
                PaymobApiError::Unavailable(e.to_string())
            } else {
                PaymobApiError::RestRequestError(e.to_string())
            }
        })?;
        if response.status().is_success() {
            trace!("💳️ REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| PaymobApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| PaymobApiError::RestResponseError(e.to_string()))?;
            Err(PaymobApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// Fetches a fresh auth token. Tokens are short-lived, so callers request one per operation.
    pub async fn authenticate(&self) -> Result<String, PaymobApiError> {
        let body = AuthRequest { api_key: self.config.api_key.reveal().clone() };
        let result = self.rest_query::<AuthResponse, _>(Method::POST, "/auth/tokens", Some(body)).await?;
        trace!("💳️ Obtained auth token");
        Ok(result.token)
    }

    /// Registers an order with the gateway and returns the gateway's id for it.
    pub async fn create_remote_order(
        &self,
        amount_cents: i64,
        items: &[OrderItem],
        merchant_order_id: &str,
    ) -> Result<i64, PaymobApiError> {
        let auth_token = self.authenticate().await?;
        let body = RemoteOrderRequest {
            auth_token,
            delivery_needed: false,
            amount_cents,
            currency: self.config.currency.clone(),
            merchant_order_id: merchant_order_id.to_string(),
            items: items.to_vec(),
        };
        let order = self.rest_query::<RemoteOrder, _>(Method::POST, "/ecommerce/orders", Some(body)).await?;
        info!("💳️ Created remote order {} for {merchant_order_id}", order.id);
        Ok(order.id)
    }

    pub async fn create_payment_key(
        &self,
        remote_order_id: i64,
        amount_cents: i64,
        billing_data: &BillingData,
    ) -> Result<String, PaymobApiError> {
        let auth_token = self.authenticate().await?;
        let body = PaymentKeyRequest {
            auth_token,
            amount_cents,
            expiration: PAYMENT_KEY_EXPIRY_SECS,
            order_id: remote_order_id,
            billing_data: billing_data.clone(),
            currency: self.config.currency.clone(),
            integration_id: self.config.integration_id,
        };
        let key =
            self.rest_query::<PaymentKeyResponse, _>(Method::POST, "/acceptance/payment_keys", Some(body)).await?;
        debug!("💳️ Issued payment key for remote order {remote_order_id}");
        Ok(key.token)
    }

    /// The hosted checkout page for a payment key.
    pub fn checkout_url(&self, payment_token: &str) -> Result<String, PaymobApiError> {
        let iframe = self.config.iframe_id.as_ref().ok_or(PaymobApiError::MissingIframe)?;
        Ok(format!("{}/acceptance/iframes/{iframe}?payment_token={payment_token}", self.config.base_url))
    }

    /// Looks up the charge made against a remote order. The transaction id is what refunds are issued against; it is
    /// not the remote order id.
    pub async fn get_transaction_id(&self, remote_order_id: i64) -> Result<i64, PaymobApiError> {
        #[derive(Deserialize)]
        struct InquiryResponse {
            id: Option<i64>,
        }
        let auth_token = self.authenticate().await?;
        let body = TransactionInquiry { auth_token, order_id: remote_order_id };
        let result = self
            .rest_query::<InquiryResponse, _>(Method::POST, "/ecommerce/orders/transaction_inquiry", Some(body))
            .await?;
        let id = result.id.ok_or_else(|| PaymobApiError::NoTransaction(remote_order_id.to_string()))?;
        debug!("💳️ Remote order {remote_order_id} was paid with transaction {id}");
        Ok(id)
    }

    pub async fn refund(&self, transaction_id: i64, amount_cents: i64) -> Result<RefundConfirmation, PaymobApiError> {
        let auth_token = self.authenticate().await?;
        let body = RefundRequest { auth_token, transaction_id, amount_cents };
        info!("💳️ Requesting refund of {amount_cents} cents against transaction {transaction_id}");
        let confirmation = self
            .rest_query::<RefundConfirmation, _>(Method::POST, "/acceptance/void_refund/refund", Some(body))
            .await?;
        if !confirmation.success && !confirmation.pending {
            warn!("💳️ Refund against transaction {transaction_id} was declined");
            return Err(PaymobApiError::Declined(format!("Refund against transaction {transaction_id} failed")));
        }
        info!("💳️ Refund {} against transaction {transaction_id} accepted", confirmation.id);
        Ok(confirmation)
    }

    pub fn verify_webhook_signature(&self, tx: &TransactionCallback, signature: &str) -> bool {
        verify_signature(self.config.hmac_secret.reveal(), tx, signature)
    }
}
