//! Wires the Paymob client into the engine.
//!
//! [`PaymobProvider`] is the engine's [`PaymentProvider`] for refunds. [`start_checkout`] registers a new card order
//! with Paymob and issues the payment key the storefront needs to take the payment.
use log::*;
use paymob_tools::{BillingData, OrderItem, PaymobApi, PaymobApiError};
use souq_engine::{
    db_types::{Order, PaymentMethod},
    traits::{GatewayError, GatewayRefund, MarketplaceDatabase, PaymentProvider},
    OrderFlowApi,
};

use crate::{data_objects::CheckoutDetails, errors::ServerError};

#[derive(Clone)]
pub struct PaymobProvider {
    api: PaymobApi,
}

impl PaymobProvider {
    pub fn new(api: PaymobApi) -> Self {
        Self { api }
    }
}

impl PaymentProvider for PaymobProvider {
    async fn transaction_id_for(&self, gateway_order_id: &str) -> Result<String, GatewayError> {
        let remote_order_id = parse_paymob_id(gateway_order_id)?;
        let id = self.api.get_transaction_id(remote_order_id).await.map_err(gateway_error)?;
        Ok(id.to_string())
    }

    async fn refund(&self, transaction_id: &str, amount_cents: i64) -> Result<GatewayRefund, GatewayError> {
        let transaction_id = parse_paymob_id(transaction_id)?;
        let confirmation = self.api.refund(transaction_id, amount_cents).await.map_err(gateway_error)?;
        Ok(GatewayRefund {
            reference: confirmation.id.to_string(),
            amount_cents: confirmation.amount_cents,
            pending: confirmation.pending,
        })
    }
}

fn parse_paymob_id(id: &str) -> Result<i64, GatewayError> {
    id.trim().parse::<i64>().map_err(|_| GatewayError::Rejected(format!("{id} is not a Paymob identifier")))
}

/// Sorts client errors into the engine's retryable and non-retryable gateway failures.
pub fn gateway_error(e: PaymobApiError) -> GatewayError {
    match e {
        PaymobApiError::Timeout(s) => GatewayError::Timeout(s),
        PaymobApiError::Unavailable(s) | PaymobApiError::RestRequestError(s) => GatewayError::Unavailable(s),
        e @ PaymobApiError::QueryError { .. } if e.is_retryable() => GatewayError::Unavailable(e.to_string()),
        PaymobApiError::JsonError(s) | PaymobApiError::RestResponseError(s) => GatewayError::InvalidResponse(s),
        e => GatewayError::Rejected(e.to_string()),
    }
}

/// Starts a card payment for an unpaid order.
///
/// The order is registered with Paymob for its full total and the remote order id is stored on the order, so that the
/// transaction callback can find it later. Orders that are already paid, or that are paid on delivery, are left alone.
pub async fn start_checkout<B: MarketplaceDatabase>(
    api: &PaymobApi,
    orders: &OrderFlowApi<B>,
    order: &Order,
    billing: &BillingData,
) -> Result<Option<CheckoutDetails>, ServerError> {
    if order.is_paid() || order.payment_details.method != PaymentMethod::Card {
        trace!("💳️ Order {} does not need a card checkout", order.id);
        return Ok(None);
    }
    let items = order
        .cart_items
        .iter()
        .map(|item| OrderItem {
            name: item.product_id.clone(),
            amount_cents: item.unit_price.cents(),
            description: format!("{} from {}", item.product_id, item.brand_id),
            quantity: item.quantity,
        })
        .collect::<Vec<_>>();
    let amount_cents = order.total.cents();
    let remote_order_id = api.create_remote_order(amount_cents, &items, order.id.as_str()).await?;
    let gateway_order_id = remote_order_id.to_string();
    orders.attach_gateway_order(&order.id, &gateway_order_id).await?;
    let payment_token = api.create_payment_key(remote_order_id, amount_cents, billing).await?;
    let checkout_url = match api.checkout_url(&payment_token) {
        Ok(url) => Some(url),
        Err(PaymobApiError::MissingIframe) => None,
        Err(e) => return Err(e.into()),
    };
    info!("💳️ Checkout started for order {} as Paymob order {gateway_order_id}", order.id);
    Ok(Some(CheckoutDetails { gateway_order_id, payment_token, checkout_url }))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn client_errors_are_classified() {
        assert!(gateway_error(PaymobApiError::Timeout("15s".into())).is_retryable());
        assert!(gateway_error(PaymobApiError::Unavailable("refused".into())).is_retryable());
        let e = gateway_error(PaymobApiError::QueryError { status: 502, message: "Bad Gateway".into() });
        assert!(matches!(e, GatewayError::Unavailable(_)));
        let e = gateway_error(PaymobApiError::QueryError { status: 400, message: "amount too large".into() });
        assert!(matches!(e, GatewayError::Rejected(ref s) if s.contains("amount too large")));
        let e = gateway_error(PaymobApiError::Declined("no".into()));
        assert!(!e.is_retryable());
        let e = gateway_error(PaymobApiError::JsonError("eof".into()));
        assert!(matches!(e, GatewayError::InvalidResponse(_)));
    }

    #[test]
    fn ids_must_be_numeric() {
        assert_eq!(parse_paymob_id(" 217503754 ").unwrap(), 217503754);
        assert!(matches!(parse_paymob_id("gw-1"), Err(GatewayError::Rejected(_))));
    }
}
