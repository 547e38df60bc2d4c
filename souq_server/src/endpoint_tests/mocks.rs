use mockall::mock;
use souq_engine::traits::{GatewayError, GatewayRefund, PaymentProvider};

mock! {
    pub Gateway {}
    impl PaymentProvider for Gateway {
        async fn transaction_id_for(&self, gateway_order_id: &str) -> Result<String, GatewayError>;
        async fn refund(&self, transaction_id: &str, amount_cents: i64) -> Result<GatewayRefund, GatewayError>;
    }
}

/// A gateway that must not be called at all
pub fn silent_gateway() -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway.expect_transaction_id_for().never();
    gateway.expect_refund().never();
    gateway
}
