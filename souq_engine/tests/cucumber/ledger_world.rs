use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
    Mutex,
};

use cucumber::World;
use log::*;
use souq_engine::{
    events::EventProducers,
    traits::{GatewayError, GatewayRefund, PaymentProvider},
    LedgerApi,
    OrderFlowApi,
    PayoutApi,
    ReturnsApi,
    SqliteDatabase,
};

#[derive(Default, Debug, World)]
pub struct LedgerWorld {
    pub system: Option<MarketplaceSystem>,
    /// The return request the scenario is working on
    pub current_return: Option<i64>,
    /// The error produced by the last step that was allowed to fail
    pub last_error: Option<String>,
}

#[derive(Debug)]
pub struct MarketplaceSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub gateway: StubGateway,
}

impl LedgerWorld {
    pub fn system(&self) -> &MarketplaceSystem {
        self.system.as_ref().expect("The marketplace has not been set up")
    }

    pub fn db(&self) -> SqliteDatabase {
        self.system().db.clone()
    }

    pub fn order_api(&self) -> OrderFlowApi<SqliteDatabase> {
        OrderFlowApi::new(self.db(), EventProducers::default())
    }

    pub fn ledger_api(&self) -> LedgerApi<SqliteDatabase> {
        LedgerApi::new(self.db())
    }

    pub fn payout_api(&self) -> PayoutApi<SqliteDatabase> {
        PayoutApi::new(self.db())
    }

    pub fn returns_api(&self) -> ReturnsApi<SqliteDatabase, StubGateway> {
        ReturnsApi::new(self.db(), self.system().gateway.clone(), EventProducers::default())
    }

    pub fn current_return(&self) -> i64 {
        self.current_return.expect("No return request has been filed")
    }
}

/// A payment gateway that accepts every refund unless it has been switched off, and remembers what it refunded
#[derive(Debug, Clone, Default)]
pub struct StubGateway {
    pub down: Arc<AtomicBool>,
    pub refunds: Arc<Mutex<Vec<i64>>>,
}

impl StubGateway {
    pub fn refunded(&self) -> Vec<i64> {
        self.refunds.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl PaymentProvider for StubGateway {
    async fn transaction_id_for(&self, gateway_order_id: &str) -> Result<String, GatewayError> {
        Ok(format!("tx-{gateway_order_id}"))
    }

    async fn refund(&self, transaction_id: &str, amount_cents: i64) -> Result<GatewayRefund, GatewayError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("503 Service Unavailable".into()));
        }
        debug!("💳️ Stub gateway refunding {amount_cents} on {transaction_id}");
        let mut refunds = self.refunds.lock().map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        refunds.push(amount_cents);
        Ok(GatewayRefund { reference: format!("rf-{}", refunds.len()), amount_cents, pending: false })
    }
}
