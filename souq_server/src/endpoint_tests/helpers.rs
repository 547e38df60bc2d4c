use std::time::Duration;

use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web, App};
use log::debug;
use paymob_tools::{PaymobApi, PaymobConfig};
use serde_json::Value;
use souq_common::Secret;
use souq_engine::{
    db_types::{BrandId, CartItem, Money, NewBrand, NewOrder, OrderId},
    events::EventProducers,
    test_utils::prepare_env::{drop_database, prepare_test_env, random_db_path},
    traits::BrandManagement,
    BrandApi,
    LedgerApi,
    OrderFlowApi,
    PayoutApi,
    ReturnsApi,
    SqliteDatabase,
};

use super::mocks::MockGateway;
use crate::server::configure_routes;

pub const HMAC_SECRET: &str = "paymob-test-secret";

pub struct TestDb {
    url: String,
    pub db: SqliteDatabase,
}

impl TestDb {
    pub async fn new() -> Self {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error connecting to test database");
        Self { url, db }
    }

    pub async fn tear_down(self) {
        self.db.close().await;
        drop_database(&self.url).await;
    }

    pub async fn seed_brand(&self, id: &str) -> BrandId {
        self.db.upsert_brand(NewBrand::new(id, &id.to_uppercase())).await.expect("Error creating brand").id
    }
}

/// A Paymob client pointed at a port nothing listens on
pub fn offline_paymob() -> PaymobApi {
    let config = PaymobConfig {
        base_url: "http://127.0.0.1:9".into(),
        api_key: Secret::new("key".into()),
        hmac_secret: Secret::new(HMAC_SECRET.into()),
        timeout: Duration::from_secs(2),
        ..Default::default()
    };
    PaymobApi::new(config).expect("Error creating Paymob client")
}

/// Sends a single request to a fully configured app, backed by `db` and the given gateway.
pub async fn send(db: &SqliteDatabase, gateway: MockGateway, req: TestRequest) -> (StatusCode, String) {
    let app = App::new()
        .app_data(web::Data::new(OrderFlowApi::new(db.clone(), EventProducers::default())))
        .app_data(web::Data::new(BrandApi::new(db.clone())))
        .app_data(web::Data::new(LedgerApi::new(db.clone())))
        .app_data(web::Data::new(PayoutApi::new(db.clone())))
        .app_data(web::Data::new(ReturnsApi::new(db.clone(), gateway, EventProducers::default())))
        .app_data(web::Data::new(offline_paymob()))
        .configure(|cfg| configure_routes::<SqliteDatabase, MockGateway>(cfg, Secret::new(HMAC_SECRET.into()), true));
    let service = test::init_service(app).await;
    debug!("Making request");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            (status, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            let body = res.into_body().try_into_bytes().unwrap_or_default();
            (status, String::from_utf8_lossy(&body).into_owned())
        },
    }
}

pub fn json(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Response was not JSON ({e}): {body}"))
}

pub fn money(v: &Value) -> f64 {
    v.as_f64().unwrap_or_else(|| panic!("{v} is not an amount"))
}

/// The canonical 1000 order plus 50 shipping, paid through Paymob order `gateway_order_id`
pub fn paid_order(id: &str, customer: &str, brand: &BrandId, gateway_order_id: &str) -> NewOrder {
    unpaid_order(id, customer, brand).paid_with(gateway_order_id)
}

pub fn unpaid_order(id: &str, customer: &str, brand: &BrandId) -> NewOrder {
    NewOrder::new(
        OrderId::from(id),
        customer.to_string(),
        vec![CartItem::new(&format!("{id}-p1"), brand, 1, Money::from_major(1000))],
        Money::from_major(50),
    )
}
