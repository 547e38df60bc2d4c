use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::json;

use super::{
    helpers::{json, money, paid_order, send, unpaid_order, TestDb},
    mocks::silent_gateway,
};
use crate::data_objects::IngestOrderRequest;

#[actix_web::test]
async fn health_check() {
    let t = TestDb::new().await;
    let (status, body) = send(&t.db, silent_gateway(), TestRequest::get().uri("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
    t.tear_down().await;
}

#[actix_web::test]
async fn brands_are_created_and_fetched() {
    let t = TestDb::new().await;
    let req = TestRequest::post()
        .uri("/api/brands")
        .set_json(json!({"id": "nile", "name": "Nile Leather", "commission_rate": 0.2}));
    let (status, body) = send(&t.db, silent_gateway(), req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let brand = json(&body);
    assert_eq!(brand["commission_rate"], 0.2);
    assert_eq!(brand["tax_rate"], 0.14);

    let (status, body) = send(&t.db, silent_gateway(), TestRequest::get().uri("/api/brands/nile")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["name"], "Nile Leather");

    let (status, body) = send(&t.db, silent_gateway(), TestRequest::get().uri("/api/brands/delta")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json(&body)["error"].as_str().unwrap().contains("delta"));
    t.tear_down().await;
}

#[actix_web::test]
async fn brand_rates_must_be_fractions() {
    let t = TestDb::new().await;
    let req =
        TestRequest::post().uri("/api/brands").set_json(json!({"id": "nile", "name": "Nile", "commission_rate": 1.5}));
    let (status, _) = send(&t.db, silent_gateway(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    t.tear_down().await;
}

#[actix_web::test]
async fn paid_orders_are_booked_on_ingestion() {
    let t = TestDb::new().await;
    let nile = t.seed_brand("nile").await;
    let order = IngestOrderRequest { order: paid_order("1001", "alice", &nile, "500100"), billing: None };
    let req = TestRequest::post().uri("/api/orders").set_json(&order);
    let (status, body) = send(&t.db, silent_gateway(), req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let result = json(&body);
    assert!(result["checkout"].is_null());
    assert_eq!(money(&result["order"]["brand_payout"]), 660.0);
    assert_eq!(money(&result["order"]["net_admin_profit"]), 120.0);

    let req = TestRequest::post().uri("/api/orders").set_json(&order);
    let (status, body) = send(&t.db, silent_gateway(), req).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json(&body)["error"].as_str().unwrap().contains("1001 already exists"));
    t.tear_down().await;
}

#[actix_web::test]
async fn inconsistent_orders_are_rejected() {
    let t = TestDb::new().await;
    let nile = t.seed_brand("nile").await;
    let mut order = unpaid_order("1002", "alice", &nile);
    order.cart_items[0].quantity = 3;
    let req = TestRequest::post().uri("/api/orders").set_json(IngestOrderRequest { order, billing: None });
    let (status, body) = send(&t.db, silent_gateway(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    let (status, _) = send(&t.db, silent_gateway(), TestRequest::get().uri("/api/orders/1002")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    t.tear_down().await;
}

#[actix_web::test]
async fn oversized_amounts_are_rejected() {
    let t = TestDb::new().await;
    t.seed_brand("nile").await;
    let req = TestRequest::post().uri("/api/orders").set_json(json!({
        "id": "1005",
        "customer_id": "alice",
        "cart_items": [{
            "product_id": "p1",
            "brand_id": "nile",
            "quantity": 1000,
            "unit_price": 50_000_000_000_000_000_i64,
            "total_price": 1
        }],
        "total": 1,
        "paid": true,
        "gateway_order_id": "500105"
    }));
    let (status, body) = send(&t.db, silent_gateway(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert!(json(&body)["error"].as_str().unwrap().contains("out of range"));
    let (status, _) = send(&t.db, silent_gateway(), TestRequest::get().uri("/api/orders/1005")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    t.tear_down().await;
}

#[actix_web::test]
async fn card_orders_are_kept_when_the_gateway_is_down() {
    let t = TestDb::new().await;
    let nile = t.seed_brand("nile").await;
    let order = IngestOrderRequest { order: unpaid_order("1003", "alice", &nile), billing: None };
    let req = TestRequest::post().uri("/api/orders").set_json(&order);
    let (status, body) = send(&t.db, silent_gateway(), req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let result = json(&body);
    assert!(result["checkout"].is_null());
    assert_eq!(result["order"]["payment_details"]["paid"], false);

    let (status, body) = send(&t.db, silent_gateway(), TestRequest::get().uri("/api/orders/1003")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["order_status"], "Pending");
    t.tear_down().await;
}

#[actix_web::test]
async fn order_lifecycle() {
    let t = TestDb::new().await;
    let nile = t.seed_brand("nile").await;
    let order = IngestOrderRequest { order: paid_order("1004", "alice", &nile, "500104"), billing: None };
    send(&t.db, silent_gateway(), TestRequest::post().uri("/api/orders").set_json(&order)).await;

    let req = TestRequest::post().uri("/api/orders/1004/status").set_json(json!({"status": "Delivered"}));
    let (status, _) = send(&t.db, silent_gateway(), req).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let req = TestRequest::post().uri("/api/orders/1004/status").set_json(json!({"status": "Processing"}));
    let (status, body) = send(&t.db, silent_gateway(), req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["order_status"], "Processing");

    let req = TestRequest::post().uri("/api/orders/1004/delivery_date").set_json(json!({"delivery_date": "2024-03-20"}));
    let (status, body) = send(&t.db, silent_gateway(), req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["delivery_date"], "2024-03-20");

    let req = TestRequest::post().uri("/api/orders/9999/status").set_json(json!({"status": "Processing"}));
    let (status, _) = send(&t.db, silent_gateway(), req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    t.tear_down().await;
}
