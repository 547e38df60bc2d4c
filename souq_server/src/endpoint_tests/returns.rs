use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::json;
use souq_engine::{
    traits::{GatewayError, GatewayRefund},
    OrderFlowApi,
};

use super::{
    helpers::{json, money, paid_order, send, TestDb},
    mocks::{silent_gateway, MockGateway},
};

/// Seeds the canonical paid order (Paymob order 217503754) and files a return for it
async fn order_with_return(t: &TestDb) -> i64 {
    let nile = t.seed_brand("nile").await;
    let flow = OrderFlowApi::new(t.db.clone(), Default::default());
    flow.process_new_order(paid_order("2001", "alice", &nile, "217503754")).await.unwrap();
    let req = TestRequest::post().uri("/api/returns").set_json(json!({
        "order_id": "2001",
        "customer_id": "alice",
        "brand_id": "nile",
        "reason": "Wrong size"
    }));
    let (status, body) = send(&t.db, silent_gateway(), req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let request = json(&body);
    assert_eq!(money(&request["total_refund_amount"]), 1140.0);
    assert_eq!(request["status"], "Pending");
    request["id"].as_i64().unwrap()
}

fn accepting_gateway() -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway
        .expect_transaction_id_for()
        .withf(|id: &str| id == "217503754")
        .times(1)
        .returning(|_| Ok("192036465".to_string()));
    gateway
        .expect_refund()
        .withf(|tx: &str, amount: &i64| tx == "192036465" && *amount == 114_000)
        .times(1)
        .returning(|_, amount| Ok(GatewayRefund { reference: "192036999".into(), amount_cents: amount, pending: false }));
    gateway
}

fn timing_out_gateway() -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway.expect_transaction_id_for().times(1).returning(|_| Ok("192036465".to_string()));
    gateway.expect_refund().times(1).returning(|_, _| Err(GatewayError::Timeout("15s elapsed".into())));
    gateway
}

#[actix_web::test]
async fn refunding_a_return() {
    let t = TestDb::new().await;
    let id = order_with_return(&t).await;

    let req = TestRequest::post()
        .uri(&format!("/api/returns/{id}/brand_status"))
        .set_json(json!({"brand_id": "nile", "status": "Received"}));
    let (status, body) = send(&t.db, silent_gateway(), req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["brand_status"], "Received");

    let req = TestRequest::post()
        .uri(&format!("/api/returns/{id}/admin_status"))
        .set_json(json!({"status": "Refunded", "note": "Goods inspected"}));
    let (status, body) = send(&t.db, accepting_gateway(), req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let request = json(&body);
    assert_eq!(request["status"], "Refunded");
    assert_eq!(request["refund_reference"], "192036999");

    let (_, body) = send(&t.db, silent_gateway(), TestRequest::get().uri("/api/orders/2001")).await;
    let order = json(&body);
    assert_eq!(order["order_status"], "Refunded");
    assert_eq!(money(&order["brand_payout"]), 0.0);
    assert_eq!(money(&order["net_admin_profit"]), 0.0);

    let req = TestRequest::get().uri("/api/finance/logs?order_id=2001&kind=Reversal");
    let (status, body) = send(&t.db, silent_gateway(), req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let entries = json(&body);
    assert_eq!(entries.as_array().unwrap().len(), 1);
    assert_eq!(money(&entries[0]["total"]), -1000.0);
    assert_eq!(money(&entries[0]["brand_payout"]), -660.0);

    let (_, body) = send(&t.db, silent_gateway(), TestRequest::get().uri("/api/finance/totals?order_id=2001")).await;
    let totals = json(&body);
    assert_eq!(totals["entries"], 2);
    assert_eq!(money(&totals["total"]), 0.0);
    assert_eq!(money(&totals["net_admin_profit"]), 0.0);

    // A refunded return is final
    let req = TestRequest::post().uri(&format!("/api/returns/{id}/admin_status")).set_json(json!({"status": "Rejected"}));
    let (status, body) = send(&t.db, silent_gateway(), req).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json(&body)["error"].as_str().unwrap().contains("already been refunded"));
    t.tear_down().await;
}

#[actix_web::test]
async fn gateway_outages_change_nothing() {
    let t = TestDb::new().await;
    let id = order_with_return(&t).await;
    let req = TestRequest::post().uri(&format!("/api/returns/{id}/admin_status")).set_json(json!({"status": "Refunded"}));
    let (status, body) = send(&t.db, timing_out_gateway(), req).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let error = json(&body);
    assert_eq!(error["retryable"], true);
    assert!(error["error"].as_str().unwrap().contains("15s elapsed"));

    let (_, body) = send(&t.db, silent_gateway(), TestRequest::get().uri(&format!("/api/returns/{id}"))).await;
    assert_eq!(json(&body)["status"], "Pending");
    let (_, body) = send(&t.db, silent_gateway(), TestRequest::get().uri("/api/finance/logs?kind=Reversal")).await;
    assert_eq!(json(&body).as_array().unwrap().len(), 0);
    let (_, body) = send(&t.db, silent_gateway(), TestRequest::get().uri("/api/orders/2001")).await;
    assert_eq!(money(&json(&body)["brand_payout"]), 660.0);
    t.tear_down().await;
}

#[actix_web::test]
async fn brands_must_give_a_reason_for_missing_goods() {
    let t = TestDb::new().await;
    let id = order_with_return(&t).await;
    let req = TestRequest::post()
        .uri(&format!("/api/returns/{id}/brand_status"))
        .set_json(json!({"brand_id": "nile", "status": "Not Received"}));
    let (status, body) = send(&t.db, silent_gateway(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json(&body)["error"].as_str().unwrap().contains("reason is required"));

    let req = TestRequest::post()
        .uri(&format!("/api/returns/{id}/brand_status"))
        .set_json(json!({"brand_id": "delta", "status": "Received"}));
    let (status, _) = send(&t.db, silent_gateway(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = TestRequest::post()
        .uri(&format!("/api/returns/{id}/brand_status"))
        .set_json(json!({"brand_id": "nile", "status": "Not Received", "reason": "Parcel never arrived"}));
    let (status, body) = send(&t.db, silent_gateway(), req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let request = json(&body);
    assert_eq!(request["brand_status"], "Not Received");
    assert_eq!(request["brand_reason"], "Parcel never arrived");
    t.tear_down().await;
}

#[actix_web::test]
async fn listing_and_fetching_returns() {
    let t = TestDb::new().await;
    let id = order_with_return(&t).await;
    let req = TestRequest::post().uri(&format!("/api/returns/{id}/admin_status")).set_json(json!({"status": "Rejected"}));
    let (status, _) = send(&t.db, silent_gateway(), req).await;
    assert_eq!(status, StatusCode::OK);

    let req = TestRequest::get().uri("/api/returns?customer_id=alice&status=Not%20Refunded");
    let (status, body) = send(&t.db, silent_gateway(), req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body).as_array().unwrap().len(), 1);

    let (_, body) = send(&t.db, silent_gateway(), TestRequest::get().uri("/api/returns?status=Refunded")).await;
    assert_eq!(json(&body).as_array().unwrap().len(), 0);

    let (status, _) = send(&t.db, silent_gateway(), TestRequest::get().uri("/api/returns/404")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    t.tear_down().await;
}

#[actix_web::test]
async fn returns_need_a_paid_order_of_the_customer() {
    let t = TestDb::new().await;
    order_with_return(&t).await;
    let req = TestRequest::post().uri("/api/returns").set_json(json!({
        "order_id": "2001",
        "customer_id": "mallory",
        "brand_id": "nile",
        "reason": "Wrong size"
    }));
    let (status, _) = send(&t.db, silent_gateway(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = TestRequest::post().uri("/api/returns").set_json(json!({
        "order_id": "7777",
        "customer_id": "alice",
        "brand_id": "nile",
        "reason": "Wrong size"
    }));
    let (status, _) = send(&t.db, silent_gateway(), req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    t.tear_down().await;
}
