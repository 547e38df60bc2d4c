use actix_web::{http::StatusCode, test::TestRequest};
use chrono::Utc;
use serde_json::json;
use souq_engine::OrderFlowApi;

use super::{
    helpers::{json, money, paid_order, send, unpaid_order, TestDb},
    mocks::silent_gateway,
};

async fn seed_orders(t: &TestDb) {
    let nile = t.seed_brand("nile").await;
    let flow = OrderFlowApi::new(t.db.clone(), Default::default());
    flow.process_new_order(paid_order("3001", "alice", &nile, "300001")).await.unwrap();
    flow.process_new_order(paid_order("3002", "bob", &nile, "300002")).await.unwrap();
    flow.process_new_order(unpaid_order("3003", "carol", &nile)).await.unwrap();
}

#[actix_web::test]
async fn financial_logs_and_totals() {
    let t = TestDb::new().await;
    seed_orders(&t).await;
    let (status, body) = send(&t.db, silent_gateway(), TestRequest::get().uri("/api/finance/logs?brand_id=nile")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let entries = json(&body);
    assert_eq!(entries.as_array().unwrap().len(), 2);
    assert_eq!(money(&entries[0]["vat"]), 140.0);
    assert_eq!(money(&entries[0]["commission"]), 150.0);
    assert_eq!(money(&entries[0]["gateway_fee"]), 30.0);

    let (status, body) = send(&t.db, silent_gateway(), TestRequest::get().uri("/api/finance/totals")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let totals = json(&body);
    assert_eq!(totals["entries"], 2);
    assert_eq!(money(&totals["brand_payout"]), 1320.0);
    assert_eq!(money(&totals["net_admin_profit"]), 240.0);

    let (status, body) = send(&t.db, silent_gateway(), TestRequest::get().uri("/api/finance/logs?month=13")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json(&body)["error"].is_string());
    t.tear_down().await;
}

#[actix_web::test]
async fn recalculating_the_ledger() {
    let t = TestDb::new().await;
    seed_orders(&t).await;
    let req = TestRequest::post().uri("/api/finance/recalculate").set_json(json!({}));
    let (status, body) = send(&t.db, silent_gateway(), req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let summary = json(&body);
    assert_eq!(summary["orders_processed"], 2);
    assert_eq!(summary["entries_written"], 2);
    assert_eq!(summary["failures"].as_array().unwrap().len(), 0);

    let req = TestRequest::post()
        .uri("/api/finance/recalculate")
        .set_json(json!({"since": "2024-04-01T00:00:00Z", "until": "2024-03-01T00:00:00Z"}));
    let (status, _) = send(&t.db, silent_gateway(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    t.tear_down().await;
}

#[actix_web::test]
async fn brand_payouts() {
    let t = TestDb::new().await;
    seed_orders(&t).await;
    let today = Utc::now().date_naive();
    let req = TestRequest::post().uri("/api/payouts/calculate").set_json(json!({"from": today, "to": today}));
    let (status, body) = send(&t.db, silent_gateway(), req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let payouts = json(&body);
    assert_eq!(payouts.as_array().unwrap().len(), 1);
    let payout = &payouts[0];
    assert_eq!(payout["brand_id"], "nile");
    assert_eq!(payout["payout_status"], "Pending");
    assert_eq!(money(&payout["total_sales"]), 2000.0);
    let id = payout["id"].as_i64().unwrap();

    let (status, body) = send(&t.db, silent_gateway(), TestRequest::post().uri(&format!("/api/payouts/{id}/paid"))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["payout_status"], "Paid");

    let (status, _) = send(&t.db, silent_gateway(), TestRequest::post().uri(&format!("/api/payouts/{id}/paid"))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Recalculating the period keeps the paid status
    let req = TestRequest::post().uri("/api/payouts/calculate").set_json(json!({"from": today, "to": today}));
    let (_, body) = send(&t.db, silent_gateway(), req).await;
    assert_eq!(json(&body)[0]["payout_status"], "Paid");

    let (status, body) = send(&t.db, silent_gateway(), TestRequest::get().uri("/api/payouts?status=Paid")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body).as_array().unwrap().len(), 1);

    let (status, _) = send(&t.db, silent_gateway(), TestRequest::post().uri("/api/payouts/9999/paid")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let yesterday = today.pred_opt().unwrap();
    let req = TestRequest::post().uri("/api/payouts/calculate").set_json(json!({"from": today, "to": yesterday}));
    let (status, _) = send(&t.db, silent_gateway(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    t.tear_down().await;
}
