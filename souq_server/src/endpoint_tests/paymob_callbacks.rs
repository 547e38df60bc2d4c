use actix_web::{http::StatusCode, test::TestRequest};
use paymob_tools::{
    data_objects::{CallbackOrder, SourceData},
    signature::{calculate_hmac, signed_message},
    TransactionCallback,
};
use serde_json::json;
use souq_engine::{db_types::OrderId, OrderFlowApi};

use super::{
    helpers::{json, money, send, unpaid_order, TestDb, HMAC_SECRET},
    mocks::silent_gateway,
};

const REMOTE_ORDER_ID: i64 = 217503754;

fn transaction(success: bool) -> TransactionCallback {
    TransactionCallback {
        id: 192036465,
        pending: false,
        amount_cents: 100_000,
        success,
        is_standalone_payment: true,
        is_3d_secure: true,
        integration_id: 4097558,
        owner: 302852,
        created_at: "2024-03-15T10:05:12.712345".into(),
        currency: "EGP".into(),
        order: CallbackOrder { id: REMOTE_ORDER_ID },
        source_data: SourceData { pan: "2346".into(), sub_type: "MasterCard".into(), kind: "card".into() },
        ..Default::default()
    }
}

fn callback(tx: &TransactionCallback, signature: Option<&str>) -> TestRequest {
    let uri = match signature {
        Some(sig) => format!("/paymob/callback?hmac={sig}"),
        None => "/paymob/callback".to_string(),
    };
    TestRequest::post().uri(&uri).set_json(json!({ "type": "TRANSACTION", "obj": tx }))
}

async fn order_awaiting_payment(t: &TestDb) {
    let nile = t.seed_brand("nile").await;
    let flow = OrderFlowApi::new(t.db.clone(), Default::default());
    flow.process_new_order(unpaid_order("4001", "alice", &nile)).await.unwrap();
    flow.attach_gateway_order(&OrderId::from("4001"), &REMOTE_ORDER_ID.to_string()).await.unwrap();
}

#[actix_web::test]
async fn signed_payments_book_the_order() {
    let t = TestDb::new().await;
    order_awaiting_payment(&t).await;
    let tx = transaction(true);
    let sig = calculate_hmac(HMAC_SECRET, &signed_message(&tx));
    let (status, body) = send(&t.db, silent_gateway(), callback(&tx, Some(&sig))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["success"], true);

    let (_, body) = send(&t.db, silent_gateway(), TestRequest::get().uri("/api/orders/4001")).await;
    let order = json(&body);
    assert_eq!(order["payment_details"]["paid"], true);
    assert_eq!(order["payment_details"]["transaction_id"], "192036465");
    assert_eq!(money(&order["brand_payout"]), 660.0);

    let (_, body) = send(&t.db, silent_gateway(), TestRequest::get().uri("/api/finance/logs?order_id=4001")).await;
    assert_eq!(json(&body).as_array().unwrap().len(), 1);

    // Paymob retries callbacks. A repeat changes nothing.
    let (status, _) = send(&t.db, silent_gateway(), callback(&tx, Some(&sig))).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = send(&t.db, silent_gateway(), TestRequest::get().uri("/api/finance/logs?order_id=4001")).await;
    assert_eq!(json(&body).as_array().unwrap().len(), 1);
    t.tear_down().await;
}

#[actix_web::test]
async fn forged_callbacks_are_refused() {
    let t = TestDb::new().await;
    order_awaiting_payment(&t).await;
    let tx = transaction(true);
    let sig = calculate_hmac("not-the-secret", &signed_message(&tx));
    let (status, _) = send(&t.db, silent_gateway(), callback(&tx, Some(&sig))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&t.db, silent_gateway(), callback(&tx, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Signed for a smaller amount than was reported
    let mut tampered = tx.clone();
    tampered.amount_cents = 100;
    let sig = calculate_hmac(HMAC_SECRET, &signed_message(&tampered));
    let (status, _) = send(&t.db, silent_gateway(), callback(&tx, Some(&sig))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = send(&t.db, silent_gateway(), TestRequest::get().uri("/api/orders/4001")).await;
    assert_eq!(json(&body)["payment_details"]["paid"], false);
    t.tear_down().await;
}

#[actix_web::test]
async fn failed_transactions_are_acknowledged() {
    let t = TestDb::new().await;
    order_awaiting_payment(&t).await;
    let tx = transaction(false);
    let sig = calculate_hmac(HMAC_SECRET, &signed_message(&tx));
    let (status, body) = send(&t.db, silent_gateway(), callback(&tx, Some(&sig))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(json(&body)["message"].as_str().unwrap().contains("No action taken"));

    let (_, body) = send(&t.db, silent_gateway(), TestRequest::get().uri("/api/orders/4001")).await;
    assert_eq!(json(&body)["payment_details"]["paid"], false);
    t.tear_down().await;
}

#[actix_web::test]
async fn payments_for_unknown_orders() {
    let t = TestDb::new().await;
    let tx = transaction(true);
    let sig = calculate_hmac(HMAC_SECRET, &signed_message(&tx));
    let (status, _) = send(&t.db, silent_gateway(), callback(&tx, Some(&sig))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    t.tear_down().await;
}
