use std::sync::atomic::Ordering;

use chrono::{NaiveDate, TimeZone, Utc};
use cucumber::{given, then, when};
use souq_engine::{
    db_types::{
        AdminDecision,
        BrandDecision,
        BrandId,
        BrandReturnStatus,
        CartItem,
        FinancialLogEntry,
        LedgerEntryKind,
        Money,
        NewBrand,
        NewOrder,
        NewReturnRequest,
        OrderId,
        PayoutStatus,
        Rate,
        ReturnStatus,
    },
    traits::{BrandManagement, LedgerManagement, PayoutQueryFilter},
};

use crate::cucumber::LedgerWorld;

fn money(s: &str) -> Money {
    s.parse::<Money>().expect("Not a monetary amount")
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("Dates are written as YYYY-MM-DD")
}

#[given(expr = "brand {word} with default rates")]
async fn brand_with_default_rates(world: &mut LedgerWorld, id: String) {
    world.db().upsert_brand(NewBrand::new(&id, &id)).await.expect("Error creating brand");
}

#[given(expr = "brand {word} with {int} bps commission and {int} bps tax")]
async fn brand_with_rates(world: &mut LedgerWorld, id: String, commission: i64, tax: i64) {
    let brand = NewBrand::new(&id, &id).with_rates(Rate::from_bps(commission), Rate::from_bps(tax));
    world.db().upsert_brand(brand).await.expect("Error creating brand");
}

#[when(expr = "customer {word} places paid order {word} on {word} for {word} EGP of {word} with {word} EGP shipping")]
async fn place_paid_order(
    world: &mut LedgerWorld,
    customer: String,
    order_id: String,
    day: String,
    amount: String,
    brand: String,
    shipping: String,
) {
    let created = Utc.from_utc_datetime(&date(&day).and_hms_opt(12, 0, 0).expect("Valid time"));
    let brand = BrandId::from(brand);
    let order = NewOrder::new(
        OrderId::from(order_id.as_str()),
        customer,
        vec![CartItem::new(&format!("{order_id}-item"), &brand, 1, money(&amount))],
        money(&shipping),
    )
    .with_created_at(created)
    .paid_with(&format!("gw-{order_id}"));
    world.order_api().process_new_order(order).await.expect("Error processing order");
}

async fn ledger_entry(world: &LedgerWorld, order_id: &str, brand: &str, kind: LedgerEntryKind) -> FinancialLogEntry {
    world
        .db()
        .fetch_ledger_entry(&OrderId::from(order_id), &BrandId::from(brand), kind)
        .await
        .expect("Error fetching ledger entry")
        .expect("Ledger entry does not exist")
}

fn entry_field(entry: &FinancialLogEntry, field: &str) -> Money {
    match field {
        "total" => entry.total,
        "shipping_fee" => entry.shipping_fee,
        "vat" => entry.vat,
        "commission" => entry.commission,
        "gateway_fee" => entry.gateway_fee,
        "brand_payout" => entry.brand_payout,
        "net_admin_profit" => entry.net_admin_profit,
        "captured_amount" => entry.captured_amount,
        "converted_amount" => entry.converted_amount,
        _ => panic!("Unknown ledger field {field}"),
    }
}

#[then(expr = "the sale for order {word} and brand {word} has {word} of {word}")]
async fn check_sale_field(world: &mut LedgerWorld, order_id: String, brand: String, field: String, value: String) {
    let entry = ledger_entry(world, &order_id, &brand, LedgerEntryKind::Sale).await;
    assert_eq!(entry_field(&entry, &field), money(&value), "{field} is incorrect");
}

#[then(expr = "the reversal for order {word} and brand {word} has {word} of {word}")]
async fn check_reversal_field(world: &mut LedgerWorld, order_id: String, brand: String, field: String, value: String) {
    let entry = ledger_entry(world, &order_id, &brand, LedgerEntryKind::Reversal).await;
    assert_eq!(entry_field(&entry, &field), money(&value), "{field} is incorrect");
}

#[then(expr = "order {word} has no reversal for brand {word}")]
async fn check_no_reversal(world: &mut LedgerWorld, order_id: String, brand: String) {
    let entry = world
        .db()
        .fetch_ledger_entry(&OrderId::from(order_id), &BrandId::from(brand), LedgerEntryKind::Reversal)
        .await
        .expect("Error fetching ledger entry");
    assert!(entry.is_none(), "Unexpected reversal {entry:?}");
}

#[when(expr = "the ledger is regenerated for order {word}")]
async fn regenerate(world: &mut LedgerWorld, order_id: String) {
    world.ledger_api().generate_entries_for_order(&OrderId::from(order_id)).await.expect("Error generating ledger");
}

#[then(expr = "order {word} has {word} of {word}")]
async fn check_order_field(world: &mut LedgerWorld, order_id: String, field: String, value: String) {
    let order = world.order_api().fetch_order(&OrderId::from(order_id)).await.expect("Error fetching order");
    match field.as_str() {
        "status" => assert_eq!(order.order_status.to_string(), value, "Status is incorrect"),
        "brand_payout" => assert_eq!(order.brand_payout, money(&value), "Brand payout is incorrect"),
        "net_admin_profit" => assert_eq!(order.net_admin_profit, money(&value), "Admin profit is incorrect"),
        _ => panic!("Unknown order field {field}"),
    }
}

#[when(expr = "customer {word} returns the {word} items of order {word} because {string}")]
async fn file_return(world: &mut LedgerWorld, customer: String, brand: String, order_id: String, reason: String) {
    let request = NewReturnRequest::new(&OrderId::from(order_id), &customer, &BrandId::from(brand), &reason);
    let saved = world.returns_api().create_return_request(request).await.expect("Error filing return");
    world.current_return = Some(saved.id);
}

#[when(expr = "brand {word} marks the return as received")]
async fn brand_received(world: &mut LedgerWorld, brand: String) {
    let id = world.current_return();
    let result = world.returns_api().set_brand_status(id, &BrandId::from(brand), BrandDecision::Received).await;
    world.last_error = result.err().map(|e| e.to_string());
}

#[when(expr = "brand {word} marks the return as not received")]
async fn brand_not_received(world: &mut LedgerWorld, brand: String) {
    let id = world.current_return();
    let decision = BrandDecision::NotReceived { reason: None };
    let result = world.returns_api().set_brand_status(id, &BrandId::from(brand), decision).await;
    world.last_error = result.err().map(|e| e.to_string());
}

#[when(expr = "the gateway is down")]
async fn gateway_down(world: &mut LedgerWorld) {
    world.system().gateway.down.store(true, Ordering::SeqCst);
}

#[when(expr = "the admin marks the return as {word}")]
async fn admin_decision(world: &mut LedgerWorld, decision: String) {
    let decision = match decision.as_str() {
        "Approved" => AdminDecision::Approved,
        "Rejected" => AdminDecision::Rejected,
        "Refunded" => AdminDecision::Refunded,
        _ => panic!("Unknown admin decision {decision}"),
    };
    let id = world.current_return();
    let result = world.returns_api().set_admin_status(id, decision, Some("Reviewed".into())).await;
    world.last_error = result.err().map(|e| e.to_string());
}

#[then(expr = "the step failed with {string}")]
async fn check_error(world: &mut LedgerWorld, fragment: String) {
    let err = world.last_error.as_deref().expect("The step did not fail");
    assert!(err.contains(&fragment), "Error '{err}' does not mention '{fragment}'");
}

#[then(expr = "the step succeeded")]
async fn check_no_error(world: &mut LedgerWorld) {
    assert!(world.last_error.is_none(), "Unexpected error: {:?}", world.last_error);
}

#[then(expr = "the return has status {string} and brand status {string}")]
async fn check_return_status(world: &mut LedgerWorld, status: String, brand_status: String) {
    let id = world.current_return();
    let request = world.returns_api().fetch_return_request(id).await.expect("Error fetching return");
    assert_eq!(request.status.to_string(), status);
    assert_eq!(request.brand_status.to_string(), brand_status);
    if request.status == ReturnStatus::Refunded {
        assert!(request.refund_reference.is_some());
    }
    if request.brand_status == BrandReturnStatus::NotReceived {
        assert!(request.brand_reason.is_some());
    }
}

#[then(expr = "the gateway refunded {int} cents")]
async fn check_refunded(world: &mut LedgerWorld, cents: i64) {
    assert_eq!(world.system().gateway.refunded(), vec![cents]);
}

#[then(expr = "the gateway refunded nothing")]
async fn check_nothing_refunded(world: &mut LedgerWorld) {
    assert!(world.system().gateway.refunded().is_empty());
}

#[when(expr = "payouts are calculated from {word} to {word}")]
async fn calculate_payouts(world: &mut LedgerWorld, from: String, to: String) {
    world.payout_api().calculate_payouts(date(&from), date(&to)).await.expect("Error calculating payouts");
}

async fn payout_for(world: &LedgerWorld, brand: &str) -> souq_engine::db_types::BrandPayout {
    let filter = PayoutQueryFilter::default().with_brand_id(BrandId::from(brand));
    let mut payouts = world.payout_api().payouts(filter).await.expect("Error fetching payouts");
    assert_eq!(payouts.len(), 1, "Expected exactly one payout for {brand}");
    payouts.remove(0)
}

#[then(expr = "the payout for brand {word} has {word} of {word}")]
async fn check_payout_field(world: &mut LedgerWorld, brand: String, field: String, value: String) {
    let payout = payout_for(world, &brand).await;
    let actual = match field.as_str() {
        "total_sales" => payout.total_sales,
        "total_commission" => payout.total_commission,
        "total_tax" => payout.total_tax,
        "brand_receivable" => payout.brand_receivable,
        _ => panic!("Unknown payout field {field}"),
    };
    assert_eq!(actual, money(&value), "{field} is incorrect");
}

#[when(expr = "the payout for brand {word} is marked paid")]
async fn mark_payout_paid(world: &mut LedgerWorld, brand: String) {
    let payout = payout_for(world, &brand).await;
    world.payout_api().mark_paid(payout.id).await.expect("Error marking payout paid");
}

#[then(expr = "the payout for brand {word} is {word}")]
async fn check_payout_status(world: &mut LedgerWorld, brand: String, status: String) {
    let payout = payout_for(world, &brand).await;
    let expected = match status.as_str() {
        "Pending" => PayoutStatus::Pending,
        "Paid" => PayoutStatus::Paid,
        _ => panic!("Unknown payout status {status}"),
    };
    assert_eq!(payout.payout_status, expected);
    assert_eq!(payout.paid_at.is_some(), expected == PayoutStatus::Paid);
}
