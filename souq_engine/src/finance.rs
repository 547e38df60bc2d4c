//! The financial split of an order.
//!
//! Everything in this module is a pure function of the order and its brands. The ledger generator, the payout
//! aggregator and the refund workflow all derive their figures from here, so the three can never drift apart.
//!
//! Per brand on an order:
//! * `commission` is the sum of each line's pre-computed commission, or `line total × brand commission rate`
//! * `vat` is the sum of each line's pre-computed tax, or `line total × brand tax rate`
//! * `total` and `shipping_fee` are the brand's share of the order total and shipping fee, in proportion to its line
//!   totals. A single-brand order gets both in full.
//! * `gateway_fee = total × 3%`
//! * `brand_payout = total − vat − commission − shipping_fee`
//! * `net_admin_profit = commission − gateway_fee`
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::db_types::{Brand, BrandId, CartItem, LedgerEntryKind, Money, NewLedgerEntry, Order, OrderId, Rate};

/// The gateway's fee on the full captured amount
pub const GATEWAY_FEE_RATE: Rate = Rate::from_bps(300);

pub fn line_commission(item: &CartItem, brand: &Brand) -> Money {
    item.commission_amount.unwrap_or_else(|| item.total_price.apply_rate(brand.commission_rate))
}

pub fn line_tax(item: &CartItem, brand: &Brand) -> Money {
    item.tax_amount.unwrap_or_else(|| item.total_price.apply_rate(brand.tax_rate))
}

/// A cart line that could not be accounted for because its brand no longer exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedLine {
    pub order_id: OrderId,
    /// Zero-based position of the line in the cart
    pub line: usize,
    pub product_id: String,
    pub brand_id: BrandId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderSplit {
    pub entries: Vec<NewLedgerEntry>,
    pub skipped: Vec<SkippedLine>,
}

/// Computes the sale ledger entry for every brand on the order.
///
/// Lines whose brand is missing from `brands` are reported in [`OrderSplit::skipped`]. Their share of the order total
/// is not redistributed to the other brands.
pub fn split_order(order: &Order, brands: &HashMap<BrandId, Brand>) -> OrderSplit {
    let brand_ids = order.brand_ids();
    let weights = brand_ids
        .iter()
        .map(|b| order.items_for_brand(b).map(|i| i.total_price).sum::<Money>())
        .collect::<Vec<Money>>();
    let totals = order.total.allocate(&weights);
    let shipping = order.shipping_fee.allocate(&weights);
    let skipped = order
        .cart_items
        .iter()
        .enumerate()
        .filter(|(_, item)| !brands.contains_key(&item.brand_id))
        .map(|(line, item)| SkippedLine {
            order_id: order.id.clone(),
            line,
            product_id: item.product_id.clone(),
            brand_id: item.brand_id.clone(),
        })
        .collect();
    let entries = brand_ids
        .iter()
        .zip(totals)
        .zip(shipping)
        .filter_map(|((brand_id, total), shipping_fee)| {
            let brand = brands.get(brand_id)?;
            Some(brand_entry(order, brand, total, shipping_fee))
        })
        .collect();
    OrderSplit { entries, skipped }
}

fn brand_entry(order: &Order, brand: &Brand, total: Money, shipping_fee: Money) -> NewLedgerEntry {
    let (vat, commission) = order
        .items_for_brand(&brand.id)
        .fold((Money::ZERO, Money::ZERO), |(vat, commission), item| {
            (vat + line_tax(item, brand), commission + line_commission(item, brand))
        });
    let gateway_fee = total.apply_rate(GATEWAY_FEE_RATE);
    NewLedgerEntry {
        order_id: order.id.clone(),
        brand_id: brand.id.clone(),
        kind: LedgerEntryKind::Sale,
        total,
        shipping_fee,
        vat,
        commission,
        gateway_fee,
        brand_payout: total - vat - commission - shipping_fee,
        net_admin_profit: commission - gateway_fee,
        captured_amount: total,
        converted_amount: total,
        month: order.month(),
        year: order.year(),
        created_at: order.created_at,
    }
}

/// What the customer gets back when a brand's items are returned. Shipping is never refunded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundBasis {
    pub product_total: Money,
    pub total_vat: Money,
}

impl RefundBasis {
    pub fn for_brand(order: &Order, brand: &Brand) -> Self {
        order.items_for_brand(&brand.id).fold(Self::default(), |acc, item| Self {
            product_total: acc.product_total + item.total_price,
            total_vat: acc.total_vat + line_tax(item, brand),
        })
    }

    pub fn amount(&self) -> Money {
        self.product_total + self.total_vat
    }
}
