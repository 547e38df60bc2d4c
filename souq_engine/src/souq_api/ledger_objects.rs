use serde::{Deserialize, Serialize};

use crate::{
    db_types::{BrandId, FinancialLogEntry, Money, OrderId},
    finance::SkippedLine,
};

/// What happened when the ledger generator ran over a single order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRun {
    pub order_id: OrderId,
    /// The sale entries as stored
    pub entries: Vec<FinancialLogEntry>,
    /// Lines that reference a brand that does not exist
    pub skipped_lines: Vec<SkippedLine>,
    /// Brands whose sale entry was left alone because it has already been reversed
    pub frozen_brands: Vec<BrandId>,
    /// Brands whose payout came out negative. The entries are still written.
    pub negative_payouts: Vec<BrandId>,
}

impl LedgerRun {
    pub fn new(order_id: OrderId) -> Self {
        Self {
            order_id,
            entries: Vec::new(),
            skipped_lines: Vec::new(),
            frozen_brands: Vec::new(),
            negative_payouts: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecalculationFailure {
    pub order_id: OrderId,
    pub error: String,
}

/// Summary of a recalculation sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecalculationReport {
    pub orders_processed: usize,
    pub entries_written: usize,
    pub skipped_lines: Vec<SkippedLine>,
    pub frozen_entries: usize,
    pub failures: Vec<RecalculationFailure>,
}

impl RecalculationReport {
    pub fn record(&mut self, run: LedgerRun) {
        self.orders_processed += 1;
        self.entries_written += run.entries.len();
        self.frozen_entries += run.frozen_brands.len();
        self.skipped_lines.extend(run.skipped_lines);
    }
}

/// Column sums over a set of ledger entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTotals {
    pub entries: usize,
    pub total: Money,
    pub shipping_fee: Money,
    pub vat: Money,
    pub commission: Money,
    pub gateway_fee: Money,
    pub brand_payout: Money,
    pub net_admin_profit: Money,
    pub captured_amount: Money,
    pub converted_amount: Money,
}

impl<'a> FromIterator<&'a FinancialLogEntry> for LedgerTotals {
    fn from_iter<T: IntoIterator<Item = &'a FinancialLogEntry>>(iter: T) -> Self {
        iter.into_iter().fold(Self::default(), |mut acc, e| {
            acc.entries += 1;
            acc.total += e.total;
            acc.shipping_fee += e.shipping_fee;
            acc.vat += e.vat;
            acc.commission += e.commission;
            acc.gateway_fee += e.gateway_fee;
            acc.brand_payout += e.brand_payout;
            acc.net_admin_profit += e.net_admin_profit;
            acc.captured_amount += e.captured_amount;
            acc.converted_amount += e.converted_amount;
            acc
        })
    }
}
