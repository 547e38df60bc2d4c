use std::{collections::HashMap, fmt::Debug};

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    db_types::{Brand, BrandId, FinancialLogEntry, Order, OrderId},
    finance::split_order,
    souq_api::{
        errors::LedgerApiError,
        ledger_objects::{LedgerRun, LedgerTotals, RecalculationFailure, RecalculationReport},
    },
    traits::{BrandManagement, LedgerManagement, LedgerQueryFilter, OrderManagement, OrderQueryFilter},
};

/// `LedgerApi` writes the financial log for paid orders and answers reporting queries over it.
pub struct LedgerApi<B> {
    db: B,
}

impl<B> Debug for LedgerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LedgerApi")
    }
}

impl<B> LedgerApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> LedgerApi<B>
where B: OrderManagement + BrandManagement + LedgerManagement
{
    /// Generates (or regenerates) the sale entries for a paid order.
    ///
    /// Running this twice on an unchanged order writes identical entries. Lines whose brand does not exist are
    /// skipped and reported; the remaining brands are still written.
    pub async fn generate_entries_for_order(&self, order_id: &OrderId) -> Result<LedgerRun, LedgerApiError> {
        let order = self
            .db
            .fetch_order(order_id)
            .await?
            .ok_or_else(|| LedgerApiError::NotFound(format!("Order {order_id}")))?;
        self.generate_entries(&order).await
    }

    pub(crate) async fn generate_entries(&self, order: &Order) -> Result<LedgerRun, LedgerApiError> {
        if !order.is_paid() {
            return Err(LedgerApiError::ValidationError(format!(
                "Order {} has not been paid. Ledger entries are only written for paid orders.",
                order.id
            )));
        }
        let brands = self
            .db
            .fetch_brands(&order.brand_ids())
            .await?
            .into_iter()
            .map(|b| (b.id.clone(), b))
            .collect::<HashMap<BrandId, Brand>>();
        let split = split_order(order, &brands);
        let mut run = LedgerRun::new(order.id.clone());
        for line in &split.skipped {
            error!(
                "📒️ Order {} line {} ({}) refers to brand {}, which does not exist. The line has been left out of \
                 the ledger.",
                line.order_id, line.line, line.product_id, line.brand_id
            );
        }
        for entry in split.entries.iter().filter(|e| e.brand_payout.is_negative()) {
            warn!(
                "📒️ Brand {} has a negative payout of {} on order {}. The entry is written as is.",
                entry.brand_id, entry.brand_payout, entry.order_id
            );
            run.negative_payouts.push(entry.brand_id.clone());
        }
        let saved = self.db.save_sale_entries(&order.id, &split.entries).await?;
        run.frozen_brands = split
            .entries
            .iter()
            .filter(|e| !saved.iter().any(|s| s.brand_id == e.brand_id))
            .map(|e| e.brand_id.clone())
            .collect();
        if !run.frozen_brands.is_empty() {
            info!(
                "📒️ Order {} has already been refunded for {} brand(s). Those entries were not touched.",
                order.id,
                run.frozen_brands.len()
            );
        }
        debug!("📒️ {} sale entries written for order {}", saved.len(), order.id);
        run.entries = saved;
        run.skipped_lines = split.skipped;
        Ok(run)
    }

    /// Re-runs the generator over every paid order, optionally restricted to orders created in `[since, until)`.
    ///
    /// A failure on one order is recorded in the report and does not stop the sweep.
    pub async fn recalculate(
        &self,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<RecalculationReport, LedgerApiError> {
        if let (Some(s), Some(u)) = (since, until) {
            if s >= u {
                return Err(LedgerApiError::ValidationError(format!("The range start {s} is not before its end {u}")));
            }
        }
        let mut query = OrderQueryFilter::default().paid_only();
        query.since = since;
        query.until = until;
        let orders = self.db.search_orders(query).await?;
        info!("📒️ Recalculating the ledger for {} paid orders", orders.len());
        let mut report = RecalculationReport::default();
        for order in orders {
            match self.generate_entries(&order).await {
                Ok(run) => report.record(run),
                Err(e) => {
                    error!("📒️ Could not recalculate the ledger for order {}. {e}", order.id);
                    report.failures.push(RecalculationFailure { order_id: order.id, error: e.to_string() });
                },
            }
        }
        info!(
            "📒️ Recalculation complete. {} orders, {} entries, {} skipped lines, {} failures",
            report.orders_processed,
            report.entries_written,
            report.skipped_lines.len(),
            report.failures.len()
        );
        Ok(report)
    }

    pub async fn financial_logs(&self, filter: LedgerQueryFilter) -> Result<Vec<FinancialLogEntry>, LedgerApiError> {
        check_filter(&filter)?;
        let entries = self.db.fetch_ledger_entries(filter).await?;
        Ok(entries)
    }

    /// Sums every monetary column over the entries that match the filter. Reversals are included, so a refunded sale
    /// nets to zero.
    pub async fn ledger_totals(&self, filter: LedgerQueryFilter) -> Result<LedgerTotals, LedgerApiError> {
        let entries = self.financial_logs(filter).await?;
        Ok(entries.iter().collect())
    }
}

fn check_filter(filter: &LedgerQueryFilter) -> Result<(), LedgerApiError> {
    match filter.month {
        Some(m) if !(1..=12).contains(&m) => {
            Err(LedgerApiError::ValidationError(format!("{m} is not a month. Use a number from 1 to 12.")))
        },
        _ => Ok(()),
    }
}
