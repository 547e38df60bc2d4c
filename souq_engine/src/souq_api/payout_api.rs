use std::{
    collections::{BTreeMap, HashMap},
    fmt::Debug,
};

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use log::*;

use crate::{
    db_types::{Brand, BrandId, BrandPayout, PayoutFigures},
    finance::{line_commission, line_tax},
    souq_api::errors::PayoutApiError,
    traits::{BrandManagement, OrderManagement, OrderQueryFilter, PayoutManagement, PayoutQueryFilter},
};

/// `PayoutApi` aggregates what the marketplace owes each brand over a period, and tracks when it has been paid.
pub struct PayoutApi<B> {
    db: B,
}

impl<B> Debug for PayoutApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PayoutApi")
    }
}

impl<B> PayoutApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

/// The half-open UTC instant range covering the calendar days `from` to `to` inclusive
fn period_bounds(from: NaiveDate, to: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>), PayoutApiError> {
    if from > to {
        return Err(PayoutApiError::ValidationError(format!("The period starts on {from}, after it ends on {to}")));
    }
    let day_after = to
        .succ_opt()
        .ok_or_else(|| PayoutApiError::ValidationError(format!("{to} is too far in the future")))?;
    let since = Utc.from_utc_datetime(&from.and_time(NaiveTime::MIN));
    let until = Utc.from_utc_datetime(&day_after.and_time(NaiveTime::MIN));
    Ok((since, until))
}

impl<B> PayoutApi<B>
where B: OrderManagement + BrandManagement + PayoutManagement
{
    /// Totals every line of every paid order created between the start of `from` and the end of `to` by brand, and
    /// stores one summary per brand for the period.
    ///
    /// Recalculating a period refreshes the figures but never resets a summary that has already been paid.
    pub async fn calculate_payouts(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<BrandPayout>, PayoutApiError> {
        let (since, until) = period_bounds(from, to)?;
        let query = OrderQueryFilter::default().paid_only().since(since).until(until);
        let orders = self.db.search_orders(query).await?;
        debug!("💸️ {} paid orders fall between {from} and {to}", orders.len());
        let mut brand_ids = orders.iter().flat_map(|o| o.brand_ids()).collect::<Vec<BrandId>>();
        brand_ids.sort();
        brand_ids.dedup();
        let brands = self
            .db
            .fetch_brands(&brand_ids)
            .await?
            .into_iter()
            .map(|b| (b.id.clone(), b))
            .collect::<HashMap<BrandId, Brand>>();
        let mut figures = BTreeMap::<BrandId, PayoutFigures>::new();
        for order in &orders {
            for item in &order.cart_items {
                let Some(brand) = brands.get(&item.brand_id) else {
                    error!(
                        "💸️ Order {} has a line for brand {}, which does not exist. It is left out of the payout.",
                        order.id, item.brand_id
                    );
                    continue;
                };
                let commission = line_commission(item, brand);
                let f = figures
                    .entry(brand.id.clone())
                    .or_insert_with(|| PayoutFigures::new(brand.id.clone(), from, to));
                f.total_sales += item.total_price;
                f.total_commission += commission;
                f.total_tax += line_tax(item, brand);
                f.brand_receivable += item.total_price - commission;
            }
        }
        let figures = figures.into_values().collect::<Vec<PayoutFigures>>();
        let payouts = self.db.upsert_payouts(&figures).await?;
        info!("💸️ Payout summaries for {} brands calculated for {from} to {to}", payouts.len());
        Ok(payouts)
    }

    pub async fn payouts(&self, filter: PayoutQueryFilter) -> Result<Vec<BrandPayout>, PayoutApiError> {
        let payouts = self.db.fetch_payouts(filter).await?;
        Ok(payouts)
    }

    /// Records that the brand has been paid for the period. Paying a summary twice is an invalid transition.
    pub async fn mark_paid(&self, id: i64) -> Result<BrandPayout, PayoutApiError> {
        let payout = self.db.mark_payout_paid(id, Utc::now()).await?;
        info!("💸️ Payout #{id} of {} to {} has been paid", payout.brand_receivable, payout.brand_id);
        Ok(payout)
    }
}
