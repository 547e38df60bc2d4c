use std::{collections::HashMap, fmt::Debug};

use chrono::{Duration, Utc};
use log::*;

use crate::{
    db_types::{
        AdminDecision,
        BrandDecision,
        BrandId,
        BrandReturnStatus,
        LedgerEntryKind,
        Money,
        NewReturnRequest,
        Order,
        ReturnItem,
        ReturnRequest,
        ReturnStatus,
    },
    events::{EventProducers, ReturnRefundedEvent},
    finance::{line_tax, split_order, RefundBasis},
    souq_api::errors::ReturnsApiError,
    traits::{
        BrandManagement,
        GatewayRefund,
        LedgerManagement,
        OrderManagement,
        PaymentProvider,
        RefundCommit,
        ReturnManagement,
        ReturnQueryFilter,
    },
};

/// A refund claim older than this is assumed to belong to a caller that died mid-refund
const REFUND_CLAIM_TIMEOUT_MINUTES: i64 = 15;

/// `ReturnsApi` drives a customer's return of one brand's items through the brand's and the admin's decisions, up to
/// and including the refund.
///
/// When an admin refunds a return, the gateway is asked to refund the brand's line totals plus VAT (never shipping)
/// before anything is written. Only once the gateway has accepted the refund are the ledger reversal, the order
/// update and the request update committed, in a single transaction. A gateway failure therefore leaves no trace.
pub struct ReturnsApi<B, P> {
    db: B,
    provider: P,
    producers: EventProducers,
}

impl<B, P> Debug for ReturnsApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReturnsApi")
    }
}

impl<B, P> ReturnsApi<B, P> {
    pub fn new(db: B, provider: P, producers: EventProducers) -> Self {
        Self { db, provider, producers }
    }
}

impl<B, P> ReturnsApi<B, P>
where
    B: OrderManagement + BrandManagement + LedgerManagement + ReturnManagement,
    P: PaymentProvider,
{
    /// Files a return for every line of `brand_id` on the order.
    ///
    /// The order must exist, be paid, belong to the customer and contain at least one line of the brand. The brand's
    /// items must not have been refunded already, and there may be only one open (`Pending`) request per order and
    /// brand.
    pub async fn create_return_request(&self, request: NewReturnRequest) -> Result<ReturnRequest, ReturnsApiError> {
        if request.reason.trim().is_empty() {
            return Err(ReturnsApiError::ValidationError("A reason for the return is required".into()));
        }
        if request.customer_id.trim().is_empty() || request.brand_id.as_str().trim().is_empty() {
            return Err(ReturnsApiError::ValidationError("Both a customer id and a brand id are required".into()));
        }
        let order = self.fetch_order(&request).await?;
        if !order.is_paid() {
            return Err(ReturnsApiError::ValidationError(format!("Order {} has not been paid", order.id)));
        }
        if order.customer_id != request.customer_id {
            return Err(ReturnsApiError::ValidationError(format!(
                "Order {} does not belong to customer {}",
                order.id, request.customer_id
            )));
        }
        if order.items_for_brand(&request.brand_id).next().is_none() {
            return Err(ReturnsApiError::ValidationError(format!(
                "Order {} has no items from brand {}",
                order.id, request.brand_id
            )));
        }
        self.check_no_return_in_progress(&order, &request.brand_id).await?;
        let brand = self
            .db
            .fetch_brand(&request.brand_id)
            .await?
            .ok_or_else(|| ReturnsApiError::NotFound(format!("Brand {}", request.brand_id)))?;
        let items = order
            .items_for_brand(&brand.id)
            .map(|i| ReturnItem {
                product_id: i.product_id.clone(),
                quantity: i.quantity,
                unit_price: i.unit_price,
                total_price: i.total_price,
                tax: line_tax(i, &brand),
            })
            .collect::<Vec<ReturnItem>>();
        let basis = RefundBasis::for_brand(&order, &brand);
        let saved = self.db.insert_return_request(&request, &items, basis.amount()).await?;
        info!(
            "↩️ Customer {} filed return #{} for {} items of brand {} on order {}. Refund due: {}",
            saved.customer_id,
            saved.id,
            saved.items.len(),
            saved.brand_id,
            saved.order_id,
            saved.total_refund_amount
        );
        Ok(saved)
    }

    async fn check_no_return_in_progress(&self, order: &Order, brand_id: &BrandId) -> Result<(), ReturnsApiError> {
        if self.db.fetch_ledger_entry(&order.id, brand_id, LedgerEntryKind::Reversal).await?.is_some() {
            return Err(ReturnsApiError::InvalidTransition(format!(
                "Order {} has already been refunded for brand {brand_id}",
                order.id
            )));
        }
        let filter = ReturnQueryFilter::default()
            .with_order_id(order.id.clone())
            .with_brand_id(brand_id.clone())
            .with_status(ReturnStatus::Pending);
        if let Some(open) = self.db.fetch_return_requests(filter).await?.first() {
            return Err(ReturnsApiError::InvalidTransition(format!(
                "Return request #{} for order {} and brand {brand_id} is still open",
                open.id, order.id
            )));
        }
        Ok(())
    }

    async fn fetch_order(&self, request: &NewReturnRequest) -> Result<Order, ReturnsApiError> {
        self.db
            .fetch_order(&request.order_id)
            .await?
            .ok_or_else(|| ReturnsApiError::NotFound(format!("Order {}", request.order_id)))
    }

    pub async fn fetch_return_request(&self, id: i64) -> Result<ReturnRequest, ReturnsApiError> {
        self.db.fetch_return_request(id).await?.ok_or_else(|| ReturnsApiError::NotFound(format!("Return request #{id}")))
    }

    pub async fn return_requests(&self, filter: ReturnQueryFilter) -> Result<Vec<ReturnRequest>, ReturnsApiError> {
        let requests = self.db.fetch_return_requests(filter).await?;
        Ok(requests)
    }

    /// Records whether the brand received the returned goods. Only the request's own brand may decide, and only once.
    pub async fn set_brand_status(
        &self,
        id: i64,
        brand_id: &BrandId,
        decision: BrandDecision,
    ) -> Result<ReturnRequest, ReturnsApiError> {
        let request = self.fetch_return_request(id).await?;
        if &request.brand_id != brand_id {
            return Err(ReturnsApiError::ValidationError(format!(
                "Return request #{id} belongs to brand {}, not {brand_id}",
                request.brand_id
            )));
        }
        let (status, reason) = match decision {
            BrandDecision::Received => (BrandReturnStatus::Received, None),
            BrandDecision::NotReceived { reason } => match reason.map(|r| r.trim().to_string()) {
                Some(r) if !r.is_empty() => (BrandReturnStatus::NotReceived, Some(r)),
                _ => {
                    return Err(ReturnsApiError::ValidationError(
                        "A reason is required when the goods were not received".into(),
                    ))
                },
            },
        };
        if request.brand_status != BrandReturnStatus::Pending {
            return Err(ReturnsApiError::InvalidTransition(format!(
                "Return request #{id} is already marked {} by the brand",
                request.brand_status
            )));
        }
        let updated = self.db.update_brand_status(id, status, reason).await?;
        info!("↩️ Brand {brand_id} marked return #{id} as {status}");
        Ok(updated)
    }

    /// Applies an admin decision.
    ///
    /// * `Approved` keeps the status and records the note and review time.
    /// * `Rejected` sets the status to `Not Refunded`.
    /// * `Refunded` refunds the customer through the gateway and then reverses the brand's sale in the ledger.
    ///
    /// A refunded request is final. Any decision on it is an invalid transition.
    pub async fn set_admin_status(
        &self,
        id: i64,
        decision: AdminDecision,
        note: Option<String>,
    ) -> Result<ReturnRequest, ReturnsApiError> {
        let request = self.fetch_return_request(id).await?;
        if request.status == ReturnStatus::Refunded {
            return Err(ReturnsApiError::InvalidTransition(format!(
                "Return request #{id} has already been refunded"
            )));
        }
        let note = note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        match decision {
            AdminDecision::Approved => {
                let updated = self.db.record_admin_decision(id, request.status, note, Utc::now()).await?;
                info!("↩️ Return #{id} approved");
                Ok(updated)
            },
            AdminDecision::Rejected => {
                let updated = self.db.record_admin_decision(id, ReturnStatus::NotRefunded, note, Utc::now()).await?;
                info!("↩️ Return #{id} rejected");
                Ok(updated)
            },
            AdminDecision::Refunded => self.refund(request, note).await,
        }
    }

    async fn refund(&self, request: ReturnRequest, note: Option<String>) -> Result<ReturnRequest, ReturnsApiError> {
        let id = request.id;
        let order = self
            .db
            .fetch_order(&request.order_id)
            .await?
            .ok_or_else(|| ReturnsApiError::NotFound(format!("Order {}", request.order_id)))?;
        let reversed = self.db.fetch_ledger_entry(&order.id, &request.brand_id, LedgerEntryKind::Reversal).await?;
        if reversed.is_some() {
            return Err(ReturnsApiError::InvalidTransition(format!(
                "Order {} has already been refunded for brand {}",
                order.id, request.brand_id
            )));
        }
        let gateway_order_id = order.payment_details.gateway_order_id.clone().ok_or_else(|| {
            ReturnsApiError::ValidationError(format!(
                "Order {} was not paid through the payment gateway and cannot be refunded automatically",
                order.id
            ))
        })?;
        let brand = self
            .db
            .fetch_brand(&request.brand_id)
            .await?
            .ok_or_else(|| ReturnsApiError::NotFound(format!("Brand {}", request.brand_id)))?;
        let basis = RefundBasis::for_brand(&order, &brand);
        if basis.amount() <= Money::ZERO {
            return Err(ReturnsApiError::ValidationError(format!(
                "Return request #{id} has nothing to refund ({})",
                basis.amount()
            )));
        }
        let brands = HashMap::from([(brand.id.clone(), brand.clone())]);
        let sale_entry = split_order(&order, &brands)
            .entries
            .into_iter()
            .find(|e| e.brand_id == brand.id)
            .ok_or_else(|| ReturnsApiError::ValidationError(format!("Order {} has no sale for {}", order.id, brand.id)))?;

        let stale_before = Utc::now() - Duration::minutes(REFUND_CLAIM_TIMEOUT_MINUTES);
        if !self.db.claim_refund(id, stale_before).await? {
            return Err(ReturnsApiError::InvalidTransition(format!(
                "A refund for return request #{id} is already in progress"
            )));
        }
        let refund = match self.refund_at_gateway(id, &order, &gateway_order_id, basis.amount()).await {
            Ok(refund) => refund,
            Err(e) => {
                if let Err(release) = self.db.release_refund_claim(id).await {
                    error!("↩️ Could not release the refund claim on return #{id}. It lapses by itself. {release}");
                }
                return Err(e);
            },
        };
        let amount_cents = refund.amount_cents;
        if refund.pending {
            info!("💳️ Refund {} for return #{id} is pending settlement at the gateway", refund.reference);
        }
        let commit = RefundCommit {
            return_id: id,
            sale_entry,
            admin_note: note,
            reviewed_at: Utc::now(),
            refund_reference: refund.reference.clone(),
        };
        let outcome = self.db.commit_refund(commit).await.map_err(|e| {
            error!(
                "↩️ The gateway accepted refund {} of {amount_cents} cents for return #{id}, but it could not be \
                 recorded. Reconcile this refund manually. {e}",
                refund.reference
            );
            ReturnsApiError::from(e)
        })?;
        info!(
            "↩️ Return #{id} refunded. Reversal #{} written for order {} and brand {}",
            outcome.reversal.id, outcome.order.id, outcome.reversal.brand_id
        );
        self.producers.publish_return_refunded(ReturnRefundedEvent::new(outcome.request.clone(), outcome.reversal)).await;
        Ok(outcome.request)
    }

    async fn refund_at_gateway(
        &self,
        id: i64,
        order: &Order,
        gateway_order_id: &str,
        amount: Money,
    ) -> Result<GatewayRefund, ReturnsApiError> {
        debug!("💳️ Looking up the gateway transaction for order {} ({gateway_order_id})", order.id);
        let transaction_id = self.provider.transaction_id_for(gateway_order_id).await.map_err(|e| {
            warn!("💳️ Could not resolve the transaction for order {}. {e}", order.id);
            e
        })?;
        info!("💳️ Refunding {amount} on transaction {transaction_id} for return #{id}");
        let refund = self.provider.refund(&transaction_id, amount.cents()).await.map_err(|e| {
            warn!("💳️ The gateway did not accept the refund for return #{id}. Nothing has been changed. {e}");
            e
        })?;
        Ok(refund)
    }
}
