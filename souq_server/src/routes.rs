//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Every handler is async. Database and gateway calls are awaited, so a slow refund never blocks the worker thread
//! that is serving other requests.
//!
//! Callers identify themselves explicitly: the brand deciding on a return sends its `brand_id`, and the customer filing
//! one sends their `customer_id`. Nothing is looked up from ambient session state.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use paymob_tools::{data_objects::CallbackEnvelope, PaymobApi};
use souq_engine::{
    db_types::{BrandId, NewBrand, NewReturnRequest, OrderId},
    traits::{LedgerQueryFilter, MarketplaceDatabase, PaymentProvider, PayoutQueryFilter, ReturnQueryFilter},
    BrandApi,
    LedgerApi,
    OrderFlowApi,
    PayoutApi,
    ReturnsApi,
};

use crate::{
    data_objects::{
        AdminStatusUpdate,
        BrandStatusUpdate,
        DeliveryDateUpdate,
        IngestOrderRequest,
        IngestOrderResponse,
        JsonResponse,
        OrderStatusUpdate,
        PayoutPeriod,
        RecalculateParams,
        RecalculationSummary,
    },
    errors::ServerError,
    integrations::paymob::start_checkout,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Brands  ----------------------------------------------------
route!(upsert_brand => Post "/brands" impl MarketplaceDatabase);
/// Creates a brand, or updates its name and rates. Rates are fractions, e.g. `0.15`.
pub async fn upsert_brand<B: MarketplaceDatabase>(
    body: web::Json<NewBrand>,
    api: web::Data<BrandApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let brand = body.into_inner();
    debug!("💻️ POST brand {}", brand.id);
    let brand = api.upsert_brand(brand).await?;
    Ok(HttpResponse::Ok().json(brand))
}

route!(brand_by_id => Get "/brands/{id}" impl MarketplaceDatabase);
pub async fn brand_by_id<B: MarketplaceDatabase>(
    path: web::Path<BrandId>,
    api: web::Data<BrandApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let brand_id = path.into_inner();
    debug!("💻️ GET brand {brand_id}");
    let brand = api.fetch_brand(&brand_id).await?;
    Ok(HttpResponse::Ok().json(brand))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(ingest_order => Post "/orders" impl MarketplaceDatabase);
/// Route handler for new orders from the checkout.
///
/// Orders that arrive paid have their ledger entries written immediately. Unpaid card orders are registered with
/// Paymob and the response carries the payment key for the storefront. If Paymob cannot be reached the order is still
/// stored and `checkout` is null.
pub async fn ingest_order<B: MarketplaceDatabase>(
    body: web::Json<IngestOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
    paymob: web::Data<PaymobApi>,
) -> Result<HttpResponse, ServerError> {
    let IngestOrderRequest { order, billing } = body.into_inner();
    debug!("💻️ POST order {} for customer {}", order.id, order.customer_id);
    let order = api.process_new_order(order).await?;
    let billing = billing.unwrap_or_default();
    let checkout = match start_checkout(paymob.as_ref(), api.as_ref(), &order, &billing).await {
        Ok(checkout) => checkout,
        Err(e) => {
            warn!("💻️ Order {} was stored, but its card payment could not be started. {e}", order.id);
            None
        },
    };
    let order = match checkout {
        Some(_) => api.fetch_order(&order.id).await?,
        None => order,
    };
    Ok(HttpResponse::Ok().json(IngestOrderResponse { order, checkout }))
}

route!(order_by_id => Get "/orders/{id}" impl MarketplaceDatabase);
pub async fn order_by_id<B: MarketplaceDatabase>(
    path: web::Path<OrderId>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET order {order_id}");
    let order = api.fetch_order(&order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(order_status => Post "/orders/{id}/status" impl MarketplaceDatabase);
pub async fn order_status<B: MarketplaceDatabase>(
    path: web::Path<OrderId>,
    body: web::Json<OrderStatusUpdate>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let status = body.into_inner().status;
    debug!("💻️ POST status {status} for order {order_id}");
    let order = api.update_order_status(&order_id, status).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(order_delivery_date => Post "/orders/{id}/delivery_date" impl MarketplaceDatabase);
pub async fn order_delivery_date<B: MarketplaceDatabase>(
    path: web::Path<OrderId>,
    body: web::Json<DeliveryDateUpdate>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let date = body.into_inner().delivery_date;
    debug!("💻️ POST delivery date {date} for order {order_id}");
    let order = api.set_delivery_date(&order_id, date).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Returns  ----------------------------------------------------
route!(new_return => Post "/returns" impl MarketplaceDatabase, PaymentProvider);
/// Files a return for all of one brand's items on an order.
pub async fn new_return<B: MarketplaceDatabase, P: PaymentProvider>(
    body: web::Json<NewReturnRequest>,
    api: web::Data<ReturnsApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    debug!("💻️ POST return for order {} brand {}", request.order_id, request.brand_id);
    let request = api.create_return_request(request).await?;
    Ok(HttpResponse::Ok().json(request))
}

route!(returns => Get "/returns" impl MarketplaceDatabase, PaymentProvider);
/// Lists return requests, newest first. Filter with `order_id`, `customer_id`, `brand_id`, `brand_status` and `status`
/// query parameters.
pub async fn returns<B: MarketplaceDatabase, P: PaymentProvider>(
    query: web::Query<ReturnQueryFilter>,
    api: web::Data<ReturnsApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    let filter = query.into_inner();
    debug!("💻️ GET returns for {filter:?}");
    let requests = api.return_requests(filter).await?;
    Ok(HttpResponse::Ok().json(requests))
}

route!(return_by_id => Get "/returns/{id}" impl MarketplaceDatabase, PaymentProvider);
pub async fn return_by_id<B: MarketplaceDatabase, P: PaymentProvider>(
    path: web::Path<i64>,
    api: web::Data<ReturnsApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ GET return #{id}");
    let request = api.fetch_return_request(id).await?;
    Ok(HttpResponse::Ok().json(request))
}

route!(return_brand_status => Post "/returns/{id}/brand_status" impl MarketplaceDatabase, PaymentProvider);
/// The brand reports whether the goods came back. `Not Received` needs a reason.
pub async fn return_brand_status<B: MarketplaceDatabase, P: PaymentProvider>(
    path: web::Path<i64>,
    body: web::Json<BrandStatusUpdate>,
    api: web::Data<ReturnsApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let BrandStatusUpdate { brand_id, decision } = body.into_inner();
    debug!("💻️ POST brand status for return #{id} from {brand_id}: {decision:?}");
    let request = api.set_brand_status(id, &brand_id, decision).await?;
    Ok(HttpResponse::Ok().json(request))
}

route!(return_admin_status => Post "/returns/{id}/admin_status" impl MarketplaceDatabase, PaymentProvider);
/// The admin decides on a return. `Refunded` refunds the customer through Paymob before reversing the brand's sale.
///
/// If Paymob is unavailable the response is a 503 with `"retryable": true` and nothing has changed.
pub async fn return_admin_status<B: MarketplaceDatabase, P: PaymentProvider>(
    path: web::Path<i64>,
    body: web::Json<AdminStatusUpdate>,
    api: web::Data<ReturnsApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let AdminStatusUpdate { status, note } = body.into_inner();
    debug!("💻️ POST admin status {status} for return #{id}");
    let request = api.set_admin_status(id, status, note).await?;
    Ok(HttpResponse::Ok().json(request))
}

//----------------------------------------------   Finance  ----------------------------------------------------
route!(financial_logs => Get "/finance/logs" impl MarketplaceDatabase);
/// The financial log, filtered by the `year`, `month`, `brand_id`, `order_id` and `kind` query parameters.
pub async fn financial_logs<B: MarketplaceDatabase>(
    query: web::Query<LedgerQueryFilter>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let filter = query.into_inner();
    debug!("💻️ GET financial logs for {filter:?}");
    let entries = api.financial_logs(filter).await?;
    Ok(HttpResponse::Ok().json(entries))
}

route!(ledger_totals => Get "/finance/totals" impl MarketplaceDatabase);
pub async fn ledger_totals<B: MarketplaceDatabase>(
    query: web::Query<LedgerQueryFilter>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let filter = query.into_inner();
    debug!("💻️ GET ledger totals for {filter:?}");
    let totals = api.ledger_totals(filter).await?;
    Ok(HttpResponse::Ok().json(totals))
}

route!(recalculate => Post "/finance/recalculate" impl MarketplaceDatabase);
/// Regenerates the ledger for every paid order, optionally limited to orders created in `[since, until)`.
pub async fn recalculate<B: MarketplaceDatabase>(
    body: web::Json<RecalculateParams>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let RecalculateParams { since, until } = body.into_inner();
    info!("💻️ Ledger recalculation requested for [{since:?}, {until:?})");
    let report = api.recalculate(since, until).await?;
    Ok(HttpResponse::Ok().json(RecalculationSummary::from(report)))
}

//----------------------------------------------   Payouts  ----------------------------------------------------
route!(calculate_payouts => Post "/payouts/calculate" impl MarketplaceDatabase);
pub async fn calculate_payouts<B: MarketplaceDatabase>(
    body: web::Json<PayoutPeriod>,
    api: web::Data<PayoutApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let PayoutPeriod { from, to } = body.into_inner();
    info!("💻️ Payout calculation requested for {from} to {to}");
    let payouts = api.calculate_payouts(from, to).await?;
    Ok(HttpResponse::Ok().json(payouts))
}

route!(payouts => Get "/payouts" impl MarketplaceDatabase);
pub async fn payouts<B: MarketplaceDatabase>(
    query: web::Query<PayoutQueryFilter>,
    api: web::Data<PayoutApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let filter = query.into_inner();
    debug!("💻️ GET payouts for {filter:?}");
    let payouts = api.payouts(filter).await?;
    Ok(HttpResponse::Ok().json(payouts))
}

route!(payout_paid => Post "/payouts/{id}/paid" impl MarketplaceDatabase);
pub async fn payout_paid<B: MarketplaceDatabase>(
    path: web::Path<i64>,
    api: web::Data<PayoutApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    info!("💻️ Marking payout #{id} as paid");
    let payout = api.mark_paid(id).await?;
    Ok(HttpResponse::Ok().json(payout))
}

//----------------------------------------------   Paymob  ----------------------------------------------------
route!(paymob_callback => Post "/callback" impl MarketplaceDatabase);
/// Route handler for Paymob's transaction-processed callback.
///
/// The signature has already been checked by the HMAC middleware. Successful payments confirm the matching order, which
/// writes its ledger entries. Everything else (failed attempts, refunds, voids) is acknowledged and ignored, so that
/// Paymob does not keep retrying.
pub async fn paymob_callback<B: MarketplaceDatabase>(
    body: web::Json<CallbackEnvelope>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let tx = body.into_inner().obj;
    trace!("💻️ Paymob callback for transaction {} on order {}", tx.id, tx.order.id);
    if !tx.is_successful_payment() {
        info!("💻️ Ignoring Paymob transaction {}. It is not a completed payment.", tx.id);
        return Ok(HttpResponse::Ok().json(JsonResponse::success("Callback acknowledged. No action taken.")));
    }
    let gateway_order_id = tx.order.id.to_string();
    let transaction_id = tx.id.to_string();
    let order = api.confirm_payment(&gateway_order_id, Some(&transaction_id)).await?;
    info!("💻️ Payment for order {} confirmed by Paymob transaction {transaction_id}", order.id);
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Payment for order {} confirmed.", order.id))))
}
