use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use paymob_tools::PaymobApi;
use souq_common::Secret;
use souq_engine::{
    events::{EventHandlers, EventHooks, EventProducers, OrderPaidEvent, ReturnRefundedEvent},
    traits::{MarketplaceDatabase, PaymentProvider},
    BrandApi,
    LedgerApi,
    OrderFlowApi,
    PayoutApi,
    ReturnsApi,
    SqliteDatabase,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::paymob::PaymobProvider,
    middleware::PaymobHmacMiddlewareFactory,
    recalc_worker::start_recalc_worker,
    routes::{
        health,
        BrandByIdRoute,
        CalculatePayoutsRoute,
        FinancialLogsRoute,
        IngestOrderRoute,
        LedgerTotalsRoute,
        NewReturnRoute,
        OrderByIdRoute,
        OrderDeliveryDateRoute,
        OrderStatusRoute,
        PaymobCallbackRoute,
        PayoutPaidRoute,
        PayoutsRoute,
        RecalculateRoute,
        ReturnAdminStatusRoute,
        ReturnBrandStatusRoute,
        ReturnByIdRoute,
        ReturnsRoute,
        UpsertBrandRoute,
    },
};

const EVENT_BUFFER_SIZE: usize = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.db_max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.auto_migrate {
        db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
        info!("🗃️ Database migrations are up to date");
    }
    let paymob = PaymobApi::new(config.paymob.api.clone())?;
    let handlers = create_event_handlers();
    let producers = handlers.producers();
    handlers.start_handlers().await;
    if let Some(interval) = config.recalc_interval {
        // The worker runs for the lifetime of the process
        let _worker = start_recalc_worker(db.clone(), interval);
    }
    let srv = create_server_instance(config, db, paymob, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    paymob: PaymobApi,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let hmac_secret = config.paymob.api.hmac_secret.clone();
    let hmac_checks = config.paymob.hmac_checks;
    let srv = HttpServer::new(move || {
        let provider = PaymobProvider::new(paymob.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("souq::access_log"))
            .app_data(web::Data::new(OrderFlowApi::new(db.clone(), producers.clone())))
            .app_data(web::Data::new(BrandApi::new(db.clone())))
            .app_data(web::Data::new(LedgerApi::new(db.clone())))
            .app_data(web::Data::new(PayoutApi::new(db.clone())))
            .app_data(web::Data::new(ReturnsApi::new(db.clone(), provider, producers.clone())))
            .app_data(web::Data::new(paymob.clone()))
            .configure(|cfg| configure_routes::<SqliteDatabase, PaymobProvider>(cfg, hmac_secret.clone(), hmac_checks))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Registers every route. The API objects the handlers use must already be in the app data.
pub fn configure_routes<B, P>(cfg: &mut web::ServiceConfig, hmac_secret: Secret<String>, hmac_checks: bool)
where
    B: MarketplaceDatabase + 'static,
    P: PaymentProvider + 'static,
{
    let api_scope = web::scope("/api")
        .service(UpsertBrandRoute::<B>::new())
        .service(BrandByIdRoute::<B>::new())
        .service(IngestOrderRoute::<B>::new())
        .service(OrderByIdRoute::<B>::new())
        .service(OrderStatusRoute::<B>::new())
        .service(OrderDeliveryDateRoute::<B>::new())
        .service(NewReturnRoute::<B, P>::new())
        .service(ReturnsRoute::<B, P>::new())
        .service(ReturnByIdRoute::<B, P>::new())
        .service(ReturnBrandStatusRoute::<B, P>::new())
        .service(ReturnAdminStatusRoute::<B, P>::new())
        .service(FinancialLogsRoute::<B>::new())
        .service(LedgerTotalsRoute::<B>::new())
        .service(RecalculateRoute::<B>::new())
        .service(CalculatePayoutsRoute::<B>::new())
        .service(PayoutsRoute::<B>::new())
        .service(PayoutPaidRoute::<B>::new());
    let paymob_scope = web::scope("/paymob")
        .wrap(PaymobHmacMiddlewareFactory::new(hmac_secret, hmac_checks))
        .service(PaymobCallbackRoute::<B>::new());
    cfg.service(health).service(api_scope).service(paymob_scope);
}

/// Event hooks that record the ledger's milestones in the log.
fn create_event_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_order_paid(|ev: OrderPaidEvent| {
        Box::pin(async move {
            let OrderPaidEvent { order, entries } = ev;
            info!(
                "📒️ Order {} is paid. {} sale entries written. Brand payout {}, platform profit {}",
                order.id,
                entries.len(),
                order.brand_payout,
                order.net_admin_profit
            );
        })
    });
    hooks.on_return_refunded(|ev: ReturnRefundedEvent| {
        Box::pin(async move {
            let ReturnRefundedEvent { request, reversal } = ev;
            info!(
                "↩️ Return #{} on order {} refunded. Reversed {} of brand payout for {}",
                request.id, request.order_id, reversal.brand_payout, request.brand_id
            );
        })
    });
    EventHandlers::new(EVENT_BUFFER_SIZE, hooks)
}
