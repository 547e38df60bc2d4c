//! HMAC middleware for Paymob callbacks.
//!
//! Paymob signs each transaction-processed callback with HMAC-SHA512 over a fixed set of the transaction's fields, using
//! the merchant's HMAC secret as the key. The hex digest is sent in the `hmac` query parameter.
//!
//! Wrap the Paymob callback scope with this middleware so that unsigned or tampered callbacks never reach the handlers.
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorBadRequest, ErrorForbidden},
    web,
    Error,
};
use futures::future::LocalBoxFuture;
use log::{trace, warn};
use paymob_tools::signature::verify_callback_body;
use serde::Deserialize;
use souq_common::Secret;

#[derive(Deserialize)]
struct SignatureQuery {
    hmac: Option<String>,
}

pub struct PaymobHmacMiddlewareFactory {
    key: Secret<String>,
    // If false, then the middleware will not check the HMAC signature and always allow the call
    enabled: bool,
}

impl PaymobHmacMiddlewareFactory {
    pub fn new(key: Secret<String>, enabled: bool) -> Self {
        PaymobHmacMiddlewareFactory { key, enabled }
    }
}

impl<S, B> Transform<S, ServiceRequest> for PaymobHmacMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = PaymobHmacMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(PaymobHmacMiddlewareService {
            key: self.key.clone(),
            enabled: self.enabled,
            service: Rc::new(service),
        }))
    }
}

pub struct PaymobHmacMiddlewareService<S> {
    key: Secret<String>,
    enabled: bool,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for PaymobHmacMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let secret = self.key.reveal().clone();
        let enabled = self.enabled;
        Box::pin(async move {
            trace!("🔐️ Checking HMAC for Paymob callback");
            if !enabled {
                trace!("🔐️ HMAC checks are disabled. Allowing request.");
                return service.call(req).await;
            }
            let signature = web::Query::<SignatureQuery>::from_query(req.query_string())
                .ok()
                .and_then(|q| q.into_inner().hmac)
                .ok_or_else(|| {
                    warn!("🔐️ No HMAC signature found in Paymob callback. Denying access.");
                    ErrorForbidden("No HMAC signature found.")
                })?;
            let data = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Failed to extract request data: {:?}", e);
                ErrorBadRequest("Failed to extract request data.")
            })?;
            let validated = verify_callback_body(&secret, data.as_ref(), &signature).map_err(|e| {
                warn!("🔐️ Paymob callback body could not be read. {e}");
                ErrorBadRequest("Invalid callback body.")
            })?;
            if validated {
                trace!("🔐️ HMAC check for Paymob callback ✅️");
                req.set_payload(bytes_to_payload(data));
                service.call(req).await
            } else {
                warn!("🔐️ Invalid HMAC signature found in Paymob callback. Denying access.");
                Err(ErrorForbidden("Invalid HMAC signature."))
            }
        })
    }
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
