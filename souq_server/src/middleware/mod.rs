mod hmac;

pub use hmac::{PaymobHmacMiddlewareFactory, PaymobHmacMiddlewareService};
