use std::time::Duration;

use log::*;
use souq_common::{helpers::parse_number_or, Secret};

const DEFAULT_BASE_URL: &str = "https://accept.paymob.com/api";
const DEFAULT_CURRENCY: &str = "EGP";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone)]
pub struct PaymobConfig {
    /// Root of the Accept REST API, without a trailing slash.
    pub base_url: String,
    pub api_key: Secret<String>,
    /// The card integration that payment keys are issued against.
    pub integration_id: i64,
    /// The hosted checkout iframe. Checkout links are only produced when this is set.
    pub iframe_id: Option<String>,
    /// The key Paymob uses to sign transaction callbacks.
    pub hmac_secret: Secret<String>,
    pub currency: String,
    /// Upper bound on every request made to the gateway.
    pub timeout: Duration,
}

impl Default for PaymobConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: Secret::default(),
            integration_id: 0,
            iframe_id: None,
            hmac_secret: Secret::default(),
            currency: DEFAULT_CURRENCY.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl PaymobConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("SOUQ_PAYMOB_BASE_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| {
                info!("🪛️ SOUQ_PAYMOB_BASE_URL not set, using {DEFAULT_BASE_URL}");
                DEFAULT_BASE_URL.to_string()
            });
        let api_key = Secret::new(std::env::var("SOUQ_PAYMOB_API_KEY").unwrap_or_else(|_| {
            warn!("🪛️ SOUQ_PAYMOB_API_KEY not set. Gateway calls will fail until it is configured.");
            String::default()
        }));
        let integration_id = std::env::var("SOUQ_PAYMOB_INTEGRATION_ID")
            .ok()
            .and_then(|s| {
                s.trim()
                    .parse::<i64>()
                    .map_err(|e| error!("🪛️ {s} is not a valid SOUQ_PAYMOB_INTEGRATION_ID. {e}"))
                    .ok()
            })
            .unwrap_or_else(|| {
                warn!("🪛️ SOUQ_PAYMOB_INTEGRATION_ID not set. Payment keys cannot be issued.");
                0
            });
        let iframe_id = std::env::var("SOUQ_PAYMOB_IFRAME_ID").ok().filter(|s| !s.trim().is_empty());
        let hmac_secret = Secret::new(std::env::var("SOUQ_PAYMOB_HMAC_SECRET").unwrap_or_else(|_| {
            warn!("🪛️ SOUQ_PAYMOB_HMAC_SECRET not set. Transaction callbacks cannot be verified.");
            String::default()
        }));
        let currency = std::env::var("SOUQ_PAYMOB_CURRENCY").unwrap_or_else(|_| DEFAULT_CURRENCY.to_string());
        let timeout_secs = parse_number_or(std::env::var("SOUQ_PAYMOB_TIMEOUT_SECS").ok(), DEFAULT_TIMEOUT_SECS);
        Self {
            base_url,
            api_key,
            integration_id,
            iframe_id,
            hmac_secret,
            currency,
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}
