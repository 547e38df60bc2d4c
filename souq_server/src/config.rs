use std::env;

use chrono::Duration;
use log::*;
use paymob_tools::PaymobConfig;
use souq_common::helpers::{parse_boolean_flag, parse_number_or};

const DEFAULT_SOUQ_HOST: &str = "127.0.0.1";
const DEFAULT_SOUQ_PORT: u16 = 8370;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 25;
const DEFAULT_RECALC_INTERVAL_HOURS: i64 = 24;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    /// If true, pending database migrations are applied when the server starts.
    pub auto_migrate: bool,
    /// Time between ledger recalculation sweeps. `None` disables the sweep worker.
    pub recalc_interval: Option<Duration>,
    pub paymob: PaymobServerConfig,
}

#[derive(Clone, Debug, Default)]
pub struct PaymobServerConfig {
    /// If false, callbacks are accepted without checking their signature. **DANGER**
    pub hmac_checks: bool,
    pub api: PaymobConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SOUQ_HOST.to_string(),
            port: DEFAULT_SOUQ_PORT,
            database_url: String::default(),
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            auto_migrate: true,
            recalc_interval: Some(Duration::hours(DEFAULT_RECALC_INTERVAL_HOURS)),
            paymob: PaymobServerConfig { hmac_checks: true, api: PaymobConfig::default() },
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SOUQ_HOST").ok().unwrap_or_else(|| DEFAULT_SOUQ_HOST.into());
        let port = env::var("SOUQ_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SOUQ_PORT. {e} Using the default, {DEFAULT_SOUQ_PORT}, \
                         instead."
                    );
                    DEFAULT_SOUQ_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SOUQ_PORT);
        let database_url = env::var("SOUQ_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ SOUQ_DATABASE_URL is not set. Please set it to the URL for the Souq database.");
            String::default()
        });
        let db_max_connections =
            parse_number_or(env::var("SOUQ_DB_MAX_CONNECTIONS").ok(), DEFAULT_DB_MAX_CONNECTIONS).max(1);
        let auto_migrate = parse_boolean_flag(env::var("SOUQ_AUTO_MIGRATE").ok(), true);
        let recalc_interval = configure_recalc_interval();
        let paymob = PaymobServerConfig::from_env_or_defaults();
        Self { host, port, database_url, db_max_connections, auto_migrate, recalc_interval, paymob }
    }
}

impl PaymobServerConfig {
    pub fn from_env_or_defaults() -> Self {
        let api = PaymobConfig::new_from_env_or_default();
        let hmac_checks = parse_boolean_flag(env::var("SOUQ_PAYMOB_HMAC_CHECKS").ok(), true);
        if !hmac_checks {
            warn!(
                "🚨️ Paymob callback signatures will NOT be checked. Anyone can mark orders as paid. Do not run \
                 production like this. 🚨️"
            );
        }
        Self { hmac_checks, api }
    }
}

fn configure_recalc_interval() -> Option<Duration> {
    let hours = env::var("SOUQ_RECALC_INTERVAL_HOURS")
        .map_err(|_| {
            info!(
                "🪛️ SOUQ_RECALC_INTERVAL_HOURS is not set. Using the default value of {DEFAULT_RECALC_INTERVAL_HOURS} \
                 hrs."
            )
        })
        .and_then(|s| {
            s.trim()
                .parse::<i64>()
                .map_err(|e| warn!("🪛️ Invalid configuration value for SOUQ_RECALC_INTERVAL_HOURS. {e}"))
        })
        .ok()
        .unwrap_or(DEFAULT_RECALC_INTERVAL_HOURS);
    if hours <= 0 {
        info!("🪛️ The ledger recalculation sweep is disabled.");
        None
    } else {
        Some(Duration::hours(hours))
    }
}
