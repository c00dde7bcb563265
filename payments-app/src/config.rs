//! Configuration loading from environment.

use std::env;
use std::time::Duration;

use anyhow::Context;

use payments_hex::outbound::MidtransEnvironment;
use payments_hex::service::DEFAULT_FINISH_URL;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub auth_service_url: String,
    pub user_service_url: String,
    pub midtrans_server_key: String,
    pub midtrans_env: MidtransEnvironment,
    pub midtrans_finish_url: String,
    pub webhook_verify_signature: bool,
    pub rate_limit_per_minute: u32,
    pub http_client_timeout: Duration,
    pub log_format: LogFormat,
    /// OTLP collector; tracing export is off when unset
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            var(key).ok_or_else(|| anyhow::anyhow!("{} environment variable is required", key))
        };

        let port = var("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .context("PORT must be a port number")?;

        let midtrans_env = match var("MIDTRANS_ENV") {
            Some(value) => value.parse().map_err(anyhow::Error::msg)?,
            None => MidtransEnvironment::default(),
        };

        let webhook_verify_signature = match var("WEBHOOK_VERIFY_SIGNATURE") {
            Some(value) => parse_bool(&value)
                .with_context(|| format!("WEBHOOK_VERIFY_SIGNATURE: invalid value '{}'", value))?,
            None => true,
        };

        let rate_limit_per_minute = var("RATE_LIMIT_PER_MINUTE")
            .unwrap_or_else(|| "100".to_string())
            .parse()
            .context("RATE_LIMIT_PER_MINUTE must be a positive integer")?;

        let timeout_secs: u64 = var("HTTP_CLIENT_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .context("HTTP_CLIENT_TIMEOUT_SECS must be a number of seconds")?;

        let log_format = match var("LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            port,
            database_url: required("DATABASE_URL")?,
            auth_service_url: required("AUTH_SERVICE_URL")?,
            user_service_url: required("USER_SERVICE_URL")?,
            midtrans_server_key: required("MIDTRANS_SERVER_KEY")?,
            midtrans_env,
            midtrans_finish_url: var("MIDTRANS_FINISH_URL")
                .unwrap_or_else(|| DEFAULT_FINISH_URL.to_string()),
            webhook_verify_signature,
            rate_limit_per_minute,
            http_client_timeout: Duration::from_secs(timeout_secs),
            log_format,
            otlp_endpoint: var("OTEL_EXPORTER_OTLP_ENDPOINT"),
        })
    }

    /// Server key used to verify notifications, when verification is on.
    pub fn webhook_server_key(&self) -> Option<String> {
        self.webhook_verify_signature
            .then(|| self.midtrans_server_key.clone())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
