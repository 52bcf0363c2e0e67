//! Configuration loading from environment.

use std::env;
use std::time::Duration;

use mpesa_gateway::MpesaConfig;

/// Application configuration.
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub admin_api_key: String,
    pub mpesa: MpesaConfig,
    pub expiry_window: chrono::Duration,
    pub sweep_interval: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through `lookup`. Blank values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| anyhow::anyhow!("{} environment variable is required", key))
        };

        let port = parse_or(get("PORT"), "PORT", 5000u16)?;
        let database_url = required("DATABASE_URL")?;
        let admin_api_key = required("ADMIN_API_KEY")?;

        let timeout_secs = parse_or(get("MPESA_TIMEOUT_SECS"), "MPESA_TIMEOUT_SECS", 30u64)?;
        let expiry_minutes =
            parse_or(get("PAYMENT_EXPIRY_MINUTES"), "PAYMENT_EXPIRY_MINUTES", 15i64)?;
        let sweep_secs = parse_or(get("SWEEP_INTERVAL_SECS"), "SWEEP_INTERVAL_SECS", 120u64)?;

        if timeout_secs == 0 {
            anyhow::bail!("MPESA_TIMEOUT_SECS must be greater than zero");
        }
        if expiry_minutes <= 0 {
            anyhow::bail!("PAYMENT_EXPIRY_MINUTES must be greater than zero");
        }
        if sweep_secs == 0 {
            anyhow::bail!("SWEEP_INTERVAL_SECS must be greater than zero");
        }

        let mpesa = MpesaConfig::sandbox(
            required("MPESA_CONSUMER_KEY")?,
            required("MPESA_CONSUMER_SECRET")?,
            required("MPESA_SHORTCODE")?,
            required("MPESA_PASSKEY")?,
            required("CALLBACK_BASE_URL")?,
        )
        .with_base_url(get("MPESA_BASE_URL").unwrap_or_else(|| MpesaConfig::SANDBOX_URL.into()))
        .with_timeout(Duration::from_secs(timeout_secs));

        Ok(Self {
            port,
            database_url,
            admin_api_key,
            mpesa,
            expiry_window: chrono::Duration::minutes(expiry_minutes),
            sweep_interval: Duration::from_secs(sweep_secs),
        })
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("admin_api_key", &"<redacted>")
            .field("mpesa", &self.mpesa)
            .field("expiry_window", &self.expiry_window)
            .field("sweep_interval", &self.sweep_interval)
            .finish_non_exhaustive()
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} is invalid ({}): {}", key, v, e)),
    }
}
