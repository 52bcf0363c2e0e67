//! Gateway configuration.

use std::time::Duration;

/// Path on our service that receives STK callbacks.
pub const CALLBACK_PATH: &str = "/api/mpesa/callback";

#[derive(Clone)]
pub struct MpesaConfig {
    pub base_url: String,
    pub consumer_key: String,
    pub consumer_secret: String,
    pub shortcode: String,
    pub passkey: String,
    /// Public base URL of this service, as reachable by the provider
    pub callback_base_url: String,
    /// Applies to every outbound request
    pub timeout: Duration,
    /// A cached token is refreshed once it is this close to expiry
    pub credential_safety_margin: chrono::Duration,
}

impl MpesaConfig {
    pub const SANDBOX_URL: &'static str = "https://sandbox.safaricom.co.ke";

    /// Sandbox configuration with default timeouts.
    pub fn sandbox(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        shortcode: impl Into<String>,
        passkey: impl Into<String>,
        callback_base_url: impl Into<String>,
    ) -> Self {
        Self {
            base_url: Self::SANDBOX_URL.to_string(),
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            shortcode: shortcode.into(),
            passkey: passkey.into(),
            callback_base_url: callback_base_url.into(),
            timeout: Duration::from_secs(30),
            credential_safety_margin: chrono::Duration::seconds(60),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full callback URL sent with every charge.
    pub fn callback_url(&self) -> String {
        format!(
            "{}{}",
            self.callback_base_url.trim_end_matches('/'),
            CALLBACK_PATH
        )
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

impl std::fmt::Debug for MpesaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MpesaConfig")
            .field("base_url", &self.base_url)
            .field("shortcode", &self.shortcode)
            .field("callback_base_url", &self.callback_base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
