//! Provider access credential.

use chrono::{DateTime, Duration, Utc};

/// A short-lived bearer token for the payment provider. Held in memory only.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessCredential {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessCredential {
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// Usable if `now` is still ahead of expiry by at least `safety_margin`.
    pub fn is_fresh(&self, now: DateTime<Utc>, safety_margin: Duration) -> bool {
        now < self.expires_at - safety_margin
    }
}

// Keep tokens out of logs.
impl std::fmt::Debug for AccessCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessCredential")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freshness_respects_margin() {
        let now = Utc::now();
        let cred = AccessCredential::new("tok", now + Duration::seconds(100));

        assert!(cred.is_fresh(now, Duration::seconds(60)));
        assert!(!cred.is_fresh(now, Duration::seconds(100)));
        assert!(!cred.is_fresh(now + Duration::seconds(50), Duration::seconds(60)));
    }

    #[test]
    fn test_debug_redacts_token() {
        let cred = AccessCredential::new("secret-token", Utc::now());
        assert!(!format!("{:?}", cred).contains("secret-token"));
    }
}
