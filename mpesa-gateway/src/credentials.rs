//! Access credential cache.
//!
//! One cache per process. The async mutex is held across the refresh, so
//! callers that arrive while a token is being fetched wait for that fetch
//! and then read its result instead of starting their own.

use std::future::Future;

use chrono::{Duration, Utc};
use tokio::sync::Mutex;

use listings_types::{AccessCredential, GatewayError};

pub struct CredentialCache {
    slot: Mutex<Option<AccessCredential>>,
    safety_margin: Duration,
}

impl CredentialCache {
    pub fn new(safety_margin: Duration) -> Self {
        Self {
            slot: Mutex::new(None),
            safety_margin,
        }
    }

    /// Returns the cached credential if still fresh, otherwise runs `refresh`
    /// once and caches its result. A failed refresh leaves the slot empty.
    pub async fn get_or_refresh<F, Fut>(&self, refresh: F) -> Result<AccessCredential, GatewayError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<AccessCredential, GatewayError>>,
    {
        let mut slot = self.slot.lock().await;

        if let Some(cred) = slot.as_ref() {
            if cred.is_fresh(Utc::now(), self.safety_margin) {
                return Ok(cred.clone());
            }
        }

        tracing::debug!("refreshing payment provider access credential");
        *slot = None;
        let fresh = refresh().await?;
        *slot = Some(fresh.clone());
        Ok(fresh)
    }

    /// Drops the cached credential, e.g. after the provider rejects it.
    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn credential(valid_for_secs: i64) -> AccessCredential {
        AccessCredential::new("tok", Utc::now() + Duration::seconds(valid_for_secs))
    }

    #[tokio::test]
    async fn test_fresh_credential_is_reused() {
        let cache = CredentialCache::new(Duration::seconds(60));
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            cache
                .get_or_refresh(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(credential(3600))
                })
                .await
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_credential_inside_margin_is_refreshed() {
        let cache = CredentialCache::new(Duration::seconds(60));
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            cache
                .get_or_refresh(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(credential(30))
                })
                .await
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_collapse_into_one() {
        let cache = Arc::new(CredentialCache::new(Duration::seconds(60)));
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let cache = cache.clone();
                let calls = calls.clone();
                tokio::spawn(async move {
                    cache
                        .get_or_refresh(|| async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                            Ok(credential(3600))
                        })
                        .await
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().token, "tok");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_is_not_cached() {
        let cache = CredentialCache::new(Duration::seconds(60));

        let err = cache
            .get_or_refresh(|| async { Err(GatewayError::Unavailable("timeout".into())) })
            .await;
        assert!(matches!(err, Err(GatewayError::Unavailable(_))));

        let ok = cache.get_or_refresh(|| async { Ok(credential(3600)) }).await;
        assert!(ok.is_ok());
    }

    #[tokio::test]
    async fn test_invalidate_forces_refresh() {
        let cache = CredentialCache::new(Duration::seconds(60));
        let calls = AtomicUsize::new(0);
        let refresh = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(credential(3600))
        };

        cache.get_or_refresh(refresh).await.unwrap();
        cache.invalidate().await;
        cache.get_or_refresh(refresh).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
