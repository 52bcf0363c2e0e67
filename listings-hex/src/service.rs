//! Featured Listing Application Service
//!
//! Orchestrates listing administration and the "pay to feature" flow through
//! the store and gateway ports. Contains no HTTP or database code.

use std::sync::Arc;

use chrono::{Duration, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};

use listings_types::{
    AppError, CallbackResult, ChargeRequest, CorrelationRef, CorrelationStore,
    CreateListingRequest, DomainError, FeatureListingRequest, FeaturePaymentResponse, KesAmount,
    Listing, ListingId, ListingStore, PaymentGateway, PaymentRequest, PaymentStatus, PhoneNumber,
    RepoError, Resolution,
};

/// Default age after which an unanswered charge is expired.
pub const DEFAULT_EXPIRY_MINUTES: i64 = 15;

/// Stale requests fetched per sweep query.
const SWEEP_BATCH: i64 = 100;

/// A fresh reference is drawn this many times if the store reports a clash.
const MAX_REF_ATTEMPTS: usize = 3;

const PROMPT_SENT: &str = "Payment request sent, check your phone.";

/// Both persistence ports, as one bound.
pub trait Store: ListingStore + CorrelationStore {}

impl<T: ListingStore + CorrelationStore> Store for T {}

/// What a callback did to its payment request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// PENDING -> SUCCEEDED and the listing is now featured.
    Succeeded,
    /// PENDING -> FAILED.
    Failed,
    /// The request was already terminal; nothing changed.
    Duplicate,
}

/// Application service for listings and featured-listing payments.
///
/// Generic over the store and gateway so adapters are injected at compile
/// time and tests can run against in-memory fakes.
pub struct FeaturedListingService<R: Store, G: PaymentGateway> {
    repo: R,
    gateway: G,
    expiry_window: Duration,
    ref_locks: DashMap<CorrelationRef, Arc<Mutex<()>>>,
}

impl<R: Store, G: PaymentGateway> FeaturedListingService<R, G> {
    pub fn new(repo: R, gateway: G) -> Self {
        Self {
            repo,
            gateway,
            expiry_window: Duration::minutes(DEFAULT_EXPIRY_MINUTES),
            ref_locks: DashMap::new(),
        }
    }

    /// Overrides how long a request may stay PENDING before a sweep expires it.
    pub fn with_expiry_window(mut self, window: Duration) -> Self {
        self.expiry_window = window;
        self
    }

    pub fn expiry_window(&self) -> Duration {
        self.expiry_window
    }

    /// Returns a reference to the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Listings
    // ─────────────────────────────────────────────────────────────────────────────

    #[instrument(skip(self, req), fields(business = %req.business_name))]
    pub async fn create_listing(&self, req: CreateListingRequest) -> Result<Listing, AppError> {
        let listing = self.repo.create_listing(req).await?;
        info!(listing_id = %listing.id, "Listing created");
        Ok(listing)
    }

    pub async fn get_listing(&self, id: ListingId) -> Result<Listing, AppError> {
        self.repo
            .get_listing(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Listing {}", id)))
    }

    /// Flips the admin verification badge.
    #[instrument(skip(self))]
    pub async fn toggle_verified(&self, id: ListingId) -> Result<Listing, AppError> {
        let listing = self.repo.toggle_verified(id).await?;
        info!(listing_id = %id, verified = listing.verified, "Verification toggled");
        Ok(listing)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Charge initiation
    // ─────────────────────────────────────────────────────────────────────────────

    /// Starts a "pay to feature" charge.
    ///
    /// Input is validated before anything is persisted. The PENDING row is
    /// written before the provider is contacted, so a callback that beats the
    /// submission response still finds it. A failed submission marks the row
    /// FAILED and is never retried.
    #[instrument(skip(self, req), fields(listing_id = %req.listing_id, amount = req.amount))]
    pub async fn initiate_feature_payment(
        &self,
        req: FeatureListingRequest,
    ) -> Result<FeaturePaymentResponse, AppError> {
        let phone = PhoneNumber::parse(&req.phone)?;
        let amount = KesAmount::from_minor_units(req.amount)?;
        let listing = self.get_listing(req.listing_id).await?;

        let (charge, correlation_ref) = self.persist_pending(&phone, amount, listing.id).await?;
        info!(correlation_ref = %correlation_ref, "Payment request recorded, submitting charge");

        match self.gateway.submit(&charge).await {
            Ok(acceptance) => {
                if let Err(e) = self
                    .repo
                    .record_checkout(&correlation_ref, &acceptance.checkout_request_id)
                    .await
                {
                    // The AccountReference echo still correlates the callback.
                    warn!(
                        correlation_ref = %correlation_ref,
                        checkout_request_id = %acceptance.checkout_request_id,
                        "Failed to record checkout id: {}", e
                    );
                }

                info!(
                    correlation_ref = %correlation_ref,
                    checkout_request_id = %acceptance.checkout_request_id,
                    "Charge accepted by provider"
                );

                Ok(FeaturePaymentResponse {
                    correlation_ref,
                    status: PaymentStatus::Pending,
                    message: acceptance
                        .customer_message
                        .unwrap_or_else(|| PROMPT_SENT.to_string()),
                })
            }
            Err(gateway_err) => {
                warn!(correlation_ref = %correlation_ref, "Charge submission failed: {}", gateway_err);

                let marked = self
                    .with_ref_lock(&correlation_ref, || {
                        self.repo.transition(
                            &correlation_ref,
                            PaymentStatus::Pending,
                            PaymentStatus::Failed,
                            Resolution::with_desc(gateway_err.to_string()),
                        )
                    })
                    .await?;

                if marked {
                    return Err(gateway_err.into());
                }

                // A callback resolved the request while the submission was failing.
                let current = self.get_payment_request(&correlation_ref).await?;
                Ok(FeaturePaymentResponse {
                    correlation_ref,
                    status: current.status,
                    message: current
                        .result_desc
                        .unwrap_or_else(|| "Payment already resolved".to_string()),
                })
            }
        }
    }

    /// Builds a charge and stores its PENDING row, drawing a new reference if
    /// the store already holds the one issued.
    async fn persist_pending(
        &self,
        phone: &PhoneNumber,
        amount: KesAmount,
        listing_id: ListingId,
    ) -> Result<(ChargeRequest, CorrelationRef), AppError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let (charge, correlation_ref) =
                self.gateway
                    .build_charge_request(phone, amount, listing_id, Utc::now());

            let pending = PaymentRequest::pending(
                correlation_ref.clone(),
                listing_id,
                phone.as_str().to_string(),
                amount.minor_units(),
            );

            match self.repo.create_payment_request(&pending).await {
                Ok(()) => return Ok((charge, correlation_ref)),
                Err(RepoError::Conflict(msg)) if attempt < MAX_REF_ATTEMPTS => {
                    warn!(correlation_ref = %correlation_ref, "Correlation reference clash ({}), regenerating", msg);
                }
                Err(RepoError::Conflict(msg)) => {
                    return Err(AppError::Internal(format!(
                        "Could not allocate a correlation reference: {}",
                        msg
                    )));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Payment lookups
    // ─────────────────────────────────────────────────────────────────────────────

    pub async fn get_payment_request(
        &self,
        correlation_ref: &CorrelationRef,
    ) -> Result<PaymentRequest, AppError> {
        self.repo
            .find_by_ref(correlation_ref)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Payment request {}", correlation_ref)))
    }

    /// Payment history for a listing, newest first.
    pub async fn list_payments_for_listing(
        &self,
        listing_id: ListingId,
    ) -> Result<Vec<PaymentRequest>, AppError> {
        // Verify listing exists first
        let _ = self.get_listing(listing_id).await?;

        self.repo
            .list_for_listing(listing_id)
            .await
            .map_err(Into::into)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Callback reconciliation
    // ─────────────────────────────────────────────────────────────────────────────

    /// Applies a provider callback to its payment request.
    ///
    /// Errors are for logging only; the provider is acknowledged regardless.
    /// On success the listing is featured before the request is marked
    /// SUCCEEDED, so a failed listing write leaves the request PENDING and the
    /// callback can be replayed.
    #[instrument(skip(self, payload), fields(bytes = payload.len()))]
    pub async fn handle_callback(&self, payload: &[u8]) -> Result<CallbackOutcome, AppError> {
        let callback = CallbackResult::decode(payload).inspect_err(|e| {
            warn!("Rejected callback: {}", e);
        })?;

        let request = self.resolve_callback_target(&callback).await?;
        let correlation_ref = request.correlation_ref.clone();

        self.with_ref_lock(&correlation_ref, || self.reconcile(&correlation_ref, &callback))
            .await
    }

    async fn resolve_callback_target(
        &self,
        callback: &CallbackResult,
    ) -> Result<PaymentRequest, AppError> {
        let found = match (&callback.correlation_ref, &callback.checkout_request_id) {
            (Some(correlation_ref), _) => self.repo.find_by_ref(correlation_ref).await?,
            (None, Some(checkout_id)) => self.repo.find_by_checkout_id(checkout_id).await?,
            (None, None) => None,
        };

        found.ok_or_else(|| {
            let err = DomainError::MalformedCallback(format!(
                "no payment request for reference {:?} / checkout {:?}",
                callback.correlation_ref.as_ref().map(CorrelationRef::as_str),
                callback.checkout_request_id
            ));
            if callback.is_success() {
                // Money moved; the receipt has to be matched by hand.
                error!(
                    checkout_request_id = callback.checkout_request_id.as_deref().unwrap_or("-"),
                    receipt = callback.receipt_number.as_deref().unwrap_or("-"),
                    amount = ?callback.amount,
                    "ALERT: successful payment matches no request: {}", err
                );
            } else {
                warn!("Ignoring callback: {}", err);
            }
            err.into()
        })
    }

    /// Runs with the per-reference lock held.
    async fn reconcile(
        &self,
        correlation_ref: &CorrelationRef,
        callback: &CallbackResult,
    ) -> Result<CallbackOutcome, AppError> {
        // Re-read under the lock; a concurrent duplicate may have resolved it.
        let current = self.get_payment_request(correlation_ref).await?;
        if current.is_terminal() {
            info!(
                correlation_ref = %correlation_ref,
                status = %current.status,
                "Duplicate callback for resolved payment, ignoring"
            );
            return Ok(CallbackOutcome::Duplicate);
        }

        if let Some(paid) = callback.amount {
            if (paid as i64).saturating_mul(100) != current.amount_minor_units {
                warn!(
                    correlation_ref = %correlation_ref,
                    paid_shillings = paid,
                    expected_minor_units = current.amount_minor_units,
                    "Callback amount differs from requested amount"
                );
            }
        }

        let resolution = Resolution {
            result_code: Some(callback.result_code),
            result_desc: callback.result_desc.clone(),
            receipt_number: callback.receipt_number.clone(),
        };

        if !callback.is_success() {
            let moved = self
                .repo
                .transition(
                    correlation_ref,
                    PaymentStatus::Pending,
                    PaymentStatus::Failed,
                    resolution,
                )
                .await?;
            return Ok(if moved {
                info!(
                    correlation_ref = %correlation_ref,
                    result_code = callback.result_code,
                    "Payment failed"
                );
                CallbackOutcome::Failed
            } else {
                CallbackOutcome::Duplicate
            });
        }

        if let Err(e) = self.repo.set_featured(current.listing_id).await {
            match &e {
                RepoError::Domain(DomainError::ListingNotFound(id)) => error!(
                    correlation_ref = %correlation_ref,
                    listing_id = %id,
                    receipt = callback.receipt_number.as_deref().unwrap_or("-"),
                    "ALERT: payment received for a listing that no longer exists"
                ),
                other => error!(
                    correlation_ref = %correlation_ref,
                    receipt = callback.receipt_number.as_deref().unwrap_or("-"),
                    "Failed to feature listing after payment: {}", other
                ),
            }
            return Err(e.into());
        }

        let moved = self
            .repo
            .transition(
                correlation_ref,
                PaymentStatus::Pending,
                PaymentStatus::Succeeded,
                resolution,
            )
            .await?;

        if moved {
            info!(
                correlation_ref = %correlation_ref,
                listing_id = %current.listing_id,
                receipt = callback.receipt_number.as_deref().unwrap_or("-"),
                "Payment succeeded, listing featured"
            );
            Ok(CallbackOutcome::Succeeded)
        } else {
            Ok(CallbackOutcome::Duplicate)
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Expiry
    // ─────────────────────────────────────────────────────────────────────────────

    /// Marks every PENDING request older than the expiry window EXPIRED.
    /// Returns how many were moved.
    #[instrument(skip(self))]
    pub async fn expire_stale_requests(&self) -> Result<usize, AppError> {
        let cutoff = Utc::now() - self.expiry_window;
        let mut expired = 0;

        loop {
            let stale = self.repo.list_pending_before(cutoff, SWEEP_BATCH).await?;
            let fetched = stale.len();

            for request in stale {
                let correlation_ref = request.correlation_ref;
                let moved = self
                    .with_ref_lock(&correlation_ref, || {
                        self.repo.transition(
                            &correlation_ref,
                            PaymentStatus::Pending,
                            PaymentStatus::Expired,
                            Resolution::with_desc("No callback received before expiry"),
                        )
                    })
                    .await?;

                if moved {
                    expired += 1;
                    info!(correlation_ref = %correlation_ref, "Payment request expired");
                }
            }

            if fetched < SWEEP_BATCH as usize {
                break;
            }
        }

        Ok(expired)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Per-reference serialisation
    // ─────────────────────────────────────────────────────────────────────────────

    /// Runs `f` while holding the in-process lock for `correlation_ref`.
    async fn with_ref_lock<T, E, F, Fut>(
        &self,
        correlation_ref: &CorrelationRef,
        f: F,
    ) -> Result<T, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: Into<AppError>,
    {
        let lock = Arc::clone(
            &self
                .ref_locks
                .entry(correlation_ref.clone())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        );

        let result = {
            let _guard = lock.lock().await;
            f().await
        };

        drop(lock);
        self.ref_locks
            .remove_if(correlation_ref, |_, l| Arc::strong_count(l) == 1);

        result.map_err(Into::into)
    }

    #[cfg(test)]
    pub(crate) fn held_ref_locks(&self) -> usize {
        self.ref_locks.len()
    }
}
