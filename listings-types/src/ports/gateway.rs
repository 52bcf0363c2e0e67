//! Payment gateway port.
//!
//! Implemented by the mobile-money provider adapter. The application layer
//! builds, persists and submits charges through this trait only.

use chrono::{DateTime, Utc};

use crate::domain::{ChargeRequest, CorrelationRef, KesAmount, ListingId, PhoneNumber};

/// Error type for gateway operations. None of these are retried automatically:
/// resubmitting a charge risks charging the payer twice.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Network failure, timeout or provider outage.
    #[error("Payment gateway unavailable: {0}")]
    Unavailable(String),

    /// The provider rejected our client credentials.
    #[error("Payment gateway rejected credentials: {0}")]
    Auth(String),

    /// The provider refused (or never acknowledged) the charge.
    #[error("Charge submission failed: {0}")]
    SubmissionFailed(String),
}

/// Provider acknowledgment of a submitted charge. This is NOT payment success;
/// the outcome arrives later by callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeAcceptance {
    pub merchant_request_id: Option<String>,
    pub checkout_request_id: String,
    pub customer_message: Option<String>,
}

/// Port trait for mobile-money payment gateways.
#[async_trait::async_trait]
pub trait PaymentGateway: Send + Sync + 'static {
    /// Assembles a signed charge and a correlation reference never issued
    /// before by this gateway instance.
    fn build_charge_request(
        &self,
        phone: &PhoneNumber,
        amount: KesAmount,
        listing_id: ListingId,
        now: DateTime<Utc>,
    ) -> (ChargeRequest, CorrelationRef);

    /// Submits a charge using the current access credential.
    async fn submit(&self, request: &ChargeRequest) -> Result<ChargeAcceptance, GatewayError>;
}
