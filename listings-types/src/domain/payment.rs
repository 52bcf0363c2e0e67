//! Payment request domain model.
//!
//! A `PaymentRequest` is created PENDING when an administrator triggers
//! "pay to feature" and leaves PENDING at most once. Rows are never deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::listing::ListingId;

/// Opaque reference round-tripped through the provider to link a callback
/// back to the originating request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, example = "R-3f1c9d1e-8a8b-4e2f-9c1d-2b7a6f0e5d4c-1735732800000")]
pub struct CorrelationRef(String);

impl CorrelationRef {
    /// Builds the reference for the `sequence`-th request against a listing.
    pub fn for_listing(listing_id: ListingId, sequence: u64) -> Self {
        Self(format!("R-{}-{}", listing_id, sequence))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CorrelationRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for CorrelationRef {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for CorrelationRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of a payment request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Submitted (or about to be) and awaiting the provider callback
    Pending,
    Succeeded,
    Failed,
    /// Abandoned by the expiry sweep
    Expired,
}

impl PaymentStatus {
    /// Terminal states never transition again.
    pub fn is_terminal(self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }

    /// Only PENDING may move, and only to a terminal state.
    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        self == PaymentStatus::Pending && next.is_terminal()
    }
}

impl AsRef<str> for PaymentStatus {
    fn as_ref(&self) -> &str {
        match self {
            Self::Pending => "PENDING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Expired => "EXPIRED",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "SUCCEEDED" => Ok(Self::Succeeded),
            "FAILED" => Ok(Self::Failed),
            "EXPIRED" => Ok(Self::Expired),
            other => Err(format!("Unknown payment status: {}", other)),
        }
    }
}

/// Details recorded when a request leaves PENDING.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub result_code: Option<i64>,
    pub result_desc: Option<String>,
    pub receipt_number: Option<String>,
}

impl Resolution {
    pub fn with_desc(desc: impl Into<String>) -> Self {
        Self {
            result_desc: Some(desc.into()),
            ..Self::default()
        }
    }
}

/// A "pay to feature" charge and its outcome.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentRequest {
    pub correlation_ref: CorrelationRef,
    pub listing_id: ListingId,
    #[schema(example = "254712345678")]
    pub payer_phone: String,
    /// Amount in cents
    #[schema(example = 5000)]
    pub amount_minor_units: i64,
    pub status: PaymentStatus,
    /// Provider-side id returned when the charge was accepted
    pub checkout_request_id: Option<String>,
    pub result_code: Option<i64>,
    pub result_desc: Option<String>,
    /// M-Pesa receipt reported on success
    pub receipt_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl PaymentRequest {
    /// Creates a new PENDING request.
    pub fn pending(
        correlation_ref: CorrelationRef,
        listing_id: ListingId,
        payer_phone: String,
        amount_minor_units: i64,
    ) -> Self {
        Self {
            correlation_ref,
            listing_id,
            payer_phone,
            amount_minor_units,
            status: PaymentStatus::Pending,
            checkout_request_id: None,
            result_code: None,
            result_desc: None,
            receipt_number: None,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether this request has sat in PENDING past `cutoff`.
    pub fn is_stale(&self, cutoff: DateTime<Utc>) -> bool {
        self.status == PaymentStatus::Pending && self.created_at < cutoff
    }
}
