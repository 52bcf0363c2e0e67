//! Data Transfer Objects (DTOs) for requests and responses.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{CorrelationRef, Listing, ListingId, PaymentStatus};

// ─────────────────────────────────────────────────────────────────────────────
// Listing DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to list a business in the directory.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateListingRequest {
    #[schema(example = "Mama Njeri Plumbing")]
    pub business_name: String,
    #[schema(example = "Plumber")]
    pub category: String,
    #[schema(example = "Nairobi")]
    pub city: String,
    #[serde(default)]
    pub description: String,
    /// WhatsApp number for the contact deep link
    #[serde(default)]
    #[schema(example = "254712345678")]
    pub whatsapp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// A listing as returned by the API, with its contact deep link.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListingResponse {
    #[serde(flatten)]
    pub listing: Listing,
    /// `wa.me` link, absent when the listing has no WhatsApp number
    #[schema(example = "https://wa.me/254712345678")]
    pub contact_link: Option<String>,
}

impl From<Listing> for ListingResponse {
    fn from(listing: Listing) -> Self {
        Self {
            contact_link: listing.contact_link(),
            listing,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Payment DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Admin request to charge a payer for featuring a listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FeatureListingRequest {
    /// Payer MSISDN, country-code prefixed
    #[schema(example = "254712345678")]
    pub phone: String,
    /// Amount in cents (whole shillings only)
    #[schema(example = 5000)]
    pub amount: i64,
    pub listing_id: ListingId,
}

/// Response after a charge has been handed to the provider.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FeaturePaymentResponse {
    pub correlation_ref: CorrelationRef,
    pub status: PaymentStatus,
    #[schema(example = "Payment request sent, check your phone.")]
    pub message: String,
}

/// Result of an on-demand expiry sweep.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SweepResponse {
    /// Requests moved from PENDING to EXPIRED
    pub expired: usize,
}

/// Acknowledgment returned to the provider for every callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct CallbackAck {
    #[schema(example = 0)]
    pub result_code: i32,
    #[schema(example = "Accepted")]
    pub result_desc: String,
}

impl CallbackAck {
    pub fn accepted() -> Self {
        Self {
            result_code: 0,
            result_desc: "Accepted".into(),
        }
    }
}
