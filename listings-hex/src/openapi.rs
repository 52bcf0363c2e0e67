//! OpenAPI specification and documentation.

#![allow(dead_code)] // Path functions are only used by utoipa for documentation generation

use listings_types::domain::{CorrelationRef, Listing, ListingId, PaymentRequest, PaymentStatus};
use listings_types::dto::{
    CallbackAck, CreateListingRequest, FeatureListingRequest, FeaturePaymentResponse,
    ListingResponse, SweepResponse,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};

// Documentation-only stand-ins for the real handlers

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = inline(serde_json::Value), example = json!({"status": "healthy"}))
    )
)]
async fn health() {}

/// List a business in the directory
#[utoipa::path(
    post,
    path = "/api/listings",
    tag = "listings",
    request_body = CreateListingRequest,
    responses(
        (status = 201, description = "Listing created", body = ListingResponse),
        (status = 400, description = "Missing business name, category or city")
    )
)]
async fn create_listing() {}

/// Get listing by ID
#[utoipa::path(
    get,
    path = "/api/listings/{id}",
    tag = "listings",
    params(
        ("id" = String, Path, description = "Listing ID (UUID)")
    ),
    responses(
        (status = 200, description = "Listing found", body = ListingResponse),
        (status = 404, description = "Listing not found")
    )
)]
async fn get_listing() {}

/// M-Pesa STK push result callback
#[utoipa::path(
    post,
    path = "/api/mpesa/callback",
    tag = "mpesa",
    request_body(content = inline(serde_json::Value), description = "Daraja stkCallback envelope"),
    responses(
        (status = 200, description = "Always acknowledged", body = CallbackAck)
    )
)]
async fn mpesa_callback() {}

/// Charge a payer to feature a listing
#[utoipa::path(
    post,
    path = "/api/admin/payments/feature",
    tag = "admin",
    request_body = FeatureListingRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 202, description = "Charge sent to the payer's phone", body = FeaturePaymentResponse),
        (status = 400, description = "Invalid phone number or amount"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Listing not found"),
        (status = 500, description = "Provider rejected our credentials"),
        (status = 502, description = "Payment request failed"),
        (status = 503, description = "Payment provider unavailable")
    )
)]
async fn feature_listing() {}

/// Get a payment request by correlation reference
#[utoipa::path(
    get,
    path = "/api/admin/payments/{reference}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("reference" = String, Path, description = "Correlation reference, R-<listing>-<n>")
    ),
    responses(
        (status = 200, description = "Payment request", body = PaymentRequest),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Unknown reference")
    )
)]
async fn get_payment() {}

/// Payment history for a listing
#[utoipa::path(
    get,
    path = "/api/admin/listings/{id}/payments",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Listing ID (UUID)")
    ),
    responses(
        (status = 200, description = "Payment requests, newest first", body = Vec<PaymentRequest>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Listing not found")
    )
)]
async fn list_listing_payments() {}

/// Toggle a listing's verified badge
#[utoipa::path(
    put,
    path = "/api/admin/listings/{id}/verify",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Listing ID (UUID)")
    ),
    responses(
        (status = 200, description = "Updated listing", body = ListingResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Listing not found")
    )
)]
async fn toggle_verified() {}

/// Expire stale PENDING requests now
#[utoipa::path(
    post,
    path = "/api/admin/payments/sweep",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Number of requests expired", body = SweepResponse),
        (status = 401, description = "Unauthorized")
    )
)]
async fn sweep_expired() {}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Listings Directory API",
        version = "0.1.0",
        description = "Local services directory with M-Pesa paid featuring"
    ),
    paths(
        health,
        create_listing,
        get_listing,
        mpesa_callback,
        feature_listing,
        get_payment,
        list_listing_payments,
        toggle_verified,
        sweep_expired,
    ),
    components(
        schemas(
            Listing,
            ListingResponse,
            ListingId,
            CreateListingRequest,
            FeatureListingRequest,
            FeaturePaymentResponse,
            PaymentRequest,
            PaymentStatus,
            CorrelationRef,
            SweepResponse,
            CallbackAck,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "listings", description = "Public directory listings"),
        (name = "mpesa", description = "Payment provider callbacks"),
        (name = "admin", description = "Verification and paid featuring"),
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for Bearer token authentication.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_admin_routes_with_auth() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();

        assert!(doc["paths"]["/api/admin/payments/feature"]["post"].is_object());
        assert!(doc["paths"]["/api/mpesa/callback"]["post"].is_object());
        assert!(doc["components"]["securitySchemes"]["bearer_auth"].is_object());
    }
}
