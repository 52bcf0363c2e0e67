//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use utoipa::OpenApi;

use listings_types::{
    AppError, CallbackAck, CorrelationRef, CreateListingRequest, FeatureListingRequest, ListingId,
    ListingResponse, PaymentGateway, SweepResponse,
};

use crate::openapi::ApiDoc;
use crate::service::{FeaturedListingService, Store};

/// Application state shared across handlers.
pub struct AppState<R: Store, G: PaymentGateway> {
    pub service: Arc<FeaturedListingService<R, G>>,
    /// SHA-256 of the admin key, hex encoded.
    pub admin_key_hash: String,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({
            "error": message,
            "code": status.as_u16()
        });

        (status, Json(body)).into_response()
    }
}

fn parse_listing_id(raw: &str) -> Result<ListingId, ApiError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest("Invalid listing ID".into()).into())
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// Serves the OpenAPI document.
pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

// ─────────────────────────────────────────────────────────────────────────────
// Public listings
// ─────────────────────────────────────────────────────────────────────────────

#[tracing::instrument(skip(state, req), fields(business = %req.business_name))]
pub async fn create_listing<R: Store, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
    Json(req): Json<CreateListingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let listing = state.service.create_listing(req).await?;
    Ok((StatusCode::CREATED, Json(ListingResponse::from(listing))))
}

/// Get listing by ID.
#[tracing::instrument(skip(state), fields(listing_id = %id))]
pub async fn get_listing<R: Store, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let listing_id = parse_listing_id(&id)?;
    let listing = state.service.get_listing(listing_id).await?;
    Ok(Json(ListingResponse::from(listing)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Provider callback
// ─────────────────────────────────────────────────────────────────────────────

/// M-Pesa result callback.
///
/// Always answers 200 with an acknowledgment; the provider must never retry
/// because of how this service handled the body.
#[tracing::instrument(skip(state, body))]
pub async fn mpesa_callback<R: Store, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
    body: Bytes,
) -> Json<CallbackAck> {
    match state.service.handle_callback(&body).await {
        Ok(outcome) => tracing::info!(?outcome, "Callback processed"),
        Err(e) => tracing::warn!("Callback acknowledged without effect: {}", e),
    }
    Json(CallbackAck::accepted())
}

// ─────────────────────────────────────────────────────────────────────────────
// Admin
// ─────────────────────────────────────────────────────────────────────────────

/// Charge a payer to feature a listing.
#[tracing::instrument(skip(state, req), fields(listing_id = %req.listing_id, amount = req.amount))]
pub async fn feature_listing<R: Store, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
    Json(req): Json<FeatureListingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.service.initiate_feature_payment(req).await?;
    Ok((StatusCode::ACCEPTED, Json(response)))
}

#[tracing::instrument(skip(state), fields(correlation_ref = %reference))]
pub async fn get_payment<R: Store, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
    Path(reference): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let payment = state
        .service
        .get_payment_request(&CorrelationRef::from(reference))
        .await?;
    Ok(Json(payment))
}

/// Payment history for a listing.
#[tracing::instrument(skip(state), fields(listing_id = %id))]
pub async fn list_listing_payments<R: Store, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let listing_id = parse_listing_id(&id)?;
    let payments = state.service.list_payments_for_listing(listing_id).await?;
    Ok(Json(payments))
}

#[tracing::instrument(skip(state), fields(listing_id = %id))]
pub async fn toggle_verified<R: Store, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let listing_id = parse_listing_id(&id)?;
    let listing = state.service.toggle_verified(listing_id).await?;
    Ok(Json(ListingResponse::from(listing)))
}

/// Run an expiry sweep now.
#[tracing::instrument(skip(state))]
pub async fn sweep_expired<R: Store, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
) -> Result<impl IntoResponse, ApiError> {
    let expired = state.service.expire_stale_requests().await?;
    Ok(Json(SweepResponse { expired }))
}
