//! # Listings Client SDK
//!
//! A typed Rust client for the listings directory API.

use listings_types::{
    CorrelationRef, CreateListingRequest, FeatureListingRequest, FeaturePaymentResponse, ListingId,
    ListingResponse, PaymentRequest, SweepResponse,
};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Listings API client.
pub struct ListingsClient {
    base_url: String,
    admin_key: Option<String>,
    http: Client,
}

impl ListingsClient {
    /// Creates a new client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            admin_key: None,
            http: Client::new(),
        }
    }

    /// Sets the admin token sent as a Bearer credential.
    pub fn with_admin_key(mut self, admin_key: impl Into<String>) -> Self {
        self.admin_key = Some(admin_key.into());
        self
    }

    /// Checks if the API is healthy.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let resp = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        Ok(resp.status().is_success())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Listings
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn create_listing(
        &self,
        req: &CreateListingRequest,
    ) -> Result<ListingResponse, ClientError> {
        self.send(self.http.post(self.url("/api/listings")).json(req))
            .await
    }

    pub async fn get_listing(&self, id: ListingId) -> Result<ListingResponse, ClientError> {
        self.send(self.http.get(self.url(&format!("/api/listings/{}", id))))
            .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Admin
    // ─────────────────────────────────────────────────────────────────────────

    /// Sends a "pay to feature" charge to the payer's phone.
    pub async fn feature_listing(
        &self,
        listing_id: ListingId,
        phone: &str,
        amount_minor_units: i64,
    ) -> Result<FeaturePaymentResponse, ClientError> {
        let req = FeatureListingRequest {
            phone: phone.to_string(),
            amount: amount_minor_units,
            listing_id,
        };
        self.send(self.admin(self.http.post(self.url("/api/admin/payments/feature")).json(&req)))
            .await
    }

    pub async fn get_payment(
        &self,
        correlation_ref: &CorrelationRef,
    ) -> Result<PaymentRequest, ClientError> {
        let path = format!("/api/admin/payments/{}", correlation_ref);
        self.send(self.admin(self.http.get(self.url(&path)))).await
    }

    pub async fn list_listing_payments(
        &self,
        listing_id: ListingId,
    ) -> Result<Vec<PaymentRequest>, ClientError> {
        let path = format!("/api/admin/listings/{}/payments", listing_id);
        self.send(self.admin(self.http.get(self.url(&path)))).await
    }

    pub async fn toggle_verified(
        &self,
        listing_id: ListingId,
    ) -> Result<ListingResponse, ClientError> {
        let path = format!("/api/admin/listings/{}/verify", listing_id);
        self.send(self.admin(self.http.put(self.url(&path)))).await
    }

    /// Expires stale PENDING requests now; returns how many moved.
    pub async fn sweep(&self) -> Result<usize, ClientError> {
        let resp: SweepResponse = self
            .send(self.admin(self.http.post(self.url("/api/admin/payments/sweep"))))
            .await?;
        Ok(resp.expired)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn admin(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.admin_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        let resp = req.send().await?;
        self.handle_response(resp).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            Ok(serde_json::from_str(&body)?)
        } else {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
                .unwrap_or(body);
            Err(ClientError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}
