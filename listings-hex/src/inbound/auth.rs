//! Admin token middleware.

use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use listings_types::PaymentGateway;

use super::handlers::AppState;
use crate::service::Store;

/// Hex-encoded SHA-256 of an admin key.
pub fn hash_admin_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

/// Extracts the token from the Authorization header.
/// Expected format: "Bearer <token>" or just "<token>"
fn extract_token(auth_header: Option<&str>) -> Option<&str> {
    let header = auth_header?;
    Some(header.strip_prefix("Bearer ").unwrap_or(header))
}

fn token_matches(presented: &str, expected_hash: &str) -> bool {
    hash_admin_key(presented)
        .as_bytes()
        .ct_eq(expected_hash.as_bytes())
        .into()
}

/// Rejects requests that do not carry the admin token.
///
/// Only the hash of the configured key is kept in memory and the comparison
/// runs in constant time.
pub async fn admin_auth_middleware<R: Store, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let token = match extract_token(auth_header) {
        Some(token) if !token.is_empty() => token,
        _ => return unauthorized_response("Missing or invalid Authorization header"),
    };

    if !token_matches(token, &state.admin_key_hash) {
        tracing::warn!(path = %request.uri().path(), "Rejected admin request with wrong token");
        return unauthorized_response("Invalid admin token");
    }

    next.run(request).await
}

fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": message,
            "code": 401
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_token_bearer() {
        assert_eq!(extract_token(Some("Bearer adm_123")), Some("adm_123"));
    }

    #[test]
    fn test_extract_token_raw() {
        assert_eq!(extract_token(Some("adm_123")), Some("adm_123"));
    }

    #[test]
    fn test_extract_token_none() {
        assert_eq!(extract_token(None), None);
    }

    #[test]
    fn test_hash_is_stable_hex() {
        let hash = hash_admin_key("adm_secret");

        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_admin_key("adm_secret"));
    }

    #[test]
    fn test_token_matches() {
        let stored = hash_admin_key("adm_secret");

        assert!(token_matches("adm_secret", &stored));
        assert!(!token_matches("adm_secreT", &stored));
        assert!(!token_matches("", &stored));
    }
}
