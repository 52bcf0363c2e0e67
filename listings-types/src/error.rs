//! Error types for the directory service.

use crate::domain::ListingId;
use crate::ports::GatewayError;

/// Domain-level errors (business rule violations).
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Invalid phone number: {0} (expected 254XXXXXXXXX)")]
    InvalidPhone(String),

    #[error("Invalid amount: {0} (must be a positive whole number of shillings, in cents)")]
    InvalidAmount(i64),

    #[error("Listing not found: {0}")]
    ListingNotFound(ListingId),

    #[error("Malformed callback: {0}")]
    MalformedCallback(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Repository-level errors (data access failures).
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Application-level errors (for HTTP responses).
///
/// Maps cleanly to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The provider could not be reached; the admin may try again.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The provider refused the charge.
    #[error("Bad gateway: {0}")]
    BadGateway(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::ListingNotFound(id) => {
                AppError::NotFound(format!("Listing not found: {}", id))
            }
            DomainError::ValidationError(msg) => AppError::BadRequest(msg),
            e => AppError::BadRequest(e.to_string()),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Domain(e) => e.into(),
            RepoError::NotFound => AppError::NotFound("Resource not found".into()),
            RepoError::Database(e) => AppError::Internal(e),
            RepoError::Conflict(e) => AppError::BadRequest(e),
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Unavailable(_) => AppError::ServiceUnavailable(
                "Payment provider unavailable, please try again".into(),
            ),
            GatewayError::SubmissionFailed(_) => {
                AppError::BadGateway("Payment request failed".into())
            }
            GatewayError::Auth(msg) => {
                AppError::Internal(format!("Payment provider rejected credentials: {}", msg))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_errors_map_to_admin_messages() {
        assert!(matches!(
            AppError::from(GatewayError::Unavailable("timeout".into())),
            AppError::ServiceUnavailable(_)
        ));
        assert!(matches!(
            AppError::from(GatewayError::SubmissionFailed("HTTP 500".into())),
            AppError::BadGateway(msg) if msg == "Payment request failed"
        ));
        assert!(matches!(
            AppError::from(GatewayError::Auth("401".into())),
            AppError::Internal(_)
        ));
    }

    #[test]
    fn test_listing_not_found_maps_to_404() {
        let err = RepoError::Domain(DomainError::ListingNotFound(ListingId::new()));
        assert!(matches!(AppError::from(err), AppError::NotFound(_)));
    }
}
