//! Database row structs and their conversion to domain types.
//!
//! SQLite stores ids and timestamps as TEXT and booleans as INTEGER;
//! PostgreSQL uses native UUID, TIMESTAMPTZ and BOOLEAN columns.

use listings_types::{PaymentStatus, RepoError};

// ─────────────────────────────────────────────────────────────────────────────
// Parsing helpers
// ─────────────────────────────────────────────────────────────────────────────

pub fn parse_status(s: &str) -> Result<PaymentStatus, RepoError> {
    s.parse().map_err(RepoError::Database)
}

pub fn db_err(e: impl std::fmt::Display) -> RepoError {
    RepoError::Database(e.to_string())
}

/// Maps a unique-key violation to `Conflict`, anything else to `Database`.
pub fn insert_err(e: sqlx::Error, what: &str) -> RepoError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => {
            RepoError::Conflict(format!("{} already exists", what))
        }
        _ => db_err(e),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SQLite rows
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(feature = "sqlite")]
pub mod sqlite {
    use chrono::{DateTime, SecondsFormat, Utc};
    use sqlx::FromRow;

    use listings_types::{CorrelationRef, Listing, ListingId, PaymentRequest, RepoError};

    use super::{db_err, parse_status};

    /// Fixed-width RFC 3339 so TEXT comparison orders like time.
    pub fn ts(dt: DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn parse_ts(s: &str) -> Result<DateTime<Utc>, RepoError> {
        Ok(DateTime::parse_from_rfc3339(s)
            .map_err(db_err)?
            .with_timezone(&Utc))
    }

    fn parse_listing_id(s: &str) -> Result<ListingId, RepoError> {
        s.parse().map_err(db_err)
    }

    /// Listing row.
    #[derive(FromRow)]
    pub struct DbListing {
        pub id: String,
        pub business_name: String,
        pub category: String,
        pub city: String,
        pub description: String,
        pub whatsapp: String,
        pub image_url: Option<String>,
        pub verified: i64,
        pub featured: i64,
        pub created_at: String,
    }

    impl DbListing {
        pub fn into_domain(self) -> Result<Listing, RepoError> {
            Ok(Listing {
                id: parse_listing_id(&self.id)?,
                business_name: self.business_name,
                category: self.category,
                city: self.city,
                description: self.description,
                whatsapp: self.whatsapp,
                image_url: self.image_url,
                verified: self.verified != 0,
                featured: self.featured != 0,
                created_at: parse_ts(&self.created_at)?,
            })
        }
    }

    /// Payment request row.
    #[derive(FromRow)]
    pub struct DbPaymentRequest {
        pub correlation_ref: String,
        pub listing_id: String,
        pub payer_phone: String,
        pub amount_minor_units: i64,
        pub status: String,
        pub checkout_request_id: Option<String>,
        pub result_code: Option<i64>,
        pub result_desc: Option<String>,
        pub receipt_number: Option<String>,
        pub created_at: String,
        pub resolved_at: Option<String>,
    }

    impl DbPaymentRequest {
        pub fn into_domain(self) -> Result<PaymentRequest, RepoError> {
            Ok(PaymentRequest {
                correlation_ref: CorrelationRef::from(self.correlation_ref),
                listing_id: parse_listing_id(&self.listing_id)?,
                payer_phone: self.payer_phone,
                amount_minor_units: self.amount_minor_units,
                status: parse_status(&self.status)?,
                checkout_request_id: self.checkout_request_id,
                result_code: self.result_code,
                result_desc: self.result_desc,
                receipt_number: self.receipt_number,
                created_at: parse_ts(&self.created_at)?,
                resolved_at: self.resolved_at.as_deref().map(parse_ts).transpose()?,
            })
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PostgreSQL rows
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(feature = "postgres")]
pub mod pg {
    use chrono::{DateTime, Utc};
    use sqlx::FromRow;
    use uuid::Uuid;

    use listings_types::{CorrelationRef, Listing, ListingId, PaymentRequest, RepoError};

    use super::parse_status;

    /// Listing row.
    #[derive(FromRow)]
    pub struct DbListing {
        pub id: Uuid,
        pub business_name: String,
        pub category: String,
        pub city: String,
        pub description: String,
        pub whatsapp: String,
        pub image_url: Option<String>,
        pub verified: bool,
        pub featured: bool,
        pub created_at: DateTime<Utc>,
    }

    impl DbListing {
        pub fn into_domain(self) -> Listing {
            Listing {
                id: ListingId::from_uuid(self.id),
                business_name: self.business_name,
                category: self.category,
                city: self.city,
                description: self.description,
                whatsapp: self.whatsapp,
                image_url: self.image_url,
                verified: self.verified,
                featured: self.featured,
                created_at: self.created_at,
            }
        }
    }

    /// Payment request row.
    #[derive(FromRow)]
    pub struct DbPaymentRequest {
        pub correlation_ref: String,
        pub listing_id: Uuid,
        pub payer_phone: String,
        pub amount_minor_units: i64,
        pub status: String,
        pub checkout_request_id: Option<String>,
        pub result_code: Option<i64>,
        pub result_desc: Option<String>,
        pub receipt_number: Option<String>,
        pub created_at: DateTime<Utc>,
        pub resolved_at: Option<DateTime<Utc>>,
    }

    impl DbPaymentRequest {
        pub fn into_domain(self) -> Result<PaymentRequest, RepoError> {
            Ok(PaymentRequest {
                correlation_ref: CorrelationRef::from(self.correlation_ref),
                listing_id: ListingId::from_uuid(self.listing_id),
                payer_phone: self.payer_phone,
                amount_minor_units: self.amount_minor_units,
                status: parse_status(&self.status)?,
                checkout_request_id: self.checkout_request_id,
                result_code: self.result_code,
                result_desc: self.result_desc,
                receipt_number: self.receipt_number,
                created_at: self.created_at,
                resolved_at: self.resolved_at,
            })
        }
    }
}
