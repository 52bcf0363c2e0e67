//! PostgreSQL repository adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use listings_types::{
    CorrelationRef, CorrelationStore, CreateListingRequest, DomainError, Listing, ListingId,
    ListingStore, PaymentRequest, PaymentStatus, RepoError, Resolution,
};

use crate::types::pg::{DbListing, DbPaymentRequest};
use crate::types::{db_err, insert_err};

const LISTING_COLUMNS: &str = "id, business_name, category, city, description, whatsapp, image_url, verified, featured, created_at";

const PAYMENT_COLUMNS: &str = "correlation_ref, listing_id, payer_phone, amount_minor_units, status, checkout_request_id, result_code, result_desc, receipt_number, created_at, resolved_at";

// ─────────────────────────────────────────────────────────────────────────────
// PostgreSQL Repository
// ─────────────────────────────────────────────────────────────────────────────

/// PostgreSQL repository. Status changes are single conditional updates.
pub struct PostgresRepo {
    pool: PgPool,
}

/// Executes SQL statements from a migration file, splitting by semicolons.
async fn execute_migration(pool: &PgPool, sql: &str, name: &str) -> Result<(), anyhow::Error> {
    for statement in sql.split(';') {
        let stmt = statement.trim();
        if !stmt.is_empty() {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .map_err(|e| anyhow::anyhow!("Migration {} failed: {}", name, e))?;
        }
    }
    Ok(())
}

/// Runs all database migrations.
async fn run_migrations(pool: &PgPool) -> Result<(), anyhow::Error> {
    execute_migration(
        pool,
        include_str!("../migrations/0001_create_listings_pg.sql"),
        "0001",
    )
    .await?;

    execute_migration(
        pool,
        include_str!("../migrations/0002_create_payment_requests_pg.sql"),
        "0002",
    )
    .await?;

    Ok(())
}

impl PostgresRepo {
    /// Creates a new PostgreSQL repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ListingStore for PostgresRepo {
    async fn create_listing(&self, req: CreateListingRequest) -> Result<Listing, RepoError> {
        let listing = Listing::new(
            req.business_name,
            req.category,
            req.city,
            req.description,
            req.whatsapp,
            req.image_url,
        )?;

        sqlx::query(
            r#"INSERT INTO listings (id, business_name, category, city, description, whatsapp, image_url, verified, featured, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, FALSE, FALSE, $8)"#,
        )
        .bind(listing.id.into_uuid())
        .bind(&listing.business_name)
        .bind(&listing.category)
        .bind(&listing.city)
        .bind(&listing.description)
        .bind(&listing.whatsapp)
        .bind(&listing.image_url)
        .bind(listing.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| insert_err(e, "Listing"))?;

        Ok(listing)
    }

    async fn get_listing(&self, id: ListingId) -> Result<Option<Listing>, RepoError> {
        let row: Option<DbListing> = sqlx::query_as(&format!(
            "SELECT {} FROM listings WHERE id = $1",
            LISTING_COLUMNS
        ))
        .bind(id.into_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(DbListing::into_domain))
    }

    async fn set_featured(&self, id: ListingId) -> Result<(), RepoError> {
        let result = sqlx::query(r#"UPDATE listings SET featured = TRUE WHERE id = $1"#)
            .bind(id.into_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::ListingNotFound(id).into());
        }
        Ok(())
    }

    async fn toggle_verified(&self, id: ListingId) -> Result<Listing, RepoError> {
        let row: Option<DbListing> = sqlx::query_as(&format!(
            "UPDATE listings SET verified = NOT verified WHERE id = $1 RETURNING {}",
            LISTING_COLUMNS
        ))
        .bind(id.into_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(DbListing::into_domain)
            .ok_or_else(|| DomainError::ListingNotFound(id).into())
    }
}

#[async_trait]
impl CorrelationStore for PostgresRepo {
    async fn create_payment_request(&self, req: &PaymentRequest) -> Result<(), RepoError> {
        sqlx::query(
            r#"INSERT INTO payment_requests (correlation_ref, listing_id, payer_phone, amount_minor_units, status, created_at)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(req.correlation_ref.as_str())
        .bind(req.listing_id.into_uuid())
        .bind(&req.payer_phone)
        .bind(req.amount_minor_units)
        .bind(req.status.as_ref())
        .bind(req.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| insert_err(e, "Correlation reference"))?;

        Ok(())
    }

    async fn find_by_ref(
        &self,
        correlation_ref: &CorrelationRef,
    ) -> Result<Option<PaymentRequest>, RepoError> {
        let row: Option<DbPaymentRequest> = sqlx::query_as(&format!(
            "SELECT {} FROM payment_requests WHERE correlation_ref = $1",
            PAYMENT_COLUMNS
        ))
        .bind(correlation_ref.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(DbPaymentRequest::into_domain).transpose()
    }

    async fn find_by_checkout_id(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<PaymentRequest>, RepoError> {
        let row: Option<DbPaymentRequest> = sqlx::query_as(&format!(
            "SELECT {} FROM payment_requests WHERE checkout_request_id = $1",
            PAYMENT_COLUMNS
        ))
        .bind(checkout_request_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(DbPaymentRequest::into_domain).transpose()
    }

    async fn record_checkout(
        &self,
        correlation_ref: &CorrelationRef,
        checkout_request_id: &str,
    ) -> Result<(), RepoError> {
        let result = sqlx::query(
            r#"UPDATE payment_requests SET checkout_request_id = $1 WHERE correlation_ref = $2"#,
        )
        .bind(checkout_request_id)
        .bind(correlation_ref.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| insert_err(e, "Checkout request id"))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn transition(
        &self,
        correlation_ref: &CorrelationRef,
        from: PaymentStatus,
        to: PaymentStatus,
        resolution: Resolution,
    ) -> Result<bool, RepoError> {
        if !from.can_transition_to(to) {
            return Err(RepoError::Conflict(format!(
                "Illegal transition {} -> {}",
                from, to
            )));
        }

        let result = sqlx::query(
            r#"UPDATE payment_requests
               SET status = $1, resolved_at = $2, result_code = $3, result_desc = $4, receipt_number = $5
               WHERE correlation_ref = $6 AND status = $7"#,
        )
        .bind(to.as_ref())
        .bind(Utc::now())
        .bind(resolution.result_code)
        .bind(resolution.result_desc)
        .bind(resolution.receipt_number)
        .bind(correlation_ref.as_str())
        .bind(from.as_ref())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_pending_before(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<PaymentRequest>, RepoError> {
        let rows: Vec<DbPaymentRequest> = sqlx::query_as(&format!(
            "SELECT {} FROM payment_requests WHERE status = 'PENDING' AND created_at < $1 ORDER BY created_at ASC LIMIT $2",
            PAYMENT_COLUMNS
        ))
        .bind(cutoff)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(DbPaymentRequest::into_domain).collect()
    }

    async fn list_for_listing(
        &self,
        listing_id: ListingId,
    ) -> Result<Vec<PaymentRequest>, RepoError> {
        let rows: Vec<DbPaymentRequest> = sqlx::query_as(&format!(
            "SELECT {} FROM payment_requests WHERE listing_id = $1 ORDER BY created_at DESC",
            PAYMENT_COLUMNS
        ))
        .bind(listing_id.into_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(DbPaymentRequest::into_domain).collect()
    }
}
