//! SQLite repository adapter.
#![allow(clippy::collapsible_if)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

use listings_types::{
    CorrelationRef, CorrelationStore, CreateListingRequest, DomainError, Listing, ListingId,
    ListingStore, PaymentRequest, PaymentStatus, RepoError, Resolution,
};

use crate::types::sqlite::{DbListing, DbPaymentRequest, ts};
use crate::types::{db_err, insert_err};

const LISTING_COLUMNS: &str = "id, business_name, category, city, description, whatsapp, image_url, verified, featured, created_at";

const PAYMENT_COLUMNS: &str = "correlation_ref, listing_id, payer_phone, amount_minor_units, status, checkout_request_id, result_code, result_desc, receipt_number, created_at, resolved_at";

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Repository
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite repository implementation.
pub struct SqliteRepo {
    pool: SqlitePool,
}

/// Executes SQL statements from a migration file, splitting by semicolons.
async fn execute_migration(pool: &SqlitePool, sql: &str, name: &str) -> anyhow::Result<()> {
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

async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    execute_migration(
        pool,
        include_str!("../migrations/0001_create_listings.sql"),
        "0001",
    )
    .await?;

    execute_migration(
        pool,
        include_str!("../migrations/0002_create_payment_requests.sql"),
        "0002",
    )
    .await?;

    Ok(())
}

impl SqliteRepo {
    /// Creates a new SQLite repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            let path = path.split('?').next().unwrap_or(path);
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to an in-memory database would otherwise see its own
        // empty database.
        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
        let max_connections = if in_memory { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Listing store
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl ListingStore for SqliteRepo {
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
               VALUES (?, ?, ?, ?, ?, ?, ?, 0, 0, ?)"#,
        )
        .bind(listing.id.to_string())
        .bind(&listing.business_name)
        .bind(&listing.category)
        .bind(&listing.city)
        .bind(&listing.description)
        .bind(&listing.whatsapp)
        .bind(&listing.image_url)
        .bind(ts(listing.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| insert_err(e, "Listing"))?;

        Ok(listing)
    }

    async fn get_listing(&self, id: ListingId) -> Result<Option<Listing>, RepoError> {
        let row: Option<DbListing> = sqlx::query_as(&format!(
            "SELECT {} FROM listings WHERE id = ?",
            LISTING_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(DbListing::into_domain).transpose()
    }

    async fn set_featured(&self, id: ListingId) -> Result<(), RepoError> {
        let result = sqlx::query(r#"UPDATE listings SET featured = 1 WHERE id = ?"#)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::ListingNotFound(id).into());
        }
        Ok(())
    }

    async fn toggle_verified(&self, id: ListingId) -> Result<Listing, RepoError> {
        let result = sqlx::query(r#"UPDATE listings SET verified = 1 - verified WHERE id = ?"#)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::ListingNotFound(id).into());
        }

        self.get_listing(id)
            .await?
            .ok_or_else(|| DomainError::ListingNotFound(id).into())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Correlation store
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl CorrelationStore for SqliteRepo {
    async fn create_payment_request(&self, req: &PaymentRequest) -> Result<(), RepoError> {
        sqlx::query(
            r#"INSERT INTO payment_requests (correlation_ref, listing_id, payer_phone, amount_minor_units, status, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(req.correlation_ref.as_str())
        .bind(req.listing_id.to_string())
        .bind(&req.payer_phone)
        .bind(req.amount_minor_units)
        .bind(req.status.to_string())
        .bind(ts(req.created_at))
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
            "SELECT {} FROM payment_requests WHERE correlation_ref = ?",
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
            "SELECT {} FROM payment_requests WHERE checkout_request_id = ?",
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
            r#"UPDATE payment_requests SET checkout_request_id = ? WHERE correlation_ref = ?"#,
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
               SET status = ?, resolved_at = ?, result_code = ?, result_desc = ?, receipt_number = ?
               WHERE correlation_ref = ? AND status = ?"#,
        )
        .bind(to.to_string())
        .bind(ts(Utc::now()))
        .bind(resolution.result_code)
        .bind(resolution.result_desc)
        .bind(resolution.receipt_number)
        .bind(correlation_ref.as_str())
        .bind(from.to_string())
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
            "SELECT {} FROM payment_requests WHERE status = 'PENDING' AND created_at < ? ORDER BY created_at ASC LIMIT ?",
            PAYMENT_COLUMNS
        ))
        .bind(ts(cutoff))
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
            "SELECT {} FROM payment_requests WHERE listing_id = ? ORDER BY created_at DESC",
            PAYMENT_COLUMNS
        ))
        .bind(listing_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(DbPaymentRequest::into_domain).collect()
    }
}
