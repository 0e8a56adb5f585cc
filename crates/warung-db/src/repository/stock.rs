//! # Stock Repository
//!
//! The stock ledger: quantity and price per (product, unit).
//!
//! ## Ledger Movements
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Purchase receipt ──► increment(P, U, n, price)                         │
//! │                       └── creates the entry if (P, U) has none          │
//! │                                                                         │
//! │  Sale ──────────────► decrement(P, U, ceil(qty))                        │
//! │                       └── UPDATE … WHERE quantity >= n                  │
//! │                           0 rows → InsufficientStock, nothing changed   │
//! │                                                                         │
//! │  Unit conversion ───► transfer(P, box → pcs, 1 → 12)                    │
//! │                       └── decrement + increment in one transaction      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The decrement is a single conditional UPDATE, so a concurrent sale can
//! never push a quantity below zero.

use chrono::Utc;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::product::ensure_active_product;
use crate::repository::sequence::allocate_id;
use warung_core::ids::EntityKind;
use warung_core::validation::{validate_amount, validate_transfer, validate_unit, validate_units};
use warung_core::{CoreError, NewStockEntry, Shortfall, StockEntry, StockTransfer, ValidationError};

const STOCK_COLUMNS: &str = "id, product_id, unit, quantity, unit_price, is_active, updated_at";

// =============================================================================
// Connection-level operations (compose inside a workflow transaction)
// =============================================================================

/// The live entry for (product, unit), if any.
pub(crate) async fn find_active(
    conn: &mut SqliteConnection,
    product_id: &str,
    unit: &str,
) -> DbResult<Option<StockEntry>> {
    let (product_id, unit) = (product_id.trim(), unit.trim());
    let sql = format!(
        "SELECT {STOCK_COLUMNS} FROM stock_entries WHERE product_id = ?1 AND unit = ?2 AND is_active = 1"
    );
    let entry = sqlx::query_as::<_, StockEntry>(&sql)
        .bind(product_id)
        .bind(unit)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(entry)
}

/// Adds `amount` to (product, unit), creating the entry with `unit_price`
/// when there is none.
pub(crate) async fn increment_in(
    conn: &mut SqliteConnection,
    product_id: &str,
    unit: &str,
    amount: i64,
    unit_price: i64,
) -> DbResult<StockEntry> {
    let (product_id, unit) = (product_id.trim(), unit.trim());
    let now = Utc::now();

    let sql = format!(
        r#"
        UPDATE stock_entries
        SET quantity = quantity + ?3, updated_at = ?4
        WHERE product_id = ?1 AND unit = ?2 AND is_active = 1
        RETURNING {STOCK_COLUMNS}
        "#
    );
    let updated = sqlx::query_as::<_, StockEntry>(&sql)
        .bind(product_id)
        .bind(unit)
        .bind(amount)
        .bind(now)
        .fetch_optional(&mut *conn)
        .await?;

    if let Some(entry) = updated {
        debug!(product_id = %product_id, unit = %unit, amount, quantity = entry.quantity, "Stock incremented");
        return Ok(entry);
    }

    let id = allocate_id(&mut *conn, EntityKind::Stock).await?;
    let entry = insert_entry(&mut *conn, &id, product_id, unit, amount, unit_price).await?;
    info!(id = %id, product_id = %product_id, unit = %unit, quantity = amount, "Stock entry created");
    Ok(entry)
}

/// Removes `amount` from (product, unit).
///
/// ## Errors
/// `InsufficientStock` with the single shortfall when the entry is missing
/// or holds less than `amount`. The quantity is left unchanged.
pub(crate) async fn decrement_in(
    conn: &mut SqliteConnection,
    product_id: &str,
    unit: &str,
    amount: i64,
) -> DbResult<()> {
    let (product_id, unit) = (product_id.trim(), unit.trim());
    if amount == 0 {
        return Ok(());
    }
    if amount < 0 {
        return Err(ValidationError::MustBePositive {
            field: "jumlah".to_string(),
        }
        .into());
    }

    let result = sqlx::query(
        r#"
        UPDATE stock_entries
        SET quantity = quantity - ?3, updated_at = ?4
        WHERE product_id = ?1 AND unit = ?2 AND is_active = 1 AND quantity >= ?3
        "#,
    )
    .bind(product_id)
    .bind(unit)
    .bind(amount)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let available = find_active(&mut *conn, product_id, unit)
            .await?
            .map(|entry| entry.quantity)
            .unwrap_or(0);
        debug!(product_id = %product_id, unit = %unit, available, requested = amount, "Insufficient stock");
        return Err(CoreError::insufficient(Shortfall::new(product_id, unit, available, amount)).into());
    }

    debug!(product_id = %product_id, unit = %unit, amount, "Stock decremented");
    Ok(())
}

async fn insert_entry(
    conn: &mut SqliteConnection,
    id: &str,
    product_id: &str,
    unit: &str,
    quantity: i64,
    unit_price: i64,
) -> DbResult<StockEntry> {
    let (product_id, unit) = (product_id.trim(), unit.trim());
    let sql = format!(
        r#"
        INSERT INTO stock_entries (id, product_id, unit, quantity, unit_price, is_active, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)
        RETURNING {STOCK_COLUMNS}
        "#
    );
    let entry = sqlx::query_as::<_, StockEntry>(&sql)
        .bind(id)
        .bind(product_id)
        .bind(unit)
        .bind(quantity)
        .bind(unit_price)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;
    Ok(entry)
}

// =============================================================================
// Repository
// =============================================================================

/// Both sides of a unit conversion after it was applied.
#[derive(Debug, Clone, Serialize)]
pub struct TransferOutcome {
    #[serde(rename = "asal")]
    pub from: StockEntry,
    #[serde(rename = "tujuan")]
    pub to: StockEntry,
}

/// Repository for the stock ledger.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Live entries, optionally for one product.
    pub async fn list(&self, product_id: Option<&str>) -> DbResult<Vec<StockEntry>> {
        let sql = format!(
            r#"
            SELECT {STOCK_COLUMNS} FROM stock_entries
            WHERE is_active = 1 AND (?1 IS NULL OR product_id = ?1)
            ORDER BY product_id, unit
            "#
        );
        let entries = sqlx::query_as::<_, StockEntry>(&sql)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(entries)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<StockEntry>> {
        let sql = format!("SELECT {STOCK_COLUMNS} FROM stock_entries WHERE id = ?1 AND is_active = 1");
        let entry = sqlx::query_as::<_, StockEntry>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(entry)
    }

    /// The live entry for (product, unit).
    pub async fn find(&self, product_id: &str, unit: &str) -> DbResult<Option<StockEntry>> {
        let mut conn = self.pool.acquire().await?;
        find_active(&mut conn, product_id, unit).await
    }

    /// Creates the entry for a (product, unit) that has none.
    ///
    /// ## Errors
    /// - `NotFound` if the product doesn't exist or was deleted
    /// - `UniqueViolation` if a live entry for (product, unit) exists
    pub async fn create(&self, input: &NewStockEntry) -> DbResult<StockEntry> {
        validate_unit(&input.unit)?;
        validate_amount("harga", input.unit_price)?;
        let quantity = input.quantity.unwrap_or(0);
        validate_amount("jumlah", quantity)?;

        let (product_id, unit) = (input.product_id.trim(), input.unit.trim());

        let mut tx = self.pool.begin().await?;

        ensure_active_product(&mut tx, product_id).await?;

        if find_active(&mut tx, product_id, unit).await?.is_some() {
            return Err(DbError::duplicate("stok", format!("{product_id}/{unit}")));
        }

        let id = allocate_id(&mut tx, EntityKind::Stock).await?;
        let entry = insert_entry(&mut tx, &id, product_id, unit, quantity, input.unit_price).await?;

        tx.commit().await?;

        info!(id = %entry.id, product_id = %entry.product_id, unit = %entry.unit, "Stock entry created");
        Ok(entry)
    }

    /// Sets the unit price of an entry.
    pub async fn update_price(&self, id: &str, unit_price: i64) -> DbResult<StockEntry> {
        validate_amount("harga", unit_price)?;
        debug!(id = %id, unit_price, "Updating stock price");

        let sql = format!(
            r#"
            UPDATE stock_entries SET unit_price = ?2, updated_at = ?3
            WHERE id = ?1 AND is_active = 1
            RETURNING {STOCK_COLUMNS}
            "#
        );
        sqlx::query_as::<_, StockEntry>(&sql)
            .bind(id)
            .bind(unit_price)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("StockEntry", id))
    }

    /// Soft-deletes an entry.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting stock entry");

        let result = sqlx::query(
            "UPDATE stock_entries SET is_active = 0, updated_at = ?2 WHERE id = ?1 AND is_active = 1",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("StockEntry", id));
        }
        Ok(())
    }

    /// Adds stock, creating the entry at `unit_price` if needed.
    pub async fn increment(
        &self,
        product_id: &str,
        unit: &str,
        amount: i64,
        unit_price: i64,
    ) -> DbResult<StockEntry> {
        validate_unit(unit)?;
        validate_units("jumlah", amount)?;

        let mut tx = self.pool.begin().await?;
        ensure_active_product(&mut tx, product_id).await?;
        let entry = increment_in(&mut tx, product_id, unit, amount, unit_price).await?;
        tx.commit().await?;
        Ok(entry)
    }

    /// Removes stock; `InsufficientStock` leaves the quantity unchanged.
    pub async fn decrement(&self, product_id: &str, unit: &str, amount: i64) -> DbResult<()> {
        validate_units("jumlah", amount)?;

        let mut conn = self.pool.acquire().await?;
        decrement_in(&mut conn, product_id, unit, amount).await
    }

    /// Manual unit conversion in one transaction.
    ///
    /// The target entry is created when missing, priced at `to_unit_price`
    /// (default 0). Prices are never derived from the source.
    pub async fn transfer(&self, transfer: &StockTransfer) -> DbResult<TransferOutcome> {
        validate_transfer(transfer)?;

        info!(
            product_id = %transfer.product_id,
            from_unit = %transfer.from_unit,
            to_unit = %transfer.to_unit,
            from_amount = transfer.from_amount,
            to_amount = transfer.to_amount,
            "Converting stock units"
        );

        let mut tx = self.pool.begin().await?;

        ensure_active_product(&mut tx, &transfer.product_id).await?;
        decrement_in(&mut tx, &transfer.product_id, &transfer.from_unit, transfer.from_amount).await?;
        let to = increment_in(
            &mut tx,
            &transfer.product_id,
            &transfer.to_unit,
            transfer.to_amount,
            transfer.to_unit_price.unwrap_or(0),
        )
        .await?;
        let from = find_active(&mut tx, &transfer.product_id, &transfer.from_unit)
            .await?
            .ok_or_else(|| DbError::not_found("StockEntry", format!("{}/{}", transfer.product_id, transfer.from_unit)))?;

        tx.commit().await?;

        Ok(TransferOutcome { from, to })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
