//! # Sequence Repository
//!
//! Atomic counters behind prefixed identifiers and daily invoice numbers.
//!
//! ## Allocation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    INSERT INTO id_sequences (entity, last_value)                        │
//! │    VALUES ('HTJ', <max existing suffix in sales_headers> + 1)           │
//! │    ON CONFLICT (entity) DO UPDATE SET last_value = last_value + 1       │
//! │    RETURNING last_value                         ──►  7  ──►  HTJ000007  │
//! │                                                                         │
//! │    INSERT INTO sales_headers (id, ...) VALUES ('HTJ000007', ...)        │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The counter bump and the insert it names share one transaction, so two
//! concurrent writers never see the same value, and a rolled-back workflow
//! gives its number back. The first allocation for an entity seeds the
//! counter from rows already in the table.

use chrono::{Local, NaiveDate};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use warung_core::ids::EntityKind;
use warung_core::invoice::{day_key, format_invoice, INVOICE_PREFIX};

/// Table holding the rows identified by `kind`.
pub(crate) fn table_for(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Product => "products",
        EntityKind::Category => "categories",
        EntityKind::Stock => "stock_entries",
        EntityKind::Supplier => "suppliers",
        EntityKind::User => "users",
        EntityKind::PurchaseHeader => "purchase_headers",
        EntityKind::PurchaseDetail => "purchase_details",
        EntityKind::SalesHeader => "sales_headers",
        EntityKind::SalesDetail => "sales_details",
    }
}

/// The server's calendar day, which scopes invoice numbers.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Allocates the next identifier for `kind` on `conn`.
pub(crate) async fn allocate_id(conn: &mut SqliteConnection, kind: EntityKind) -> DbResult<String> {
    let prefix = kind.prefix();
    let sql = format!(
        r#"
        INSERT INTO id_sequences (entity, last_value)
        VALUES (
            ?1,
            COALESCE(
                (SELECT MAX(CAST(SUBSTR(id, ?2) AS INTEGER)) FROM {table} WHERE id LIKE ?1 || '%'),
                0
            ) + 1
        )
        ON CONFLICT (entity) DO UPDATE SET last_value = last_value + 1
        RETURNING last_value
        "#,
        table = table_for(kind)
    );

    let seq: i64 = sqlx::query_scalar(&sql)
        .bind(prefix)
        .bind(prefix.len() as i64 + 1)
        .fetch_one(&mut *conn)
        .await?;

    let id = kind.format(seq as u64);
    debug!(entity = %prefix, id = %id, "Allocated identifier");
    Ok(id)
}

/// Allocates the next invoice number of `date` on `conn`.
pub(crate) async fn allocate_invoice(conn: &mut SqliteConnection, date: NaiveDate) -> DbResult<String> {
    let day = day_key(date);
    let pattern = format!("{}/{}/%", INVOICE_PREFIX, day);
    // "INV/YYYYMMDD/" is followed by the sequence
    let suffix_start = pattern.len() as i64;

    let seq: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO invoice_sequences (day, last_value)
        VALUES (
            ?1,
            COALESCE(
                (SELECT MAX(CAST(SUBSTR(invoice_number, ?3) AS INTEGER))
                 FROM sales_headers WHERE invoice_number LIKE ?2),
                0
            ) + 1
        )
        ON CONFLICT (day) DO UPDATE SET last_value = last_value + 1
        RETURNING last_value
        "#,
    )
    .bind(&day)
    .bind(&pattern)
    .bind(suffix_start)
    .fetch_one(&mut *conn)
    .await?;

    let invoice = format_invoice(date, seq as u64);
    debug!(invoice = %invoice, "Allocated invoice number");
    Ok(invoice)
}

/// Repository for the counters, outside of a workflow transaction.
#[derive(Debug, Clone)]
pub struct SequenceRepository {
    pool: SqlitePool,
}

impl SequenceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SequenceRepository { pool }
    }

    /// Reserves the next identifier for `kind` in its own transaction.
    pub async fn next_id(&self, kind: EntityKind) -> DbResult<String> {
        let mut tx = self.pool.begin().await?;
        let id = allocate_id(&mut tx, kind).await?;
        tx.commit().await?;
        Ok(id)
    }

    /// Reserves the next invoice number of `date` in its own transaction.
    pub async fn next_invoice(&self, date: NaiveDate) -> DbResult<String> {
        let mut tx = self.pool.begin().await?;
        let invoice = allocate_invoice(&mut tx, date).await?;
        tx.commit().await?;
        Ok(invoice)
    }

    /// The invoice number the next sale of `date` would get, without
    /// reserving it.
    pub async fn peek_next_invoice(&self, date: NaiveDate) -> DbResult<String> {
        let day = day_key(date);
        let pattern = format!("{}/{}/%", INVOICE_PREFIX, day);

        let seq: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(
                (SELECT last_value FROM invoice_sequences WHERE day = ?1),
                (SELECT MAX(CAST(SUBSTR(invoice_number, ?3) AS INTEGER))
                 FROM sales_headers WHERE invoice_number LIKE ?2),
                0
            ) + 1
            "#,
        )
        .bind(&day)
        .bind(&pattern)
        .bind(pattern.len() as i64)
        .fetch_one(&self.pool)
        .await?;

        Ok(format_invoice(date, seq as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    #[tokio::test]
    async fn test_identifiers_are_sequential_and_formatted() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let seq = db.sequences();

        for n in 1..=5u64 {
            assert_eq!(seq.next_id(EntityKind::Product).await.unwrap(), EntityKind::Product.format(n));
        }
        assert_eq!(seq.next_id(EntityKind::SalesHeader).await.unwrap(), "HTJ000001");
        assert_eq!(seq.next_id(EntityKind::SalesHeader).await.unwrap(), "HTJ000002");
        assert_eq!(seq.next_id(EntityKind::Product).await.unwrap(), "PRO006");
    }

    #[tokio::test]
    async fn test_counter_seeds_from_existing_rows() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        sqlx::query("INSERT INTO categories (id, name, is_active) VALUES ('KAT041', 'Lama', 1)")
            .execute(db.pool())
            .await
            .unwrap();

        let seq = db.sequences();
        assert_eq!(seq.next_id(EntityKind::Category).await.unwrap(), "KAT042");
        assert_eq!(seq.next_id(EntityKind::Category).await.unwrap(), "KAT043");
    }

    #[tokio::test]
    async fn test_rolled_back_allocation_is_reused() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        {
            let mut tx = db.pool().begin().await.unwrap();
            let id = allocate_id(&mut tx, EntityKind::Supplier).await.unwrap();
            assert_eq!(id, "SUP001");
            tx.rollback().await.unwrap();
        }

        assert_eq!(db.sequences().next_id(EntityKind::Supplier).await.unwrap(), "SUP001");
    }

    #[tokio::test]
    async fn test_invoice_sequence_is_scoped_to_the_day() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let seq = db.sequences();

        assert_eq!(seq.next_invoice(day(30)).await.unwrap(), "INV/20260130/000001");
        assert_eq!(seq.next_invoice(day(30)).await.unwrap(), "INV/20260130/000002");
        assert_eq!(seq.next_invoice(day(31)).await.unwrap(), "INV/20260131/000001");
    }

    #[tokio::test]
    async fn test_peek_does_not_reserve() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let seq = db.sequences();

        assert_eq!(seq.peek_next_invoice(day(31)).await.unwrap(), "INV/20260131/000001");
        assert_eq!(seq.peek_next_invoice(day(31)).await.unwrap(), "INV/20260131/000001");

        seq.next_invoice(day(31)).await.unwrap();
        assert_eq!(seq.peek_next_invoice(day(31)).await.unwrap(), "INV/20260131/000002");
        assert_eq!(seq.next_invoice(day(31)).await.unwrap(), "INV/20260131/000002");
    }
}
