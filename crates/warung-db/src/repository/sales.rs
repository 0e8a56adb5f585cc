//! # Sales Repository
//!
//! The sales-transaction workflow: every stock movement a sale causes
//! happens in the same SQLite transaction as the rows that describe it.
//!
//! ## Create
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate lines (≥1, qty > 0, no repeated product/unit)                 │
//! │       │                                                                 │
//! │  BEGIN                                                                  │
//! │       │                                                                 │
//! │       ├── read every (product, unit) on hand                            │
//! │       ├── any short? ──► InsufficientStock [all short lines], ROLLBACK  │
//! │       │                                                                 │
//! │       ├── HTJ000007 + INV/20260131/000003, header status Pending        │
//! │       └── per line: DTJ id, insert, decrement ceil(qty)                 │
//! │                        └── conditional; short here ──► ROLLBACK         │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Update (reconciliation)
//! ```text
//!   stored lines             new lines              ledger
//!   PRO001/pcs 3.0  ───────► PRO001/pcs 8.0        -5   (ceil 8 - ceil 3)
//!   PRO002/box 1.0  ───────► (absent)              +1   row deleted
//!   (absent)        ───────► PRO003/kg  2.5        -3   row inserted
//! ```
//! Restores run first, then changed lines, then added lines. The first
//! line that would drive an entry below zero aborts the whole update.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::sequence::{allocate_id, allocate_invoice, local_today};
use crate::repository::stock::{decrement_in, find_active, increment_in};
use crate::repository::user::ensure_user;
use warung_core::ids::EntityKind;
use warung_core::stock::{collect_shortfalls, plan_reconciliation, required_units};
use warung_core::validation::{validate_new_sale, validate_sales_lines, validate_sales_patch};
use warung_core::{
    CoreError, LineKey, NewSale, NewSalesLine, SalesDetail, SalesFilter, SalesHeader, SalesStatus,
    SalesTransaction, SalesUpdate,
};

const HEADER_COLUMNS: &str = "id, buyer_user_id, seller_user_id, buyer_name, date, total, \
     payment_method, invoice_number, status, channel, created_at, updated_at";

const DETAIL_COLUMNS: &str = "id, header_id, product_id, unit, quantity, unit_price, subtotal";

// =============================================================================
// Row helpers
// =============================================================================

async fn fetch_header(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<SalesHeader>> {
    let sql = format!("SELECT {HEADER_COLUMNS} FROM sales_headers WHERE id = ?1");
    let header = sqlx::query_as::<_, SalesHeader>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(header)
}

async fn fetch_details(conn: &mut SqliteConnection, header_id: &str) -> DbResult<Vec<SalesDetail>> {
    let sql = format!("SELECT {DETAIL_COLUMNS} FROM sales_details WHERE header_id = ?1 ORDER BY id");
    let details = sqlx::query_as::<_, SalesDetail>(&sql)
        .bind(header_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(details)
}

async fn insert_detail(
    conn: &mut SqliteConnection,
    header_id: &str,
    line: &NewSalesLine,
) -> DbResult<SalesDetail> {
    let id = allocate_id(&mut *conn, EntityKind::SalesDetail).await?;

    let sql = format!(
        r#"
        INSERT INTO sales_details (id, header_id, product_id, unit, quantity, unit_price, subtotal)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        RETURNING {DETAIL_COLUMNS}
        "#
    );
    let detail = sqlx::query_as::<_, SalesDetail>(&sql)
        .bind(&id)
        .bind(header_id)
        .bind(line.product_id.trim())
        .bind(line.unit.trim())
        .bind(line.quantity)
        .bind(line.unit_price)
        .bind(line.subtotal())
        .fetch_one(&mut *conn)
        .await?;
    Ok(detail)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for sales transactions.
#[derive(Debug, Clone)]
pub struct SalesRepository {
    pool: SqlitePool,
}

impl SalesRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SalesRepository { pool }
    }

    /// Records a sale and deducts its stock, numbering the invoice with
    /// the server's current day.
    pub async fn create(&self, sale: &NewSale) -> DbResult<SalesTransaction> {
        self.create_on(sale, local_today()).await
    }

    /// Records a sale whose invoice number belongs to `invoice_day`.
    ///
    /// ## Errors
    /// - `Domain(Validation)` for malformed input
    /// - `Domain(InsufficientStock)` listing every short line
    /// - `NotFound` for an unknown buyer or seller user
    ///
    /// On any error nothing is written and no number is consumed.
    pub async fn create_on(&self, sale: &NewSale, invoice_day: NaiveDate) -> DbResult<SalesTransaction> {
        validate_new_sale(sale)?;

        let mut tx = self.pool.begin().await?;

        if let Some(seller) = &sale.seller_user_id {
            ensure_user(&mut tx, seller).await?;
        }
        if let Some(buyer) = &sale.buyer_user_id {
            ensure_user(&mut tx, buyer).await?;
        }

        let mut on_hand: HashMap<LineKey, Option<i64>> = HashMap::with_capacity(sale.lines.len());
        for line in &sale.lines {
            let key = LineKey::of_line(line);
            let quantity = find_active(&mut tx, &key.product_id, &key.unit)
                .await?
                .map(|entry| entry.quantity);
            on_hand.insert(key, quantity);
        }

        let shortfalls = collect_shortfalls(&sale.lines, |key| on_hand.get(key).copied().flatten());
        if !shortfalls.is_empty() {
            warn!(buyer = %sale.buyer_name, short_lines = shortfalls.len(), "Sale rejected: insufficient stock");
            return Err(CoreError::InsufficientStock { shortfalls }.into());
        }

        let id = allocate_id(&mut tx, EntityKind::SalesHeader).await?;
        let invoice = allocate_invoice(&mut tx, invoice_day).await?;
        let now = Utc::now();

        let sql = format!(
            r#"
            INSERT INTO sales_headers (
                id, buyer_user_id, seller_user_id, buyer_name, date, total,
                payment_method, invoice_number, status, channel, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
            RETURNING {HEADER_COLUMNS}
            "#
        );
        let header = sqlx::query_as::<_, SalesHeader>(&sql)
            .bind(&id)
            .bind(&sale.buyer_user_id)
            .bind(&sale.seller_user_id)
            .bind(sale.buyer_name.trim())
            .bind(sale.date)
            .bind(sale.total_or_sum())
            .bind(sale.payment_method.trim())
            .bind(&invoice)
            .bind(SalesStatus::Pending)
            .bind(sale.channel)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

        let mut details = Vec::with_capacity(sale.lines.len());
        for line in &sale.lines {
            let detail = insert_detail(&mut tx, &header.id, line).await?;
            decrement_in(&mut tx, &line.product_id, &line.unit, required_units(line.quantity)).await?;
            details.push(detail);
        }

        tx.commit().await?;

        info!(
            id = %header.id,
            invoice = %header.invoice_number,
            lines = details.len(),
            total = header.total,
            "Sales transaction created"
        );

        Ok(SalesTransaction { header, details })
    }

    /// Replaces the lines of a sale and applies the provided header fields,
    /// moving stock by the difference.
    ///
    /// ## Errors
    /// - `NotFound` when the sale doesn't exist
    /// - `Domain(Validation)` for malformed input or repeated lines
    /// - `Domain(InsufficientStock)` for the first line that can't be covered
    /// - `Domain(InvalidSalesStatus)` when asked to move a paid sale back
    ///   to `Pending`
    ///
    /// Any error rolls back every change of the call.
    pub async fn update(&self, id: &str, update: &SalesUpdate) -> DbResult<SalesTransaction> {
        validate_sales_patch(&update.header)?;
        validate_sales_lines(&update.lines)?;

        let mut tx = self.pool.begin().await?;

        let current = fetch_header(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("SalesTransaction", id))?;

        let patch = &update.header;
        // paid is final; only mark_paid moves the status forward
        if current.status == SalesStatus::Lunas && patch.status == Some(SalesStatus::Pending) {
            return Err(CoreError::InvalidSalesStatus {
                id: id.to_string(),
                status: current.status.to_string(),
            }
            .into());
        }
        if let Some(seller) = &patch.seller_user_id {
            ensure_user(&mut tx, seller).await?;
        }
        if let Some(buyer) = &patch.buyer_user_id {
            ensure_user(&mut tx, buyer).await?;
        }

        let old = fetch_details(&mut tx, id).await?;
        let plan = plan_reconciliation(&old, &update.lines)?;

        debug!(
            id = %id,
            removed = plan.removed.len(),
            changed = plan.changed.len(),
            added = plan.added.len(),
            "Reconciling sales lines"
        );

        let total = patch
            .total
            .unwrap_or_else(|| update.lines.iter().map(NewSalesLine::subtotal).sum());

        sqlx::query(
            r#"
            UPDATE sales_headers SET
                buyer_user_id  = COALESCE(?2, buyer_user_id),
                seller_user_id = COALESCE(?3, seller_user_id),
                buyer_name     = COALESCE(?4, buyer_name),
                date           = COALESCE(?5, date),
                total          = ?6,
                payment_method = COALESCE(?7, payment_method),
                channel        = COALESCE(?8, channel),
                status         = COALESCE(?9, status),
                updated_at     = ?10
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&patch.buyer_user_id)
        .bind(&patch.seller_user_id)
        .bind(patch.buyer_name.as_deref().map(str::trim))
        .bind(patch.date)
        .bind(total)
        .bind(patch.payment_method.as_deref().map(str::trim))
        .bind(patch.channel)
        .bind(patch.status)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        let old_prices: HashMap<&str, i64> = old.iter().map(|d| (d.id.as_str(), d.unit_price)).collect();

        for removed in &plan.removed {
            let price = old_prices.get(removed.detail_id.as_str()).copied().unwrap_or(0);
            increment_in(&mut tx, &removed.key.product_id, &removed.key.unit, removed.restore, price).await?;

            sqlx::query("DELETE FROM sales_details WHERE id = ?1")
                .bind(&removed.detail_id)
                .execute(&mut *tx)
                .await?;
        }

        for changed in &plan.changed {
            let line = &changed.line;
            if changed.delta > 0 {
                decrement_in(&mut tx, &line.product_id, &line.unit, changed.delta).await?;
            } else if changed.delta < 0 {
                increment_in(&mut tx, &line.product_id, &line.unit, -changed.delta, line.unit_price).await?;
            }

            sqlx::query("UPDATE sales_details SET quantity = ?2, unit_price = ?3, subtotal = ?4 WHERE id = ?1")
                .bind(&changed.detail_id)
                .bind(line.quantity)
                .bind(line.unit_price)
                .bind(line.subtotal())
                .execute(&mut *tx)
                .await?;
        }

        for added in &plan.added {
            decrement_in(&mut tx, &added.line.product_id, &added.line.unit, added.required).await?;
            insert_detail(&mut tx, id, &added.line).await?;
        }

        let header = fetch_header(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("SalesTransaction", id))?;
        let details = fetch_details(&mut tx, id).await?;

        tx.commit().await?;

        info!(id = %id, lines = details.len(), total = header.total, "Sales transaction updated");
        Ok(SalesTransaction { header, details })
    }

    /// A sale with its lines.
    pub async fn get(&self, id: &str) -> DbResult<SalesTransaction> {
        let mut conn = self.pool.acquire().await?;

        let header = fetch_header(&mut conn, id)
            .await?
            .ok_or_else(|| DbError::not_found("SalesTransaction", id))?;
        let details = fetch_details(&mut conn, id).await?;

        Ok(SalesTransaction { header, details })
    }

    /// Sale headers matching the filter, newest first.
    pub async fn list(&self, filter: &SalesFilter) -> DbResult<Vec<SalesHeader>> {
        let sql = format!(
            r#"
            SELECT {HEADER_COLUMNS} FROM sales_headers
            WHERE (?1 IS NULL OR status = ?1)
              AND (?2 IS NULL OR date >= ?2)
              AND (?3 IS NULL OR date <= ?3)
              AND (?4 IS NULL OR seller_user_id = ?4)
            ORDER BY date DESC, id DESC
            "#
        );
        let headers = sqlx::query_as::<_, SalesHeader>(&sql)
            .bind(filter.status)
            .bind(filter.from)
            .bind(filter.to)
            .bind(filter.seller_user_id.as_deref())
            .fetch_all(&self.pool)
            .await?;
        Ok(headers)
    }

    /// Moves a sale from `Pending` to `Lunas`.
    pub async fn mark_paid(&self, id: &str) -> DbResult<SalesHeader> {
        let sql = format!(
            r#"
            UPDATE sales_headers SET status = ?2, updated_at = ?3
            WHERE id = ?1 AND status = ?4
            RETURNING {HEADER_COLUMNS}
            "#
        );
        let updated = sqlx::query_as::<_, SalesHeader>(&sql)
            .bind(id)
            .bind(SalesStatus::Lunas)
            .bind(Utc::now())
            .bind(SalesStatus::Pending)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(header) = updated {
            info!(id = %id, invoice = %header.invoice_number, "Sales transaction paid");
            return Ok(header);
        }

        let mut conn = self.pool.acquire().await?;
        match fetch_header(&mut conn, id).await? {
            Some(header) => Err(CoreError::InvalidSalesStatus {
                id: id.to_string(),
                status: header.status.to_string(),
            }
            .into()),
            None => Err(DbError::not_found("SalesTransaction", id)),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Database;
    use crate::repository::test_support::{add_seller, add_stock, db_with_products, quantity_of};
    use warung_core::invoice::day_key;
    use warung_core::{SalesChannel, SalesHeaderPatch, Shortfall, ValidationError};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 31).unwrap()
    }

    fn line(product: &str, unit: &str, qty: f64, price: i64) -> NewSalesLine {
        NewSalesLine {
            product_id: product.to_string(),
            unit: unit.to_string(),
            quantity: qty,
            unit_price: price,
            subtotal: None,
        }
    }

    fn sale(seller: Option<String>, lines: Vec<NewSalesLine>) -> NewSale {
        NewSale {
            buyer_user_id: None,
            seller_user_id: seller,
            buyer_name: "Budi".to_string(),
            date: day(),
            total: None,
            payment_method: "cash".to_string(),
            channel: SalesChannel::Toko,
            lines,
        }
    }

    fn update(lines: Vec<NewSalesLine>) -> SalesUpdate {
        SalesUpdate {
            header: SalesHeaderPatch::default(),
            lines,
        }
    }

    /// Two products with 10 pcs each at 10.000.
    async fn stocked() -> (Database, String, String) {
        let (db, products) = db_with_products(2).await;
        let p1 = products[0].id.clone();
        let p2 = products[1].id.clone();
        add_stock(&db, &p1, "pcs", 10, 10_000).await;
        add_stock(&db, &p2, "pcs", 10, 5_000).await;
        (db, p1, p2)
    }

    async fn header_count(db: &Database) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM sales_headers")
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_end_to_end() {
        let (db, p1, _) = stocked().await;
        let seller = add_seller(&db).await;

        let created = db
            .sales()
            .create(&sale(Some(seller.clone()), vec![line(&p1, "pcs", 3.0, 10_000)]))
            .await
            .unwrap();

        assert_eq!(created.header.id, "HTJ000001");
        assert_eq!(
            created.header.invoice_number,
            format!("INV/{}/000001", day_key(local_today()))
        );
        assert_eq!(created.header.status, SalesStatus::Pending);
        assert_eq!(created.header.total, 30_000);
        assert_eq!(created.header.seller_user_id.as_deref(), Some(seller.as_str()));
        assert_eq!(created.details.len(), 1);
        assert_eq!(created.details[0].id, "DTJ000001");
        assert_eq!(created.details[0].subtotal, 30_000);

        assert_eq!(quantity_of(&db, &p1, "pcs").await, Some(7));
    }

    #[tokio::test]
    async fn test_invoices_continue_within_the_day() {
        let (db, p1, p2) = stocked().await;

        let a = db.sales().create_on(&sale(None, vec![line(&p1, "pcs", 1.0, 10_000)]), day()).await.unwrap();
        let b = db.sales().create_on(&sale(None, vec![line(&p2, "pcs", 1.0, 5_000)]), day()).await.unwrap();

        assert_eq!(a.header.invoice_number, "INV/20260131/000001");
        assert_eq!(b.header.invoice_number, "INV/20260131/000002");
        assert_eq!(b.header.id, "HTJ000002");
    }

    #[tokio::test]
    async fn test_fractional_quantity_consumes_ceiling() {
        let (db, p1, _) = stocked().await;

        let created = db
            .sales()
            .create(&sale(None, vec![line(&p1, "pcs", 2.3, 10_000)]))
            .await
            .unwrap();

        assert_eq!(created.details[0].quantity, 2.3);
        assert_eq!(created.details[0].subtotal, 23_000);
        assert_eq!(quantity_of(&db, &p1, "pcs").await, Some(7));
    }

    #[tokio::test]
    async fn test_create_reports_every_short_line_and_writes_nothing() {
        let (db, p1, p2) = stocked().await;

        let err = db
            .sales()
            .create(&sale(
                None,
                vec![
                    line(&p1, "pcs", 11.0, 10_000),
                    line(&p2, "pcs", 2.0, 5_000),
                    line(&p2, "box", 1.0, 50_000),
                ],
            ))
            .await
            .unwrap_err();

        match err {
            DbError::Domain(CoreError::InsufficientStock { shortfalls }) => {
                assert_eq!(
                    shortfalls,
                    vec![
                        Shortfall::new(p1.as_str(), "pcs", 10, 11),
                        Shortfall::new(p2.as_str(), "box", 0, 1),
                    ]
                );
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        assert_eq!(header_count(&db).await, 0);
        assert_eq!(quantity_of(&db, &p1, "pcs").await, Some(10));
        assert_eq!(quantity_of(&db, &p2, "pcs").await, Some(10));

        // No number was consumed
        let ok = db.sales().create(&sale(None, vec![line(&p1, "pcs", 1.0, 10_000)])).await.unwrap();
        assert_eq!(ok.header.id, "HTJ000001");
    }

    #[tokio::test]
    async fn test_create_rolls_back_when_a_later_decrement_fails() {
        let (db, p1, p2) = stocked().await;

        // Simulates a concurrent sale draining the second line's stock
        // after pre-validation passed.
        sqlx::query(&format!(
            "CREATE TRIGGER drain AFTER INSERT ON sales_details \
             BEGIN UPDATE stock_entries SET quantity = 0 WHERE product_id = '{p2}'; END"
        ))
        .execute(db.pool())
        .await
        .unwrap();

        let err = db
            .sales()
            .create(&sale(
                None,
                vec![line(&p1, "pcs", 3.0, 10_000), line(&p2, "pcs", 2.0, 5_000)],
            ))
            .await
            .unwrap_err();
        assert!(err.is_insufficient_stock());

        assert_eq!(header_count(&db).await, 0);
        assert_eq!(quantity_of(&db, &p1, "pcs").await, Some(10));
        assert_eq!(quantity_of(&db, &p2, "pcs").await, Some(10));
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_seller_and_duplicate_lines() {
        let (db, p1, _) = stocked().await;

        let err = db
            .sales()
            .create(&sale(Some("USR404".to_string()), vec![line(&p1, "pcs", 1.0, 10_000)]))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { ref entity, .. } if entity == "User"));

        let err = db
            .sales()
            .create(&sale(
                None,
                vec![line(&p1, "pcs", 1.0, 10_000), line(&p1, "pcs", 2.0, 10_000)],
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
        assert_eq!(quantity_of(&db, &p1, "pcs").await, Some(10));
    }

    #[tokio::test]
    async fn test_update_with_identical_lines_leaves_stock_alone() {
        let (db, p1, _) = stocked().await;
        let lines = vec![line(&p1, "pcs", 2.5, 10_000)];
        let created = db.sales().create(&sale(None, lines.clone())).await.unwrap();
        assert_eq!(quantity_of(&db, &p1, "pcs").await, Some(7));

        let updated = db.sales().update(&created.header.id, &update(lines.clone())).await.unwrap();
        let again = db.sales().update(&created.header.id, &update(lines)).await.unwrap();

        assert_eq!(quantity_of(&db, &p1, "pcs").await, Some(7));
        assert_eq!(updated.details[0].id, created.details[0].id);
        assert_eq!(again.details.len(), 1);
    }

    #[tokio::test]
    async fn test_update_moves_stock_by_the_difference() {
        let (db, p1, _) = stocked().await;
        let created = db.sales().create(&sale(None, vec![line(&p1, "pcs", 3.0, 10_000)])).await.unwrap();
        let id = &created.header.id;

        let grown = db.sales().update(id, &update(vec![line(&p1, "pcs", 8.0, 10_000)])).await.unwrap();
        assert_eq!(quantity_of(&db, &p1, "pcs").await, Some(2));
        assert_eq!(grown.header.total, 80_000);
        assert_eq!(grown.details[0].quantity, 8.0);

        db.sales().update(id, &update(vec![line(&p1, "pcs", 1.2, 10_000)])).await.unwrap();
        assert_eq!(quantity_of(&db, &p1, "pcs").await, Some(8));
    }

    #[tokio::test]
    async fn test_update_restores_removed_and_consumes_added() {
        let (db, p1, p2) = stocked().await;
        let created = db.sales().create(&sale(None, vec![line(&p1, "pcs", 4.0, 10_000)])).await.unwrap();
        assert_eq!(quantity_of(&db, &p1, "pcs").await, Some(6));

        let updated = db
            .sales()
            .update(&created.header.id, &update(vec![line(&p2, "pcs", 3.0, 5_000)]))
            .await
            .unwrap();

        assert_eq!(quantity_of(&db, &p1, "pcs").await, Some(10));
        assert_eq!(quantity_of(&db, &p2, "pcs").await, Some(7));
        assert_eq!(updated.details.len(), 1);
        assert_eq!(updated.details[0].product_id, p2);
        assert_eq!(updated.details[0].id, "DTJ000002");
    }

    #[tokio::test]
    async fn test_failed_update_leaves_no_trace() {
        let (db, p1, p2) = stocked().await;
        let created = db.sales().create(&sale(None, vec![line(&p1, "pcs", 3.0, 10_000)])).await.unwrap();
        let id = &created.header.id;

        let err = db
            .sales()
            .update(
                id,
                &SalesUpdate {
                    header: SalesHeaderPatch {
                        buyer_name: Some("Budi Santoso".to_string()),
                        ..Default::default()
                    },
                    lines: vec![line(&p1, "pcs", 5.0, 10_000), line(&p2, "pcs", 11.0, 5_000)],
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_insufficient_stock());

        let stored = db.sales().get(id).await.unwrap();
        assert_eq!(stored.header.buyer_name, "Budi");
        assert_eq!(stored.header.total, 30_000);
        assert_eq!(stored.details.len(), 1);
        assert_eq!(stored.details[0].quantity, 3.0);
        assert_eq!(quantity_of(&db, &p1, "pcs").await, Some(7));
        assert_eq!(quantity_of(&db, &p2, "pcs").await, Some(10));
    }

    #[tokio::test]
    async fn test_update_unknown_sale_is_not_found() {
        let (db, p1, _) = stocked().await;
        let err = db
            .sales()
            .update("HTJ999999", &update(vec![line(&p1, "pcs", 1.0, 10_000)]))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_mark_paid_once() {
        let (db, p1, _) = stocked().await;
        let created = db.sales().create(&sale(None, vec![line(&p1, "pcs", 1.0, 10_000)])).await.unwrap();
        let id = &created.header.id;

        let paid = db.sales().mark_paid(id).await.unwrap();
        assert_eq!(paid.status, SalesStatus::Lunas);

        let err = db.sales().mark_paid(id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidSalesStatus { .. })));
        assert!(matches!(
            db.sales().mark_paid("HTJ999999").await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_paid_sale_cannot_return_to_pending() {
        let (db, p1, _) = stocked().await;
        let created = db.sales().create(&sale(None, vec![line(&p1, "pcs", 2.0, 10_000)])).await.unwrap();
        let id = &created.header.id;
        db.sales().mark_paid(id).await.unwrap();

        let err = db
            .sales()
            .update(
                id,
                &SalesUpdate {
                    header: SalesHeaderPatch {
                        status: Some(SalesStatus::Pending),
                        ..Default::default()
                    },
                    lines: vec![line(&p1, "pcs", 5.0, 10_000)],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidSalesStatus { .. })));

        let stored = db.sales().get(id).await.unwrap();
        assert_eq!(stored.header.status, SalesStatus::Lunas);
        assert_eq!(stored.details[0].quantity, 2.0);
        assert_eq!(quantity_of(&db, &p1, "pcs").await, Some(8));

        // Editing lines of a paid sale without touching the status still works
        let edited = db.sales().update(id, &update(vec![line(&p1, "pcs", 3.0, 10_000)])).await.unwrap();
        assert_eq!(edited.header.status, SalesStatus::Lunas);
        assert_eq!(quantity_of(&db, &p1, "pcs").await, Some(7));
    }

    #[tokio::test]
    async fn test_oversized_amounts_are_rejected_before_any_write() {
        let (db, p1, p2) = stocked().await;

        let mut a = line(&p1, "pcs", 1.0, 10_000);
        a.subtotal = Some(i64::MAX / 2 + 1);
        let mut b = line(&p2, "pcs", 1.0, 5_000);
        b.subtotal = Some(i64::MAX / 2 + 1);

        let err = db.sales().create(&sale(None, vec![a.clone(), b.clone()])).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
        assert_eq!(header_count(&db).await, 0);
        assert_eq!(quantity_of(&db, &p1, "pcs").await, Some(10));

        let created = db.sales().create(&sale(None, vec![line(&p1, "pcs", 3.0, 10_000)])).await.unwrap();
        let id = &created.header.id;

        let err = db.sales().update(id, &update(vec![a, b])).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

        let stored = db.sales().get(id).await.unwrap();
        assert_eq!(stored.header.total, 30_000);
        assert_eq!(quantity_of(&db, &p1, "pcs").await, Some(7));
        assert_eq!(quantity_of(&db, &p2, "pcs").await, Some(10));
    }

    #[tokio::test]
    async fn test_padded_unit_uses_the_existing_entry() {
        let (db, p1, _) = stocked().await;

        let created = db.sales().create(&sale(None, vec![line(&p1, " pcs ", 2.0, 10_000)])).await.unwrap();
        assert_eq!(created.details[0].unit, "pcs");
        assert_eq!(quantity_of(&db, &p1, "pcs").await, Some(8));

        let updated = db
            .sales()
            .update(&created.header.id, &update(vec![line(&p1, "pcs", 2.0, 10_000)]))
            .await
            .unwrap();
        assert_eq!(updated.details[0].id, created.details[0].id);
        assert_eq!(quantity_of(&db, &p1, "pcs").await, Some(8));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let (db, p1, p2) = stocked().await;
        let seller = add_seller(&db).await;

        let first = db.sales().create(&sale(Some(seller.clone()), vec![line(&p1, "pcs", 1.0, 10_000)])).await.unwrap();
        db.sales().create(&sale(None, vec![line(&p2, "pcs", 1.0, 5_000)])).await.unwrap();
        db.sales().mark_paid(&first.header.id).await.unwrap();

        let all = db.sales().list(&SalesFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let paid = db
            .sales()
            .list(&SalesFilter {
                status: Some(SalesStatus::Lunas),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(paid.len(), 1);
        assert_eq!(paid[0].id, first.header.id);

        let by_seller = db
            .sales()
            .list(&SalesFilter {
                seller_user_id: Some(seller),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_seller.len(), 1);

        let later = db
            .sales()
            .list(&SalesFilter {
                from: day().succ_opt(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(later.is_empty());
    }
}
