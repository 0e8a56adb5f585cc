//! # Purchase Repository
//!
//! Goods received from suppliers. Each line adds to the stock ledger at
//! its purchase price, creating the (product, unit) entry when it is new.
//!
//! ```text
//! BEGIN
//!   supplier live?            no ──► NotFound
//!   products live?            no ──► NotFound
//!   HTB000001 header
//!   per line: DTB id, insert, increment(product, unit, qty, unit price)
//! COMMIT
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::repository::product::ensure_active_product;
use crate::repository::sequence::allocate_id;
use crate::repository::stock::increment_in;
use crate::repository::supplier::ensure_active_supplier;
use warung_core::ids::EntityKind;
use warung_core::validation::validate_new_purchase;
use warung_core::{NewPurchase, PurchaseDetail, PurchaseHeader, PurchaseTransaction};

const HEADER_COLUMNS: &str =
    "id, supplier_id, date, total, payment_method, invoice_number, tax, created_at";

const DETAIL_COLUMNS: &str =
    "id, header_id, product_id, unit, quantity, unit_price, discount, subtotal";

async fn fetch_details(conn: &mut SqliteConnection, header_id: &str) -> DbResult<Vec<PurchaseDetail>> {
    let sql = format!("SELECT {DETAIL_COLUMNS} FROM purchase_details WHERE header_id = ?1 ORDER BY id");
    let details = sqlx::query_as::<_, PurchaseDetail>(&sql)
        .bind(header_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(details)
}

/// Repository for purchase transactions.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// Records a purchase and receives its stock, all or nothing.
    pub async fn create(&self, purchase: &NewPurchase) -> DbResult<PurchaseTransaction> {
        validate_new_purchase(purchase)?;

        let mut tx = self.pool.begin().await?;

        ensure_active_supplier(&mut tx, &purchase.supplier_id).await?;
        for line in &purchase.lines {
            ensure_active_product(&mut tx, &line.product_id).await?;
        }

        let id = allocate_id(&mut tx, EntityKind::PurchaseHeader).await?;

        let sql = format!(
            r#"
            INSERT INTO purchase_headers (id, supplier_id, date, total, payment_method, invoice_number, tax, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            RETURNING {HEADER_COLUMNS}
            "#
        );
        let header = sqlx::query_as::<_, PurchaseHeader>(&sql)
            .bind(&id)
            .bind(&purchase.supplier_id)
            .bind(purchase.date)
            .bind(purchase.total_or_sum())
            .bind(purchase.payment_method.trim())
            .bind(&purchase.invoice_number)
            .bind(purchase.tax.unwrap_or(0))
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await?;

        let insert_sql = format!(
            r#"
            INSERT INTO purchase_details (id, header_id, product_id, unit, quantity, unit_price, discount, subtotal)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            RETURNING {DETAIL_COLUMNS}
            "#
        );

        let mut details = Vec::with_capacity(purchase.lines.len());
        for line in &purchase.lines {
            let detail_id = allocate_id(&mut tx, EntityKind::PurchaseDetail).await?;
            let detail = sqlx::query_as::<_, PurchaseDetail>(&insert_sql)
                .bind(&detail_id)
                .bind(&header.id)
                .bind(line.product_id.trim())
                .bind(line.unit.trim())
                .bind(line.quantity)
                .bind(line.unit_price)
                .bind(line.discount.unwrap_or(0))
                .bind(line.subtotal())
                .fetch_one(&mut *tx)
                .await?;

            increment_in(&mut tx, &line.product_id, &line.unit, line.quantity, line.unit_price).await?;
            details.push(detail);
        }

        tx.commit().await?;

        info!(
            id = %header.id,
            supplier_id = %header.supplier_id,
            lines = details.len(),
            total = header.total,
            "Purchase transaction created"
        );

        Ok(PurchaseTransaction { header, details })
    }

    /// A purchase with its lines.
    pub async fn get(&self, id: &str) -> DbResult<PurchaseTransaction> {
        let mut conn = self.pool.acquire().await?;

        let sql = format!("SELECT {HEADER_COLUMNS} FROM purchase_headers WHERE id = ?1");
        let header = sqlx::query_as::<_, PurchaseHeader>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| DbError::not_found("PurchaseTransaction", id))?;
        let details = fetch_details(&mut conn, id).await?;

        Ok(PurchaseTransaction { header, details })
    }

    /// Purchase headers, newest first, optionally for one supplier.
    pub async fn list(&self, supplier_id: Option<&str>) -> DbResult<Vec<PurchaseHeader>> {
        let sql = format!(
            r#"
            SELECT {HEADER_COLUMNS} FROM purchase_headers
            WHERE (?1 IS NULL OR supplier_id = ?1)
            ORDER BY date DESC, id DESC
            "#
        );
        let headers = sqlx::query_as::<_, PurchaseHeader>(&sql)
            .bind(supplier_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{add_stock, add_supplier, db_with_products, quantity_of};
    use chrono::NaiveDate;
    use warung_core::{CoreError, NewPurchaseLine};

    fn purchase(supplier: &str, lines: Vec<NewPurchaseLine>) -> NewPurchase {
        NewPurchase {
            supplier_id: supplier.to_string(),
            date: NaiveDate::from_ymd_opt(2026, 1, 30).unwrap(),
            total: None,
            payment_method: "transfer".to_string(),
            invoice_number: Some("SR-0091".to_string()),
            tax: Some(11_000),
            lines,
        }
    }

    fn line(product: &str, unit: &str, qty: i64, price: i64) -> NewPurchaseLine {
        NewPurchaseLine {
            product_id: product.to_string(),
            unit: unit.to_string(),
            quantity: qty,
            unit_price: price,
            discount: None,
            subtotal: None,
        }
    }

    #[tokio::test]
    async fn test_purchase_adds_to_existing_and_creates_missing_stock() {
        let (db, products) = db_with_products(1).await;
        let p = &products[0].id;
        let supplier = add_supplier(&db).await;
        add_stock(&db, p, "pcs", 5, 10_000).await;

        let created = db
            .purchases()
            .create(&purchase(
                &supplier,
                vec![line(p, "pcs", 24, 8_000), line(p, "box", 2, 180_000)],
            ))
            .await
            .unwrap();

        assert_eq!(created.header.id, "HTB000001");
        assert_eq!(created.header.total, 24 * 8_000 + 2 * 180_000);
        assert_eq!(created.header.tax, 11_000);
        assert_eq!(created.details[0].id, "DTB000001");
        assert_eq!(created.details[1].unit, "box");

        assert_eq!(quantity_of(&db, p, "pcs").await, Some(29));
        let boxed = db.stock().find(p, "box").await.unwrap().unwrap();
        assert_eq!(boxed.quantity, 2);
        assert_eq!(boxed.unit_price, 180_000);
    }

    #[tokio::test]
    async fn test_oversized_price_writes_nothing() {
        let (db, products) = db_with_products(1).await;
        let p = &products[0].id;
        let supplier = add_supplier(&db).await;
        add_stock(&db, p, "pcs", 5, 10_000).await;

        let err = db
            .purchases()
            .create(&purchase(&supplier, vec![line(p, "pcs", 3, i64::MAX / 2)]))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
        assert_eq!(quantity_of(&db, p, "pcs").await, Some(5));
        assert!(db.purchases().list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_padded_unit_lands_on_the_existing_entry() {
        let (db, products) = db_with_products(1).await;
        let p = &products[0].id;
        let supplier = add_supplier(&db).await;
        add_stock(&db, p, "pcs", 5, 10_000).await;

        let created = db
            .purchases()
            .create(&purchase(&supplier, vec![line(p, "pcs ", 4, 9_000)]))
            .await
            .unwrap();

        assert_eq!(created.details[0].unit, "pcs");
        assert_eq!(quantity_of(&db, p, "pcs").await, Some(9));
        assert_eq!(db.stock().list(Some(p.as_str())).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_supplier_writes_nothing() {
        let (db, products) = db_with_products(1).await;
        let p = &products[0].id;

        let err = db
            .purchases()
            .create(&purchase("SUP404", vec![line(p, "pcs", 5, 1_000)]))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { ref entity, .. } if entity == "Supplier"));
        assert_eq!(quantity_of(&db, p, "pcs").await, None);
        assert!(db.purchases().list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_product_rolls_back_every_line() {
        let (db, products) = db_with_products(1).await;
        let p = &products[0].id;
        let supplier = add_supplier(&db).await;

        let err = db
            .purchases()
            .create(&purchase(
                &supplier,
                vec![line(p, "pcs", 5, 1_000), line("PRO404", "pcs", 1, 1_000)],
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
        assert_eq!(quantity_of(&db, p, "pcs").await, None);
    }

    #[tokio::test]
    async fn test_get_and_list() {
        let (db, products) = db_with_products(1).await;
        let p = &products[0].id;
        let supplier = add_supplier(&db).await;

        let created = db
            .purchases()
            .create(&purchase(&supplier, vec![line(p, "pcs", 5, 1_000)]))
            .await
            .unwrap();

        let fetched = db.purchases().get(&created.header.id).await.unwrap();
        assert_eq!(fetched.details.len(), 1);
        assert_eq!(fetched.header.invoice_number.as_deref(), Some("SR-0091"));

        assert_eq!(db.purchases().list(Some(supplier.as_str())).await.unwrap().len(), 1);
        assert!(db.purchases().list(Some("SUP999")).await.unwrap().is_empty());
        assert!(matches!(
            db.purchases().get("HTB999999").await,
            Err(DbError::NotFound { .. })
        ));
    }
}
