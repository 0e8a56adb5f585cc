//! # Product Repository
//!
//! Catalog products. Products are soft-deleted; sales and purchase rows
//! keep pointing at them.
//!
//! ## Search
//! ```text
//! GET /produk?id_kategori=KAT001&cari=teh
//!      │
//!      ▼
//! ProductFilter { category_id: Some("KAT001"), search: Some("teh") }
//!      │
//!      ▼
//! WHERE is_active = 1
//!   AND (?1 IS NULL OR category_id = ?1)
//!   AND (?2 IS NULL OR name LIKE '%' || ?2 || '%')
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::category::ensure_active_category;
use crate::repository::sequence::allocate_id;
use warung_core::ids::EntityKind;
use warung_core::validation::{validate_name, validate_reference, validate_text};
use warung_core::{NewProduct, Product, ProductFilter, ProductPatch};

const PRODUCT_COLUMNS: &str = "id, category_id, name, description, image, is_active, created_at, updated_at";

/// Fails with `NotFound` unless `id` is a live product.
pub(crate) async fn ensure_active_product(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE id = ?1 AND is_active = 1")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

    if count == 0 {
        return Err(DbError::not_found("Product", id));
    }
    Ok(())
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Live products matching the filter, ordered by name.
    pub async fn list(&self, filter: &ProductFilter) -> DbResult<Vec<Product>> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE is_active = 1
              AND (?1 IS NULL OR category_id = ?1)
              AND (?2 IS NULL OR name LIKE '%' || ?2 || '%')
            ORDER BY name
            "#
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(filter.category_id.as_deref())
            .bind(search)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1 AND is_active = 1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    /// Creates a product in a live category.
    pub async fn create(&self, input: &NewProduct) -> DbResult<Product> {
        validate_reference("id_kategori", &input.category_id)?;
        validate_name("nama_produk", &input.name)?;
        if let Some(description) = &input.description {
            validate_text("deskripsi", description, 2000)?;
        }

        let mut tx = self.pool.begin().await?;

        ensure_active_category(&mut tx, &input.category_id).await?;
        let id = allocate_id(&mut tx, EntityKind::Product).await?;
        let now = Utc::now();

        let sql = format!(
            r#"
            INSERT INTO products (id, category_id, name, description, image, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6)
            RETURNING {PRODUCT_COLUMNS}
            "#
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(&id)
            .bind(&input.category_id)
            .bind(input.name.trim())
            .bind(&input.description)
            .bind(&input.image)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    /// Applies the present fields of `patch`.
    pub async fn update(&self, id: &str, patch: &ProductPatch) -> DbResult<Product> {
        if let Some(name) = &patch.name {
            validate_name("nama_produk", name)?;
        }
        debug!(id = %id, "Updating product");

        let mut tx = self.pool.begin().await?;

        if let Some(category_id) = &patch.category_id {
            ensure_active_category(&mut tx, category_id).await?;
        }

        let sql = format!(
            r#"
            UPDATE products SET
                category_id = COALESCE(?2, category_id),
                name        = COALESCE(?3, name),
                description = COALESCE(?4, description),
                image       = COALESCE(?5, image),
                updated_at  = ?6
            WHERE id = ?1 AND is_active = 1
            RETURNING {PRODUCT_COLUMNS}
            "#
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(&patch.category_id)
            .bind(patch.name.as_deref().map(str::trim))
            .bind(&patch.description)
            .bind(&patch.image)
            .bind(Utc::now())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        tx.commit().await?;
        Ok(product)
    }

    /// Soft-deletes a product.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query(
            "UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1 AND is_active = 1",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }
}
