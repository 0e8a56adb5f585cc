//! # Supplier Repository

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::sequence::allocate_id;
use warung_core::ids::EntityKind;
use warung_core::validation::{validate_name, validate_text};
use warung_core::{NewSupplier, Supplier, SupplierPatch};

const SUPPLIER_COLUMNS: &str = "id, name, phone, notes, is_active";

/// Fails with `NotFound` unless `id` is a live supplier.
pub(crate) async fn ensure_active_supplier(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM suppliers WHERE id = ?1 AND is_active = 1")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

    if count == 0 {
        return Err(DbError::not_found("Supplier", id));
    }
    Ok(())
}

/// Repository for supplier database operations.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    pub async fn list(&self) -> DbResult<Vec<Supplier>> {
        let sql = format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE is_active = 1 ORDER BY name");
        let suppliers = sqlx::query_as::<_, Supplier>(&sql).fetch_all(&self.pool).await?;
        Ok(suppliers)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Supplier>> {
        let sql = format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = ?1 AND is_active = 1");
        let supplier = sqlx::query_as::<_, Supplier>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(supplier)
    }

    pub async fn create(&self, input: &NewSupplier) -> DbResult<Supplier> {
        validate_name("nama_supplier", &input.name)?;
        if let Some(phone) = &input.phone {
            validate_text("no_telp", phone, 30)?;
        }

        let mut tx = self.pool.begin().await?;
        let id = allocate_id(&mut tx, EntityKind::Supplier).await?;

        let sql = format!(
            r#"
            INSERT INTO suppliers (id, name, phone, notes, is_active)
            VALUES (?1, ?2, ?3, ?4, 1)
            RETURNING {SUPPLIER_COLUMNS}
            "#
        );
        let supplier = sqlx::query_as::<_, Supplier>(&sql)
            .bind(&id)
            .bind(input.name.trim())
            .bind(&input.phone)
            .bind(&input.notes)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(id = %supplier.id, name = %supplier.name, "Supplier created");
        Ok(supplier)
    }

    pub async fn update(&self, id: &str, patch: &SupplierPatch) -> DbResult<Supplier> {
        if let Some(name) = &patch.name {
            validate_name("nama_supplier", name)?;
        }
        debug!(id = %id, "Updating supplier");

        let sql = format!(
            r#"
            UPDATE suppliers SET
                name  = COALESCE(?2, name),
                phone = COALESCE(?3, phone),
                notes = COALESCE(?4, notes)
            WHERE id = ?1 AND is_active = 1
            RETURNING {SUPPLIER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Supplier>(&sql)
            .bind(id)
            .bind(patch.name.as_deref().map(str::trim))
            .bind(&patch.phone)
            .bind(&patch.notes)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Supplier", id))
    }

    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting supplier");

        let result = sqlx::query("UPDATE suppliers SET is_active = 0 WHERE id = ?1 AND is_active = 1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }
        Ok(())
    }
}
