//! # Category Repository
//!
//! Product categories. Names are unique among live categories.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::sequence::allocate_id;
use warung_core::ids::EntityKind;
use warung_core::validation::validate_name;
use warung_core::Category;

/// Fails with `NotFound` unless `id` is a live category.
pub(crate) async fn ensure_active_category(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE id = ?1 AND is_active = 1")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

    if count == 0 {
        return Err(DbError::not_found("Category", id));
    }
    Ok(())
}

async fn ensure_name_free(conn: &mut SqliteConnection, name: &str, except_id: Option<&str>) -> DbResult<()> {
    let taken: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM categories WHERE name = ?1 AND is_active = 1 AND (?2 IS NULL OR id != ?2)",
    )
    .bind(name)
    .bind(except_id)
    .fetch_one(&mut *conn)
    .await?;

    if taken > 0 {
        return Err(DbError::duplicate("nama_kategori", name));
    }
    Ok(())
}

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Live categories ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, is_active FROM categories WHERE is_active = 1 ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, is_active FROM categories WHERE id = ?1 AND is_active = 1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(category)
    }

    /// Creates a category.
    ///
    /// ## Errors
    /// `UniqueViolation` when a live category already has this name.
    pub async fn create(&self, name: &str) -> DbResult<Category> {
        validate_name("nama_kategori", name)?;
        let name = name.trim();

        let mut tx = self.pool.begin().await?;

        ensure_name_free(&mut tx, name, None).await?;
        let id = allocate_id(&mut tx, EntityKind::Category).await?;

        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (id, name, is_active) VALUES (?1, ?2, 1) RETURNING id, name, is_active",
        )
        .bind(&id)
        .bind(name)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(id = %category.id, name = %category.name, "Category created");
        Ok(category)
    }

    /// Renames a category.
    pub async fn rename(&self, id: &str, name: &str) -> DbResult<Category> {
        validate_name("nama_kategori", name)?;
        let name = name.trim();
        debug!(id = %id, name = %name, "Renaming category");

        let mut tx = self.pool.begin().await?;

        ensure_name_free(&mut tx, name, Some(id)).await?;

        let category = sqlx::query_as::<_, Category>(
            "UPDATE categories SET name = ?2 WHERE id = ?1 AND is_active = 1 RETURNING id, name, is_active",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Category", id))?;

        tx.commit().await?;
        Ok(category)
    }

    /// Soft-deletes a category. Its products are left untouched.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting category");

        let result = sqlx::query("UPDATE categories SET is_active = 0 WHERE id = ?1 AND is_active = 1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::test_db;

    #[tokio::test]
    async fn test_create_and_list() {
        let db = test_db().await;

        let minuman = db.categories().create("Minuman").await.unwrap();
        let makanan = db.categories().create("  Makanan ").await.unwrap();
        assert_eq!(minuman.id, "KAT001");
        assert_eq!(makanan.id, "KAT002");
        assert_eq!(makanan.name, "Makanan");

        let names: Vec<String> = db
            .categories()
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Makanan", "Minuman"]);
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected_until_deleted() {
        let db = test_db().await;
        let first = db.categories().create("Minuman").await.unwrap();

        let err = db.categories().create("Minuman").await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        db.categories().soft_delete(&first.id).await.unwrap();
        let second = db.categories().create("Minuman").await.unwrap();
        assert_eq!(second.id, "KAT002");
    }

    #[tokio::test]
    async fn test_rename() {
        let db = test_db().await;
        let a = db.categories().create("Minuman").await.unwrap();
        db.categories().create("Snack").await.unwrap();

        let renamed = db.categories().rename(&a.id, "Minuman Dingin").await.unwrap();
        assert_eq!(renamed.name, "Minuman Dingin");

        // Renaming to its own name is allowed, to another live name is not
        assert!(db.categories().rename(&a.id, "Minuman Dingin").await.is_ok());
        assert!(matches!(
            db.categories().rename(&a.id, "Snack").await,
            Err(DbError::UniqueViolation { .. })
        ));
        assert!(matches!(
            db.categories().rename("KAT999", "X").await,
            Err(DbError::NotFound { .. })
        ));
    }
}
