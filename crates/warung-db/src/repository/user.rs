//! # User Repository
//!
//! Accounts for sellers, warehouse staff and admins.
//!
//! ## Passwords
//! ```text
//! create / update(password)          verify_credentials
//!        │                                  │
//!        ▼                                  ▼
//! Argon2 + random salt              PasswordHash::new(stored)
//!        │                                  │
//!        ▼                                  ▼
//! "$argon2id$v=19$..."  ──stored──► verify_password(candidate)
//! ```
//!
//! Users are hard-deleted. Sales keep their rows; the user references on
//! them are cleared by the foreign key.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::sequence::allocate_id;
use warung_core::ids::EntityKind;
use warung_core::validation::{validate_password, validate_text, validate_username};
use warung_core::{NewUser, User, UserPatch};

const USER_COLUMNS: &str = "id, username, password_hash, name, role, phone, gender, address, is_active";

/// Hashes a password for storage.
pub fn hash_password(password: &str) -> DbResult<String> {
    use argon2::{
        password_hash::{rand_core::OsRng, SaltString},
        Argon2, PasswordHasher,
    };

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

/// Fails with `NotFound` unless the user `id` exists.
pub(crate) async fn ensure_user(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ?1")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

    if count == 0 {
        return Err(DbError::not_found("User", id));
    }
    Ok(())
}

/// Checks a password against its stored hash.
fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};

    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    pub async fn list(&self) -> DbResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
        let users = sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?;
        Ok(users)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Creates a user with a hashed password.
    ///
    /// ## Errors
    /// `UniqueViolation` when the username is taken.
    pub async fn create(&self, input: &NewUser) -> DbResult<User> {
        validate_username(&input.username)?;
        validate_password(&input.password)?;
        validate_text("nama", &input.name, 100)?;

        let username = input.username.trim();
        let password_hash = hash_password(&input.password)?;

        let mut tx = self.pool.begin().await?;

        let taken: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?1")
            .bind(username)
            .fetch_one(&mut *tx)
            .await?;
        if taken > 0 {
            return Err(DbError::duplicate("username", username));
        }

        let id = allocate_id(&mut tx, EntityKind::User).await?;

        let sql = format!(
            r#"
            INSERT INTO users (id, username, password_hash, name, role, phone, gender, address, is_active)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1)
            RETURNING {USER_COLUMNS}
            "#
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&id)
            .bind(username)
            .bind(&password_hash)
            .bind(input.name.trim())
            .bind(input.role)
            .bind(&input.phone)
            .bind(&input.gender)
            .bind(&input.address)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(id = %user.id, username = %user.username, role = ?user.role, "User created");
        Ok(user)
    }

    /// Applies the present fields of `patch`; a present password is
    /// re-hashed.
    pub async fn update(&self, id: &str, patch: &UserPatch) -> DbResult<User> {
        if let Some(username) = &patch.username {
            validate_username(username)?;
        }
        if let Some(name) = &patch.name {
            validate_text("nama", name, 100)?;
        }
        let password_hash = match &patch.password {
            Some(password) => {
                validate_password(password)?;
                Some(hash_password(password)?)
            }
            None => None,
        };
        let username = patch.username.as_deref().map(str::trim);

        debug!(id = %id, rehash = password_hash.is_some(), "Updating user");

        let mut tx = self.pool.begin().await?;

        if let Some(username) = username {
            let taken: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?1 AND id != ?2")
                    .bind(username)
                    .bind(id)
                    .fetch_one(&mut *tx)
                    .await?;
            if taken > 0 {
                return Err(DbError::duplicate("username", username));
            }
        }

        let sql = format!(
            r#"
            UPDATE users SET
                username      = COALESCE(?2, username),
                password_hash = COALESCE(?3, password_hash),
                name          = COALESCE(?4, name),
                role          = COALESCE(?5, role),
                phone         = COALESCE(?6, phone),
                gender        = COALESCE(?7, gender),
                address       = COALESCE(?8, address),
                is_active     = COALESCE(?9, is_active)
            WHERE id = ?1
            RETURNING {USER_COLUMNS}
            "#
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(username)
            .bind(password_hash)
            .bind(patch.name.as_deref().map(str::trim))
            .bind(patch.role)
            .bind(&patch.phone)
            .bind(&patch.gender)
            .bind(&patch.address)
            .bind(patch.is_active)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))?;

        tx.commit().await?;
        Ok(user)
    }

    /// Deletes a user permanently.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        info!(id = %id, "User deleted");
        Ok(())
    }

    /// The active user with these credentials, if they match.
    pub async fn verify_credentials(&self, username: &str, password: &str) -> DbResult<Option<User>> {
        let Some(user) = self.get_by_username(username).await? else {
            debug!(username = %username, "Login for unknown username");
            return Ok(None);
        };

        if !user.is_active {
            warn!(id = %user.id, "Login attempt on inactive user");
            return Ok(None);
        }

        if !verify_password(password, &user.password_hash) {
            debug!(id = %user.id, "Password mismatch");
            return Ok(None);
        }

        Ok(Some(user))
    }
}
