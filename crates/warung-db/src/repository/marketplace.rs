//! # Marketplace Token Repository
//!
//! One row per platform holding the current OAuth token pair. Every
//! write overwrites the row and restarts its TTL clock.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;
use warung_core::validation::validate_text;
use warung_core::{MarketplacePlatform, MarketplaceToken, TokenSeed, ValidationError};

const TOKEN_COLUMNS: &str = "platform, access_token, refresh_token, ttl_secs, account_id, updated_at";

/// Repository for stored marketplace tokens.
#[derive(Debug, Clone)]
pub struct MarketplaceTokenRepository {
    pool: SqlitePool,
}

impl MarketplaceTokenRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MarketplaceTokenRepository { pool }
    }

    pub async fn get(&self, platform: MarketplacePlatform) -> DbResult<Option<MarketplaceToken>> {
        let sql = format!("SELECT {TOKEN_COLUMNS} FROM marketplace_tokens WHERE platform = ?1");
        let token = sqlx::query_as::<_, MarketplaceToken>(&sql)
            .bind(platform)
            .fetch_optional(&self.pool)
            .await?;
        Ok(token)
    }

    pub async fn list(&self) -> DbResult<Vec<MarketplaceToken>> {
        let sql = format!("SELECT {TOKEN_COLUMNS} FROM marketplace_tokens ORDER BY platform");
        let tokens = sqlx::query_as::<_, MarketplaceToken>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(tokens)
    }

    /// Stores a token pair issued now.
    pub async fn upsert(&self, platform: MarketplacePlatform, seed: &TokenSeed) -> DbResult<MarketplaceToken> {
        self.upsert_at(platform, seed, Utc::now()).await
    }

    /// Stores a token pair issued at `issued_at`.
    ///
    /// A seed without an account id keeps the stored one.
    pub async fn upsert_at(
        &self,
        platform: MarketplacePlatform,
        seed: &TokenSeed,
        issued_at: DateTime<Utc>,
    ) -> DbResult<MarketplaceToken> {
        validate_text("access_token", &seed.access_token, 4096)?;
        validate_text("refresh_token", &seed.refresh_token, 4096)?;
        if seed.ttl_secs <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "expire_in".to_string(),
            }
            .into());
        }

        let sql = format!(
            r#"
            INSERT INTO marketplace_tokens (platform, access_token, refresh_token, ttl_secs, account_id, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (platform) DO UPDATE SET
                access_token  = excluded.access_token,
                refresh_token = excluded.refresh_token,
                ttl_secs      = excluded.ttl_secs,
                account_id    = COALESCE(excluded.account_id, marketplace_tokens.account_id),
                updated_at    = excluded.updated_at
            RETURNING {TOKEN_COLUMNS}
            "#
        );
        let token = sqlx::query_as::<_, MarketplaceToken>(&sql)
            .bind(platform)
            .bind(&seed.access_token)
            .bind(&seed.refresh_token)
            .bind(seed.ttl_secs)
            .bind(&seed.account_id)
            .bind(issued_at)
            .fetch_one(&self.pool)
            .await?;

        info!(platform = %platform, expires_at = %token.expires_at(), "Marketplace token stored");
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::test_db;

    fn seed(access: &str, account: Option<&str>) -> TokenSeed {
        TokenSeed {
            access_token: access.to_string(),
            refresh_token: format!("refresh-{access}"),
            ttl_secs: 14_400,
            account_id: account.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_upsert_overwrites_single_row() {
        let db = test_db().await;
        let repo = db.marketplace_tokens();

        assert!(repo.get(MarketplacePlatform::Shopee).await.unwrap().is_none());

        repo.upsert(MarketplacePlatform::Shopee, &seed("a1", Some("shop-77"))).await.unwrap();
        let second = repo.upsert(MarketplacePlatform::Shopee, &seed("a2", None)).await.unwrap();

        assert_eq!(second.access_token, "a2");
        assert_eq!(second.refresh_token, "refresh-a2");
        assert_eq!(second.account_id.as_deref(), Some("shop-77"));
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_issued_at_drives_expiry() {
        let db = test_db().await;
        let repo = db.marketplace_tokens();
        let issued = Utc::now() - chrono::Duration::hours(5);

        let token = repo
            .upsert_at(MarketplacePlatform::Lazada, &seed("z", None), issued)
            .await
            .unwrap();
        assert!(token.is_expired(Utc::now()));
    }

    #[tokio::test]
    async fn test_rejects_empty_tokens() {
        let db = test_db().await;
        let err = db
            .marketplace_tokens()
            .upsert(MarketplacePlatform::Shopee, &seed("", None))
            .await;
        assert!(err.is_err());
    }
}
