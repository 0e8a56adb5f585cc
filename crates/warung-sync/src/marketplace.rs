//! # Marketplace Token Refresh
//!
//! Keeps the stored Shopee/Lazada OAuth token pairs usable.
//!
//! ## Refresh Check
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  refresh_if_expired(platform)                                           │
//! │       │                                                                 │
//! │       ├─ no exchanger configured ──────────────► NotConfigured          │
//! │       ├─ no stored row ────────────────────────► NoToken                │
//! │       ├─ now <  updated_at + ttl ──────────────► Fresh { expires_at }   │
//! │       └─ now >= updated_at + ttl                                        │
//! │              │                                                          │
//! │              ▼                                                          │
//! │         exchanger.refresh(current) ── error ──► Err (row untouched)     │
//! │              │                                                          │
//! │              ▼                                                          │
//! │         overwrite row ─────────────────────────► Refreshed(token)       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Two overlapping checks for the same platform may both call the
//! marketplace; the later write wins.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use warung_core::{MarketplacePlatform, MarketplaceToken, TokenSeed};
use warung_db::Database;

use crate::error::{SyncError, SyncResult};
use crate::sign::{hmac_sha256, hmac_sha256_hex};

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

pub const SHOPEE_REFRESH_PATH: &str = "/api/v2/auth/access_token/get";
pub const LAZADA_REFRESH_PATH: &str = "/auth/token/refresh";

// =============================================================================
// Exchanger Trait
// =============================================================================

/// Trades a refresh token for a new token pair.
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    fn platform(&self) -> MarketplacePlatform;

    async fn refresh(&self, current: &MarketplaceToken) -> SyncResult<TokenSeed>;
}

fn http_client() -> SyncResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| SyncError::InvalidConfig(format!("http client: {}", e)))
}

// =============================================================================
// Shopee
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopeeConfig {
    pub base_url: String,
    pub partner_id: i64,
    pub partner_key: String,
}

/// `hex(HMAC-SHA256(partner_key, partner_id + path + timestamp))`
pub fn shopee_sign(partner_key: &str, partner_id: i64, path: &str, timestamp: i64) -> SyncResult<String> {
    hmac_sha256_hex(partner_key, &format!("{}{}{}", partner_id, path, timestamp))
}

pub struct ShopeeExchanger {
    config: ShopeeConfig,
    client: reqwest::Client,
}

impl ShopeeExchanger {
    pub fn new(config: ShopeeConfig) -> SyncResult<Self> {
        if config.partner_key.is_empty() {
            return Err(SyncError::InvalidConfig("shopee partner_key is empty".into()));
        }
        Ok(ShopeeExchanger {
            config,
            client: http_client()?,
        })
    }
}

#[derive(Debug, Serialize)]
struct ShopeeRefreshRequest<'a> {
    refresh_token: &'a str,
    partner_id: i64,
    shop_id: i64,
}

#[derive(Debug, Deserialize)]
struct ShopeeRefreshResponse {
    #[serde(default)]
    error: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    refresh_token: String,
    #[serde(default)]
    expire_in: i64,
    #[serde(default)]
    shop_id: Option<i64>,
}

#[async_trait]
impl TokenExchanger for ShopeeExchanger {
    fn platform(&self) -> MarketplacePlatform {
        MarketplacePlatform::Shopee
    }

    async fn refresh(&self, current: &MarketplaceToken) -> SyncResult<TokenSeed> {
        let shop_id = current
            .account_id
            .as_deref()
            .and_then(|id| id.trim().parse::<i64>().ok())
            .ok_or_else(|| SyncError::InvalidConfig("shopee token has no numeric shop_id".into()))?;

        let timestamp = Utc::now().timestamp();
        let sign = shopee_sign(
            &self.config.partner_key,
            self.config.partner_id,
            SHOPEE_REFRESH_PATH,
            timestamp,
        )?;
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), SHOPEE_REFRESH_PATH);

        debug!(shop_id, "Refreshing Shopee token");

        let response = self
            .client
            .post(&url)
            .query(&[
                ("partner_id", self.config.partner_id.to_string()),
                ("timestamp", timestamp.to_string()),
                ("sign", sign),
            ])
            .json(&ShopeeRefreshRequest {
                refresh_token: &current.refresh_token,
                partner_id: self.config.partner_id,
                shop_id,
            })
            .send()
            .await
            .map_err(|e| SyncError::external("shopee", e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SyncError::external("shopee", e.to_string()))?;

        let body: ShopeeRefreshResponse = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(SyncError::external("shopee", format!("status {}", status)))
            }
            Err(e) => {
                return Err(SyncError::InvalidResponse {
                    service: "shopee".into(),
                    message: e.to_string(),
                })
            }
        };

        if !body.error.is_empty() {
            return Err(SyncError::AuthFailed {
                service: "shopee".into(),
                message: format!("{}: {}", body.error, body.message),
            });
        }
        if !status.is_success() {
            return Err(SyncError::external("shopee", format!("status {}", status)));
        }
        if body.access_token.is_empty() || body.refresh_token.is_empty() {
            return Err(SyncError::InvalidResponse {
                service: "shopee".into(),
                message: "missing token in response".into(),
            });
        }

        Ok(TokenSeed {
            access_token: body.access_token,
            refresh_token: body.refresh_token,
            ttl_secs: body.expire_in,
            account_id: Some(body.shop_id.unwrap_or(shop_id).to_string()),
        })
    }
}

// =============================================================================
// Lazada
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LazadaConfig {
    pub base_url: String,
    pub app_key: String,
    pub app_secret: String,
}

/// `HEX_UPPER(HMAC-SHA256(app_secret, api_path + k1v1k2v2...))` over the
/// parameters sorted by key.
pub fn lazada_sign(app_secret: &str, api_path: &str, params: &BTreeMap<&str, String>) -> SyncResult<String> {
    let mut message = String::from(api_path);
    for (key, value) in params {
        message.push_str(key);
        message.push_str(value);
    }
    hmac_sha256(app_secret, &message).map(hex::encode_upper)
}

pub struct LazadaExchanger {
    config: LazadaConfig,
    client: reqwest::Client,
}

impl LazadaExchanger {
    pub fn new(config: LazadaConfig) -> SyncResult<Self> {
        if config.app_key.is_empty() || config.app_secret.is_empty() {
            return Err(SyncError::InvalidConfig("lazada app_key/app_secret is empty".into()));
        }
        Ok(LazadaExchanger {
            config,
            client: http_client()?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct LazadaRefreshResponse {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    refresh_token: String,
    #[serde(default)]
    expires_in: i64,
}

#[async_trait]
impl TokenExchanger for LazadaExchanger {
    fn platform(&self) -> MarketplacePlatform {
        MarketplacePlatform::Lazada
    }

    async fn refresh(&self, current: &MarketplaceToken) -> SyncResult<TokenSeed> {
        let mut params = BTreeMap::new();
        params.insert("app_key", self.config.app_key.clone());
        params.insert("timestamp", Utc::now().timestamp_millis().to_string());
        params.insert("sign_method", "sha256".to_string());
        params.insert("refresh_token", current.refresh_token.clone());
        let sign = lazada_sign(&self.config.app_secret, LAZADA_REFRESH_PATH, &params)?;
        params.insert("sign", sign);

        let url = format!(
            "{}/rest{}",
            self.config.base_url.trim_end_matches('/'),
            LAZADA_REFRESH_PATH
        );

        debug!("Refreshing Lazada token");

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| SyncError::external("lazada", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::external("lazada", format!("status {}", status)));
        }

        let body: LazadaRefreshResponse = response.json().await.map_err(|e| SyncError::InvalidResponse {
            service: "lazada".into(),
            message: e.to_string(),
        })?;

        if body.code != "0" {
            return Err(SyncError::AuthFailed {
                service: "lazada".into(),
                message: format!("{}: {}", body.code, body.message),
            });
        }
        if body.access_token.is_empty() || body.refresh_token.is_empty() {
            return Err(SyncError::InvalidResponse {
                service: "lazada".into(),
                message: "missing token in response".into(),
            });
        }

        Ok(TokenSeed {
            access_token: body.access_token,
            refresh_token: body.refresh_token,
            ttl_secs: body.expires_in,
            account_id: current.account_id.clone(),
        })
    }
}

// =============================================================================
// Refresher
// =============================================================================

/// Result of a refresh check.
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    /// Nothing stored for the platform yet.
    NoToken,
    /// Still valid; left alone.
    Fresh { expires_at: DateTime<Utc> },
    Refreshed(MarketplaceToken),
}

/// Checks stored tokens and refreshes the expired ones.
#[derive(Clone)]
pub struct TokenRefresher {
    db: Database,
    exchangers: HashMap<MarketplacePlatform, Arc<dyn TokenExchanger>>,
}

impl TokenRefresher {
    pub fn new(db: Database) -> Self {
        TokenRefresher {
            db,
            exchangers: HashMap::new(),
        }
    }

    pub fn with_exchanger(mut self, exchanger: Arc<dyn TokenExchanger>) -> Self {
        self.exchangers.insert(exchanger.platform(), exchanger);
        self
    }

    /// Platforms with a registered exchanger.
    pub fn platforms(&self) -> Vec<MarketplacePlatform> {
        MarketplacePlatform::ALL
            .into_iter()
            .filter(|p| self.exchangers.contains_key(p))
            .collect()
    }

    pub async fn refresh_if_expired(&self, platform: MarketplacePlatform) -> SyncResult<RefreshOutcome> {
        self.refresh_if_expired_at(platform, Utc::now()).await
    }

    /// Same as [`refresh_if_expired`](Self::refresh_if_expired) with an
    /// explicit clock.
    ///
    /// ## Errors
    /// - `NotConfigured` when no exchanger is registered for the platform
    /// - Exchange failures from the marketplace; the stored row is unchanged
    pub async fn refresh_if_expired_at(
        &self,
        platform: MarketplacePlatform,
        now: DateTime<Utc>,
    ) -> SyncResult<RefreshOutcome> {
        let exchanger = self
            .exchangers
            .get(&platform)
            .ok_or(SyncError::NotConfigured { platform })?;

        let tokens = self.db.marketplace_tokens();
        let Some(current) = tokens.get(platform).await? else {
            debug!(platform = %platform, "No marketplace token stored");
            return Ok(RefreshOutcome::NoToken);
        };

        if !current.is_expired(now) {
            debug!(platform = %platform, expires_at = %current.expires_at(), "Marketplace token still valid");
            return Ok(RefreshOutcome::Fresh {
                expires_at: current.expires_at(),
            });
        }

        info!(platform = %platform, expired_at = %current.expires_at(), "Marketplace token expired, refreshing");

        let seed = match exchanger.refresh(&current).await {
            Ok(seed) => seed,
            Err(e) => {
                warn!(platform = %platform, error = %e, "Marketplace token refresh failed");
                return Err(e);
            }
        };

        let token = tokens.upsert_at(platform, &seed, now).await?;
        Ok(RefreshOutcome::Refreshed(token))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
