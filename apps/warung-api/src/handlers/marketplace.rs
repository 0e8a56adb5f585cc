//! Marketplace token endpoints.
//!
//! The access/refresh tokens themselves are never echoed back.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use warung_core::{MarketplacePlatform, MarketplaceToken, TokenSeed};
use warung_sync::RefreshOutcome;

use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TokenStatus {
    pub platform: MarketplacePlatform,
    pub account_id: Option<String>,
    pub ttl_secs: i64,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub expired: bool,
}

impl TokenStatus {
    fn of(token: &MarketplaceToken, now: DateTime<Utc>) -> Self {
        TokenStatus {
            platform: token.platform,
            account_id: token.account_id.clone(),
            ttl_secs: token.ttl_secs,
            updated_at: token.updated_at,
            expires_at: token.expires_at(),
            expired: token.is_expired(now),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// `no_token`, `fresh` or `refreshed`
    pub status: &'static str,
    pub expires_at: Option<DateTime<Utc>>,
}

fn parse_platform(raw: &str) -> ApiResult<MarketplacePlatform> {
    raw.parse().map_err(|e: warung_core::ValidationError| ApiError::BadRequest(e.to_string()))
}

/// `GET /marketplace/{platform}/token`
pub async fn get_token(
    State(state): State<AppState>,
    Path(platform): Path<String>,
) -> ApiResult<Json<TokenStatus>> {
    let platform = parse_platform(&platform)?;
    let token = state
        .db
        .marketplace_tokens()
        .get(platform)
        .await?
        .ok_or_else(|| ApiError::not_found("MarketplaceToken", platform.as_str()))?;
    Ok(Json(TokenStatus::of(&token, Utc::now())))
}

/// `PUT /marketplace/{platform}/token`: store the pair from the OAuth
/// callback.
pub async fn put_token(
    State(state): State<AppState>,
    Path(platform): Path<String>,
    ApiJson(seed): ApiJson<TokenSeed>,
) -> ApiResult<Json<TokenStatus>> {
    let platform = parse_platform(&platform)?;
    let token = state.db.marketplace_tokens().upsert(platform, &seed).await?;
    Ok(Json(TokenStatus::of(&token, Utc::now())))
}

/// `POST /marketplace/{platform}/refresh`: run the expiry check now.
pub async fn refresh_token(
    State(state): State<AppState>,
    Path(platform): Path<String>,
) -> ApiResult<Json<RefreshResponse>> {
    let platform = parse_platform(&platform)?;
    let response = match state.refresher.refresh_if_expired(platform).await? {
        RefreshOutcome::NoToken => RefreshResponse {
            status: "no_token",
            expires_at: None,
        },
        RefreshOutcome::Fresh { expires_at } => RefreshResponse {
            status: "fresh",
            expires_at: Some(expires_at),
        },
        RefreshOutcome::Refreshed(token) => RefreshResponse {
            status: "refreshed",
            expires_at: Some(token.expires_at()),
        },
    };
    Ok(Json(response))
}
