//! `POST /login`

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use warung_core::User;

use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = state
        .db
        .users()
        .verify_credentials(&request.username, &request.password)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Username atau password salah".to_string()))?;

    let token = state.jwt.generate_token(&user)?;
    info!(user_id = %user.id, role = ?user.role, "User logged in");

    Ok(Json(LoginResponse { token, user }))
}
