//! # API Error Types
//!
//! Every handler returns [`ApiResult`]; the error side renders as
//! `{"message": "..."}` with extra fields where the client needs them.
//!
//! ```text
//! DbError::NotFound                     → 404
//! DbError::UniqueViolation              → 409
//! CoreError::Validation, JSON rejection → 400
//! CoreError::InsufficientStock          → 400 + stok_tidak_cukup[]   (create)
//!                                       → 500                        (update)
//! CoreError::InvalidSalesStatus         → 409
//! SyncError::ExternalService/AuthFailed → 502
//! anything else                         → 500, details only in the log
//! ```

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;
use warung_core::{CoreError, Shortfall};
use warung_db::DbError;
use warung_sync::SyncError;

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Stok tidak cukup")]
    InsufficientStock { shortfalls: Vec<Shortfall> },

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// A sales update failed and was rolled back.
    #[error("Gagal memperbarui transaksi: {0}")]
    UpdateFailed(String),

    #[error("{0}")]
    BadGateway(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        ApiError::NotFound(format!("{} not found: {}", entity, id))
    }

    /// Error mapping for the sales update path: stock shortfalls and store
    /// failures both surface as 500 with the reason.
    pub fn from_update(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. }
            | DbError::Domain(CoreError::Validation(_))
            | DbError::Domain(CoreError::InvalidSalesStatus { .. }) => err.into(),
            DbError::Domain(CoreError::InsufficientStock { .. }) => ApiError::UpdateFailed(err.to_string()),
            other => {
                error!(error = %other, "Sales update failed");
                ApiError::UpdateFailed("kesalahan penyimpanan".to_string())
            }
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::UpdateFailed(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::InsufficientStock { shortfalls } => json!({
                "message": self.to_string(),
                "stok_tidak_cukup": shortfalls,
            }),
            ApiError::Internal(detail) => {
                error!(error = %detail, "Request failed");
                json!({ "message": "Terjadi kesalahan pada server" })
            }
            _ => json!({ "message": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { .. } => ApiError::Conflict(err.to_string()),
            DbError::ForeignKeyViolation { .. } => ApiError::BadRequest(err.to_string()),
            DbError::Domain(core) => core.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InsufficientStock { shortfalls } => ApiError::InsufficientStock { shortfalls },
            CoreError::InvalidSalesStatus { .. } => ApiError::Conflict(err.to_string()),
            CoreError::Validation(v) => ApiError::BadRequest(v.to_string()),
        }
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::NotConfigured { .. } => ApiError::NotFound(err.to_string()),
            e if e.is_external() => ApiError::BadGateway(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err: ApiError = DbError::not_found("Sales transaction", "HTJ999999").into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: ApiError = CoreError::insufficient(Shortfall::new("PRO001", "pcs", 1, 3)).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: ApiError = DbError::duplicate("username", "kasir").into();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err: ApiError = SyncError::external("shopee", "timeout").into();
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_update_shortfall_is_server_error() {
        let db_err: DbError = CoreError::insufficient(Shortfall::new("PRO001", "pcs", 1, 3)).into();
        let err = ApiError::from_update(db_err);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("PRO001/pcs"));

        let err = ApiError::from_update(DbError::not_found("Sales transaction", "HTJ000009"));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_update_on_paid_sale_is_conflict() {
        let db_err: DbError = CoreError::InvalidSalesStatus {
            id: "HTJ000001".to_string(),
            status: "lunas".to_string(),
        }
        .into();
        assert_eq!(ApiError::from_update(db_err).status(), StatusCode::CONFLICT);
    }
}
