//! Supplier endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use warung_core::{NewSupplier, Supplier, SupplierPatch};

use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::state::AppState;

pub async fn list_suppliers(State(state): State<AppState>) -> ApiResult<Json<Vec<Supplier>>> {
    Ok(Json(state.db.suppliers().list().await?))
}

pub async fn get_supplier(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Supplier>> {
    state
        .db
        .suppliers()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Supplier", &id))
}

pub async fn create_supplier(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewSupplier>,
) -> ApiResult<(StatusCode, Json<Supplier>)> {
    let supplier = state.db.suppliers().create(&input).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

pub async fn update_supplier(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<SupplierPatch>,
) -> ApiResult<Json<Supplier>> {
    Ok(Json(state.db.suppliers().update(&id, &patch).await?))
}

pub async fn delete_supplier(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.db.suppliers().soft_delete(&id).await?;
    Ok(Json(json!({ "message": "Supplier berhasil dihapus" })))
}
