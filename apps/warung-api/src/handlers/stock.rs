//! Stock ledger endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use warung_core::{NewStockEntry, StockEntry, StockPriceUpdate, StockTransfer};
use warung_db::TransferOutcome;

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiQuery};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct StockQuery {
    #[serde(default)]
    pub id_produk: Option<String>,
}

/// `GET /stok`
pub async fn list_stock(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<StockQuery>,
) -> ApiResult<Json<Vec<StockEntry>>> {
    Ok(Json(state.db.stock().list(query.id_produk.as_deref()).await?))
}

/// `GET /stok/{id}`
pub async fn get_stock(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<StockEntry>> {
    state
        .db
        .stock()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("StockEntry", &id))
}

/// `POST /stok`
pub async fn create_stock(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewStockEntry>,
) -> ApiResult<(StatusCode, Json<StockEntry>)> {
    let entry = state.db.stock().create(&input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// `PUT /stok/{id}`: price only; quantities move through transactions.
pub async fn update_stock_price(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<StockPriceUpdate>,
) -> ApiResult<Json<StockEntry>> {
    Ok(Json(state.db.stock().update_price(&id, input.unit_price).await?))
}

/// `DELETE /stok/{id}`
pub async fn delete_stock(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.db.stock().soft_delete(&id).await?;
    Ok(Json(json!({ "message": "Stok berhasil dihapus" })))
}

/// `POST /stok/konversi`
pub async fn transfer_stock(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<StockTransfer>,
) -> ApiResult<Json<TransferOutcome>> {
    Ok(Json(state.db.stock().transfer(&input).await?))
}
