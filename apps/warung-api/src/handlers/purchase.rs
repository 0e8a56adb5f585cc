//! Purchase (goods received) endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use warung_core::{NewPurchase, PurchaseHeader, PurchaseTransaction};

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiQuery};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PurchaseQuery {
    #[serde(default)]
    pub id_supplier: Option<String>,
}

/// `POST /transaksiBeli`
pub async fn create_purchase(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewPurchase>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let purchase = state.db.purchases().create(&input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Transaksi pembelian berhasil ditambahkan",
            "id_htrans_beli": purchase.header.id,
        })),
    ))
}

/// `GET /transaksiBeli`
pub async fn list_purchases(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PurchaseQuery>,
) -> ApiResult<Json<Vec<PurchaseHeader>>> {
    Ok(Json(state.db.purchases().list(query.id_supplier.as_deref()).await?))
}

/// `GET /transaksiBeli/{id}`
pub async fn get_purchase(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PurchaseTransaction>> {
    Ok(Json(state.db.purchases().get(&id).await?))
}
