//! Sales transaction endpoints.
//!
//! Writes go through `SalesRepository`, which owns the transaction; the
//! realtime event and webhook fire only after it has committed.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tracing::info;
use warung_core::{NewSale, SalesFilter, SalesHeader, SalesTransaction, SalesUpdate};
use warung_db::local_today;

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiQuery};
use crate::state::{AppState, SaleChange};

/// `POST /transaksiJual`
pub async fn create_sale(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewSale>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let sale = state.db.sales().create(&input).await?;
    state.announce(&sale, SaleChange::Created);

    info!(id = %sale.header.id, invoice = %sale.header.invoice_number, "Sale recorded");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Transaksi berhasil ditambahkan",
            "invoice": sale.header.invoice_number,
            "id_htrans_jual": sale.header.id,
        })),
    ))
}

/// `PUT /transaksiJual/transjual/{id_htrans_jual}`
pub async fn update_sale(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<SalesUpdate>,
) -> ApiResult<Json<Value>> {
    let sale = state
        .db
        .sales()
        .update(&id, &input)
        .await
        .map_err(ApiError::from_update)?;
    state.announce(&sale, SaleChange::Updated);

    Ok(Json(json!({ "message": "Transaksi berhasil diperbarui" })))
}

/// `GET /transaksiJual`
pub async fn list_sales(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<SalesFilter>,
) -> ApiResult<Json<Vec<SalesHeader>>> {
    Ok(Json(state.db.sales().list(&filter).await?))
}

/// `GET /transaksiJual/{id}`
pub async fn get_sale(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SalesTransaction>> {
    Ok(Json(state.db.sales().get(&id).await?))
}

/// `PATCH /transaksiJual/{id}/lunas`
pub async fn mark_paid(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SalesHeader>> {
    Ok(Json(state.db.sales().mark_paid(&id).await?))
}

/// `GET /transaksiJual/invoice/latest`: the number the next sale today
/// would get. Nothing is reserved.
pub async fn next_invoice(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let invoice = state.db.sequences().peek_next_invoice(local_today()).await?;
    Ok(Json(json!({ "nomor_invoice": invoice })))
}
