//! Product and category endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use warung_core::{Category, NewProduct, Product, ProductFilter, ProductPatch};

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiQuery};
use crate::state::AppState;

// =============================================================================
// Products
// =============================================================================

pub async fn list_products(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<ProductFilter>,
) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.db.products().list(&filter).await?))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product", &id))
}

pub async fn create_product(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewProduct>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let product = state.db.products().create(&input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<ProductPatch>,
) -> ApiResult<Json<Product>> {
    Ok(Json(state.db.products().update(&id, &patch).await?))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.db.products().soft_delete(&id).await?;
    Ok(Json(json!({ "message": "Produk berhasil dihapus" })))
}

// =============================================================================
// Categories
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CategoryBody {
    pub nama_kategori: String,
}

pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.db.categories().list().await?))
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Category>> {
    state
        .db
        .categories()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Category", &id))
}

pub async fn create_category(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CategoryBody>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let category = state.db.categories().create(&body.nama_kategori).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn rename_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<CategoryBody>,
) -> ApiResult<Json<Category>> {
    Ok(Json(state.db.categories().rename(&id, &body.nama_kategori).await?))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.db.categories().soft_delete(&id).await?;
    Ok(Json(json!({ "message": "Kategori berhasil dihapus" })))
}
