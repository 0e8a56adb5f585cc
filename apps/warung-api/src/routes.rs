//! Router assembly.
//!
//! ```text
//! public:     POST /login   GET /health   GET /ws/{id_user}
//! protected:  everything else (Bearer JWT when auth.enabled)
//! layers:     TraceLayer → CORS → [auth guard] → handler
//! ```

use axum::http::HeaderValue;
use axum::middleware;
use axum::routing::{get, patch, post, put};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::auth::require_auth;
use crate::handlers::{
    auth, catalog, health, marketplace, purchase, realtime, sales, stock, supplier, user,
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        // Sales
        .route("/transaksiJual", get(sales::list_sales).post(sales::create_sale))
        .route("/transaksiJual/invoice/latest", get(sales::next_invoice))
        .route("/transaksiJual/transjual/{id}", put(sales::update_sale))
        .route("/transaksiJual/{id}", get(sales::get_sale))
        .route("/transaksiJual/{id}/lunas", patch(sales::mark_paid))
        // Purchases
        .route(
            "/transaksiBeli",
            get(purchase::list_purchases).post(purchase::create_purchase),
        )
        .route("/transaksiBeli/{id}", get(purchase::get_purchase))
        // Stock
        .route("/stok", get(stock::list_stock).post(stock::create_stock))
        .route("/stok/konversi", post(stock::transfer_stock))
        .route(
            "/stok/{id}",
            get(stock::get_stock)
                .put(stock::update_stock_price)
                .delete(stock::delete_stock),
        )
        // Catalog
        .route("/produk", get(catalog::list_products).post(catalog::create_product))
        .route(
            "/produk/{id}",
            get(catalog::get_product)
                .put(catalog::update_product)
                .delete(catalog::delete_product),
        )
        .route(
            "/kategori",
            get(catalog::list_categories).post(catalog::create_category),
        )
        .route(
            "/kategori/{id}",
            get(catalog::get_category)
                .put(catalog::rename_category)
                .delete(catalog::delete_category),
        )
        .route(
            "/supplier",
            get(supplier::list_suppliers).post(supplier::create_supplier),
        )
        .route(
            "/supplier/{id}",
            get(supplier::get_supplier)
                .put(supplier::update_supplier)
                .delete(supplier::delete_supplier),
        )
        .route("/user", get(user::list_users).post(user::create_user))
        .route(
            "/user/{id}",
            get(user::get_user).put(user::update_user).delete(user::delete_user),
        )
        // Marketplace
        .route(
            "/marketplace/{platform}/token",
            get(marketplace::get_token).put(marketplace::put_token),
        )
        .route("/marketplace/{platform}/refresh", post(marketplace::refresh_token));

    let protected = if state.config.auth.enabled {
        protected.route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
    } else {
        warn!("Authentication disabled, every route is public");
        protected
    };

    let public = Router::new()
        .route("/login", post(auth::login))
        .route("/health", get(health::health))
        .route("/ws/{id_user}", get(realtime::connect));

    let cors = cors_layer(&state.config.server.cors_origins);

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}
