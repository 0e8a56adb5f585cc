//! # Warung API
//!
//! REST + WebSocket server for the shop backend.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Warung API Server                             │
//! │                                                                         │
//! │  Cashier app ──► HTTP (3000) ──► Handlers ──► warung-db ──► SQLite      │
//! │       ▲                              │                                  │
//! │       │                              │ after commit                     │
//! │       │                              ▼                                  │
//! │       └──── /ws/{id_user} ◄──── RealtimeHub        WebhookNotifier ───► │
//! │                                                                         │
//! │  RefreshScheduler ──► TokenRefresher ──► Shopee / Lazada OAuth          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! `warung.toml` in the platform config directory, then `WARUNG_*`
//! environment variables. See [`config::AppConfig`].

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::AppConfig;
pub use error::{ApiError, ApiResult};
pub use routes::build_router;
pub use state::{AppState, SaleChange};
