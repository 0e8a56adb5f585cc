//! # warung-sync: Outbound Side Effects for Warung POS
//!
//! Everything the backend pushes out of process: realtime events to
//! connected sellers, webhook notifications, and the marketplace OAuth
//! token lifecycle.
//!
//! ## Where It Sits
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  warung-api handler                                                     │
//! │       │  db.sales().create(..)  ── commit ──┐                           │
//! │       │                                     ▼                           │
//! │       │                    ┌──────────────────────────────────┐         │
//! │       │                    │  EventPublisher::publish         │         │
//! │       │                    │  WebhookNotifier::dispatch       │         │
//! │       │                    │  (never block, never roll back)  │         │
//! │       │                    └──────────────────────────────────┘         │
//! │       ▼                                                                 │
//! │  201 Created                                                            │
//! │                                                                         │
//! │  RefreshScheduler ── every N secs ──► TokenRefresher ──► Shopee/Lazada  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`realtime`] - Broadcast hub and per-user WebSocket forwarding
//! - [`notify`] - Detached webhook delivery
//! - [`marketplace`] - Token exchangers and the expiry check
//! - [`scheduler`] - Interval loops driving the refresher
//! - [`error`] - Sync error types

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod marketplace;
pub mod notify;
pub mod realtime;
pub mod scheduler;
mod sign;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{SyncError, SyncResult};
pub use marketplace::{
    LazadaConfig, LazadaExchanger, RefreshOutcome, ShopeeConfig, ShopeeExchanger, TokenExchanger,
    TokenRefresher,
};
pub use notify::{Notification, WebhookNotifier};
pub use realtime::{EventPublisher, RealtimeHub, RealtimeMessage, SalesEvent};
pub use scheduler::RefreshScheduler;
