//! # Sync Error Types
//!
//! Error types for outbound calls and token refresh.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐  │
//! │  │  Configuration  │  │  External       │  │     Storage             │  │
//! │  │                 │  │                 │  │                         │  │
//! │  │  InvalidConfig  │  │  ExternalService│  │  Database               │  │
//! │  │  NotConfigured  │  │  AuthFailed     │  │                         │  │
//! │  │                 │  │  InvalidResponse│  │                         │  │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘  │
//! │                                                                         │
//! │  Webhook failures never surface as errors: they are logged and          │
//! │  dropped. Token exchange failures propagate to the caller.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;
use warung_core::MarketplacePlatform;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid configuration (bad URL, missing credential, ...).
    #[error("Invalid sync configuration: {0}")]
    InvalidConfig(String),

    /// No exchanger is registered for the platform.
    #[error("Marketplace {platform} is not configured")]
    NotConfigured { platform: MarketplacePlatform },

    // =========================================================================
    // External Service Errors
    // =========================================================================
    /// Transport failure or non-success status from a third party.
    #[error("{service} request failed: {message}")]
    ExternalService { service: String, message: String },

    /// The marketplace rejected the credentials or refresh token.
    #[error("{service} rejected authentication: {message}")]
    AuthFailed { service: String, message: String },

    /// The response body could not be understood.
    #[error("Invalid response from {service}: {message}")]
    InvalidResponse { service: String, message: String },

    // =========================================================================
    // Storage Errors
    // =========================================================================
    #[error("Database error: {0}")]
    Database(String),
}

impl SyncError {
    pub fn external(service: impl Into<String>, message: impl Into<String>) -> Self {
        SyncError::ExternalService {
            service: service.into(),
            message: message.into(),
        }
    }

    /// True for failures caused by a third party rather than local state.
    pub fn is_external(&self) -> bool {
        matches!(
            self,
            SyncError::ExternalService { .. }
                | SyncError::AuthFailed { .. }
                | SyncError::InvalidResponse { .. }
        )
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<warung_db::DbError> for SyncError {
    fn from(err: warung_db::DbError) -> Self {
        SyncError::Database(err.to_string())
    }
}
