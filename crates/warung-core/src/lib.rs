//! # warung-core: Pure Business Logic for Warung POS
//!
//! Domain types and the rules behind the shop's stock and transaction
//! workflows, as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Warung POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 warung-api (axum REST handlers)                 │   │
//! │  │   POST /transaksiJual, PUT /transaksiJual/transjual/{id}, ...   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ warung-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐ │   │
//! │  │   │  types  │ │   ids   │ │ invoice │ │  stock  │ │validation│ │   │
//! │  │   │ Product │ │ PRO001  │ │ INV/... │ │ ceil(q) │ │  rules   │ │   │
//! │  │   │ Sales.. │ │ HTJ0001 │ │ per day │ │ plans   │ │          │ │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └──────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          warung-db (SQLite, counters, atomic workflows)         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Stored entities (Product, StockEntry, SalesHeader, ...)
//! - [`input`] - Workflow inputs (new sale, header patch, purchase lines)
//! - [`ids`] - Prefixed, zero-padded identifiers (`PRO001`, `HTJ000001`)
//! - [`invoice`] - Sales invoice numbers (`INV/20260131/000001`)
//! - [`stock`] - Ceiling consumption rule, shortfalls, update reconciliation
//! - [`money`] - Integer rupiah amounts
//! - [`serde_helpers`] - Numbers sent as JSON numbers or numeric strings
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use warung_core::ids::EntityKind;
//! use warung_core::stock::required_units;
//!
//! assert_eq!(EntityKind::SalesHeader.format(1), "HTJ000001");
//!
//! // Partial units consume a whole unit of stock
//! assert_eq!(required_units(2.3), 3);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ids;
pub mod input;
pub mod invoice;
pub mod money;
pub mod serde_helpers;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use ids::EntityKind;
pub use input::*;
pub use money::Money;
pub use stock::{LineKey, Shortfall};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of detail lines accepted in one transaction.
pub const MAX_TRANSACTION_LINES: usize = 200;

/// Maximum quantity of a single line.
///
/// Guards against typos such as `10000` instead of `10` on a sale.
pub const MAX_LINE_QUANTITY: f64 = 100_000.0;

/// Upper bound for any client-supplied rupiah amount (price, subtotal,
/// discount, tax, total).
///
/// `MAX_AMOUNT × MAX_LINE_QUANTITY × MAX_TRANSACTION_LINES` stays well
/// inside `i64`, so totals computed from validated input cannot overflow.
pub const MAX_AMOUNT: i64 = 10_000_000_000;
