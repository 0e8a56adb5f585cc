//! # warung-db: Database Layer for Warung POS
//!
//! SQLite persistence for the shop backend, on sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Warung POS Data Flow                             │
//! │                                                                         │
//! │  POST /transaksiJual (warung-api)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                     warung-db (THIS CRATE)                      │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐   │    │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │   │    │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │   │    │
//! │  │   │               │    │ SalesRepo      │    │              │   │    │
//! │  │   │ SqlitePool    │◄───│ StockRepo      │    │ 001_initial_ │   │    │
//! │  │   │ WAL, FKs on   │    │ SequenceRepo   │    │   schema.sql │   │    │
//! │  │   │               │    │ ...            │    │              │   │    │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘   │    │
//! │  │                                                                 │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                     SQLite Database                             │    │
//! │  │   ~/.local/share/warung/warung.db                               │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repositories and the sales/purchase workflows
//!
//! ## Usage
//!
//! ```rust,ignore
//! use warung_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("warung.db")).await?;
//!
//! let sale = db.sales().create(&new_sale).await?;
//! println!("{} {}", sale.header.id, sale.header.invoice_number);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::category::CategoryRepository;
pub use repository::marketplace::MarketplaceTokenRepository;
pub use repository::product::ProductRepository;
pub use repository::purchase::PurchaseRepository;
pub use repository::sales::SalesRepository;
pub use repository::sequence::{local_today, SequenceRepository};
pub use repository::stock::{StockRepository, TransferOutcome};
pub use repository::supplier::SupplierRepository;
pub use repository::user::UserRepository;
