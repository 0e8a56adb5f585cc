//! # Repository Module
//!
//! Database repository implementations for Warung POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Layout                                    │
//! │                                                                         │
//! │  axum handler                                                           │
//! │       │  db.sales().create(&sale)                                       │
//! │       ▼                                                                 │
//! │  SalesRepository ─────────┐  one transaction                            │
//! │       │                   │                                             │
//! │       ├── sequence::allocate_id / allocate_invoice                      │
//! │       ├── stock::decrement_in / increment_in                            │
//! │       └── INSERT header, details                                        │
//! │                                                                         │
//! │  The `*_in` / `allocate_*` helpers take a `&mut SqliteConnection` so    │
//! │  workflows can compose them inside their own transaction.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`SequenceRepository`](sequence::SequenceRepository) - Identifier and invoice counters
//! - [`StockRepository`](stock::StockRepository) - Stock ledger
//! - [`SalesRepository`](sales::SalesRepository) - Sales workflow
//! - [`PurchaseRepository`](purchase::PurchaseRepository) - Purchase workflow
//! - [`ProductRepository`](product::ProductRepository),
//!   [`CategoryRepository`](category::CategoryRepository),
//!   [`SupplierRepository`](supplier::SupplierRepository),
//!   [`UserRepository`](user::UserRepository) - Catalog and parties
//! - [`MarketplaceTokenRepository`](marketplace::MarketplaceTokenRepository) - OAuth token rows

pub mod category;
pub mod marketplace;
pub mod product;
pub mod purchase;
pub mod sales;
pub mod sequence;
pub mod stock;
pub mod supplier;
pub mod user;

#[cfg(test)]
pub(crate) mod test_support;
