//! # Identifier Format
//!
//! Every stored entity carries a human-readable identifier: a fixed
//! three-letter prefix followed by a zero-padded decimal sequence.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Entity            Prefix  Width  Seed                                  │
//! │  ───────────────── ──────  ─────  ─────────                             │
//! │  Product           PRO     3      PRO001                                │
//! │  Category          KAT     3      KAT001                                │
//! │  StockEntry        STK     3      STK001                                │
//! │  Supplier          SUP     3      SUP001                                │
//! │  User              USR     3      USR001                                │
//! │  PurchaseHeader    HTB     6      HTB000001                             │
//! │  PurchaseDetail    DTB     6      DTB000001                             │
//! │  SalesHeader       HTJ     6      HTJ000001                             │
//! │  SalesDetail       DTJ     6      DTJ000001                             │
//! │                                                                         │
//! │  Past the width the suffix simply grows: PRO999 → PRO1000               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! This module only formats. Allocation of the next sequence
//! value is an atomic counter in `warung-db`, incremented inside the same
//! transaction as the insert it names.

use serde::{Deserialize, Serialize};

/// The kinds of entity that receive prefixed identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Product,
    Category,
    Stock,
    Supplier,
    User,
    PurchaseHeader,
    PurchaseDetail,
    SalesHeader,
    SalesDetail,
}

impl EntityKind {
    pub const ALL: [EntityKind; 9] = [
        EntityKind::Product,
        EntityKind::Category,
        EntityKind::Stock,
        EntityKind::Supplier,
        EntityKind::User,
        EntityKind::PurchaseHeader,
        EntityKind::PurchaseDetail,
        EntityKind::SalesHeader,
        EntityKind::SalesDetail,
    ];

    /// Fixed identifier prefix. Also the counter key in `id_sequences`.
    pub const fn prefix(&self) -> &'static str {
        match self {
            EntityKind::Product => "PRO",
            EntityKind::Category => "KAT",
            EntityKind::Stock => "STK",
            EntityKind::Supplier => "SUP",
            EntityKind::User => "USR",
            EntityKind::PurchaseHeader => "HTB",
            EntityKind::PurchaseDetail => "DTB",
            EntityKind::SalesHeader => "HTJ",
            EntityKind::SalesDetail => "DTJ",
        }
    }

    /// Minimum number of digits in the numeric suffix.
    pub const fn width(&self) -> usize {
        match self {
            EntityKind::PurchaseHeader
            | EntityKind::PurchaseDetail
            | EntityKind::SalesHeader
            | EntityKind::SalesDetail => 6,
            _ => 3,
        }
    }

    /// Formats a sequence value as an identifier.
    ///
    /// ## Example
    /// ```rust
    /// use warung_core::ids::EntityKind;
    ///
    /// assert_eq!(EntityKind::Product.format(12), "PRO012");
    /// assert_eq!(EntityKind::SalesDetail.format(7), "DTJ000007");
    /// assert_eq!(EntityKind::Product.format(1000), "PRO1000");
    /// ```
    pub fn format(&self, seq: u64) -> String {
        format!("{}{:0width$}", self.prefix(), seq, width = self.width())
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.prefix())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_identifiers() {
        assert_eq!(EntityKind::Product.format(1), "PRO001");
        assert_eq!(EntityKind::User.format(1), "USR001");
        assert_eq!(EntityKind::PurchaseHeader.format(1), "HTB000001");
        assert_eq!(EntityKind::SalesHeader.format(1), "HTJ000001");
    }

    #[test]
    fn test_prefixes_are_unique() {
        let mut prefixes: Vec<_> = EntityKind::ALL.iter().map(|k| k.prefix()).collect();
        prefixes.sort();
        prefixes.dedup();
        assert_eq!(prefixes.len(), EntityKind::ALL.len());
    }
}
