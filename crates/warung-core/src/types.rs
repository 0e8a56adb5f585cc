//! # Domain Types
//!
//! Stored entities of the shop backend.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Catalog                 Stock Ledger            Parties                │
//! │  ┌──────────────┐        ┌────────────────┐      ┌──────────────┐       │
//! │  │ Category KAT │◄───┐   │ StockEntry STK │      │ Supplier SUP │       │
//! │  └──────────────┘    │   │ (product,unit) │      │ User     USR │       │
//! │  ┌──────────────┐    │   │ quantity, price│      └──────────────┘       │
//! │  │ Product  PRO │────┘   └────────────────┘                             │
//! │  └──────────────┘                                                       │
//! │                                                                         │
//! │  Transactions (header 1 ── n detail)                                    │
//! │  ┌────────────────────┐ ┌────────────────────┐                          │
//! │  │ PurchaseHeader HTB │ │ SalesHeader    HTJ │  invoice INV/DATE/SEQ    │
//! │  │ PurchaseDetail DTB │ │ SalesDetail    DTJ │  status Pending|Lunas    │
//! │  └────────────────────┘ └────────────────────┘                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rust field names are English. Serialized names follow the shop's
//! Indonesian JSON API (`id_produk`, `satuan`, `jumlah_barang`, ...), so the
//! same structs go over the wire and into the generated TypeScript bindings.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Enumerations
// =============================================================================

/// Role of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Cashier / seller. Receives realtime sales events.
    #[serde(alias = "penjual")]
    Seller,
    /// Warehouse staff (purchases, stock conversion).
    #[serde(alias = "gudang")]
    Warehouse,
    Admin,
}

impl std::str::FromStr for UserRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "seller" | "penjual" => Ok(UserRole::Seller),
            "warehouse" | "gudang" => Ok(UserRole::Warehouse),
            "admin" => Ok(UserRole::Admin),
            _ => Err(ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: vec!["seller".into(), "warehouse".into(), "admin".into()],
            }),
        }
    }
}

/// Payment status of a sales transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "PascalCase"))]
#[ts(export)]
pub enum SalesStatus {
    /// Created, not yet paid.
    #[default]
    Pending,
    /// Paid in full.
    #[serde(alias = "Paid", alias = "lunas")]
    Lunas,
}

impl std::fmt::Display for SalesStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SalesStatus::Pending => write!(f, "Pending"),
            SalesStatus::Lunas => write!(f, "Lunas"),
        }
    }
}

/// Channel a sale came in through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SalesChannel {
    /// In-store counter sale.
    #[default]
    Toko,
    Shopee,
    Lazada,
}

/// Marketplace whose OAuth token pair is kept in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum MarketplacePlatform {
    Shopee,
    Lazada,
}

impl MarketplacePlatform {
    pub const ALL: [MarketplacePlatform; 2] =
        [MarketplacePlatform::Shopee, MarketplacePlatform::Lazada];

    pub fn as_str(&self) -> &'static str {
        match self {
            MarketplacePlatform::Shopee => "shopee",
            MarketplacePlatform::Lazada => "lazada",
        }
    }
}

impl std::fmt::Display for MarketplacePlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MarketplacePlatform {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "shopee" => Ok(MarketplacePlatform::Shopee),
            "lazada" => Ok(MarketplacePlatform::Lazada),
            _ => Err(ValidationError::NotAllowed {
                field: "platform".to_string(),
                allowed: vec!["shopee".into(), "lazada".into()],
            }),
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// A product category. Names are unique.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    /// `KAT001`, `KAT002`, ...
    #[serde(rename = "id_kategori")]
    pub id: String,
    #[serde(rename = "nama_kategori")]
    pub name: String,
    #[serde(rename = "aktif")]
    pub is_active: bool,
}

/// A product in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// `PRO001`, `PRO002`, ...
    #[serde(rename = "id_produk")]
    pub id: String,
    #[serde(rename = "id_kategori")]
    pub category_id: String,
    #[serde(rename = "nama_produk")]
    pub name: String,
    #[serde(rename = "deskripsi")]
    pub description: Option<String>,
    /// Image payload as sent by the client (base64 data URL).
    #[serde(rename = "gambar")]
    pub image: Option<String>,
    /// Soft-delete flag.
    #[serde(rename = "aktif")]
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Stock Ledger
// =============================================================================

/// Quantity and price of one product in one unit ("box", "pcs", ...).
///
/// At most one active entry exists per (product, unit).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockEntry {
    /// `STK001`, `STK002`, ...
    #[serde(rename = "id_stok")]
    pub id: String,
    #[serde(rename = "id_produk")]
    pub product_id: String,
    #[serde(rename = "satuan")]
    pub unit: String,
    /// Whole units on hand. Never negative.
    #[serde(rename = "jumlah")]
    pub quantity: i64,
    /// Unit price in rupiah.
    #[serde(rename = "harga")]
    pub unit_price: i64,
    #[serde(rename = "aktif")]
    pub is_active: bool,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Parties
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Supplier {
    /// `SUP001`, `SUP002`, ...
    #[serde(rename = "id_supplier")]
    pub id: String,
    #[serde(rename = "nama_supplier")]
    pub name: String,
    #[serde(rename = "no_telp")]
    pub phone: Option<String>,
    #[serde(rename = "keterangan")]
    pub notes: Option<String>,
    #[serde(rename = "aktif")]
    pub is_active: bool,
}

/// A user account. The password hash never leaves the backend.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    /// `USR001`, `USR002`, ...
    #[serde(rename = "id_user")]
    pub id: String,
    pub username: String,
    /// Argon2 PHC string.
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,
    #[serde(rename = "nama")]
    pub name: String,
    pub role: UserRole,
    #[serde(rename = "no_telp")]
    pub phone: Option<String>,
    #[serde(rename = "jenis_kelamin")]
    pub gender: Option<String>,
    #[serde(rename = "alamat")]
    pub address: Option<String>,
    #[serde(rename = "aktif")]
    pub is_active: bool,
}

// =============================================================================
// Purchase Transactions
// =============================================================================

/// Goods received from a supplier.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PurchaseHeader {
    /// `HTB000001`, ...
    #[serde(rename = "id_htrans_beli")]
    pub id: String,
    #[serde(rename = "id_supplier")]
    pub supplier_id: String,
    #[ts(as = "String")]
    #[serde(rename = "tanggal")]
    pub date: NaiveDate,
    #[serde(rename = "total_harga")]
    pub total: i64,
    #[serde(rename = "metode_pembayaran")]
    pub payment_method: String,
    /// The supplier's own invoice number, if any.
    #[serde(rename = "nomor_invoice")]
    pub invoice_number: Option<String>,
    #[serde(rename = "ppn")]
    pub tax: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PurchaseDetail {
    /// `DTB000001`, ...
    #[serde(rename = "id_dtrans_beli")]
    pub id: String,
    #[serde(rename = "id_htrans_beli")]
    pub header_id: String,
    #[serde(rename = "id_produk")]
    pub product_id: String,
    #[serde(rename = "satuan")]
    pub unit: String,
    #[serde(rename = "jumlah_barang")]
    pub quantity: i64,
    #[serde(rename = "harga_satuan")]
    pub unit_price: i64,
    #[serde(rename = "diskon_barang")]
    pub discount: i64,
    pub subtotal: i64,
}

// =============================================================================
// Sales Transactions
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SalesHeader {
    /// `HTJ000001`, ...
    #[serde(rename = "id_htrans_jual")]
    pub id: String,
    /// Buyer-side user account (member customers), if any.
    #[serde(rename = "id_user")]
    pub buyer_user_id: Option<String>,
    /// Seller-side user; addressee of realtime events.
    #[serde(rename = "id_user_penjual")]
    pub seller_user_id: Option<String>,
    #[serde(rename = "nama_pembeli")]
    pub buyer_name: String,
    #[ts(as = "String")]
    #[serde(rename = "tanggal")]
    pub date: NaiveDate,
    #[serde(rename = "total_harga")]
    pub total: i64,
    #[serde(rename = "metode_pembayaran")]
    pub payment_method: String,
    /// `INV/YYYYMMDD/NNNNNN`
    #[serde(rename = "nomor_invoice")]
    pub invoice_number: String,
    pub status: SalesStatus,
    #[serde(rename = "sumber")]
    pub channel: SalesChannel,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A sales line. Quantity may be fractional; the ledger is charged
/// `ceil(quantity)` whole units.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SalesDetail {
    /// `DTJ000001`, ...
    #[serde(rename = "id_dtrans_jual")]
    pub id: String,
    #[serde(rename = "id_htrans_jual")]
    pub header_id: String,
    #[serde(rename = "id_produk")]
    pub product_id: String,
    #[serde(rename = "satuan")]
    pub unit: String,
    #[serde(rename = "jumlah_barang")]
    pub quantity: f64,
    #[serde(rename = "harga_satuan")]
    pub unit_price: i64,
    pub subtotal: i64,
}

/// A sales header together with its lines.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesTransaction {
    #[serde(flatten)]
    pub header: SalesHeader,
    #[serde(rename = "detail")]
    pub details: Vec<SalesDetail>,
}

/// A purchase header together with its lines.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseTransaction {
    #[serde(flatten)]
    pub header: PurchaseHeader,
    #[serde(rename = "detail")]
    pub details: Vec<PurchaseDetail>,
}

// =============================================================================
// Marketplace Tokens
// =============================================================================

/// The stored OAuth token pair for one marketplace. One row per platform.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct MarketplaceToken {
    pub platform: MarketplacePlatform,
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds, as reported by the marketplace.
    pub ttl_secs: i64,
    /// Shop (Shopee) or seller (Lazada) the token is bound to.
    pub account_id: Option<String>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl MarketplaceToken {
    /// When the access token stops being valid.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.updated_at + Duration::seconds(self.ttl_secs)
    }

    /// `now >= updated_at + ttl`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn token(updated_at: DateTime<Utc>, ttl_secs: i64) -> MarketplaceToken {
        MarketplaceToken {
            platform: MarketplacePlatform::Shopee,
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            ttl_secs,
            account_id: None,
            updated_at,
        }
    }

    #[test]
    fn test_token_expiry_boundary() {
        let updated = Utc.with_ymd_and_hms(2026, 1, 31, 8, 0, 0).unwrap();
        let token = token(updated, 14_400);

        assert!(!token.is_expired(updated + Duration::seconds(14_399)));
        assert!(token.is_expired(updated + Duration::seconds(14_400)));
        assert!(token.is_expired(updated + Duration::days(1)));
    }

    #[test]
    fn test_role_parsing_accepts_indonesian_aliases() {
        assert_eq!("penjual".parse::<UserRole>().unwrap(), UserRole::Seller);
        assert_eq!("Gudang".parse::<UserRole>().unwrap(), UserRole::Warehouse);
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert!("kasir".parse::<UserRole>().is_err());

        let role: UserRole = serde_json::from_str("\"penjual\"").unwrap();
        assert_eq!(role, UserRole::Seller);
    }

    #[test]
    fn test_sales_status_wire_format() {
        assert_eq!(serde_json::to_string(&SalesStatus::Lunas).unwrap(), "\"Lunas\"");
        let status: SalesStatus = serde_json::from_str("\"Paid\"").unwrap();
        assert_eq!(status, SalesStatus::Lunas);
        assert_eq!(SalesStatus::default(), SalesStatus::Pending);
    }

    #[test]
    fn test_platform_round_trip_through_str() {
        for platform in MarketplacePlatform::ALL {
            assert_eq!(platform.as_str().parse::<MarketplacePlatform>().unwrap(), platform);
        }
    }
}
