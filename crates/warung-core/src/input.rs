//! # Workflow Inputs
//!
//! Request payloads accepted by the workflows, deserialized straight from
//! the shop's JSON. Numeric fields accept numbers or numeric strings.
//!
//! ```text
//! POST /transaksiJual                         NewSale
//! {                                           ├── buyer_user_id
//!   "id_user": "USR002",                      ├── seller_user_id
//!   "id_user_penjual": "USR001",              ├── buyer_name
//!   "nama_pembeli": "Budi",                   ├── date
//!   "tanggal": "2026-01-31",                  ├── total (optional)
//!   "total_harga": 30000,                     ├── payment_method
//!   "metode_pembayaran": "cash",              ├── channel
//!   "detail": [                               └── lines: Vec<NewSalesLine>
//!     { "id_produk": "PRO001", "satuan": "pcs",
//!       "jumlah_barang": "3", "harga_satuan": 10000 }
//!   ]
//! }
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::serde_helpers::{flexible_f64, flexible_i64, flexible_i64_opt, trimmed};
use crate::types::{SalesChannel, SalesStatus, UserRole};

// =============================================================================
// Sales
// =============================================================================

/// A new sales transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSale {
    #[serde(rename = "id_user", default)]
    pub buyer_user_id: Option<String>,
    #[serde(rename = "id_user_penjual", default)]
    pub seller_user_id: Option<String>,
    #[serde(rename = "nama_pembeli")]
    pub buyer_name: String,
    #[serde(rename = "tanggal")]
    pub date: NaiveDate,
    /// Header total. Falls back to the sum of line subtotals.
    #[serde(rename = "total_harga", default, deserialize_with = "flexible_i64_opt")]
    pub total: Option<i64>,
    #[serde(rename = "metode_pembayaran")]
    pub payment_method: String,
    #[serde(rename = "sumber", default)]
    pub channel: SalesChannel,
    #[serde(rename = "detail")]
    pub lines: Vec<NewSalesLine>,
}

impl NewSale {
    pub fn total_or_sum(&self) -> i64 {
        self.total
            .unwrap_or_else(|| self.lines.iter().map(|l| l.subtotal()).sum())
    }
}

/// One line of a sale. `quantity` may be fractional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSalesLine {
    #[serde(rename = "id_produk", deserialize_with = "trimmed")]
    pub product_id: String,
    #[serde(rename = "satuan", deserialize_with = "trimmed")]
    pub unit: String,
    #[serde(rename = "jumlah_barang", deserialize_with = "flexible_f64")]
    pub quantity: f64,
    #[serde(rename = "harga_satuan", deserialize_with = "flexible_i64")]
    pub unit_price: i64,
    #[serde(default, deserialize_with = "flexible_i64_opt")]
    pub subtotal: Option<i64>,
}

impl NewSalesLine {
    /// The given subtotal, or `unit_price × quantity` rounded to the rupiah.
    pub fn subtotal(&self) -> i64 {
        self.subtotal.unwrap_or_else(|| {
            Money::from_rupiah(self.unit_price)
                .line_total(self.quantity)
                .rupiah()
        })
    }
}

/// Header fields that a sales update may change. Absent fields are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SalesHeaderPatch {
    #[serde(rename = "id_user", default)]
    pub buyer_user_id: Option<String>,
    #[serde(rename = "id_user_penjual", default)]
    pub seller_user_id: Option<String>,
    #[serde(rename = "nama_pembeli", default)]
    pub buyer_name: Option<String>,
    #[serde(rename = "tanggal", default)]
    pub date: Option<NaiveDate>,
    #[serde(rename = "total_harga", default, deserialize_with = "flexible_i64_opt")]
    pub total: Option<i64>,
    #[serde(rename = "metode_pembayaran", default)]
    pub payment_method: Option<String>,
    #[serde(rename = "sumber", default)]
    pub channel: Option<SalesChannel>,
    #[serde(default)]
    pub status: Option<SalesStatus>,
}

/// `PUT /transaksiJual/transjual/{id}`: partial header plus the complete
/// replacement line list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesUpdate {
    #[serde(flatten)]
    pub header: SalesHeaderPatch,
    #[serde(rename = "detail")]
    pub lines: Vec<NewSalesLine>,
}

/// Filters for listing sales headers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SalesFilter {
    #[serde(default)]
    pub status: Option<SalesStatus>,
    /// Inclusive lower bound on the transaction date.
    #[serde(rename = "dari", default)]
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on the transaction date.
    #[serde(rename = "sampai", default)]
    pub to: Option<NaiveDate>,
    #[serde(rename = "id_user_penjual", default)]
    pub seller_user_id: Option<String>,
}

// =============================================================================
// Purchases
// =============================================================================

/// Goods received from a supplier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPurchase {
    #[serde(rename = "id_supplier")]
    pub supplier_id: String,
    #[serde(rename = "tanggal")]
    pub date: NaiveDate,
    #[serde(rename = "total_harga", default, deserialize_with = "flexible_i64_opt")]
    pub total: Option<i64>,
    #[serde(rename = "metode_pembayaran")]
    pub payment_method: String,
    #[serde(rename = "nomor_invoice", default)]
    pub invoice_number: Option<String>,
    #[serde(rename = "ppn", default, deserialize_with = "flexible_i64_opt")]
    pub tax: Option<i64>,
    #[serde(rename = "detail")]
    pub lines: Vec<NewPurchaseLine>,
}

impl NewPurchase {
    pub fn total_or_sum(&self) -> i64 {
        self.total.unwrap_or_else(|| {
            self.lines.iter().map(|l| l.subtotal()).sum::<i64>() + self.tax.unwrap_or(0)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPurchaseLine {
    #[serde(rename = "id_produk", deserialize_with = "trimmed")]
    pub product_id: String,
    #[serde(rename = "satuan", deserialize_with = "trimmed")]
    pub unit: String,
    #[serde(rename = "jumlah_barang", deserialize_with = "flexible_i64")]
    pub quantity: i64,
    #[serde(rename = "harga_satuan", deserialize_with = "flexible_i64")]
    pub unit_price: i64,
    #[serde(rename = "diskon_barang", default, deserialize_with = "flexible_i64_opt")]
    pub discount: Option<i64>,
    #[serde(default, deserialize_with = "flexible_i64_opt")]
    pub subtotal: Option<i64>,
}

impl NewPurchaseLine {
    /// The given subtotal, or `unit_price × quantity - discount`.
    pub fn subtotal(&self) -> i64 {
        self.subtotal.unwrap_or_else(|| {
            (Money::from_rupiah(self.unit_price) * self.quantity
                - Money::from_rupiah(self.discount.unwrap_or(0)))
            .rupiah()
        })
    }
}

// =============================================================================
// Stock
// =============================================================================

/// A new stock entry for a (product, unit) that has none yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStockEntry {
    #[serde(rename = "id_produk", deserialize_with = "trimmed")]
    pub product_id: String,
    #[serde(rename = "satuan", deserialize_with = "trimmed")]
    pub unit: String,
    #[serde(rename = "jumlah", default, deserialize_with = "flexible_i64_opt")]
    pub quantity: Option<i64>,
    #[serde(rename = "harga", deserialize_with = "flexible_i64")]
    pub unit_price: i64,
}

/// Manual unit conversion: take `from_amount` of `from_unit`, add
/// `to_amount` of `to_unit`. No price conversion is implied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockTransfer {
    #[serde(rename = "id_produk", deserialize_with = "trimmed")]
    pub product_id: String,
    #[serde(rename = "satuan_asal", deserialize_with = "trimmed")]
    pub from_unit: String,
    #[serde(rename = "satuan_tujuan", deserialize_with = "trimmed")]
    pub to_unit: String,
    #[serde(rename = "jumlah_asal", deserialize_with = "flexible_i64")]
    pub from_amount: i64,
    #[serde(rename = "jumlah_tujuan", deserialize_with = "flexible_i64")]
    pub to_amount: i64,
    /// Price for the target entry if it has to be created.
    #[serde(rename = "harga_tujuan", default, deserialize_with = "flexible_i64_opt")]
    pub to_unit_price: Option<i64>,
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    #[serde(rename = "id_kategori")]
    pub category_id: String,
    #[serde(rename = "nama_produk")]
    pub name: String,
    #[serde(rename = "deskripsi", default)]
    pub description: Option<String>,
    #[serde(rename = "gambar", default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductPatch {
    #[serde(rename = "id_kategori", default)]
    pub category_id: Option<String>,
    #[serde(rename = "nama_produk", default)]
    pub name: Option<String>,
    #[serde(rename = "deskripsi", default)]
    pub description: Option<String>,
    #[serde(rename = "gambar", default)]
    pub image: Option<String>,
}

/// Product list filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductFilter {
    #[serde(rename = "id_kategori", default)]
    pub category_id: Option<String>,
    /// Case-insensitive substring of the product name.
    #[serde(rename = "cari", default)]
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSupplier {
    #[serde(rename = "nama_supplier")]
    pub name: String,
    #[serde(rename = "no_telp", default)]
    pub phone: Option<String>,
    #[serde(rename = "keterangan", default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupplierPatch {
    #[serde(rename = "nama_supplier", default)]
    pub name: Option<String>,
    #[serde(rename = "no_telp", default)]
    pub phone: Option<String>,
    #[serde(rename = "keterangan", default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    #[serde(rename = "nama")]
    pub name: String,
    pub role: UserRole,
    #[serde(rename = "no_telp", default)]
    pub phone: Option<String>,
    #[serde(rename = "jenis_kelamin", default)]
    pub gender: Option<String>,
    #[serde(rename = "alamat", default)]
    pub address: Option<String>,
}

/// User update. A present `password` is re-hashed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPatch {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(rename = "nama", default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(rename = "no_telp", default)]
    pub phone: Option<String>,
    #[serde(rename = "jenis_kelamin", default)]
    pub gender: Option<String>,
    #[serde(rename = "alamat", default)]
    pub address: Option<String>,
    #[serde(rename = "aktif", default)]
    pub is_active: Option<bool>,
}

/// Shape of a stock price update body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockPriceUpdate {
    #[serde(rename = "harga", deserialize_with = "flexible_i64")]
    pub unit_price: i64,
}

/// Token pair pushed by the marketplace OAuth callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSeed {
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime in seconds (`expire_in` in both marketplaces' responses).
    #[serde(alias = "expire_in", alias = "expires_in", deserialize_with = "flexible_i64")]
    pub ttl_secs: i64,
    #[serde(default, alias = "shop_id", alias = "seller_id")]
    pub account_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sale_payload_with_string_numbers() {
        let sale: NewSale = serde_json::from_str(
            r#"{
                "id_user": "USR002",
                "id_user_penjual": "USR001",
                "nama_pembeli": "Budi",
                "tanggal": "2026-01-31",
                "metode_pembayaran": "cash",
                "detail": [
                    {"id_produk": "PRO001", "satuan": "pcs", "jumlah_barang": "3", "harga_satuan": "10000"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(sale.channel, SalesChannel::Toko);
        assert_eq!(sale.lines[0].quantity, 3.0);
        assert_eq!(sale.lines[0].subtotal(), 30_000);
        assert_eq!(sale.total_or_sum(), 30_000);
    }

    #[test]
    fn test_fractional_line_subtotal_rounds_to_rupiah() {
        let line = NewSalesLine {
            product_id: "PRO001".into(),
            unit: "kg".into(),
            quantity: 2.35,
            unit_price: 12_500,
            subtotal: None,
        };
        assert_eq!(line.subtotal(), 29_375);

        let explicit = NewSalesLine {
            subtotal: Some(29_000),
            ..line
        };
        assert_eq!(explicit.subtotal(), 29_000);
    }

    #[test]
    fn test_purchase_line_subtotal_applies_discount() {
        let line: NewPurchaseLine = serde_json::from_str(
            r#"{"id_produk": "PRO001", "satuan": "box", "jumlah_barang": 2, "harga_satuan": 50000, "diskon_barang": "5000"}"#,
        )
        .unwrap();
        assert_eq!(line.subtotal(), 95_000);
    }

    #[test]
    fn test_update_payload_flattens_header_patch() {
        let update: SalesUpdate = serde_json::from_str(
            r#"{"nama_pembeli": "Budi S.", "detail": [
                {"id_produk": "PRO001", "satuan": "pcs", "jumlah_barang": 8, "harga_satuan": 10000}
            ]}"#,
        )
        .unwrap();
        assert_eq!(update.header.buyer_name.as_deref(), Some("Budi S."));
        assert!(update.header.date.is_none());
        assert_eq!(update.lines.len(), 1);
    }
}
