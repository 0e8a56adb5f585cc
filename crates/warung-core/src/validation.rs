//! # Validation Module
//!
//! Input validation for the workflows. Everything here runs before any
//! database work, so a rejected request has no side effects.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: axum extractors (warung-api)                                  │
//! │  ├── JSON shape, dates, numbers-or-numeric-strings                      │
//! │  └── Rejection → 400                                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  ├── required fields, lengths, positive quantities                      │
//! │  └── duplicate (product, unit) lines                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite (warung-db)                                            │
//! │  ├── NOT NULL / UNIQUE / CHECK (quantity >= 0)                          │
//! │  └── Foreign keys                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use warung_core::validation::{validate_sale_quantity, validate_unit};
//!
//! assert!(validate_unit("pcs").is_ok());
//! assert!(validate_sale_quantity(2.5).is_ok());
//! assert!(validate_sale_quantity(0.0).is_err());
//! ```

use crate::error::ValidationError;
use crate::input::{NewPurchase, NewSale, NewSalesLine, SalesHeaderPatch, StockTransfer};
use crate::stock::{ensure_unique_keys, LineKey};
use crate::{MAX_AMOUNT, MAX_LINE_QUANTITY, MAX_TRANSACTION_LINES};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Non-empty after trimming, at most `max` characters.
pub fn validate_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a product, category or supplier name.
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    validate_text(field, name, 200)
}

/// Validates an entity reference such as `PRO001`.
pub fn validate_reference(field: &str, id: &str) -> ValidationResult<()> {
    validate_text(field, id, 32)
}

/// Validates a stock unit label ("pcs", "box", "kg", ...).
pub fn validate_unit(unit: &str) -> ValidationResult<()> {
    validate_text("satuan", unit, 30)
}

/// Validates a login name.
///
/// ## Rules
/// - 3 to 50 characters
/// - Letters, digits, `.`, `_` and `-` only
pub fn validate_username(username: &str) -> ValidationResult<()> {
    let username = username.trim();

    if username.is_empty() {
        return Err(ValidationError::required("username"));
    }
    if username.chars().count() < 3 {
        return Err(ValidationError::TooShort {
            field: "username".to_string(),
            min: 3,
        });
    }
    if username.chars().count() > 50 {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: 50,
        });
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(ValidationError::invalid_format(
            "username",
            "must contain only letters, numbers, dots, hyphens, and underscores",
        ));
    }

    Ok(())
}

/// Validates a plaintext password before hashing.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::required("password"));
    }
    if password.chars().count() < 6 {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: 6,
        });
    }
    if password.len() > 128 {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: 128,
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sold quantity.
///
/// ## Rules
/// - Finite and strictly positive (fractions allowed)
/// - At most [`MAX_LINE_QUANTITY`]
pub fn validate_sale_quantity(qty: f64) -> ValidationResult<()> {
    if !qty.is_finite() {
        return Err(ValidationError::invalid_format(
            "jumlah_barang",
            "must be a finite number",
        ));
    }
    if qty <= 0.0 {
        return Err(ValidationError::MustBePositive {
            field: "jumlah_barang".to_string(),
        });
    }
    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "jumlah_barang".to_string(),
            min: 0,
            max: MAX_LINE_QUANTITY as i64,
        });
    }
    Ok(())
}

/// Validates a whole-unit quantity (purchases, transfers).
pub fn validate_units(field: &str, qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    if qty > MAX_LINE_QUANTITY as i64 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY as i64,
        });
    }
    Ok(())
}

/// Prices, totals, discounts and taxes are whole rupiah, never negative
/// and at most [`MAX_AMOUNT`]. Zero is allowed (free items, no tax).
pub fn validate_amount(field: &str, rupiah: i64) -> ValidationResult<()> {
    if rupiah < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    if rupiah > MAX_AMOUNT {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT,
        });
    }
    Ok(())
}

fn validate_line_count(count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::required("detail"));
    }
    if count > MAX_TRANSACTION_LINES {
        return Err(ValidationError::OutOfRange {
            field: "detail".to_string(),
            min: 1,
            max: MAX_TRANSACTION_LINES as i64,
        });
    }
    Ok(())
}

// =============================================================================
// Workflow Validators
// =============================================================================

/// Validates sales lines: at least one, each well-formed, no repeated
/// (product, unit).
pub fn validate_sales_lines(lines: &[NewSalesLine]) -> ValidationResult<()> {
    validate_line_count(lines.len())?;

    for line in lines {
        validate_reference("id_produk", &line.product_id)?;
        validate_unit(&line.unit)?;
        validate_sale_quantity(line.quantity)?;
        validate_amount("harga_satuan", line.unit_price)?;
        if let Some(subtotal) = line.subtotal {
            validate_amount("subtotal", subtotal)?;
        }
    }

    ensure_unique_keys(lines.iter().map(LineKey::of_line))
}

/// Validates a new sale before any stock is checked.
pub fn validate_new_sale(sale: &NewSale) -> ValidationResult<()> {
    validate_text("nama_pembeli", &sale.buyer_name, 100)?;
    validate_text("metode_pembayaran", &sale.payment_method, 50)?;
    if let Some(total) = sale.total {
        validate_amount("total_harga", total)?;
    }
    if let Some(id) = &sale.seller_user_id {
        validate_reference("id_user_penjual", id)?;
    }
    validate_sales_lines(&sale.lines)
}

/// Validates the optional header fields of a sales update.
pub fn validate_sales_patch(patch: &SalesHeaderPatch) -> ValidationResult<()> {
    if let Some(name) = &patch.buyer_name {
        validate_text("nama_pembeli", name, 100)?;
    }
    if let Some(method) = &patch.payment_method {
        validate_text("metode_pembayaran", method, 50)?;
    }
    if let Some(total) = patch.total {
        validate_amount("total_harga", total)?;
    }
    Ok(())
}

/// Validates a purchase receipt.
pub fn validate_new_purchase(purchase: &NewPurchase) -> ValidationResult<()> {
    validate_reference("id_supplier", &purchase.supplier_id)?;
    validate_text("metode_pembayaran", &purchase.payment_method, 50)?;
    if let Some(total) = purchase.total {
        validate_amount("total_harga", total)?;
    }
    if let Some(tax) = purchase.tax {
        validate_amount("ppn", tax)?;
    }
    validate_line_count(purchase.lines.len())?;

    for line in &purchase.lines {
        validate_reference("id_produk", &line.product_id)?;
        validate_unit(&line.unit)?;
        validate_units("jumlah_barang", line.quantity)?;
        validate_amount("harga_satuan", line.unit_price)?;
        if let Some(discount) = line.discount {
            validate_amount("diskon_barang", discount)?;
        }
        if let Some(subtotal) = line.subtotal {
            validate_amount("subtotal", subtotal)?;
        }
    }

    ensure_unique_keys(
        purchase
            .lines
            .iter()
            .map(|l| LineKey::new(l.product_id.as_str(), l.unit.as_str())),
    )
}

/// Validates a manual unit conversion.
pub fn validate_transfer(transfer: &StockTransfer) -> ValidationResult<()> {
    validate_reference("id_produk", &transfer.product_id)?;
    validate_unit(&transfer.from_unit)?;
    validate_unit(&transfer.to_unit)?;
    if transfer.from_unit.trim() == transfer.to_unit.trim() {
        return Err(ValidationError::invalid_format(
            "satuan_tujuan",
            "must differ from satuan_asal",
        ));
    }
    validate_units("jumlah_asal", transfer.from_amount)?;
    validate_units("jumlah_tujuan", transfer.to_amount)?;
    if let Some(price) = transfer.to_unit_price {
        validate_amount("harga_tujuan", price)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::NewPurchaseLine;
    use crate::types::SalesChannel;
    use chrono::NaiveDate;

    fn line(product: &str, unit: &str, qty: f64) -> NewSalesLine {
        NewSalesLine {
            product_id: product.to_string(),
            unit: unit.to_string(),
            quantity: qty,
            unit_price: 10_000,
            subtotal: None,
        }
    }

    fn sale(lines: Vec<NewSalesLine>) -> NewSale {
        NewSale {
            buyer_user_id: None,
            seller_user_id: Some("USR001".to_string()),
            buyer_name: "Budi".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
            total: None,
            payment_method: "cash".to_string(),
            channel: SalesChannel::Toko,
            lines,
        }
    }

    #[test]
    fn test_validate_text() {
        assert!(validate_text("nama", "Budi", 10).is_ok());
        assert!(validate_text("nama", "   ", 10).is_err());
        assert!(validate_text("nama", &"a".repeat(11), 10).is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("kasir_01").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("rahasia").is_ok());
        assert!(validate_password("12345").is_err());
        assert!(validate_password("").is_err());
    }

    #[test]
    fn test_validate_sale_quantity() {
        assert!(validate_sale_quantity(0.25).is_ok());
        assert!(validate_sale_quantity(3.0).is_ok());
        assert!(validate_sale_quantity(0.0).is_err());
        assert!(validate_sale_quantity(-1.0).is_err());
        assert!(validate_sale_quantity(f64::NAN).is_err());
        assert!(validate_sale_quantity(MAX_LINE_QUANTITY + 1.0).is_err());
    }

    #[test]
    fn test_new_sale_requires_lines() {
        assert!(matches!(
            validate_new_sale(&sale(vec![])),
            Err(ValidationError::Required { .. })
        ));
        assert!(validate_new_sale(&sale(vec![line("PRO001", "pcs", 3.0)])).is_ok());
    }

    #[test]
    fn test_new_sale_rejects_duplicate_product_unit() {
        let err = validate_new_sale(&sale(vec![
            line("PRO001", "pcs", 1.0),
            line("PRO001", "box", 1.0),
            line("PRO001", "pcs", 2.0),
        ]))
        .unwrap_err();
        assert!(matches!(err, ValidationError::Duplicate { ref value, .. } if value == "PRO001/pcs"));
    }

    #[test]
    fn test_padded_unit_counts_as_duplicate() {
        let lines = vec![line("PRO001", "pcs", 1.0), line("PRO001", " pcs", 1.0)];
        let err = validate_new_sale(&sale(lines)).unwrap_err();
        assert!(matches!(err, ValidationError::Duplicate { ref value, .. } if value == "PRO001/pcs"));
    }

    #[test]
    fn test_new_sale_rejects_empty_unit_and_negative_price() {
        assert!(validate_new_sale(&sale(vec![line("PRO001", "", 1.0)])).is_err());

        let mut bad = line("PRO001", "pcs", 1.0);
        bad.unit_price = -1;
        assert!(validate_new_sale(&sale(vec![bad])).is_err());
    }

    #[test]
    fn test_purchase_requires_whole_positive_units() {
        let purchase = NewPurchase {
            supplier_id: "SUP001".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
            total: None,
            payment_method: "transfer".to_string(),
            invoice_number: None,
            tax: None,
            lines: vec![NewPurchaseLine {
                product_id: "PRO001".to_string(),
                unit: "box".to_string(),
                quantity: 0,
                unit_price: 50_000,
                discount: None,
                subtotal: None,
            }],
        };
        assert!(validate_new_purchase(&purchase).is_err());
    }

    fn purchase_line(qty: i64, price: i64) -> NewPurchaseLine {
        NewPurchaseLine {
            product_id: "PRO001".to_string(),
            unit: "box".to_string(),
            quantity: qty,
            unit_price: price,
            discount: None,
            subtotal: None,
        }
    }

    fn purchase(lines: Vec<NewPurchaseLine>) -> NewPurchase {
        NewPurchase {
            supplier_id: "SUP001".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
            total: None,
            payment_method: "transfer".to_string(),
            invoice_number: None,
            tax: None,
            lines,
        }
    }

    #[test]
    fn test_amounts_are_capped() {
        assert!(validate_amount("harga_satuan", 0).is_ok());
        assert!(validate_amount("harga_satuan", MAX_AMOUNT).is_ok());
        assert!(matches!(
            validate_amount("harga_satuan", MAX_AMOUNT + 1),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_sale_with_huge_subtotals_is_rejected() {
        let mut a = line("PRO001", "pcs", 1.0);
        a.subtotal = Some(i64::MAX / 2 + 1);
        let mut b = line("PRO002", "pcs", 1.0);
        b.subtotal = Some(i64::MAX / 2 + 1);

        let err = validate_new_sale(&sale(vec![a.clone(), b.clone()])).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { ref field, .. } if field == "subtotal"));
        assert!(validate_sales_lines(&[a, b]).is_err());

        let mut priced = line("PRO001", "pcs", 1.0);
        priced.unit_price = i64::MAX;
        assert!(validate_new_sale(&sale(vec![priced])).is_err());
    }

    #[test]
    fn test_largest_valid_sale_sums_without_overflow() {
        let lines: Vec<_> = (1..=MAX_TRANSACTION_LINES)
            .map(|i| {
                let mut l = line(&format!("PRO{:03}", i), "pcs", MAX_LINE_QUANTITY);
                l.unit_price = MAX_AMOUNT;
                l
            })
            .collect();
        let big = sale(lines);

        assert!(validate_new_sale(&big).is_ok());
        assert_eq!(
            big.total_or_sum(),
            MAX_AMOUNT * MAX_LINE_QUANTITY as i64 * MAX_TRANSACTION_LINES as i64
        );
    }

    #[test]
    fn test_purchase_with_huge_amounts_is_rejected() {
        let huge = purchase(vec![purchase_line(3, i64::MAX / 2)]);
        let err = validate_new_purchase(&huge).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { ref field, .. } if field == "harga_satuan"));

        let mut with_subtotal = purchase_line(1, 1_000);
        with_subtotal.subtotal = Some(i64::MAX);
        assert!(validate_new_purchase(&purchase(vec![with_subtotal])).is_err());

        let mut taxed = purchase(vec![purchase_line(1, 1_000)]);
        taxed.tax = Some(i64::MAX);
        assert!(validate_new_purchase(&taxed).is_err());

        let largest = purchase(vec![purchase_line(MAX_LINE_QUANTITY as i64, MAX_AMOUNT)]);
        assert!(validate_new_purchase(&largest).is_ok());
        assert_eq!(largest.total_or_sum(), MAX_AMOUNT * MAX_LINE_QUANTITY as i64);
    }

    #[test]
    fn test_transfer_units_must_differ() {
        let transfer = StockTransfer {
            product_id: "PRO001".to_string(),
            from_unit: "box".to_string(),
            to_unit: "box".to_string(),
            from_amount: 1,
            to_amount: 12,
            to_unit_price: None,
        };
        assert!(validate_transfer(&transfer).is_err());

        let transfer = StockTransfer {
            to_unit: "pcs".to_string(),
            ..transfer
        };
        assert!(validate_transfer(&transfer).is_ok());
    }
}
