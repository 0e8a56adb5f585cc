//! # Invoice Numbers
//!
//! Sales invoices are numbered per calendar day:
//!
//! ```text
//! INV/20260131/000001
//! │   │        │
//! │   │        └── sequence within the day, 6 digits, restarts at 000001
//! │   └── day key (YYYYMMDD, server local date)
//! └── fixed prefix
//! ```
//!
//! The per-day counter itself lives in `warung-db` (`invoice_sequences`).

use chrono::NaiveDate;

pub const INVOICE_PREFIX: &str = "INV";

const SEQUENCE_WIDTH: usize = 6;

/// The `YYYYMMDD` key that scopes an invoice sequence.
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Formats the `seq`-th invoice of `date`.
///
/// ```rust
/// use chrono::NaiveDate;
/// use warung_core::invoice::format_invoice;
///
/// let day = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
/// assert_eq!(format_invoice(day, 1), "INV/20260131/000001");
/// ```
pub fn format_invoice(date: NaiveDate, seq: u64) -> String {
    format!(
        "{}/{}/{:0width$}",
        INVOICE_PREFIX,
        day_key(date),
        seq,
        width = SEQUENCE_WIDTH
    )
}
