//! Serde helpers for numbers that arrive either as JSON numbers or as
//! numeric strings (`"3"`, `"10000"`, `"2.5"`), as the shop's web and
//! mobile clients send both.
//!
//! Non-numeric strings are deserialization errors, which the API turns
//! into `400 Bad Request`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;

/// A number that may have been sent as a string.
#[derive(Debug, Clone, Copy, PartialEq)]
struct FlexibleNumber(f64);

impl<'de> Deserialize<'de> for FlexibleNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FlexibleVisitor;

        impl<'de> Visitor<'de> for FlexibleVisitor {
            type Value = FlexibleNumber;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a number or a numeric string")
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(FlexibleNumber(value as f64))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(FlexibleNumber(value as f64))
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                if value.is_finite() {
                    Ok(FlexibleNumber(value))
                } else {
                    Err(de::Error::custom("number must be finite"))
                }
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                value
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .map(FlexibleNumber)
                    .ok_or_else(|| de::Error::custom(format!("not a number: {:?}", value)))
            }
        }

        deserializer.deserialize_any(FlexibleVisitor)
    }
}

fn to_i64<E: de::Error>(n: f64) -> Result<i64, E> {
    let rounded = n.round();
    if rounded < i64::MIN as f64 || rounded > i64::MAX as f64 {
        return Err(E::custom("number out of range"));
    }
    Ok(rounded as i64)
}

/// `f64` from a number or numeric string.
pub fn flexible_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    FlexibleNumber::deserialize(deserializer).map(|n| n.0)
}

/// Whole rupiah / whole units from a number or numeric string.
/// Fractions are rounded to the nearest integer.
pub fn flexible_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    FlexibleNumber::deserialize(deserializer).and_then(|n| to_i64(n.0))
}

/// Like [`flexible_i64`] but `null` (or an absent field with
/// `#[serde(default)]`) becomes `None`.
pub fn flexible_i64_opt<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<FlexibleNumber>::deserialize(deserializer)? {
        Some(n) => to_i64(n.0).map(Some),
        None => Ok(None),
    }
}

/// A string with surrounding whitespace removed. Used for the
/// (product, unit) key fields so `" pcs"` and `"pcs"` name the same entry.
pub fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(match raw.trim() {
        t if t.len() == raw.len() => raw,
        t => t.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Line {
        #[serde(deserialize_with = "flexible_f64")]
        qty: f64,
        #[serde(deserialize_with = "flexible_i64")]
        price: i64,
        #[serde(default, deserialize_with = "flexible_i64_opt")]
        subtotal: Option<i64>,
    }

    #[test]
    fn test_accepts_numbers_and_numeric_strings() {
        let line: Line = serde_json::from_str(r#"{"qty": "2.5", "price": 10000}"#).unwrap();
        assert_eq!(line.qty, 2.5);
        assert_eq!(line.price, 10_000);
        assert_eq!(line.subtotal, None);

        let line: Line =
            serde_json::from_str(r#"{"qty": 3, "price": " 1500 ", "subtotal": "4500"}"#).unwrap();
        assert_eq!(line.qty, 3.0);
        assert_eq!(line.price, 1_500);
        assert_eq!(line.subtotal, Some(4_500));

        let line: Line =
            serde_json::from_str(r#"{"qty": 1, "price": 1, "subtotal": null}"#).unwrap();
        assert_eq!(line.subtotal, None);
    }

    #[test]
    fn test_rejects_non_numeric_strings() {
        assert!(serde_json::from_str::<Line>(r#"{"qty": "tiga", "price": 1}"#).is_err());
        assert!(serde_json::from_str::<Line>(r#"{"qty": 1, "price": "NaN"}"#).is_err());
        assert!(serde_json::from_str::<Line>(r#"{"qty": true, "price": 1}"#).is_err());
    }

    #[test]
    fn test_line_keys_are_trimmed() {
        use crate::input::{NewSalesLine, StockTransfer};

        let line: NewSalesLine = serde_json::from_str(
            r#"{"id_produk": " PRO001", "satuan": "pcs ", "jumlah_barang": 1, "harga_satuan": 5000}"#,
        )
        .unwrap();
        assert_eq!(line.product_id, "PRO001");
        assert_eq!(line.unit, "pcs");

        let transfer: StockTransfer = serde_json::from_str(
            r#"{"id_produk": "PRO001", "satuan_asal": " box", "satuan_tujuan": "pcs\t",
                "jumlah_asal": 1, "jumlah_tujuan": 12}"#,
        )
        .unwrap();
        assert_eq!(transfer.from_unit, "box");
        assert_eq!(transfer.to_unit, "pcs");
    }
}
