//! # Stock Rules
//!
//! Pure stock arithmetic shared by the sales and purchase workflows.
//!
//! ## Ceiling Consumption
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Sold quantity (fractional)      Ledger consumption (whole units)       │
//! │  ─────────────────────────       ────────────────────────────────       │
//! │          1.0                ──►            1                            │
//! │          2.3                ──►            3                            │
//! │          0.1                ──►            1                            │
//! │                                                                         │
//! │  A started unit is a consumed unit. The sales line keeps 2.3 for the    │
//! │  receipt; the ledger loses 3.                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Update Reconciliation
//! ```text
//!  old lines (stored)          new lines (request)
//!  ┌──────────────────┐        ┌──────────────────┐
//!  │ PRO001/pcs  5    │───┬───►│ PRO001/pcs  8    │  changed: delta = 8 - 5
//!  │ PRO002/box  2    │   │    │ PRO003/pcs  1    │  added:   consume 1
//!  └──────────────────┘   │    └──────────────────┘
//!                         └─ PRO002/box only old     removed: restore 2
//! ```
//!
//! [`plan_reconciliation`] only computes the plan; `warung-db` applies it
//! inside one transaction, restores first.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::input::NewSalesLine;
use crate::types::SalesDetail;

/// Whole stock units consumed by selling `quantity`.
///
/// ```rust
/// use warung_core::stock::required_units;
///
/// assert_eq!(required_units(3.0), 3);
/// assert_eq!(required_units(2.3), 3);
/// assert_eq!(required_units(0.01), 1);
/// ```
#[inline]
pub fn required_units(quantity: f64) -> i64 {
    quantity.ceil() as i64
}

// =============================================================================
// Line Keys & Shortfalls
// =============================================================================

/// Composite (product, unit) key identifying a stock entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineKey {
    pub product_id: String,
    pub unit: String,
}

impl LineKey {
    pub fn new(product_id: impl Into<String>, unit: impl Into<String>) -> Self {
        let trim = |s: String| match s.trim() {
            t if t.len() == s.len() => s,
            t => t.to_string(),
        };
        LineKey {
            product_id: trim(product_id.into()),
            unit: trim(unit.into()),
        }
    }

    pub fn of_line(line: &NewSalesLine) -> Self {
        LineKey::new(line.product_id.as_str(), line.unit.as_str())
    }

    pub fn of_detail(detail: &SalesDetail) -> Self {
        LineKey::new(detail.product_id.as_str(), detail.unit.as_str())
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.product_id, self.unit)
    }
}

/// A line whose requested quantity exceeds the stock on hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Shortfall {
    #[serde(rename = "id_produk")]
    pub product_id: String,
    #[serde(rename = "satuan")]
    pub unit: String,
    /// Stock on hand; 0 when there is no entry at all.
    #[serde(rename = "stok_tersedia")]
    pub available: i64,
    /// Whole units the line needs.
    #[serde(rename = "jumlah_diminta")]
    pub requested: i64,
}

impl Shortfall {
    pub fn new(
        product_id: impl Into<String>,
        unit: impl Into<String>,
        available: i64,
        requested: i64,
    ) -> Self {
        Shortfall {
            product_id: product_id.into(),
            unit: unit.into(),
            available,
            requested,
        }
    }
}

/// Rejects line sets that mention the same (product, unit) twice.
pub fn ensure_unique_keys<I>(keys: I) -> Result<(), ValidationError>
where
    I: IntoIterator<Item = LineKey>,
{
    let mut seen = HashSet::new();
    for key in keys {
        if !seen.insert(key.clone()) {
            return Err(ValidationError::Duplicate {
                field: "detail".to_string(),
                value: key.to_string(),
            });
        }
    }
    Ok(())
}

/// Checks every line against the ledger and returns all the short ones.
///
/// `available` yields the on-hand quantity of an active entry, or `None`
/// when the (product, unit) has no entry.
pub fn collect_shortfalls<F>(lines: &[NewSalesLine], mut available: F) -> Vec<Shortfall>
where
    F: FnMut(&LineKey) -> Option<i64>,
{
    lines
        .iter()
        .filter_map(|line| {
            let key = LineKey::of_line(line);
            let required = required_units(line.quantity);
            let on_hand = available(&key);
            match on_hand {
                Some(qty) if qty >= required => None,
                _ => Some(Shortfall::new(
                    key.product_id,
                    key.unit,
                    on_hand.unwrap_or(0),
                    required,
                )),
            }
        })
        .collect()
}

// =============================================================================
// Reconciliation Plan
// =============================================================================

/// A stored line that is absent from the new set.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedLine {
    pub detail_id: String,
    pub key: LineKey,
    /// Whole units to put back on the ledger.
    pub restore: i64,
}

/// A stored line that is also in the new set.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangedLine {
    pub detail_id: String,
    pub line: NewSalesLine,
    /// `ceil(new) - ceil(old)`. Positive consumes more stock, negative
    /// returns stock, zero leaves the ledger alone.
    pub delta: i64,
}

/// A line that only exists in the new set.
#[derive(Debug, Clone, PartialEq)]
pub struct AddedLine {
    pub line: NewSalesLine,
    pub required: i64,
}

/// Diff between the stored lines of a sale and its replacement lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcilePlan {
    pub removed: Vec<RemovedLine>,
    pub changed: Vec<ChangedLine>,
    pub added: Vec<AddedLine>,
}

/// Pairs old and new lines by (product, unit).
///
/// Fails with `Duplicate` if `new` repeats a key. Old lines are paired in
/// stored order; a repeated old key (legacy data) leaves the extra rows in
/// `removed`.
pub fn plan_reconciliation(old: &[SalesDetail], new: &[NewSalesLine]) -> CoreResult<ReconcilePlan> {
    ensure_unique_keys(new.iter().map(LineKey::of_line))?;

    let mut pending: HashMap<LineKey, &NewSalesLine> =
        new.iter().map(|l| (LineKey::of_line(l), l)).collect();

    let mut plan = ReconcilePlan::default();

    for detail in old {
        let key = LineKey::of_detail(detail);
        let old_units = required_units(detail.quantity);
        match pending.remove(&key) {
            Some(line) => plan.changed.push(ChangedLine {
                detail_id: detail.id.clone(),
                line: line.clone(),
                delta: required_units(line.quantity) - old_units,
            }),
            None => plan.removed.push(RemovedLine {
                detail_id: detail.id.clone(),
                key,
                restore: old_units,
            }),
        }
    }

    // Keep request order for inserted rows.
    for line in new {
        if pending.remove(&LineKey::of_line(line)).is_some() {
            plan.added.push(AddedLine {
                line: line.clone(),
                required: required_units(line.quantity),
            });
        }
    }

    Ok(plan)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    fn line(product: &str, unit: &str, qty: f64) -> NewSalesLine {
        NewSalesLine {
            product_id: product.to_string(),
            unit: unit.to_string(),
            quantity: qty,
            unit_price: 10_000,
            subtotal: None,
        }
    }

    fn detail(id: &str, product: &str, unit: &str, qty: f64) -> SalesDetail {
        SalesDetail {
            id: id.to_string(),
            header_id: "HTJ000001".to_string(),
            product_id: product.to_string(),
            unit: unit.to_string(),
            quantity: qty,
            unit_price: 10_000,
            subtotal: (qty * 10_000.0) as i64,
        }
    }

    #[test]
    fn test_ceiling_rule() {
        assert_eq!(required_units(1.0), 1);
        assert_eq!(required_units(2.3), 3);
        assert_eq!(required_units(2.0000001), 3);
        assert_eq!(required_units(0.5), 1);
    }

    #[test]
    fn test_collect_shortfalls_reports_every_short_line() {
        let lines = vec![
            line("PRO001", "pcs", 3.0),
            line("PRO002", "box", 2.3),
            line("PRO003", "pcs", 1.0),
        ];
        let shortfalls = collect_shortfalls(&lines, |key| match key.product_id.as_str() {
            "PRO001" => Some(10),
            "PRO002" => Some(2),
            _ => None,
        });

        assert_eq!(
            shortfalls,
            vec![
                Shortfall::new("PRO002", "box", 2, 3),
                Shortfall::new("PRO003", "pcs", 0, 1),
            ]
        );
    }

    #[test]
    fn test_shortfall_wire_names() {
        let json = serde_json::to_value(Shortfall::new("PRO001", "pcs", 3, 5)).unwrap();
        assert_eq!(json["id_produk"], "PRO001");
        assert_eq!(json["satuan"], "pcs");
        assert_eq!(json["stok_tersedia"], 3);
        assert_eq!(json["jumlah_diminta"], 5);
    }

    #[test]
    fn test_identical_lines_plan_zero_deltas() {
        let old = vec![detail("DTJ000001", "PRO001", "pcs", 5.0)];
        let plan = plan_reconciliation(&old, &[line("PRO001", "pcs", 5.0)]).unwrap();

        assert!(plan.removed.is_empty());
        assert!(plan.added.is_empty());
        assert_eq!(plan.changed.len(), 1);
        assert_eq!(plan.changed[0].delta, 0);
    }

    #[test]
    fn test_delta_uses_ceiling_on_both_sides() {
        let old = vec![detail("DTJ000001", "PRO001", "kg", 2.3)];

        let plan = plan_reconciliation(&old, &[line("PRO001", "kg", 2.9)]).unwrap();
        assert_eq!(plan.changed[0].delta, 0);

        let plan = plan_reconciliation(&old, &[line("PRO001", "kg", 3.1)]).unwrap();
        assert_eq!(plan.changed[0].delta, 1);

        let plan = plan_reconciliation(&old, &[line("PRO001", "kg", 1.0)]).unwrap();
        assert_eq!(plan.changed[0].delta, -2);
    }

    #[test]
    fn test_removed_added_and_changed_lines() {
        let old = vec![
            detail("DTJ000001", "PRO001", "pcs", 5.0),
            detail("DTJ000002", "PRO002", "box", 1.5),
        ];
        let new = vec![line("PRO003", "pcs", 1.0), line("PRO001", "pcs", 8.0)];

        let plan = plan_reconciliation(&old, &new).unwrap();

        assert_eq!(
            plan.removed,
            vec![RemovedLine {
                detail_id: "DTJ000002".to_string(),
                key: LineKey::new("PRO002", "box"),
                restore: 2,
            }]
        );
        assert_eq!(plan.changed.len(), 1);
        assert_eq!(plan.changed[0].detail_id, "DTJ000001");
        assert_eq!(plan.changed[0].delta, 3);
        assert_eq!(plan.added.len(), 1);
        assert_eq!(plan.added[0].line.product_id, "PRO003");
        assert_eq!(plan.added[0].required, 1);
    }

    #[test]
    fn test_same_product_different_unit_is_a_different_line() {
        let old = vec![detail("DTJ000001", "PRO001", "box", 1.0)];
        let plan = plan_reconciliation(&old, &[line("PRO001", "pcs", 1.0)]).unwrap();
        assert_eq!(plan.removed.len(), 1);
        assert_eq!(plan.added.len(), 1);
    }

    #[test]
    fn test_padded_key_pairs_with_stored_line() {
        assert_eq!(LineKey::new(" PRO001", "pcs "), LineKey::new("PRO001", "pcs"));

        let old = vec![detail("DTJ000001", "PRO001", "pcs", 2.0)];
        let plan = plan_reconciliation(&old, &[line("PRO001", " pcs", 3.0)]).unwrap();
        assert!(plan.removed.is_empty());
        assert!(plan.added.is_empty());
        assert_eq!(plan.changed.len(), 1);
        assert_eq!(plan.changed[0].delta, 1);

        let new = vec![line("PRO001", "pcs", 1.0), line("PRO001", "pcs  ", 1.0)];
        let err = plan_reconciliation(&[], &new).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::Duplicate { .. })
        ));
    }

    #[test]
    fn test_duplicate_new_keys_rejected() {
        let new = vec![line("PRO001", "pcs", 1.0), line("PRO001", "pcs", 2.0)];
        let err = plan_reconciliation(&[], &new).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::Duplicate { .. })
        ));
    }
}
