//! # Error Types
//!
//! Domain-specific error types for warung-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  warung-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations (stock, status)       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  warung-db errors (separate crate)                                     │
//! │  └── DbError          - NotFound, persistence failures, CoreError      │
//! │                                                                         │
//! │  warung-api errors (app)                                               │
//! │  └── ApiError         - JSON body + HTTP status                        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::stock::Shortfall;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// One or more lines cannot be satisfied by the stock ledger.
    ///
    /// ## When This Occurs
    /// - Sales create: every short line is collected before anything is written
    /// - Sales update: the first line that would drive stock negative
    /// - Stock transfer: the source unit is short
    ///
    /// ```text
    /// Sale line PRO001/pcs qty 5
    ///      │
    ///      ▼
    /// Ledger PRO001/pcs: quantity 3
    ///      │
    ///      ▼
    /// InsufficientStock { shortfalls: [PRO001/pcs available 3, requested 5] }
    /// ```
    #[error("Insufficient stock: {}", describe_shortfalls(.shortfalls))]
    InsufficientStock { shortfalls: Vec<Shortfall> },

    /// Sales transaction is not in a state that allows the operation.
    #[error("Sales transaction {id} is {status}, cannot perform operation")]
    InvalidSalesStatus { id: String, status: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Shortfall error for a single (product, unit) line.
    pub fn insufficient(shortfall: Shortfall) -> Self {
        CoreError::InsufficientStock {
            shortfalls: vec![shortfall],
        }
    }
}

fn describe_shortfalls(shortfalls: &[Shortfall]) -> String {
    shortfalls
        .iter()
        .map(|s| {
            format!(
                "{}/{} available {}, requested {}",
                s.product_id, s.unit, s.available, s.requested
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before any database work runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., bad identifier prefix, non-numeric quantity).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., same product/unit twice in one transaction).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message_lists_every_line() {
        let err = CoreError::InsufficientStock {
            shortfalls: vec![
                Shortfall::new("PRO001", "pcs", 3, 5),
                Shortfall::new("PRO002", "box", 0, 1),
            ],
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock: PRO001/pcs available 3, requested 5; PRO002/box available 0, requested 1"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::required("nama_pembeli");
        assert_eq!(err.to_string(), "nama_pembeli is required");

        let err = ValidationError::Duplicate {
            field: "detail".to_string(),
            value: "PRO001/pcs".to_string(),
        };
        assert_eq!(err.to_string(), "detail 'PRO001/pcs' already exists");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("detail").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
