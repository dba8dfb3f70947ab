//! # Error Types
//!
//! Domain-specific error types for masala-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  masala-core errors (this file)                                        │
//! │  ├── CartError        - Cart mutations rejected by stock/limits        │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  masala-db errors (separate crate)                                     │
//! │  └── DbError / SnapshotError - Local snapshot failures                 │
//! │                                                                         │
//! │  masala-client errors (separate crate)                                 │
//! │  └── ClientError      - Transient vs rejected API failures             │
//! │                                                                         │
//! │  register errors (in app)                                              │
//! │  └── SubmitError / CommandError - What the operator sees               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cart errors are typed outcomes, not failures of the process: the ledger is
//! always left exactly as it was before the rejected call.

use thiserror::Error;

// =============================================================================
// Cart Error
// =============================================================================

/// Cart ledger errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// Item id is not in the current catalog.
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// Item exists but the kitchen has switched it off.
    #[error("{name} is not available right now")]
    ItemUnavailable { item_id: String, name: String },

    /// Catalog stock for the item is zero.
    ///
    /// ## User Workflow
    /// ```text
    /// add("paneer-tikka")
    ///      │
    ///      ▼
    /// catalog stock = 0
    ///      │
    ///      ▼
    /// OutOfStock { name: "Paneer Tikka" }  (ledger unchanged)
    /// ```
    #[error("{name} is out of stock")]
    OutOfStock { item_id: String, name: String },

    /// Requested quantity is above the catalog stock.
    ///
    /// ## When This Occurs
    /// - `add` on a line already at the stock ceiling
    /// - `set_quantity` above the available stock
    #[error("Only {available} {name} in stock, requested {requested}")]
    StockLimitExceeded {
        item_id: String,
        name: String,
        available: i64,
        requested: i64,
    },

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Cart has reached the maximum number of lines.
    #[error("Cart cannot have more than {max} items")]
    CartFull { max: usize },
}

impl CartError {
    /// Returns true for the stock-related rejections.
    pub fn is_stock_error(&self) -> bool {
        matches!(
            self,
            CartError::OutOfStock { .. } | CartError::StockLimitExceeded { .. }
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when operator input doesn't meet requirements.
/// Checked before a bill is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., phone number with letters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::InvalidFormat { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CartError.
pub type CartResult<T> = Result<T, CartError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CartError::StockLimitExceeded {
            item_id: "m1".to_string(),
            name: "Butter Chicken".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Only 3 Butter Chicken in stock, requested 5"
        );
        assert!(err.is_stock_error());
        assert!(!CartError::CartFull { max: 100 }.is_stock_error());
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "customerName".to_string(),
        };
        assert_eq!(err.to_string(), "customerName is required");
        assert_eq!(err.field(), "customerName");

        let err = ValidationError::TooLong {
            field: "tableNumber".to_string(),
            max: 10,
        };
        assert_eq!(err.to_string(), "tableNumber must be at most 10 characters");
    }
}
