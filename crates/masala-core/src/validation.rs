//! # Validation Module
//!
//! Input validation utilities for Masala POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Command surface                                              │
//! │  ├── Parsing (numbers, payment method names)                           │
//! │  └── Immediate operator feedback                                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Billing session (Rust)                                       │
//! │  ├── Cart rules (stock ceiling, quantity cap)                          │
//! │  └── THIS MODULE: customer fields before submission                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Bill API                                                     │
//! │  └── Server-side schema validation (ValidationRejected)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Customer fields are free text while the order is being built; they are only
//! checked when the bill is submitted, so a half-typed phone number never
//! blocks a cart mutation.
//!
//! ## Usage
//! ```rust
//! use masala_core::validation::{validate_phone, validate_table_number};
//!
//! assert!(validate_phone("+91 98765 43210").is_ok());
//! assert!(validate_table_number("T-4").is_ok());
//! ```

use crate::error::ValidationError;
use crate::types::CustomerDetails;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted customer name.
pub const MAX_CUSTOMER_NAME_LEN: usize = 100;

/// Longest accepted table label ("12", "T-4", "Patio 2").
pub const MAX_TABLE_NUMBER_LEN: usize = 10;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a customer name.
///
/// ## Rules
/// - May be empty (walk-in customer)
/// - At most 100 characters after trimming
pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    if name.trim().chars().count() > MAX_CUSTOMER_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "customerName".to_string(),
            max: MAX_CUSTOMER_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a customer phone number.
///
/// ## Rules
/// - May be empty
/// - Optional leading `+`
/// - Spaces and hyphens are ignored
/// - 10 to 15 digits otherwise
///
/// ## Example
/// ```rust
/// use masala_core::validation::validate_phone;
///
/// assert!(validate_phone("").is_ok());
/// assert!(validate_phone("98765-43210").is_ok());
/// assert!(validate_phone("12345").is_err());
/// assert!(validate_phone("98765abcde").is_err());
/// ```
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();
    if phone.is_empty() {
        return Ok(());
    }

    let digits_part = phone.strip_prefix('+').unwrap_or(phone);
    let mut digits = 0usize;
    for c in digits_part.chars() {
        match c {
            '0'..='9' => digits += 1,
            ' ' | '-' => {}
            _ => {
                return Err(ValidationError::InvalidFormat {
                    field: "customerPhone".to_string(),
                    reason: "must contain only digits".to_string(),
                })
            }
        }
    }

    if !(10..=15).contains(&digits) {
        return Err(ValidationError::InvalidFormat {
            field: "customerPhone".to_string(),
            reason: "must have 10 to 15 digits".to_string(),
        });
    }

    Ok(())
}

/// Validates a table label.
///
/// ## Rules
/// - May be empty (takeaway)
/// - At most 10 characters
/// - Letters, digits, spaces and hyphens only
pub fn validate_table_number(table: &str) -> ValidationResult<()> {
    let table = table.trim();

    if table.chars().count() > MAX_TABLE_NUMBER_LEN {
        return Err(ValidationError::TooLong {
            field: "tableNumber".to_string(),
            max: MAX_TABLE_NUMBER_LEN,
        });
    }

    if !table
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == ' ')
    {
        return Err(ValidationError::InvalidFormat {
            field: "tableNumber".to_string(),
            reason: "must contain only letters, numbers, spaces, and hyphens".to_string(),
        });
    }

    Ok(())
}

/// Validates every customer field, reporting the first failure.
pub fn validate_customer(details: &CustomerDetails) -> ValidationResult<()> {
    validate_customer_name(&details.customer_name)?;
    validate_phone(&details.customer_phone)?;
    validate_table_number(&details.table_number)?;
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a tax rate in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate_bps".to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_customer_name() {
        assert!(validate_customer_name("").is_ok());
        assert!(validate_customer_name("Asha Menon").is_ok());
        assert!(validate_customer_name(&"A".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("").is_ok());
        assert!(validate_phone("9876543210").is_ok());
        assert!(validate_phone("+91 98765 43210").is_ok());
        assert!(validate_phone("044-2345-6789").is_ok());

        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("98765O4321").is_err());
        assert!(validate_phone("+1234567890123456").is_err());
    }

    #[test]
    fn test_validate_table_number() {
        assert!(validate_table_number("").is_ok());
        assert!(validate_table_number("12").is_ok());
        assert!(validate_table_number("Patio 2").is_ok());
        assert!(validate_table_number("T-4").is_ok());

        assert!(validate_table_number("Table #4").is_err());
        assert!(validate_table_number("Rooftop Table 9").is_err());
    }

    #[test]
    fn test_validate_customer_reports_first_failure() {
        let details = CustomerDetails {
            customer_name: "Asha".to_string(),
            customer_phone: "123".to_string(),
            table_number: "#1".to_string(),
        };
        let err = validate_customer(&details).unwrap_err();
        assert_eq!(err.field(), "customerPhone");

        assert!(validate_customer(&CustomerDetails::default()).is_ok());
    }

    #[test]
    fn test_validate_tax_rate_bps() {
        assert!(validate_tax_rate_bps(0).is_ok());
        assert!(validate_tax_rate_bps(1800).is_ok());
        assert!(validate_tax_rate_bps(10_000).is_ok());
        assert!(validate_tax_rate_bps(10_001).is_err());
    }
}
