//! # Error Types
//!
//! Domain-specific error types for ims-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  ims-core errors (this file)                                           │
//! │  ├── CoreError        - Business rule failures                         │
//! │  └── ValidationError  - Malformed or incomplete requests               │
//! │                                                                         │
//! │  ims-db errors (separate crate)                                        │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── ServiceError     - What callers see (code + message)              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → web layer          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A product reference does not resolve.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// A sale reference does not resolve.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Applying the change would drive a quantity bucket below zero.
    ///
    /// ## User Workflow
    /// ```text
    /// Return 5 against sale S (size "N/A")
    ///      │
    ///      ▼
    /// Check sale remaining: available=3
    ///      │
    ///      ▼
    /// InsufficientQuantity { size: "N/A", requested: 5, available: 3 }
    /// ```
    #[error("Insufficient quantity for size {size}: requested {requested}, available {available}")]
    InsufficientQuantity {
        size: String,
        requested: u32,
        available: u32,
    },

    /// A bucket would exceed the representable quantity.
    #[error("Quantity overflow for size {size}")]
    QuantityOverflow { size: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InsufficientQuantity error.
    pub fn insufficient(size: impl Into<String>, requested: u32, available: u32) -> Self {
        CoreError::InsufficientQuantity {
            size: size.into(),
            requested,
            available,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These are raised before any store is read or written.
#[derive(Debug, Error)]
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

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// The sale named in a request was made against a different product.
    #[error("Mismatched sale/product: sale {sale_id} belongs to product {sale_product_id}, not {product_id}")]
    MismatchedSaleProduct {
        sale_id: String,
        sale_product_id: String,
        product_id: String,
    },
}

impl ValidationError {
    /// Creates a Required error for the given field.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Creates a MustBePositive error for the given field.
    pub fn must_be_positive(field: impl Into<String>) -> Self {
        ValidationError::MustBePositive {
            field: field.into(),
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
