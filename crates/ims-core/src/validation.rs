//! # Validation Module
//!
//! Input validation utilities for the inventory backend.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Web layer (out of this workspace)                            │
//! │  └── Deserialization, basic shape checks                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── References present and well-formed                                │
//! │  └── Quantities positive, names and reasons bounded                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (quantity >= 0)                                             │
//! │  └── PRIMARY KEY (record, size)                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use std::collections::BTreeMap;
//! use ims_core::validation::{validate_quantities, validate_reason};
//!
//! let mut raw = BTreeMap::new();
//! raw.insert("M".to_string(), 2_i64);
//! let quantities = validate_quantities(&raw).unwrap();
//! assert_eq!(quantities.get("M"), 2);
//!
//! assert!(validate_reason("   ").is_err());
//! ```

use std::collections::BTreeMap;

use crate::error::ValidationError;
use crate::quantity::SizeQuantities;
use crate::{MAX_NAME_LEN, MAX_REASON_LEN, MAX_SIZE_LABEL_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name (non-empty, at most 200 characters).
///
/// ## Example
/// ```rust
/// use ims_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Denim Jacket").is_ok());
/// assert!(validate_product_name("").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required("name"));
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates the free-text reason attached to a return.
pub fn validate_reason(reason: &str) -> ValidationResult<()> {
    let reason = reason.trim();

    if reason.is_empty() {
        return Err(ValidationError::required("reason"));
    }

    if reason.chars().count() > MAX_REASON_LEN {
        return Err(ValidationError::TooLong {
            field: "reason".to_string(),
            max: MAX_REASON_LEN,
        });
    }

    Ok(())
}

/// Validates a size label such as `"M"` or `"42"`.
pub fn validate_size_label(size: &str) -> ValidationResult<()> {
    if size.trim().is_empty() {
        return Err(ValidationError::required("size"));
    }

    if size.chars().count() > MAX_SIZE_LABEL_LEN {
        return Err(ValidationError::TooLong {
            field: "size".to_string(),
            max: MAX_SIZE_LABEL_LEN,
        });
    }

    Ok(())
}

/// Returns the trimmed reference, or `None` when it is absent or blank.
pub fn non_blank(reference: Option<&str>) -> Option<&str> {
    reference.map(str::trim).filter(|r| !r.is_empty())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a single quantity: strictly positive and representable.
pub fn validate_quantity(qty: i64) -> ValidationResult<u32> {
    if qty <= 0 {
        return Err(ValidationError::must_be_positive("quantity"));
    }

    u32::try_from(qty).map_err(|_| ValidationError::OutOfRange {
        field: "quantity".to_string(),
        min: 1,
        max: i64::from(u32::MAX),
    })
}

/// Validates caller-supplied per-size quantities.
///
/// ## Rules
/// - At least one entry
/// - Every size label valid
/// - Every quantity positive (zero and negative entries are rejected)
pub fn validate_quantities(raw: &BTreeMap<String, i64>) -> ValidationResult<SizeQuantities> {
    let quantities = validate_quantity_entries(raw)?;
    validate_size_labels(&quantities)?;
    Ok(quantities)
}

/// Like [`validate_quantities`], but leaves the size labels unchecked.
///
/// Used where labels may still collapse into `"N/A"` once the record they
/// apply to is known.
pub fn validate_quantity_entries(raw: &BTreeMap<String, i64>) -> ValidationResult<SizeQuantities> {
    if raw.is_empty() {
        return Err(ValidationError::required("quantities"));
    }

    let mut quantities = SizeQuantities::new();
    for (size, &qty) in raw {
        let qty = validate_quantity(qty).map_err(|err| match err {
            ValidationError::MustBePositive { .. } => {
                ValidationError::must_be_positive(format!("quantity for size {}", size))
            }
            other => other,
        })?;
        quantities.set(size.clone(), qty);
    }

    Ok(quantities)
}

/// Checks every label in `quantities` with [`validate_size_label`].
pub fn validate_size_labels(quantities: &SizeQuantities) -> ValidationResult<()> {
    quantities
        .iter()
        .try_for_each(|(size, _)| validate_size_label(size))
}

/// Validates a price in cents (zero allowed).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a discount against the gross amount it applies to.
pub fn validate_discount_cents(discount: i64, gross: i64) -> ValidationResult<()> {
    if discount < 0 || discount > gross {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: gross,
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

    fn raw(pairs: &[(&str, i64)]) -> BTreeMap<String, i64> {
        pairs.iter().map(|&(s, q)| (s.to_string(), q)).collect()
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Linen Shirt").is_ok());
        assert!(validate_product_name("  ").is_err());
        assert!(validate_product_name(&"A".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_reason() {
        assert!(validate_reason("damaged seam").is_ok());
        assert!(validate_reason("").is_err());
        assert!(validate_reason(&"x".repeat(501)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert_eq!(validate_quantity(3).unwrap(), 3);
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-2).is_err());
        assert!(validate_quantity(i64::from(u32::MAX) + 1).is_err());
    }

    #[test]
    fn test_validate_quantities_rejects_non_positive_entry() {
        let err = validate_quantities(&raw(&[("M", 2), ("L", 0)])).unwrap_err();
        assert_eq!(err.to_string(), "quantity for size L must be positive");
    }

    #[test]
    fn test_validate_quantities_rejects_empty() {
        assert!(matches!(
            validate_quantities(&BTreeMap::new()),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_validate_quantities_rejects_blank_size() {
        assert!(validate_quantities(&raw(&[(" ", 1)])).is_err());
    }

    #[test]
    fn test_quantity_entries_leave_labels_alone() {
        let long = "a-very-long-size-label-from-caller";
        let quantities = validate_quantity_entries(&raw(&[("", 1), (long, 2)])).unwrap();

        assert_eq!(quantities.total(), 3);
        assert!(validate_size_labels(&quantities).is_err());
        assert!(validate_quantity_entries(&raw(&[("", 0)])).is_err());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  abc ")), Some("abc"));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn test_validate_discount_cents() {
        assert!(validate_discount_cents(0, 1000).is_ok());
        assert!(validate_discount_cents(1000, 1000).is_ok());
        assert!(validate_discount_cents(1001, 1000).is_err());
        assert!(validate_discount_cents(-1, 1000).is_err());
    }
}
