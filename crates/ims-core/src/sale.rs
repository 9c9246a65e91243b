//! # Sale Planning
//!
//! Pure planning for recording a sale against a product.
//!
//! ```text
//! SaleRequest { quantities, discount }
//!      │
//!      ▼
//! normalize against product shape (flat → {"N/A": sum})
//!      │
//!      ▼
//! product.stock -= quantities      (InsufficientQuantity if short)
//!      │
//!      ▼
//! total = unit_price × Σquantities − discount
//! ```
//!
//! The sold quantities become the sale's `remaining` level, in the same shape
//! as the product, so a later return against the sale sees what was sold.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::quantity::{StockLevel, UNSIZED_LABEL};
use crate::types::Product;
use crate::validation::{validate_discount_cents, validate_quantities};

/// A request to sell a product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleRequest {
    pub product_id: String,
    pub quantities: BTreeMap<String, i64>,
    #[serde(default)]
    pub discount_cents: i64,
    #[ts(as = "String")]
    pub sale_date: NaiveDate,
}

/// Outcome of a successful sale plan.
#[derive(Debug, Clone, PartialEq)]
pub struct SalePlan {
    /// Product snapshot with the stock deducted and `in_stock` refreshed.
    pub product: Product,
    /// What the sale starts out holding.
    pub remaining: StockLevel,
    pub unit_price_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
}

/// Plans a sale of `request.quantities` from `product`.
pub fn plan_sale(product: &Product, request: &SaleRequest) -> CoreResult<SalePlan> {
    if request.product_id.trim() != product.id {
        return Err(CoreError::ProductNotFound(request.product_id.clone()));
    }

    let requested = validate_quantities(&request.quantities)?;
    let quantities = product.stock.normalize(&requested)?;

    let mut updated = product.clone();
    updated.stock.decrease(&quantities)?;
    updated.refresh_in_stock();

    let sold = quantities.total();
    let gross = i64::try_from(sold)
        .ok()
        .and_then(|qty| product.price_cents.checked_mul(qty))
        .ok_or_else(|| ValidationError::OutOfRange {
            field: "total".to_string(),
            min: 0,
            max: i64::MAX,
        })?;
    validate_discount_cents(request.discount_cents, gross)?;

    let remaining = if product.has_sizes() {
        StockLevel::Sized(quantities)
    } else {
        StockLevel::Flat(quantities.get(UNSIZED_LABEL))
    };

    Ok(SalePlan {
        product: updated,
        remaining,
        unit_price_cents: product.price_cents,
        discount_cents: request.discount_cents,
        total_cents: gross - request.discount_cents,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::SizeQuantities;
    use chrono::Utc;

    fn product(stock: StockLevel) -> Product {
        let now = Utc::now();
        Product {
            id: "P".to_string(),
            name: "Cap".to_string(),
            price_cents: 1200,
            in_stock: stock.in_stock(),
            stock,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    fn request(quantities: &[(&str, i64)], discount_cents: i64) -> SaleRequest {
        SaleRequest {
            product_id: "P".to_string(),
            quantities: quantities.iter().map(|&(s, q)| (s.to_string(), q)).collect(),
            discount_cents,
            sale_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
        }
    }

    #[test]
    fn test_flat_sale_deducts_and_prices() {
        let p = product(StockLevel::Flat(10));
        let plan = plan_sale(&p, &request(&[("N/A", 3)], 100)).unwrap();

        assert_eq!(plan.product.stock, StockLevel::Flat(7));
        assert_eq!(plan.remaining, StockLevel::Flat(3));
        assert_eq!(plan.total_cents, 3 * 1200 - 100);
    }

    #[test]
    fn test_sized_sale_keeps_sizes() {
        let sizes: SizeQuantities = [("M", 2u32), ("L", 1)].into_iter().collect();
        let p = product(StockLevel::Sized(sizes));
        let plan = plan_sale(&p, &request(&[("L", 1)], 0)).unwrap();

        assert_eq!(plan.product.stock.buckets().get("L"), 0);
        assert_eq!(plan.remaining, StockLevel::Sized(SizeQuantities::single("L", 1)));
        assert!(plan.product.in_stock);
    }

    #[test]
    fn test_sale_short_on_stock() {
        let p = product(StockLevel::Flat(1));
        let err = plan_sale(&p, &request(&[("N/A", 2)], 0)).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientQuantity { .. }));
    }

    #[test]
    fn test_discount_above_gross_rejected() {
        let p = product(StockLevel::Flat(5));
        let err = plan_sale(&p, &request(&[("N/A", 1)], 5000)).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::OutOfRange { .. })));
    }

    #[test]
    fn test_selling_last_unit_clears_in_stock() {
        let p = product(StockLevel::Flat(1));
        let plan = plan_sale(&p, &request(&[("N/A", 1)], 0)).unwrap();
        assert!(!plan.product.in_stock);
    }
}
