//! # Return Reconciliation
//!
//! Pure planning for returns: given the request and snapshots of the
//! referenced product and sale, decide the new stock levels or refuse.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        plan_return                                      │
//! │                                                                         │
//! │  ReturnRequest                                                         │
//! │       │ validate()      refs present, quantities > 0, reason set       │
//! │       ▼                                                                 │
//! │  resolve refs           ProductNotFound / SaleNotFound                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  sale.product == product?   else MismatchedSaleProduct                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  normalize against governing record (flat → {"N/A": sum})             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  availability check     InsufficientQuantity                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ReturnPlan { product', sale', quantities }                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here touches a store; the database layer persists the plan in a
//! single transaction.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::quantity::SizeQuantities;
use crate::types::{GoverningRecord, Product, ReturnCondition, Sale};
use crate::quantity::StockLevel;
use crate::validation::{
    non_blank, validate_quantity_entries, validate_reason, validate_size_labels,
};

// =============================================================================
// Request
// =============================================================================

/// A request to record a return.
///
/// Quantities are signed so that zero and negative entries reach validation
/// instead of failing deserialization.
///
/// A web layer that wants an unknown `condition` reported as a validation
/// error should take it as a string and parse it with
/// `str::parse::<ReturnCondition>()`; deserializing this type directly
/// reports it as a serde error carrying the same message.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReturnRequest {
    pub condition: ReturnCondition,
    pub product_id: Option<String>,
    pub sale_id: Option<String>,
    pub quantities: BTreeMap<String, i64>,
    pub reason: String,
    #[ts(as = "String")]
    pub return_date: NaiveDate,
}

impl ReturnRequest {
    /// Product reference, trimmed; blank counts as absent.
    pub fn product_ref(&self) -> Option<&str> {
        non_blank(self.product_id.as_deref())
    }

    /// Sale reference, trimmed; blank counts as absent.
    pub fn sale_ref(&self) -> Option<&str> {
        non_blank(self.sale_id.as_deref())
    }

    /// Store-independent checks. Returns the validated quantities.
    ///
    /// Size labels are not checked here: against a flat record any label,
    /// blank or long, collapses into `"N/A"`. [`plan_return`] checks them
    /// once the governing record turns out to be sized.
    pub fn validate(&self) -> Result<SizeQuantities, ValidationError> {
        if self.condition.requires_sale() && self.sale_ref().is_none() {
            return Err(ValidationError::required("sale_id"));
        }
        if self.condition.requires_product() && self.product_ref().is_none() {
            return Err(ValidationError::required("product_id"));
        }

        let quantities = validate_quantity_entries(&self.quantities)?;
        validate_reason(&self.reason)?;

        Ok(quantities)
    }
}

// =============================================================================
// Plan
// =============================================================================

/// Outcome of a successful plan.
///
/// `product` / `sale` are present only when that record changes, and hold the
/// snapshot to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnPlan {
    pub condition: ReturnCondition,
    pub quantities: SizeQuantities,
    pub product: Option<Product>,
    pub sale: Option<Sale>,
}

/// Plans a return.
///
/// `product` and `sale` are the records the request's references resolved to,
/// or `None` when the reference was absent or did not resolve.
pub fn plan_return(
    request: &ReturnRequest,
    product: Option<&Product>,
    sale: Option<&Sale>,
) -> CoreResult<ReturnPlan> {
    let requested = request.validate()?;

    let product = match request.product_ref() {
        Some(id) => Some(product.ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?),
        None => None,
    };
    let sale = match request.sale_ref() {
        Some(id) => Some(sale.ok_or_else(|| CoreError::SaleNotFound(id.to_string()))?),
        None => None,
    };

    if let (Some(product_id), Some(sale)) = (request.product_ref(), sale) {
        if sale.product_id != product_id {
            return Err(ValidationError::MismatchedSaleProduct {
                sale_id: sale.id.clone(),
                sale_product_id: sale.product_id.clone(),
                product_id: product_id.to_string(),
            }
            .into());
        }
    }

    let governing = match request.condition.governing_record() {
        GoverningRecord::Sale => sale.map(|s| &s.remaining),
        GoverningRecord::Product => product.map(|p| &p.stock),
    }
    .ok_or_else(|| ValidationError::required(match request.condition.governing_record() {
        GoverningRecord::Sale => "sale_id",
        GoverningRecord::Product => "product_id",
    }))?;

    if let StockLevel::Sized(_) = governing {
        validate_size_labels(&requested)?;
    }
    let quantities = governing.normalize(&requested)?;
    governing.ensure_covers(&quantities)?;

    let mut plan = ReturnPlan {
        condition: request.condition,
        quantities,
        product: None,
        sale: None,
    };

    match request.condition {
        ReturnCondition::AddProductQuantity => {
            let mut sale = required(sale, "sale_id")?.clone();
            let mut product = required(product, "product_id")?.clone();
            sale.remaining.decrease(&plan.quantities)?;
            product.stock.increase(&plan.quantities)?;
            product.refresh_in_stock();
            plan.sale = Some(sale);
            plan.product = Some(product);
        }
        ReturnCondition::DeductSaleQuantity => {
            let mut sale = required(sale, "sale_id")?.clone();
            sale.remaining.decrease(&plan.quantities)?;
            plan.sale = Some(sale);
        }
        ReturnCondition::DeductProductQuantity => {
            let mut product = required(product, "product_id")?.clone();
            product.stock.decrease(&plan.quantities)?;
            product.refresh_in_stock();
            plan.product = Some(product);
        }
    }

    Ok(plan)
}

fn required<'a, T>(record: Option<&'a T>, field: &str) -> CoreResult<&'a T> {
    record.ok_or_else(|| ValidationError::required(field).into())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(id: &str, stock: StockLevel) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: "Tee".to_string(),
            price_cents: 1500,
            in_stock: stock.in_stock(),
            stock,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    fn sale(id: &str, product_id: &str, remaining: StockLevel) -> Sale {
        Sale {
            id: id.to_string(),
            product_id: product_id.to_string(),
            remaining,
            unit_price_cents: 1500,
            discount_cents: 0,
            total_cents: 0,
            sale_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            created_at: Utc::now(),
            version: 0,
        }
    }

    fn request(
        condition: ReturnCondition,
        product_id: Option<&str>,
        sale_id: Option<&str>,
        quantities: &[(&str, i64)],
    ) -> ReturnRequest {
        ReturnRequest {
            condition,
            product_id: product_id.map(str::to_string),
            sale_id: sale_id.map(str::to_string),
            quantities: quantities.iter().map(|&(s, q)| (s.to_string(), q)).collect(),
            reason: "customer changed mind".to_string(),
            return_date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
        }
    }

    fn sized(pairs: &[(&str, u32)]) -> StockLevel {
        StockLevel::Sized(pairs.iter().map(|&(s, q)| (s, q)).collect())
    }

    #[test]
    fn test_add_product_quantity_flat() {
        let p = product("P", StockLevel::Flat(10));
        let s = sale("S", "P", StockLevel::Flat(3));
        let req = request(ReturnCondition::AddProductQuantity, Some("P"), Some("S"), &[("N/A", 2)]);

        let plan = plan_return(&req, Some(&p), Some(&s)).unwrap();

        let p2 = plan.product.unwrap();
        assert_eq!(p2.stock, StockLevel::Flat(12));
        assert!(p2.in_stock);
        assert_eq!(plan.sale.unwrap().remaining, StockLevel::Flat(1));
        assert_eq!(plan.quantities, SizeQuantities::single("N/A", 2));
    }

    #[test]
    fn test_add_product_quantity_more_than_sold() {
        let p = product("P", StockLevel::Flat(10));
        let s = sale("S", "P", StockLevel::Flat(3));
        let req = request(ReturnCondition::AddProductQuantity, Some("P"), Some("S"), &[("N/A", 5)]);

        let err = plan_return(&req, Some(&p), Some(&s)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientQuantity { requested: 5, available: 3, .. }
        ));
    }

    #[test]
    fn test_add_product_quantity_sized_creates_bucket() {
        let p = product("P", sized(&[("M", 1)]));
        let s = sale("S", "P", sized(&[("M", 1), ("XL", 2)]));
        let req = request(ReturnCondition::AddProductQuantity, Some("P"), Some("S"), &[("XL", 2)]);

        let plan = plan_return(&req, Some(&p), Some(&s)).unwrap();

        assert_eq!(plan.product.unwrap().stock, sized(&[("M", 1), ("XL", 2)]));
        assert_eq!(plan.sale.unwrap().remaining, sized(&[("M", 1), ("XL", 0)]));
    }

    #[test]
    fn test_deduct_product_quantity_sized_goes_out_of_stock() {
        let q = product("Q", sized(&[("M", 0), ("L", 2)]));
        let req = request(ReturnCondition::DeductProductQuantity, Some("Q"), None, &[("L", 2)]);

        let plan = plan_return(&req, Some(&q), None).unwrap();

        let q2 = plan.product.unwrap();
        assert_eq!(q2.stock, sized(&[("M", 0), ("L", 0)]));
        assert!(!q2.in_stock);
        assert!(plan.sale.is_none());
    }

    #[test]
    fn test_deduct_sale_quantity_leaves_product_alone() {
        let p = product("P", StockLevel::Flat(10));
        let s = sale("S", "P", StockLevel::Flat(3));
        let req = request(ReturnCondition::DeductSaleQuantity, None, Some("S"), &[("N/A", 3)]);

        let plan = plan_return(&req, Some(&p), Some(&s)).unwrap();

        assert!(plan.product.is_none());
        assert_eq!(plan.sale.unwrap().remaining, StockLevel::Flat(0));
    }

    #[test]
    fn test_deduct_sale_quantity_without_sale_ref() {
        let req = request(ReturnCondition::DeductSaleQuantity, Some("P"), None, &[("N/A", 1)]);
        let err = plan_return(&req, None, None).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::Required { ref field }) if field == "sale_id"
        ));
    }

    #[test]
    fn test_blank_reference_counts_as_missing() {
        let req = request(ReturnCondition::DeductProductQuantity, Some("  "), None, &[("M", 1)]);
        assert!(matches!(
            plan_return(&req, None, None),
            Err(CoreError::Validation(ValidationError::Required { .. }))
        ));
    }

    #[test]
    fn test_add_requires_both_refs() {
        let s = sale("S", "P", StockLevel::Flat(3));
        let req = request(ReturnCondition::AddProductQuantity, None, Some("S"), &[("N/A", 1)]);
        assert!(matches!(
            plan_return(&req, None, Some(&s)),
            Err(CoreError::Validation(ValidationError::Required { .. }))
        ));
    }

    #[test]
    fn test_mismatched_sale_and_product() {
        let p = product("P2", StockLevel::Flat(10));
        let s = sale("S", "P1", StockLevel::Flat(3));
        let req = request(ReturnCondition::AddProductQuantity, Some("P2"), Some("S"), &[("N/A", 1)]);

        let err = plan_return(&req, Some(&p), Some(&s)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::MismatchedSaleProduct { .. })
        ));
    }

    #[test]
    fn test_mismatch_checked_for_deduct_sale_with_product_ref() {
        let s = sale("S", "P1", StockLevel::Flat(3));
        let p = product("P2", StockLevel::Flat(1));
        let req = request(ReturnCondition::DeductSaleQuantity, Some("P2"), Some("S"), &[("N/A", 1)]);

        assert!(matches!(
            plan_return(&req, Some(&p), Some(&s)),
            Err(CoreError::Validation(ValidationError::MismatchedSaleProduct { .. }))
        ));
    }

    #[test]
    fn test_unresolved_references() {
        let req = request(ReturnCondition::AddProductQuantity, Some("P"), Some("S"), &[("N/A", 1)]);
        let s = sale("S", "P", StockLevel::Flat(3));

        assert!(matches!(
            plan_return(&req, None, Some(&s)),
            Err(CoreError::ProductNotFound(ref id)) if id == "P"
        ));

        let p = product("P", StockLevel::Flat(3));
        assert!(matches!(
            plan_return(&req, Some(&p), None),
            Err(CoreError::SaleNotFound(ref id)) if id == "S"
        ));
    }

    #[test]
    fn test_non_positive_quantity_rejected_before_lookup() {
        let req = request(ReturnCondition::DeductProductQuantity, Some("P"), None, &[("M", -1)]);
        assert!(matches!(
            plan_return(&req, None, None),
            Err(CoreError::Validation(ValidationError::MustBePositive { .. }))
        ));
    }

    #[test]
    fn test_arbitrary_labels_collapse_for_flat_governing_record() {
        let p = product("P", StockLevel::Flat(10));
        let s = sale("S", "P", StockLevel::Flat(6));
        let req = request(
            ReturnCondition::AddProductQuantity,
            Some("P"),
            Some("S"),
            &[("S", 1), ("M", 2), ("XXL", 3)],
        );

        let plan = plan_return(&req, Some(&p), Some(&s)).unwrap();

        assert_eq!(plan.quantities, SizeQuantities::single("N/A", 6));
        assert_eq!(plan.sale.unwrap().remaining, StockLevel::Flat(0));
        assert_eq!(plan.product.unwrap().stock, StockLevel::Flat(16));
    }

    #[test]
    fn test_blank_and_long_labels_collapse_for_flat_governing_record() {
        let p = product("P", StockLevel::Flat(10));
        let s = sale("S", "P", StockLevel::Flat(3));
        let long = "a-very-long-size-label-from-caller";
        let req = request(
            ReturnCondition::AddProductQuantity,
            Some("P"),
            Some("S"),
            &[("", 1), ("  ", 1), (long, 1)],
        );

        let plan = plan_return(&req, Some(&p), Some(&s)).unwrap();

        assert_eq!(plan.quantities, SizeQuantities::single("N/A", 3));
        assert_eq!(plan.sale.unwrap().remaining, StockLevel::Flat(0));
    }

    #[test]
    fn test_blank_label_rejected_for_sized_governing_record() {
        let q = product("Q", sized(&[("M", 4)]));
        let req = request(ReturnCondition::DeductProductQuantity, Some("Q"), None, &[(" ", 1)]);

        assert!(matches!(
            plan_return(&req, Some(&q), None),
            Err(CoreError::Validation(ValidationError::Required { ref field })) if field == "size"
        ));
    }

    #[test]
    fn test_sized_governing_record_unknown_size_is_insufficient() {
        let q = product("Q", sized(&[("M", 4)]));
        let req = request(ReturnCondition::DeductProductQuantity, Some("Q"), None, &[("N/A", 1)]);

        assert!(matches!(
            plan_return(&req, Some(&q), None),
            Err(CoreError::InsufficientQuantity { available: 0, .. })
        ));
    }
}
