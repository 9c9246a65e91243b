//! # Domain Types
//!
//! Core domain types used throughout the inventory backend.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │  ReturnRecord   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  product_id     │   │  product_id?    │       │
//! │  │  stock          │   │  remaining      │◄──│  sale_id?       │       │
//! │  │  in_stock       │   │  total_cents    │   │  condition      │       │
//! │  └─────────────────┘   └─────────────────┘   │  quantities     │       │
//! │                                              └─────────────────┘       │
//! │                                                                         │
//! │  ┌──────────────────────────┐                                          │
//! │  │     ReturnCondition      │                                          │
//! │  │  ──────────────────────  │                                          │
//! │  │  ADD_PRODUCT_QUANTITY    │  sale → product                          │
//! │  │  DEDUCT_SALE_QUANTITY    │  sale only                               │
//! │  │  DEDUCT_PRODUCT_QUANTITY │  product only                            │
//! │  └──────────────────────────┘                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::quantity::{SizeQuantities, StockLevel};

// =============================================================================
// Product
// =============================================================================

/// A product held in stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Selling price per unit in cents.
    pub price_cents: i64,

    /// Current stock, per size or flat.
    pub stock: StockLevel,

    /// Derived: total stock > 0. Kept in sync by `refresh_in_stock`.
    pub in_stock: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,

    /// Bumped on every write; also used to take the write lock.
    pub version: i64,
}

impl Product {
    /// Whether stock is tracked per size.
    #[inline]
    pub fn has_sizes(&self) -> bool {
        self.stock.is_sized()
    }

    /// Recomputes `in_stock` from the current stock level.
    pub fn refresh_in_stock(&mut self) {
        self.in_stock = self.stock.in_stock();
    }
}

/// Input for registering a product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub price_cents: i64,
    pub stock: StockLevel,
}

impl NewProduct {
    /// Validates name, price and size labels.
    pub fn validate(&self) -> Result<(), ValidationError> {
        crate::validation::validate_product_name(&self.name)?;
        crate::validation::validate_price_cents(self.price_cents)?;
        if let StockLevel::Sized(sizes) = &self.stock {
            for (size, _) in sizes.iter() {
                crate::validation::validate_size_label(size)?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale. `remaining` is what has not been returned yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub product_id: String,
    pub remaining: StockLevel,
    /// Unit price at time of sale (frozen).
    pub unit_price_cents: i64,
    pub discount_cents: i64,
    /// `unit_price × quantity − discount`.
    pub total_cents: i64,
    #[ts(as = "String")]
    pub sale_date: NaiveDate,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub version: i64,
}

// =============================================================================
// Return Condition
// =============================================================================

/// Selects which store(s) a return mutates.
///
/// Deserialization goes through [`FromStr`], so an unknown wire name fails
/// with the same `ValidationError` message a caller parsing by hand gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReturnCondition {
    /// Goods go back on the shelf: product += returned, sale -= returned.
    AddProductQuantity,
    /// Sale is written down, product untouched (e.g. damaged goods).
    DeductSaleQuantity,
    /// Product stock is written down, no sale involved.
    DeductProductQuantity,
}

/// The record whose quantities bound a return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoverningRecord {
    Product,
    Sale,
}

impl ReturnCondition {
    pub const ALL: [ReturnCondition; 3] = [
        ReturnCondition::AddProductQuantity,
        ReturnCondition::DeductSaleQuantity,
        ReturnCondition::DeductProductQuantity,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            ReturnCondition::AddProductQuantity => "ADD_PRODUCT_QUANTITY",
            ReturnCondition::DeductSaleQuantity => "DEDUCT_SALE_QUANTITY",
            ReturnCondition::DeductProductQuantity => "DEDUCT_PRODUCT_QUANTITY",
        }
    }

    pub const fn requires_product(&self) -> bool {
        matches!(
            self,
            ReturnCondition::AddProductQuantity | ReturnCondition::DeductProductQuantity
        )
    }

    pub const fn requires_sale(&self) -> bool {
        matches!(
            self,
            ReturnCondition::AddProductQuantity | ReturnCondition::DeductSaleQuantity
        )
    }

    pub const fn governing_record(&self) -> GoverningRecord {
        match self {
            ReturnCondition::DeductProductQuantity => GoverningRecord::Product,
            _ => GoverningRecord::Sale,
        }
    }
}

impl fmt::Display for ReturnCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReturnCondition {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ValidationError::required("condition"));
        }

        ReturnCondition::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "condition".to_string(),
                allowed: ReturnCondition::ALL
                    .iter()
                    .map(|c| c.as_str().to_string())
                    .collect(),
            })
    }
}

impl<'de> Deserialize<'de> for ReturnCondition {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Return Record
// =============================================================================

/// A persisted return. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReturnRecord {
    pub id: String,
    pub product_id: Option<String>,
    pub sale_id: Option<String>,
    pub condition: ReturnCondition,
    /// Normalized: a single `"N/A"` bucket when the governing record is flat.
    pub quantities: SizeQuantities,
    pub reason: String,
    #[ts(as = "String")]
    pub return_date: NaiveDate,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
