//! # Quantity Module
//!
//! Stock levels for products and sales.
//!
//! ## Two Shapes, One Code Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        StockLevel                                       │
//! │                                                                         │
//! │   Sized(SizeQuantities)              Flat(u32)                         │
//! │   ┌──────┬─────┐                     ┌─────┐                           │
//! │   │ "S"  │  4  │                     │ 10  │                           │
//! │   │ "M"  │  0  │                     └──┬──┘                           │
//! │   │ "L"  │  2  │                        │ buckets()                    │
//! │   └──────┴─────┘                        ▼                              │
//! │                                      ┌───────┬────┐                    │
//! │                                      │ "N/A" │ 10 │                    │
//! │                                      └───────┴────┘                    │
//! │                                                                         │
//! │  Reconciliation always works on the bucket view, so sized and flat     │
//! │  records share the same availability check.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A size label appears at most once per record; `SizeQuantities` is a map,
//! so duplicate size rows cannot be represented.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

/// Pseudo-size label used for records that are not size-partitioned.
pub const UNSIZED_LABEL: &str = "N/A";

// =============================================================================
// Size Quantities
// =============================================================================

/// Quantities keyed by size label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SizeQuantities(BTreeMap<String, u32>);

impl SizeQuantities {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        SizeQuantities(BTreeMap::new())
    }

    /// Creates a mapping with a single bucket.
    pub fn single(size: impl Into<String>, quantity: u32) -> Self {
        let mut map = BTreeMap::new();
        map.insert(size.into(), quantity);
        SizeQuantities(map)
    }

    /// Returns the quantity for `size`, or 0 when there is no bucket.
    pub fn get(&self, size: &str) -> u32 {
        self.0.get(size).copied().unwrap_or(0)
    }

    /// Sets the quantity for `size`, replacing any existing bucket.
    pub fn set(&mut self, size: impl Into<String>, quantity: u32) {
        self.0.insert(size.into(), quantity);
    }

    /// Sum over all buckets.
    pub fn total(&self) -> u64 {
        self.0.values().map(|&q| u64::from(q)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, size: &str) -> bool {
        self.0.contains_key(size)
    }

    /// Iterates buckets in size-label order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(size, &qty)| (size.as_str(), qty))
    }

    /// Collapses every bucket into a single `"N/A"` bucket holding the sum.
    pub fn collapsed(&self) -> CoreResult<SizeQuantities> {
        let total = u32::try_from(self.total()).map_err(|_| CoreError::QuantityOverflow {
            size: UNSIZED_LABEL.to_string(),
        })?;
        Ok(SizeQuantities::single(UNSIZED_LABEL, total))
    }

    /// Fails with `InsufficientQuantity` on the first bucket of `requested`
    /// that exceeds what is held here.
    pub fn ensure_covers(&self, requested: &SizeQuantities) -> CoreResult<()> {
        for (size, wanted) in requested.iter() {
            let available = self.get(size);
            if available < wanted {
                return Err(CoreError::insufficient(size, wanted, available));
            }
        }
        Ok(())
    }

    /// Adds `other` bucket-wise, creating buckets that do not exist yet.
    ///
    /// Either every bucket is updated or none is.
    pub fn add(&mut self, other: &SizeQuantities) -> CoreResult<()> {
        let mut next = self.0.clone();
        for (size, qty) in other.iter() {
            let current = next.get(size).copied().unwrap_or(0);
            let sum = current
                .checked_add(qty)
                .ok_or_else(|| CoreError::QuantityOverflow {
                    size: size.to_string(),
                })?;
            next.insert(size.to_string(), sum);
        }
        self.0 = next;
        Ok(())
    }

    /// Subtracts `other` bucket-wise.
    ///
    /// Availability is checked for every bucket before anything changes.
    /// Buckets that reach zero are kept.
    pub fn subtract(&mut self, other: &SizeQuantities) -> CoreResult<()> {
        self.ensure_covers(other)?;
        for (size, qty) in other.iter() {
            if let Some(current) = self.0.get_mut(size) {
                *current -= qty;
            }
        }
        Ok(())
    }
}

/// Builds a mapping from pairs; repeated labels are summed (saturating).
impl<S: Into<String>> FromIterator<(S, u32)> for SizeQuantities {
    fn from_iter<I: IntoIterator<Item = (S, u32)>>(iter: I) -> Self {
        let mut map: BTreeMap<String, u32> = BTreeMap::new();
        for (size, qty) in iter {
            let bucket = map.entry(size.into()).or_insert(0);
            *bucket = bucket.saturating_add(qty);
        }
        SizeQuantities(map)
    }
}

impl From<BTreeMap<String, u32>> for SizeQuantities {
    fn from(map: BTreeMap<String, u32>) -> Self {
        SizeQuantities(map)
    }
}

// =============================================================================
// Stock Level
// =============================================================================

/// Quantity held by a product or a sale.
///
/// A product is size-partitioned iff its level is `Sized`. Sales copy the
/// shape of their product when recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    /// Per-size buckets.
    Sized(SizeQuantities),
    /// A single count for items without sizes.
    Flat(u32),
}

impl StockLevel {
    #[inline]
    pub fn is_sized(&self) -> bool {
        matches!(self, StockLevel::Sized(_))
    }

    /// Sum of all quantities.
    pub fn total(&self) -> u64 {
        match self {
            StockLevel::Sized(sizes) => sizes.total(),
            StockLevel::Flat(qty) => u64::from(*qty),
        }
    }

    /// `true` when anything is left.
    #[inline]
    pub fn in_stock(&self) -> bool {
        self.total() > 0
    }

    /// Bucket view of this level. `Flat(n)` becomes `{"N/A": n}`.
    pub fn buckets(&self) -> SizeQuantities {
        match self {
            StockLevel::Sized(sizes) => sizes.clone(),
            StockLevel::Flat(qty) => SizeQuantities::single(UNSIZED_LABEL, *qty),
        }
    }

    /// Normalizes requested quantities against this level's shape.
    ///
    /// Sized levels keep the caller's labels. Flat levels collapse every
    /// label into `"N/A"`, whatever the caller sent.
    pub fn normalize(&self, requested: &SizeQuantities) -> CoreResult<SizeQuantities> {
        match self {
            StockLevel::Sized(_) => Ok(requested.clone()),
            StockLevel::Flat(_) => requested.collapsed(),
        }
    }

    /// Checks that every bucket of `requested` is available.
    pub fn ensure_covers(&self, requested: &SizeQuantities) -> CoreResult<()> {
        self.buckets().ensure_covers(requested)
    }

    /// Increases the level. Flat levels take the total of `quantities`.
    pub fn increase(&mut self, quantities: &SizeQuantities) -> CoreResult<()> {
        match self {
            StockLevel::Sized(sizes) => sizes.add(quantities),
            StockLevel::Flat(qty) => {
                let added = quantities.collapsed()?.get(UNSIZED_LABEL);
                *qty = qty.checked_add(added).ok_or_else(|| CoreError::QuantityOverflow {
                    size: UNSIZED_LABEL.to_string(),
                })?;
                Ok(())
            }
        }
    }

    /// Decreases the level by already-normalized quantities.
    ///
    /// Nothing changes unless every bucket is covered.
    pub fn decrease(&mut self, quantities: &SizeQuantities) -> CoreResult<()> {
        self.ensure_covers(quantities)?;
        match self {
            StockLevel::Sized(sizes) => sizes.subtract(quantities),
            StockLevel::Flat(qty) => {
                *qty -= quantities.get(UNSIZED_LABEL);
                Ok(())
            }
        }
    }
}

impl Default for StockLevel {
    fn default() -> Self {
        StockLevel::Flat(0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(pairs: &[(&str, u32)]) -> SizeQuantities {
        pairs.iter().map(|&(s, q)| (s, q)).collect()
    }

    #[test]
    fn test_flat_buckets_use_unsized_label() {
        let level = StockLevel::Flat(10);
        assert_eq!(level.buckets(), SizeQuantities::single("N/A", 10));
        assert!(!level.is_sized());
    }

    #[test]
    fn test_normalize_collapses_for_flat() {
        let level = StockLevel::Flat(10);
        let requested = sizes(&[("S", 1), ("XL", 2), ("whatever", 3)]);

        let normalized = level.normalize(&requested).unwrap();
        assert_eq!(normalized, SizeQuantities::single("N/A", 6));
    }

    #[test]
    fn test_normalize_keeps_labels_for_sized() {
        let level = StockLevel::Sized(sizes(&[("M", 1)]));
        let requested = sizes(&[("M", 1), ("L", 2)]);

        assert_eq!(level.normalize(&requested).unwrap(), requested);
    }

    #[test]
    fn test_from_iter_sums_repeated_labels() {
        let merged = sizes(&[("M", 2), ("M", 3)]);
        assert_eq!(merged.get("M"), 5);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_decrease_is_all_or_nothing() {
        let mut level = StockLevel::Sized(sizes(&[("M", 5), ("L", 1)]));
        let err = level.decrease(&sizes(&[("M", 2), ("L", 2)])).unwrap_err();

        assert!(matches!(
            err,
            CoreError::InsufficientQuantity { ref size, requested: 2, available: 1 } if size == "L"
        ));
        assert_eq!(level, StockLevel::Sized(sizes(&[("M", 5), ("L", 1)])));
    }

    #[test]
    fn test_decrease_missing_bucket_counts_as_zero() {
        let mut level = StockLevel::Sized(sizes(&[("M", 5)]));
        let err = level.decrease(&sizes(&[("XS", 1)])).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientQuantity { available: 0, .. }));
    }

    #[test]
    fn test_decrease_keeps_zero_buckets() {
        let mut level = StockLevel::Sized(sizes(&[("M", 0), ("L", 2)]));
        level.decrease(&sizes(&[("L", 2)])).unwrap();

        assert_eq!(level, StockLevel::Sized(sizes(&[("M", 0), ("L", 0)])));
        assert!(!level.in_stock());
    }

    #[test]
    fn test_increase_creates_bucket() {
        let mut level = StockLevel::Sized(sizes(&[("M", 1)]));
        level.increase(&sizes(&[("XL", 3)])).unwrap();
        assert_eq!(level.buckets().get("XL"), 3);
        assert_eq!(level.total(), 4);
    }

    #[test]
    fn test_increase_flat_adds_total() {
        let mut level = StockLevel::Flat(10);
        level.increase(&sizes(&[("N/A", 2)])).unwrap();
        assert_eq!(level, StockLevel::Flat(12));
    }

    #[test]
    fn test_increase_overflow_leaves_level_unchanged() {
        let mut level = StockLevel::Sized(sizes(&[("M", u32::MAX), ("L", 0)]));
        let before = level.clone();

        let err = level.increase(&sizes(&[("L", 1), ("M", 1)])).unwrap_err();
        assert!(matches!(err, CoreError::QuantityOverflow { .. }));
        assert_eq!(level, before);
    }

    #[test]
    fn test_stock_level_serde_shape() {
        let json = serde_json::to_string(&StockLevel::Flat(3)).unwrap();
        assert_eq!(json, r#"{"flat":3}"#);

        let level: StockLevel = serde_json::from_str(r#"{"sized":{"M":2}}"#).unwrap();
        assert_eq!(level.buckets().get("M"), 2);
    }
}
