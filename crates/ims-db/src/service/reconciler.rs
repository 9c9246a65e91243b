//! # Stock Reconciler
//!
//! Applies a return to the product and sale stores and records it.
//!
//! ## Transaction Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  reconcile(request)                                                     │
//! │                                                                         │
//! │  request.validate()            ── ValidationError, no store touched    │
//! │       │                                                                 │
//! │  BEGIN                                                                  │
//! │       │                                                                 │
//! │  lock records that will change ── UPDATE ... version = version + 1     │
//! │  (sale first, then product)       takes the SQLite write lock          │
//! │       │                                                                 │
//! │  fetch product / sale snapshots                                        │
//! │       │                                                                 │
//! │  plan_return(...)              ── NotFound / mismatch / insufficient   │
//! │       │                                                                 │
//! │  save_in(sale'), save_in(product'), insert_in(return)                  │
//! │       │                                                                 │
//! │  COMMIT                        (any error: tx dropped → ROLLBACK)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Two reconciliations against the same sale queue on the write lock; the
//! second one reads the quantities the first one committed.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, warn};

use super::error::{ServiceError, ServiceResult};
use crate::repository::product::ProductRepository;
use crate::repository::returns::{generate_return_id, ReturnRepository};
use crate::repository::sale::SaleRepository;
use ims_core::{plan_return, ReturnRecord, ReturnRequest};

/// Applies returns to stock. Cheap to clone.
#[derive(Debug, Clone)]
pub struct StockReconciler {
    pool: SqlitePool,
}

impl StockReconciler {
    pub fn new(pool: SqlitePool) -> Self {
        StockReconciler { pool }
    }

    /// Validates the request, adjusts product and/or sale quantities and
    /// persists the return, all in one transaction.
    ///
    /// ## Errors
    /// - `Validation`: bad condition refs, quantities, reason, or a sale that
    ///   belongs to another product
    /// - `NotFound`: a given product or sale reference does not resolve
    /// - `InsufficientQuantity`: the governing record holds less than requested
    /// - `Internal`: persistence failure
    ///
    /// On error no store is modified.
    pub async fn reconcile(&self, request: ReturnRequest) -> ServiceResult<ReturnRecord> {
        if let Err(e) = request.validate() {
            warn!(condition = %request.condition, error = %e, "Return rejected");
            return Err(e.into());
        }

        let condition = request.condition;
        let product_ref = request.product_ref().map(str::to_string);
        let sale_ref = request.sale_ref().map(str::to_string);

        let mut tx = self.pool.begin().await?;

        // Writes before reads: the first UPDATE takes the database write lock
        let sale_locked = match sale_ref.as_deref() {
            Some(id) if condition.requires_sale() => SaleRepository::lock_in(&mut tx, id).await?,
            _ => false,
        };
        let product_locked = match product_ref.as_deref() {
            Some(id) if condition.requires_product() => {
                ProductRepository::lock_in(&mut tx, id).await?
            }
            _ => false,
        };

        let sale = match sale_ref.as_deref() {
            Some(_) if condition.requires_sale() && !sale_locked => None,
            Some(id) => SaleRepository::fetch_in(&mut tx, id).await?,
            None => None,
        };
        let product = match product_ref.as_deref() {
            Some(_) if condition.requires_product() && !product_locked => None,
            Some(id) => ProductRepository::fetch_in(&mut tx, id).await?,
            None => None,
        };

        let plan = plan_return(&request, product.as_ref(), sale.as_ref()).map_err(|e| {
            warn!(
                condition = %condition,
                sale_id = ?sale_ref,
                product_id = ?product_ref,
                error = %e,
                "Return rejected"
            );
            ServiceError::from(e)
        })?;

        if let Some(sale) = &plan.sale {
            SaleRepository::save_in(&mut tx, sale).await?;
        }
        if let Some(product) = &plan.product {
            ProductRepository::save_in(&mut tx, product).await?;
        }

        let record = ReturnRecord {
            id: generate_return_id(),
            product_id: product_ref,
            sale_id: sale_ref,
            condition,
            quantities: plan.quantities,
            reason: request.reason.trim().to_string(),
            return_date: request.return_date,
            created_at: Utc::now(),
        };
        ReturnRepository::insert_in(&mut tx, &record).await?;

        tx.commit().await?;

        info!(
            id = %record.id,
            condition = %record.condition,
            sale_id = ?record.sale_id,
            product_id = ?record.product_id,
            units = record.quantities.total(),
            "Return reconciled"
        );

        Ok(record)
    }
}
