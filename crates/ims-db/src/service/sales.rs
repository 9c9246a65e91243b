//! # Sales Service
//!
//! Records a sale: deducts the sold quantities from the product and stores
//! the sale with those quantities as its returnable remainder. One
//! transaction; on any error the product is left as it was.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, warn};

use super::error::{ServiceError, ServiceResult};
use crate::repository::product::ProductRepository;
use crate::repository::sale::{generate_sale_id, SaleRepository};
use ims_core::validation::validate_quantities;
use ims_core::{plan_sale, Sale, SaleRequest, ValidationError};

/// Records sales against product stock. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SalesService {
    pool: SqlitePool,
}

impl SalesService {
    pub fn new(pool: SqlitePool) -> Self {
        SalesService { pool }
    }

    /// Sells `request.quantities` of a product.
    ///
    /// `total = unit_price × Σquantities − discount`, priced at the product's
    /// current price. Flat products collapse the labels into `"N/A"`.
    pub async fn record_sale(&self, request: SaleRequest) -> ServiceResult<Sale> {
        let product_id = request.product_id.trim();
        if product_id.is_empty() {
            return Err(ValidationError::required("product_id").into());
        }
        validate_quantities(&request.quantities)?;

        let mut tx = self.pool.begin().await?;

        let product = if ProductRepository::lock_in(&mut tx, product_id).await? {
            ProductRepository::fetch_in(&mut tx, product_id).await?
        } else {
            None
        };
        let product = product.ok_or_else(|| ServiceError::NotFound {
            entity: "Product".to_string(),
            id: product_id.to_string(),
        })?;

        let plan = plan_sale(&product, &request).map_err(|e| {
            warn!(product_id = %product.id, error = %e, "Sale rejected");
            ServiceError::from(e)
        })?;

        ProductRepository::save_in(&mut tx, &plan.product).await?;

        let sale = Sale {
            id: generate_sale_id(),
            product_id: product.id.clone(),
            remaining: plan.remaining,
            unit_price_cents: plan.unit_price_cents,
            discount_cents: plan.discount_cents,
            total_cents: plan.total_cents,
            sale_date: request.sale_date,
            created_at: Utc::now(),
            version: 0,
        };
        SaleRepository::insert_in(&mut tx, &sale).await?;

        tx.commit().await?;

        info!(
            id = %sale.id,
            product_id = %sale.product_id,
            units = sale.remaining.total(),
            total_cents = sale.total_cents,
            "Sale recorded"
        );

        Ok(sale)
    }
}
