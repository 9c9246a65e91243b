//! # Sale Repository
//!
//! Database operations for sales.
//!
//! A sale row stores what was sold and what is still returnable. Only the
//! remaining quantities change after insert; price, discount and total are
//! frozen at the time of sale.
//!
//! ```text
//! record_sale ──► insert_in      remaining = sold
//! reconcile   ──► save_in        remaining -= returned
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::stock::{load_sizes, replace_sizes, stock_columns, stock_level, SizeTable};
use crate::error::{DbError, DbResult};
use ims_core::{Sale, SizeQuantities, StockLevel};

const SELECT_SALE: &str = r#"
    SELECT id, product_id, has_sizes, flat_quantity,
           unit_price_cents, discount_cents, total_cents,
           sale_date, created_at, version
    FROM sales
"#;

#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: String,
    product_id: String,
    has_sizes: bool,
    flat_quantity: i64,
    unit_price_cents: i64,
    discount_cents: i64,
    total_cents: i64,
    sale_date: NaiveDate,
    created_at: DateTime<Utc>,
    version: i64,
}

impl SaleRow {
    fn into_sale(self, sizes: SizeQuantities) -> DbResult<Sale> {
        let remaining = stock_level("sales", self.has_sizes, self.flat_quantity, sizes)?;
        Ok(Sale {
            id: self.id,
            product_id: self.product_id,
            remaining,
            unit_price_cents: self.unit_price_cents,
            discount_cents: self.discount_cents,
            total_cents: self.total_cents,
            sale_date: self.sale_date,
            created_at: self.created_at,
            version: self.version,
        })
    }
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let mut tx = self.pool.begin().await?;
        let sale = Self::fetch_in(&mut tx, id).await?;
        tx.commit().await?;
        Ok(sale)
    }

    /// Writes a sale's remaining quantities back in its own transaction.
    pub async fn save(&self, sale: &Sale) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        if !Self::lock_in(&mut tx, &sale.id).await? {
            return Err(DbError::not_found("Sale", &sale.id));
        }
        Self::save_in(&mut tx, sale).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Lists the sales of one product, newest first.
    pub async fn list_for_product(&self, product_id: &str) -> DbResult<Vec<Sale>> {
        let sql = format!("{} WHERE product_id = ? ORDER BY rowid DESC", SELECT_SALE);

        let mut tx = self.pool.begin().await?;

        let rows: Vec<SaleRow> = sqlx::query_as(&sql)
            .bind(product_id)
            .fetch_all(&mut *tx)
            .await?;

        let mut sales = Vec::with_capacity(rows.len());
        for row in rows {
            let sizes = load_sizes(&mut tx, SizeTable::Sale, &row.id).await?;
            sales.push(row.into_sale(sizes)?);
        }

        tx.commit().await?;
        Ok(sales)
    }

    /// Counts sales (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // -------------------------------------------------------------------------
    // Transactional building blocks
    // -------------------------------------------------------------------------

    /// Bumps `version` to take the write lock on the row.
    ///
    /// Returns `false` when no such sale exists.
    pub(crate) async fn lock_in(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
        let result = sqlx::query("UPDATE sales SET version = version + 1 WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub(crate) async fn fetch_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("{} WHERE id = ?", SELECT_SALE);

        let row: Option<SaleRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        match row {
            Some(row) => {
                let sizes = load_sizes(conn, SizeTable::Sale, &row.id).await?;
                Ok(Some(row.into_sale(sizes)?))
            }
            None => Ok(None),
        }
    }

    pub(crate) async fn insert_in(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, product_id = %sale.product_id, total_cents = sale.total_cents, "Inserting sale");

        let (has_sizes, flat_quantity) = stock_columns(&sale.remaining);

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, product_id, has_sizes, flat_quantity,
                unit_price_cents, discount_cents, total_cents,
                sale_date, created_at, version
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.product_id)
        .bind(has_sizes)
        .bind(flat_quantity)
        .bind(sale.unit_price_cents)
        .bind(sale.discount_cents)
        .bind(sale.total_cents)
        .bind(sale.sale_date)
        .bind(sale.created_at)
        .bind(sale.version)
        .execute(&mut *conn)
        .await?;

        if let StockLevel::Sized(sizes) = &sale.remaining {
            replace_sizes(conn, SizeTable::Sale, &sale.id, sizes).await?;
        }

        Ok(())
    }

    /// Writes the remaining quantities. The caller has already locked the row.
    pub(crate) async fn save_in(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, remaining = sale.remaining.total(), "Saving sale");

        let (has_sizes, flat_quantity) = stock_columns(&sale.remaining);

        let result = sqlx::query("UPDATE sales SET has_sizes = ?, flat_quantity = ? WHERE id = ?")
            .bind(has_sizes)
            .bind(flat_quantity)
            .bind(&sale.id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", &sale.id));
        }

        let sizes = match &sale.remaining {
            StockLevel::Sized(sizes) => sizes.clone(),
            StockLevel::Flat(_) => SizeQuantities::new(),
        };
        replace_sizes(conn, SizeTable::Sale, &sale.id, &sizes).await?;

        Ok(())
    }
}

/// Generates a new sale ID.
pub fn generate_sale_id() -> String {
    Uuid::new_v4().to_string()
}
