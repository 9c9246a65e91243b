//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Storage Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products                              product_sizes                   │
//! │  ┌───────────────────────────────┐     ┌──────────────────────────┐    │
//! │  │ id  has_sizes  flat_quantity  │     │ product_id  size  qty    │    │
//! │  │ P   0          10             │     │                          │    │
//! │  │ Q   1          0              │────►│ Q           L     2      │    │
//! │  │                               │     │ Q           M     0      │    │
//! │  └───────────────────────────────┘     └──────────────────────────┘    │
//! │                                                                         │
//! │  P → StockLevel::Flat(10)                                              │
//! │  Q → StockLevel::Sized({L: 2, M: 0})                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `in_stock` is always written from the stock level being saved, never from
//! the caller's flag.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::stock::{load_sizes, replace_sizes, stock_columns, stock_level, SizeTable};
use crate::error::{DbError, DbResult};
use ims_core::{NewProduct, Product, SizeQuantities, StockLevel};

const SELECT_PRODUCT: &str = r#"
    SELECT id, name, price_cents, has_sizes, flat_quantity, in_stock,
           created_at, updated_at, version
    FROM products
"#;

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    price_cents: i64,
    has_sizes: bool,
    flat_quantity: i64,
    in_stock: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl ProductRow {
    fn into_product(self, sizes: SizeQuantities) -> DbResult<Product> {
        let stock = stock_level("products", self.has_sizes, self.flat_quantity, sizes)?;
        Ok(Product {
            id: self.id,
            name: self.name,
            price_cents: self.price_cents,
            stock,
            in_stock: self.in_stock,
            created_at: self.created_at,
            updated_at: self.updated_at,
            version: self.version,
        })
    }
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let product = repo.insert(NewProduct {
///     name: "Polo".into(),
///     price_cents: 2500,
///     stock: StockLevel::Flat(10),
/// }).await?;
///
/// let found = repo.get_by_id(&product.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by ID, with its size buckets.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut tx = self.pool.begin().await?;
        let product = Self::fetch_in(&mut tx, id).await?;
        tx.commit().await?;
        Ok(product)
    }

    /// Registers a product.
    ///
    /// ## Returns
    /// The stored product with generated ID, timestamps and `in_stock`.
    pub async fn insert(&self, new: NewProduct) -> DbResult<Product> {
        new.validate()?;

        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            name: new.name.trim().to_string(),
            price_cents: new.price_cents,
            in_stock: new.stock.in_stock(),
            stock: new.stock,
            created_at: now,
            updated_at: now,
            version: 0,
        };

        debug!(id = %product.id, name = %product.name, sized = product.has_sizes(), "Inserting product");

        let (has_sizes, flat_quantity) = stock_columns(&product.stock);

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, price_cents, has_sizes, flat_quantity, in_stock,
                created_at, updated_at, version
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(has_sizes)
        .bind(flat_quantity)
        .bind(product.in_stock)
        .bind(product.created_at)
        .bind(product.updated_at)
        .bind(product.version)
        .execute(&mut *tx)
        .await?;

        if let StockLevel::Sized(sizes) = &product.stock {
            replace_sizes(&mut tx, SizeTable::Product, &product.id, sizes).await?;
        }

        tx.commit().await?;

        Ok(product)
    }

    /// Writes a product snapshot back in its own transaction.
    ///
    /// Bumps `version` and `updated_at`.
    pub async fn save(&self, product: &Product) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        if !Self::lock_in(&mut tx, &product.id).await? {
            return Err(DbError::not_found("Product", &product.id));
        }
        Self::save_in(&mut tx, product).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Lists products by name.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<Product>> {
        let sql = format!("{} ORDER BY name, id LIMIT ?", SELECT_PRODUCT);

        let mut tx = self.pool.begin().await?;

        let rows: Vec<ProductRow> = sqlx::query_as(&sql)
            .bind(i64::from(limit))
            .fetch_all(&mut *tx)
            .await?;

        let mut products = Vec::with_capacity(rows.len());
        for row in rows {
            let sizes = load_sizes(&mut tx, SizeTable::Product, &row.id).await?;
            products.push(row.into_product(sizes)?);
        }

        tx.commit().await?;
        Ok(products)
    }

    /// Counts products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // -------------------------------------------------------------------------
    // Transactional building blocks
    // -------------------------------------------------------------------------

    /// Bumps `version` to take the write lock on the row.
    ///
    /// Returns `false` when no such product exists.
    pub(crate) async fn lock_in(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
        let result = sqlx::query("UPDATE products SET version = version + 1 WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub(crate) async fn fetch_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("{} WHERE id = ?", SELECT_PRODUCT);

        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        match row {
            Some(row) => {
                let sizes = load_sizes(conn, SizeTable::Product, &row.id).await?;
                Ok(Some(row.into_product(sizes)?))
            }
            None => Ok(None),
        }
    }

    /// Writes name, price and stock. The caller has already locked the row.
    pub(crate) async fn save_in(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, total = product.stock.total(), "Saving product");

        let (has_sizes, flat_quantity) = stock_columns(&product.stock);

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?,
                price_cents = ?,
                has_sizes = ?,
                flat_quantity = ?,
                in_stock = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(has_sizes)
        .bind(flat_quantity)
        .bind(product.stock.in_stock())
        .bind(Utc::now())
        .bind(&product.id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        let sizes = match &product.stock {
            StockLevel::Sized(sizes) => sizes.clone(),
            StockLevel::Flat(_) => SizeQuantities::new(),
        };
        replace_sizes(conn, SizeTable::Product, &product.id, &sizes).await?;

        Ok(())
    }
}

/// Generates a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use crate::DbError;
    use ims_core::{NewProduct, SizeQuantities, StockLevel};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn new_product(name: &str, stock: StockLevel) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            price_cents: 1999,
            stock,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_flat() {
        let db = db().await;
        let created = db
            .products()
            .insert(new_product("Mug", StockLevel::Flat(10)))
            .await
            .unwrap();

        let found = db.products().get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(found.stock, StockLevel::Flat(10));
        assert!(found.in_stock);
        assert_eq!(found.name, "Mug");
    }

    #[tokio::test]
    async fn test_insert_and_get_sized_keeps_zero_buckets() {
        let db = db().await;
        let sizes: SizeQuantities = [("M", 0u32), ("L", 2)].into_iter().collect();
        let created = db
            .products()
            .insert(new_product("Hoodie", StockLevel::Sized(sizes.clone())))
            .await
            .unwrap();

        let found = db.products().get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(found.stock, StockLevel::Sized(sizes));
        assert!(found.in_stock);
    }

    #[tokio::test]
    async fn test_empty_stock_is_out_of_stock() {
        let db = db().await;
        let created = db
            .products()
            .insert(new_product("Scarf", StockLevel::Flat(0)))
            .await
            .unwrap();
        assert!(!created.in_stock);
    }

    #[tokio::test]
    async fn test_insert_rejects_blank_name() {
        let db = db().await;
        let err = db
            .products()
            .insert(new_product("   ", StockLevel::Flat(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Invalid(_)));
        assert_eq!(db.products().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let db = db().await;
        assert!(db.products().get_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_derives_in_stock_and_bumps_version() {
        let db = db().await;
        let mut product = db
            .products()
            .insert(new_product("Cap", StockLevel::Flat(2)))
            .await
            .unwrap();

        product.stock = StockLevel::Flat(0);
        // Stale flag on purpose
        product.in_stock = true;
        db.products().save(&product).await.unwrap();

        let found = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(found.stock, StockLevel::Flat(0));
        assert!(!found.in_stock);
        assert_eq!(found.version, 1);
    }

    #[tokio::test]
    async fn test_save_switches_shape() {
        let db = db().await;
        let mut product = db
            .products()
            .insert(new_product("Tee", StockLevel::Sized(SizeQuantities::single("S", 3))))
            .await
            .unwrap();

        product.stock = StockLevel::Flat(5);
        db.products().save(&product).await.unwrap();

        let found = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(found.stock, StockLevel::Flat(5));
    }

    #[tokio::test]
    async fn test_save_missing_product() {
        let db = db().await;
        let mut product = db
            .products()
            .insert(new_product("Belt", StockLevel::Flat(1)))
            .await
            .unwrap();
        product.id = "missing".to_string();

        let err = db.products().save(&product).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_and_count() {
        let db = db().await;
        for name in ["Socks", "Apron", "Gloves"] {
            db.products()
                .insert(new_product(name, StockLevel::Flat(1)))
                .await
                .unwrap();
        }

        let listed = db.products().list(2).await.unwrap();
        let names: Vec<_> = listed.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Apron", "Gloves"]);
        assert_eq!(db.products().count().await.unwrap(), 3);
    }
}
