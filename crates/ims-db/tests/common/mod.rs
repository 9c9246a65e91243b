//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::PathBuf;

use ims_core::{NewProduct, Product, ReturnCondition, ReturnRequest, Sale, SaleRequest, StockLevel};
use ims_db::{Database, DbConfig};

pub async fn memory_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

/// A file-backed database with several connections, for tests that need
/// real concurrent writers.
pub struct FileDb {
    pub db: Database,
    path: PathBuf,
}

impl FileDb {
    pub async fn new(max_connections: u32) -> Self {
        let path = std::env::temp_dir().join(format!("ims-test-{}.db", uuid::Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path).max_connections(max_connections))
            .await
            .unwrap();
        FileDb { db, path }
    }

    pub async fn cleanup(self) {
        self.db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

pub fn quantities(pairs: &[(&str, i64)]) -> BTreeMap<String, i64> {
    pairs.iter().map(|&(s, q)| (s.to_string(), q)).collect()
}

pub fn sized(pairs: &[(&str, u32)]) -> StockLevel {
    StockLevel::Sized(pairs.iter().map(|&(s, q)| (s, q)).collect())
}

pub async fn product(db: &Database, stock: StockLevel) -> Product {
    db.products()
        .insert(NewProduct {
            name: "Field Jacket".to_string(),
            price_cents: 9900,
            stock,
        })
        .await
        .unwrap()
}

pub async fn sell(db: &Database, product_id: &str, pairs: &[(&str, i64)]) -> Sale {
    db.sales_service()
        .record_sale(SaleRequest {
            product_id: product_id.to_string(),
            quantities: quantities(pairs),
            discount_cents: 0,
            sale_date: NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
        })
        .await
        .unwrap()
}

/// Product with `stock + sold` units, then a sale of `sold`.
///
/// Leaves the product at `stock` and the sale's remaining at `sold`.
pub async fn flat_product_with_sale(db: &Database, stock: u32, sold: u32) -> (Product, Sale) {
    let p = product(db, StockLevel::Flat(stock + sold)).await;
    let s = sell(db, &p.id, &[("N/A", i64::from(sold))]).await;
    let p = db.products().get_by_id(&p.id).await.unwrap().unwrap();
    (p, s)
}

pub fn return_request(
    condition: ReturnCondition,
    product_id: Option<&str>,
    sale_id: Option<&str>,
    pairs: &[(&str, i64)],
) -> ReturnRequest {
    ReturnRequest {
        condition,
        product_id: product_id.map(str::to_string),
        sale_id: sale_id.map(str::to_string),
        quantities: quantities(pairs),
        reason: "customer return".to_string(),
        return_date: NaiveDate::from_ymd_opt(2024, 9, 5).unwrap(),
    }
}

pub async fn product_stock(db: &Database, id: &str) -> (StockLevel, bool) {
    let p = db.products().get_by_id(id).await.unwrap().unwrap();
    (p.stock, p.in_stock)
}

pub async fn sale_remaining(db: &Database, id: &str) -> StockLevel {
    db.sales().get_by_id(id).await.unwrap().unwrap().remaining
}
